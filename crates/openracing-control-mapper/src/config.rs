//! Mapper configuration

use crate::{MapperError, MapperResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Limits separating multi-bit fields from analog axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierThresholds {
    /// Largest distinct-value count still treated as multi-bit.
    pub max_multibit_values: usize,
    /// Largest `max - min` still treated as multi-bit.
    pub max_multibit_span: u8,
}

impl Default for ClassifierThresholds {
    fn default() -> Self {
        Self {
            max_multibit_values: 16,
            max_multibit_span: 15,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapperConfig {
    pub baseline_samples: usize,
    pub sample_interval_ms: u64,
    pub monitor_duration_secs: u64,
    pub read_timeout_ms: u64,
    /// Bytes requested per read.
    pub report_size: usize,
    pub log_path: PathBuf,
    pub classifier: ClassifierThresholds,
    /// Controls offered for mapping, in prompt order.
    pub controls: Vec<String>,
}

impl Default for MapperConfig {
    fn default() -> Self {
        Self {
            baseline_samples: 20,
            sample_interval_ms: 50,
            monitor_duration_secs: 5,
            read_timeout_ms: 100,
            report_size: 64,
            log_path: PathBuf::from("control_mapping.txt"),
            classifier: ClassifierThresholds::default(),
            controls: default_controls(),
        }
    }
}

/// The physical controls of a three-pedal wheel with a 13-button rim.
pub fn default_controls() -> Vec<String> {
    let mut controls: Vec<String> = [
        "Steering Wheel (Full Left to Full Right)",
        "Steering Wheel (Center to Left)",
        "Steering Wheel (Center to Right)",
        "Accelerator Pedal (Not Pressed to Full)",
        "Brake Pedal (Not Pressed to Full)",
        "Clutch Pedal (Not Pressed to Full)",
    ]
    .into_iter()
    .map(String::from)
    .collect();
    controls.extend((1..=13).map(|n| format!("Button {n}")));
    controls.extend(
        ["D-Pad Up", "D-Pad Right", "D-Pad Down", "D-Pad Left"]
            .into_iter()
            .map(String::from),
    );
    controls
}

impl MapperConfig {
    pub fn from_yaml_str(yaml: &str) -> MapperResult<Self> {
        let config: MapperConfig =
            serde_yaml::from_str(yaml).map_err(|e| MapperError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> MapperResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            MapperError::Config(format!("Failed to read {}: {e}", path.display()))
        })?;
        let config = Self::from_yaml_str(&text)?;
        tracing::debug!(path = %path.display(), "Loaded mapper config");
        Ok(config)
    }

    pub fn to_yaml(&self) -> MapperResult<String> {
        serde_yaml::to_string(self).map_err(|e| MapperError::Config(e.to_string()))
    }

    pub fn validate(&self) -> MapperResult<()> {
        if self.baseline_samples == 0 {
            return Err(MapperError::Config(
                "baseline_samples must be at least 1".to_string(),
            ));
        }

        if self.report_size == 0 {
            return Err(MapperError::Config(
                "report_size must be at least 1".to_string(),
            ));
        }

        if self.read_timeout_ms == 0 {
            return Err(MapperError::Config(
                "read_timeout_ms must be at least 1".to_string(),
            ));
        }

        let values = self.classifier.max_multibit_values;
        if !(1..=256).contains(&values) {
            return Err(MapperError::Config(format!(
                "classifier.max_multibit_values must be between 1 and 256, got {values}"
            )));
        }

        Ok(())
    }

    pub fn sample_interval(&self) -> Duration {
        Duration::from_millis(self.sample_interval_ms)
    }

    pub fn monitor_duration(&self) -> Duration {
        Duration::from_secs(self.monitor_duration_secs)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = MapperConfig::default();
        assert_eq!(config.baseline_samples, 20);
        assert_eq!(config.sample_interval(), Duration::from_millis(50));
        assert_eq!(config.monitor_duration(), Duration::from_secs(5));
        assert_eq!(config.read_timeout(), Duration::from_millis(100));
        assert_eq!(config.report_size, 64);
        assert_eq!(config.log_path, PathBuf::from("control_mapping.txt"));
        assert_eq!(config.classifier, ClassifierThresholds::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_controls_list() {
        let controls = default_controls();
        assert_eq!(controls.len(), 23);
        assert_eq!(controls[6], "Button 1");
        assert_eq!(controls[18], "Button 13");
        assert_eq!(controls.last().map(String::as_str), Some("D-Pad Left"));
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() -> MapperResult<()> {
        let config = MapperConfig::from_yaml_str(
            "baseline_samples: 40\nclassifier:\n  max_multibit_span: 7\ncontrols: [Handbrake]\n",
        )?;
        assert_eq!(config.baseline_samples, 40);
        assert_eq!(config.sample_interval_ms, 50);
        assert_eq!(config.classifier.max_multibit_span, 7);
        assert_eq!(config.classifier.max_multibit_values, 16);
        assert_eq!(config.controls, vec!["Handbrake".to_string()]);
        Ok(())
    }

    #[test]
    fn test_rejects_zero_samples() {
        let result = MapperConfig::from_yaml_str("baseline_samples: 0\n");
        assert!(matches!(result, Err(MapperError::Config(msg)) if msg.contains("baseline_samples")));
    }

    #[test]
    fn test_rejects_zero_report_size() {
        let config = MapperConfig {
            report_size: 0,
            ..MapperConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_out_of_range_value_threshold() {
        let mut config = MapperConfig::default();
        config.classifier.max_multibit_values = 0;
        assert!(config.validate().is_err());
        config.classifier.max_multibit_values = 257;
        assert!(config.validate().is_err());
        config.classifier.max_multibit_values = 256;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_malformed_yaml() {
        assert!(matches!(
            MapperConfig::from_yaml_str("baseline_samples: [1, 2"),
            Err(MapperError::Config(_))
        ));
    }

    #[test]
    fn test_yaml_round_trip() -> MapperResult<()> {
        let config = MapperConfig::default();
        let yaml = config.to_yaml()?;
        assert_eq!(MapperConfig::from_yaml_str(&yaml)?, config);
        Ok(())
    }
}
