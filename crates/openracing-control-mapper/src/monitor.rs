//! Change tracking over a monitoring window

use crate::classify::ChangeRecord;
use crate::config::ClassifierThresholds;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;

/// When a monitoring window ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorBudget {
    /// Wall-clock time.
    Duration(Duration),
    /// Read attempts, timeouts included.
    Reads(usize),
}

/// Accumulates per-byte divergence from a baseline.
///
/// Only positions present in both the report and the baseline are compared.
/// A position joins the change set when its value differs from the baseline;
/// its min/max are tracked on every sample regardless.
#[derive(Debug, Clone)]
pub struct ChangeTracker {
    baseline: Vec<u8>,
    values: BTreeMap<usize, BTreeSet<u8>>,
    min: Vec<u8>,
    max: Vec<u8>,
    samples: usize,
}

impl ChangeTracker {
    pub fn new(baseline: &[u8]) -> Self {
        Self {
            baseline: baseline.to_vec(),
            values: BTreeMap::new(),
            min: vec![u8::MAX; baseline.len()],
            max: vec![u8::MIN; baseline.len()],
            samples: 0,
        }
    }

    pub fn observe(&mut self, report: &[u8]) {
        self.samples += 1;
        for (index, (&value, &neutral)) in report.iter().zip(&self.baseline).enumerate() {
            if value != neutral {
                self.values.entry(index).or_default().insert(value);
            }
            if let Some(min) = self.min.get_mut(index) {
                *min = (*min).min(value);
            }
            if let Some(max) = self.max.get_mut(index) {
                *max = (*max).max(value);
            }
        }
    }

    pub fn samples(&self) -> usize {
        self.samples
    }

    pub fn has_changes(&self) -> bool {
        !self.values.is_empty()
    }

    /// Classify every changed position, in byte order.
    pub fn finish(self, thresholds: &ClassifierThresholds) -> Vec<ChangeRecord> {
        let Self {
            values, min, max, ..
        } = self;
        values
            .into_iter()
            .map(|(index, observed)| {
                let lo = min.get(index).copied().unwrap_or(u8::MAX);
                let hi = max.get(index).copied().unwrap_or(u8::MIN);
                ChangeRecord::new(index, observed, lo, hi, thresholds)
            })
            .collect()
    }
}

/// Result of one monitoring window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonitorOutcome {
    /// Reports received (timeouts excluded).
    pub samples: usize,
    pub read_attempts: usize,
    pub changes: Vec<ChangeRecord>,
}

impl MonitorOutcome {
    /// Nothing diverged from the baseline: no control was detected.
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn change_at(&self, byte_index: usize) -> Option<&ChangeRecord> {
        self.changes.iter().find(|c| c.byte_index == byte_index)
    }
}
