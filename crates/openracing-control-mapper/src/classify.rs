//! Classification of changed byte positions

use crate::config::ClassifierThresholds;
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Classification {
    /// Toggles between exactly 0 and 1.
    Button,
    /// A handful of nearby values, typically a hat switch or packed flags.
    MultiBit,
    Analog,
}

impl Classification {
    /// Label used in the mapping log.
    pub fn label(self) -> &'static str {
        match self {
            Classification::Button => "BUTTON/BIT",
            Classification::MultiBit => "MULTI-BIT",
            Classification::Analog => "ANALOG",
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.label())
    }
}

/// Bit positions that took both 0 and 1 across the observed values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub struct ActiveBits(u8);

impl ActiveBits {
    pub fn from_values<'a>(values: impl IntoIterator<Item = &'a u8>) -> Self {
        let (mut ones, mut zeros) = (0u8, 0u8);
        for &v in values {
            ones |= v;
            zeros |= !v;
        }
        Self(ones & zeros)
    }

    pub fn mask(self) -> u8 {
        self.0
    }

    pub fn contains(self, bit: u8) -> bool {
        bit < 8 && self.0 & (1 << bit) != 0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn bits(self) -> impl Iterator<Item = u8> {
        (0u8..8).filter(move |&bit| self.contains(bit))
    }
}

/// Decision tree, first match wins:
/// 1. exactly the values {0, 1} → [`Classification::Button`]
/// 2. few values within a narrow span → [`Classification::MultiBit`]
/// 3. anything else → [`Classification::Analog`]
///
/// `values` are the values that differed from the baseline; `min`/`max` span
/// every sample, including those equal to the baseline.
pub fn classify(
    values: &BTreeSet<u8>,
    min: u8,
    max: u8,
    thresholds: &ClassifierThresholds,
) -> Classification {
    let span = max.saturating_sub(min);
    if values.len() == 2 && values.iter().all(|&v| v <= 1) {
        Classification::Button
    } else if values.len() <= thresholds.max_multibit_values
        && span <= thresholds.max_multibit_span
    {
        Classification::MultiBit
    } else {
        Classification::Analog
    }
}

/// Everything observed at one byte position during a monitoring window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChangeRecord {
    pub byte_index: usize,
    pub observed_values: BTreeSet<u8>,
    pub min_observed: u8,
    pub max_observed: u8,
    pub classification: Classification,
    /// Only computed for small value sets.
    pub active_bits: Option<ActiveBits>,
}

impl ChangeRecord {
    pub fn new(
        byte_index: usize,
        observed_values: BTreeSet<u8>,
        min_observed: u8,
        max_observed: u8,
        thresholds: &ClassifierThresholds,
    ) -> Self {
        let classification = classify(&observed_values, min_observed, max_observed, thresholds);
        let active_bits = (observed_values.len() <= thresholds.max_multibit_values)
            .then(|| ActiveBits::from_values(&observed_values));
        Self {
            byte_index,
            observed_values,
            min_observed,
            max_observed,
            classification,
            active_bits,
        }
    }

    pub fn span(&self) -> u8 {
        self.max_observed.saturating_sub(self.min_observed)
    }
}
