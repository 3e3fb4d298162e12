//! Baseline selection

use openracing_hid_common::RawReport;
use std::collections::HashMap;

/// The neutral report that live reports are compared against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Baseline {
    report: RawReport,
    /// Reports obtained while capturing.
    samples: usize,
    /// How many of those were identical to `report`.
    occurrences: usize,
}

impl Baseline {
    /// Baseline taken as-is, e.g. from a known neutral capture.
    pub fn from_report(report: RawReport) -> Self {
        Self {
            report,
            samples: 1,
            occurrences: 1,
        }
    }

    pub fn report(&self) -> &RawReport {
        &self.report
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.report.as_bytes()
    }

    pub fn len(&self) -> usize {
        self.report.len()
    }

    pub fn is_empty(&self) -> bool {
        self.report.is_empty()
    }

    pub fn samples(&self) -> usize {
        self.samples
    }

    pub fn occurrences(&self) -> usize {
        self.occurrences
    }
}

/// Most frequent byte-identical report. Ties go to the report seen first.
///
/// Returns `None` for an empty window.
pub fn select_mode(samples: &[RawReport]) -> Option<Baseline> {
    let mut counts: HashMap<&RawReport, (usize, usize)> = HashMap::new();
    for (index, report) in samples.iter().enumerate() {
        counts.entry(report).or_insert((0, index)).0 += 1;
    }

    let (report, (occurrences, _)) = counts
        .into_iter()
        .max_by(|(_, (count_a, first_a)), (_, (count_b, first_b))| {
            count_a.cmp(count_b).then(first_b.cmp(first_a))
        })?;

    Some(Baseline {
        report: report.clone(),
        samples: samples.len(),
        occurrences,
    })
}
