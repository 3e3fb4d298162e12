//! Byte-wise comparison of a live report against the baseline

/// Bytes shown by live comparison; every field seen so far sits well inside.
pub const LIVE_COMPARE_BYTES: usize = 32;

/// Deltas beyond this are highlighted as large movements.
pub const LARGE_DELTA: i16 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteDiff {
    pub index: usize,
    /// Zero when the baseline is shorter than the current report.
    pub baseline: u8,
    pub current: u8,
}

impl ByteDiff {
    pub fn delta(&self) -> i16 {
        i16::from(self.current) - i16::from(self.baseline)
    }

    pub fn changed(&self) -> bool {
        self.current != self.baseline
    }

    pub fn is_large(&self) -> bool {
        self.delta().abs() > LARGE_DELTA
    }
}

/// One row per byte of `current`, up to `limit`.
pub fn diff_reports(baseline: &[u8], current: &[u8], limit: usize) -> Vec<ByteDiff> {
    current
        .iter()
        .take(limit)
        .enumerate()
        .map(|(index, &current)| ByteDiff {
            index,
            baseline: baseline.get(index).copied().unwrap_or(0),
            current,
        })
        .collect()
}
