//! Append-only mapping log
//!
//! One block per mapped control:
//!
//! ```text
//! ================================================================================
//! Control: Brake Pedal (Not Pressed to Full)
//! Samples: 250
//! ================================================================================
//! Byte  4: ANALOG     | Range: 0x00-0xFF (  0-255) | Span: 255
//! ```

use crate::MapperResult;
use crate::classify::ChangeRecord;
use std::fs::OpenOptions;
use std::io::Write as _;
use std::path::{Path, PathBuf};

const RULE_WIDTH: usize = 80;

/// What one monitoring window revealed about one named control.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlMapping {
    pub control: String,
    pub samples: usize,
    pub changes: Vec<ChangeRecord>,
}

impl ControlMapping {
    /// Log block, starting with a blank line.
    pub fn format_block(&self) -> String {
        let rule = "=".repeat(RULE_WIDTH);
        let mut out = format!(
            "\n{rule}\nControl: {}\nSamples: {}\n{rule}\n",
            self.control, self.samples
        );
        for change in &self.changes {
            out.push_str(&format_line(change));
            out.push('\n');
        }
        out
    }
}

pub fn format_line(change: &ChangeRecord) -> String {
    format!(
        "Byte {:2}: {:10} | Range: 0x{:02X}-0x{:02X} ({:3}-{:3}) | Span: {:3}",
        change.byte_index,
        change.classification.label(),
        change.min_observed,
        change.max_observed,
        change.min_observed,
        change.max_observed,
        change.span()
    )
}

/// Text file that mapping blocks are appended to. Never truncated.
#[derive(Debug, Clone)]
pub struct MappingLog {
    path: PathBuf,
}

impl MappingLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&self, mapping: &ControlMapping) -> MapperResult<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(mapping.format_block().as_bytes())?;
        tracing::info!(
            control = %mapping.control,
            fields = mapping.changes.len(),
            path = %self.path.display(),
            "Appended control mapping"
        );
        Ok(())
    }
}
