//! Differential control mapping for undocumented HID input reports
//!
//! Given a neutral baseline report and a stream of live reports, the mapper
//! finds the byte positions a physical control moves and classifies each one
//! as a single button bit, a small multi-bit field (hat switch) or an analog
//! axis. Results are appended to a flat text log.
//!
//! The crate is device-agnostic: it reads through
//! [`openracing_hid_common::DeviceInputSource`] and never decodes reports.

#![deny(unsafe_op_in_unsafe_fn)]
#![deny(clippy::unwrap_used)]

pub mod baseline;
pub mod classify;
pub mod config;
pub mod diff;
pub mod mapping_log;
pub mod monitor;
pub mod session;

pub use baseline::{Baseline, select_mode};
pub use classify::{ActiveBits, ChangeRecord, Classification, classify};
pub use config::{ClassifierThresholds, MapperConfig};
pub use diff::{ByteDiff, LIVE_COMPARE_BYTES, diff_reports};
pub use mapping_log::{ControlMapping, MappingLog};
pub use monitor::{ChangeTracker, MonitorBudget, MonitorOutcome};
pub use session::{MappingSession, SessionState};

use openracing_hid_common::HidCommonError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MapperError {
    #[error("Insufficient samples: {attempts} read attempt(s) returned no report")]
    InsufficientSamples { attempts: usize },

    #[error("No baseline captured")]
    NoBaseline,

    #[error("Device unavailable: {0}")]
    DeviceUnavailable(String),

    #[error("Device error: {0}")]
    Device(#[from] HidCommonError),

    #[error("Interrupted")]
    Interrupted,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl MapperError {
    /// Route device errors that end the session to `DeviceUnavailable`.
    pub fn from_device(err: HidCommonError) -> Self {
        if err.is_device_unavailable() {
            MapperError::DeviceUnavailable(err.to_string())
        } else {
            MapperError::Device(err)
        }
    }
}

pub type MapperResult<T> = Result<T, MapperError>;
