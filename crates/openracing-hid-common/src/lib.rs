//! Common HID utilities for racing wheel protocol tooling
//!
//! This crate provides the pieces shared between report decoders and the
//! control mapper: owned raw reports, a bounds-checked report parser, the
//! blocking [`DeviceInputSource`] abstraction (with a scriptable mock), device
//! and endpoint descriptors, and a diagnostic HID report-descriptor dump.

#![deny(unsafe_op_in_unsafe_fn)]
#![deny(clippy::unwrap_used)]

pub mod device_info;
pub mod hid_traits;
pub mod raw_report;
pub mod report_descriptor;
pub mod report_parser;

pub use device_info::*;
pub use hid_traits::*;
pub use raw_report::*;
pub use report_parser::*;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum HidCommonError {
    #[error("Device unavailable: {0}")]
    DeviceUnavailable(String),

    #[error("No interrupt IN endpoint on interface {interface}")]
    EndpointNotFound { interface: u8 },

    #[error("Failed to read from device: {0}")]
    ReadError(String),

    #[error("Report descriptor unavailable: {0}")]
    DescriptorUnavailable(String),

    #[error("Invalid report format: {0}")]
    InvalidReport(String),

    #[error("Device disconnected")]
    Disconnected,

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl HidCommonError {
    /// Errors that mean the session cannot start (or continue) at all.
    pub fn is_device_unavailable(&self) -> bool {
        matches!(
            self,
            HidCommonError::DeviceUnavailable(_)
                | HidCommonError::EndpointNotFound { .. }
                | HidCommonError::Disconnected
        )
    }
}

pub type HidCommonResult<T> = Result<T, HidCommonError>;
