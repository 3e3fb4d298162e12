//! HORI Racing Wheel (Switch) USB HID input protocol.
//!
//! The wheel enumerates as VID `0x0F0D` / PID `0x013E` and streams 64-byte
//! interrupt-IN reports. Only the first eight bytes carry state; the layout
//! was reverse engineered from live captures and is documented in [`input`].
//!
//! The crate is I/O-free. Reading from the device lives in the capture tool,
//! and discovering unknown fields lives in `openracing-control-mapper`.

#![deny(unsafe_op_in_unsafe_fn)]
#![deny(static_mut_refs)]
#![deny(clippy::unwrap_used)]

pub mod descriptor;
pub mod ids;
pub mod input;
pub mod types;

pub use descriptor::REPORT_DESCRIPTOR;
pub use ids::{
    MANUFACTURER, PRODUCT_NAME, PRODUCT_RACING_WHEEL_SWITCH, RELEASE_NUMBER, VENDOR_ID,
    is_hori_wheel, product_name,
};
pub use input::{HoriInputState, MIN_REPORT_LEN, REPORT_LEN, decode};
pub use types::{DpadDirection, HoriButton, Steering, SteeringDirection};

use openracing_hid_common::HidCommonError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HoriError {
    #[error("Malformed report: got {got} bytes, need at least {need}")]
    MalformedReport { got: usize, need: usize },

    #[error("HID error: {0}")]
    HidError(String),
}

pub type HoriResult<T> = Result<T, HoriError>;

impl From<HidCommonError> for HoriError {
    fn from(e: HidCommonError) -> Self {
        HoriError::HidError(e.to_string())
    }
}
