//! HORI USB vendor and product ID constants.
//!
//! Values are read from the device descriptor of a retail Switch-edition
//! wheel: `idVendor 0x0f0d`, `idProduct 0x013e`, `bcdDevice 1.16`,
//! `iManufacturer "HORI CO.,LTD."`, `iProduct "HORI Racing Wheel Switch"`.

/// HORI CO.,LTD. USB Vendor ID.
pub const VENDOR_ID: u16 = 0x0F0D;

/// HORI Racing Wheel for Nintendo Switch.
pub const PRODUCT_RACING_WHEEL_SWITCH: u16 = 0x013E;

/// `bcdDevice` of the captured unit.
pub const RELEASE_NUMBER: u16 = 0x0116;

pub const MANUFACTURER: &str = "HORI CO.,LTD.";

pub const PRODUCT_NAME: &str = "HORI Racing Wheel Switch";

/// Returns `true` if the VID/PID pair identifies the HORI racing wheel.
pub fn is_hori_wheel(vid: u16, pid: u16) -> bool {
    vid == VENDOR_ID && pid == PRODUCT_RACING_WHEEL_SWITCH
}

/// Returns the product name for a known HORI wheel PID, or `None`.
pub fn product_name(pid: u16) -> Option<&'static str> {
    match pid {
        PRODUCT_RACING_WHEEL_SWITCH => Some(PRODUCT_NAME),
        _ => None,
    }
}
