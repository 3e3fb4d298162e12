//! Report descriptor captured from the wheel.
//!
//! Some hosts refuse the `GET_DESCRIPTOR(Report)` control request on this
//! device, so the bytes are kept here for offline diagnostics. They describe
//! a generic gamepad collection (13 buttons, a hat, four 8-bit axes and a
//! vendor page) and do not match the layout the wheel actually sends; see
//! [`crate::input`] for that.

/// `bmRequestType` for a standard interface IN request.
pub const DESCRIPTOR_REQUEST_TYPE: u8 = 0x81;

/// `GET_DESCRIPTOR`.
pub const DESCRIPTOR_REQUEST: u8 = 0x06;

/// `wValue`: descriptor type 0x22 (Report), index 0.
pub const DESCRIPTOR_VALUE: u16 = 0x2200;

/// Upper bound on the descriptor length requested from the device.
pub const MAX_DESCRIPTOR_LEN: usize = 1024;

#[rustfmt::skip]
pub const REPORT_DESCRIPTOR: [u8; 112] = [
    0x05, 0x01, 0x09, 0x05, 0xA1, 0x01, 0x15, 0x00, 0x25, 0x01, 0x35, 0x00, 0x45, 0x01, 0x75, 0x01,
    0x95, 0x0D, 0x05, 0x09, 0x19, 0x01, 0x29, 0x0D, 0x81, 0x02, 0x95, 0x03, 0x81, 0x01, 0x05, 0x01,
    0x25, 0x07, 0x46, 0x3B, 0x01, 0x75, 0x04, 0x95, 0x01, 0x65, 0x14, 0x09, 0x39, 0x81, 0x42, 0x65,
    0x00, 0x95, 0x01, 0x81, 0x01, 0x26, 0xFF, 0x00, 0x46, 0xFF, 0x00, 0x09, 0x30, 0x09, 0x31, 0x09,
    0x32, 0x09, 0x35, 0x75, 0x08, 0x95, 0x04, 0x81, 0x02, 0x06, 0x00, 0xFF, 0x09, 0x20, 0x09, 0x21,
    0x09, 0x22, 0x09, 0x23, 0x09, 0x24, 0x09, 0x25, 0x09, 0x26, 0x09, 0x27, 0x09, 0x28, 0x09, 0x29,
    0x09, 0x2A, 0x09, 0x2B, 0x95, 0x0C, 0x81, 0x02, 0x0A, 0x21, 0x26, 0x95, 0x08, 0xB1, 0x02, 0xC0,
];
