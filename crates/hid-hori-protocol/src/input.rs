//! HORI wheel input report decoding (64-byte interrupt-IN report, no report ID).
//!
//! # Report layout
//! | Offset | Size | Field        | Encoding                                     |
//! |--------|------|--------------|----------------------------------------------|
//! | 0–1    | u16  | buttons_raw  | LE, unassigned on this wheel                 |
//! | 2      | u8   | dpad / misc  | bits 0–3 d-pad, 4 plus, 5 minus, 6 L, 7 R    |
//! | 3      | u8   | buttons      | 0 paddle down, 1 paddle up, 2 home, 3 ?, 4 A, 5 B, 6 X, 7 Y |
//! | 4      | u8   | brake        | 0 released … 255 floored                     |
//! | 5      | u8   | accelerator  | 0 released … 255 floored                     |
//! | 6–7    | u16  | steering     | LE, see [`Steering`]                         |
//! | 8–63   |      | padding      | ignored                                      |
//!
//! ZL and ZR have no bits of their own: the wheel reports them as the brake
//! and accelerator at full travel.

use crate::types::{DpadDirection, HoriButton, Steering};
use crate::{HoriError, HoriResult};
use openracing_hid_common::ReportParser;
use serde::Serialize;
use std::fmt;

/// Length of the report the wheel sends.
pub const REPORT_LEN: usize = 64;

/// Bytes that carry state; anything shorter cannot be decoded.
pub const MIN_REPORT_LEN: usize = 8;

/// Decoded wheel state. A pure function of the first eight report bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub struct HoriInputState {
    pub buttons_raw: u16,
    pub dpad_bits: u8,
    pub dpad: DpadDirection,
    pub plus: bool,
    pub minus: bool,
    pub shoulder_left: bool,
    pub shoulder_right: bool,
    pub paddle_down: bool,
    pub paddle_up: bool,
    pub home: bool,
    /// Byte 3 bit 3. Never seen set; kept so unknown activity is visible.
    pub reserved_byte3_bit3: bool,
    pub face_a: bool,
    pub face_b: bool,
    pub face_x: bool,
    pub face_y: bool,
    pub brake: u8,
    pub accel: u8,
    pub steering: Steering,
    pub zl: bool,
    pub zr: bool,
}

/// Decode a raw report. Bytes past [`MIN_REPORT_LEN`] are ignored.
pub fn decode(report: &[u8]) -> HoriResult<HoriInputState> {
    if report.len() < MIN_REPORT_LEN {
        return Err(HoriError::MalformedReport {
            got: report.len(),
            need: MIN_REPORT_LEN,
        });
    }

    let mut parser = ReportParser::new(report);

    let buttons_raw = parser.read_u16_le()?;
    let byte2 = parser.read_u8()?;
    let byte3 = parser.read_u8()?;
    let brake = parser.read_u8()?;
    let accel = parser.read_u8()?;
    let steering = Steering::from_raw(parser.read_u16_le()?);

    let bit = |byte: u8, n: u8| byte & (1 << n) != 0;
    let dpad_bits = byte2 & 0x0F;

    Ok(HoriInputState {
        buttons_raw,
        dpad_bits,
        dpad: DpadDirection::from_bits(dpad_bits),
        plus: bit(byte2, 4),
        minus: bit(byte2, 5),
        shoulder_left: bit(byte2, 6),
        shoulder_right: bit(byte2, 7),
        paddle_down: bit(byte3, 0),
        paddle_up: bit(byte3, 1),
        home: bit(byte3, 2),
        reserved_byte3_bit3: bit(byte3, 3),
        face_a: bit(byte3, 4),
        face_b: bit(byte3, 5),
        face_x: bit(byte3, 6),
        face_y: bit(byte3, 7),
        brake,
        accel,
        steering,
        zl: brake == u8::MAX,
        zr: accel == u8::MAX,
    })
}

impl HoriInputState {
    pub fn is_pressed(&self, button: HoriButton) -> bool {
        match button {
            HoriButton::Plus => self.plus,
            HoriButton::Minus => self.minus,
            HoriButton::ShoulderLeft => self.shoulder_left,
            HoriButton::ShoulderRight => self.shoulder_right,
            HoriButton::PaddleDown => self.paddle_down,
            HoriButton::PaddleUp => self.paddle_up,
            HoriButton::Home => self.home,
            HoriButton::A => self.face_a,
            HoriButton::B => self.face_b,
            HoriButton::X => self.face_x,
            HoriButton::Y => self.face_y,
            HoriButton::Zl => self.zl,
            HoriButton::Zr => self.zr,
        }
    }

    pub fn pressed_buttons(&self) -> Vec<HoriButton> {
        HoriButton::ALL
            .into_iter()
            .filter(|b| self.is_pressed(*b))
            .collect()
    }
}

/// One-line status, e.g.
/// `Wheel: 0x8000 (-32768), Accel: ff, Brake: 00 | Byte2: [--|-.] ...`.
impl fmt::Display for HoriInputState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let flag = |on: bool, c: char| if on { c } else { '-' };
        write!(
            f,
            "Wheel: 0x{:04x} ({}), Accel: {:02x}, Brake: {:02x} | ",
            self.steering.raw(),
            self.steering.signed(),
            self.accel,
            self.brake
        )?;
        write!(
            f,
            "Byte2: [{}{}|{}{}] ",
            flag(self.shoulder_left, 'L'),
            flag(self.shoulder_right, 'R'),
            flag(self.plus, '+'),
            if self.minus { '-' } else { '.' }
        )?;
        write!(
            f,
            "Byte3: [{}{}|{}{}{}{}{}] ",
            flag(self.paddle_down, 'D'),
            flag(self.paddle_up, 'U'),
            flag(self.home, 'H'),
            flag(self.face_a, 'A'),
            flag(self.face_b, 'B'),
            flag(self.face_x, 'X'),
            flag(self.face_y, 'Y')
        )?;
        write!(
            f,
            "ZL/ZR: [{}{}] | D-pad: {}",
            flag(self.zl, 'L'),
            flag(self.zr, 'R'),
            self.dpad
        )
    }
}
