//! D-pad, steering and button types for the HORI wheel.

use serde::{Deserialize, Serialize};
use std::fmt;

/// D-pad direction decoded from the low nibble of byte 2.
///
/// The wheel reports the pad as four overlapping cardinal bits
/// (N = bit 0, S = bit 1, W = bit 2, E = bit 3); diagonals set two bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DpadDirection {
    North,
    NorthEast,
    East,
    SouthEast,
    South,
    SouthWest,
    West,
    NorthWest,
    #[default]
    Neutral,
}

use DpadDirection::{
    East, Neutral, North, NorthEast, NorthWest, South, SouthEast, SouthWest, West,
};

/// Indexed by the raw nibble. Opposing-bit combinations decode as neutral.
const DPAD_TABLE: [DpadDirection; 16] = [
    Neutral,   // 0x0
    North,     // 0x1
    South,     // 0x2
    Neutral,   // 0x3
    West,      // 0x4
    NorthWest, // 0x5
    SouthWest, // 0x6
    Neutral,   // 0x7
    East,      // 0x8
    NorthEast, // 0x9
    SouthEast, // 0xA
    Neutral,   // 0xB
    Neutral,   // 0xC
    Neutral,   // 0xD
    Neutral,   // 0xE
    Neutral,   // 0xF
];

impl DpadDirection {
    pub const fn from_bits(nibble: u8) -> Self {
        DPAD_TABLE[(nibble & 0x0F) as usize]
    }

    pub fn is_neutral(self) -> bool {
        self == Neutral
    }

    pub fn short_name(self) -> &'static str {
        match self {
            North => "N",
            NorthEast => "NE",
            East => "E",
            SouthEast => "SE",
            South => "S",
            SouthWest => "SW",
            West => "W",
            NorthWest => "NW",
            Neutral => "Neutral",
        }
    }
}

impl fmt::Display for DpadDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}

/// Steering position as sent on the wire (bytes 6–7, little-endian).
///
/// 0 is centre, `1..=32767` turns right and `32768..=65535` turns left,
/// where 65535 sits just left of centre and 32768 is full left lock. This is
/// exactly the two's-complement reading of the raw word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Steering(u16);

/// Which way the wheel is turned and by how much (1..=32768).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SteeringDirection {
    Center,
    Right(u16),
    Left(u16),
}

impl Steering {
    pub const CENTER: Steering = Steering(0);

    pub const fn from_raw(raw: u16) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u16 {
        self.0
    }

    /// `raw` below 0x8000, `raw - 65536` otherwise.
    pub const fn signed(self) -> i16 {
        self.0 as i16
    }

    pub fn direction(self) -> SteeringDirection {
        match self.0 {
            0 => SteeringDirection::Center,
            raw if raw < 0x8000 => SteeringDirection::Right(raw),
            // 65536 - raw stays within 1..=32768 for raw in 0x8000..=0xFFFF.
            raw => SteeringDirection::Left(raw.wrapping_neg()),
        }
    }

    /// Position in `[-1.0, 1.0)`, negative to the left.
    pub fn normalized(self) -> f32 {
        (f32::from(self.signed()) / 32768.0).clamp(-1.0, 1.0)
    }
}

impl From<u16> for Steering {
    fn from(raw: u16) -> Self {
        Self(raw)
    }
}

/// Every binary control on the wheel, including the pedal-derived ZL/ZR.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HoriButton {
    Plus,
    Minus,
    ShoulderLeft,
    ShoulderRight,
    PaddleDown,
    PaddleUp,
    Home,
    A,
    B,
    X,
    Y,
    Zl,
    Zr,
}

impl HoriButton {
    pub const ALL: [HoriButton; 13] = [
        HoriButton::Plus,
        HoriButton::Minus,
        HoriButton::ShoulderLeft,
        HoriButton::ShoulderRight,
        HoriButton::PaddleDown,
        HoriButton::PaddleUp,
        HoriButton::Home,
        HoriButton::A,
        HoriButton::B,
        HoriButton::X,
        HoriButton::Y,
        HoriButton::Zl,
        HoriButton::Zr,
    ];

    pub fn name(self) -> &'static str {
        match self {
            HoriButton::Plus => "+",
            HoriButton::Minus => "-",
            HoriButton::ShoulderLeft => "L",
            HoriButton::ShoulderRight => "R",
            HoriButton::PaddleDown => "Paddle Down",
            HoriButton::PaddleUp => "Paddle Up",
            HoriButton::Home => "Home",
            HoriButton::A => "A",
            HoriButton::B => "B",
            HoriButton::X => "X",
            HoriButton::Y => "Y",
            HoriButton::Zl => "ZL",
            HoriButton::Zr => "ZR",
        }
    }
}

impl fmt::Display for HoriButton {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dpad_table_cardinals_and_diagonals() {
        assert_eq!(DpadDirection::from_bits(0x1), North);
        assert_eq!(DpadDirection::from_bits(0x9), NorthEast);
        assert_eq!(DpadDirection::from_bits(0x8), East);
        assert_eq!(DpadDirection::from_bits(0xA), SouthEast);
        assert_eq!(DpadDirection::from_bits(0x2), South);
        assert_eq!(DpadDirection::from_bits(0x6), SouthWest);
        assert_eq!(DpadDirection::from_bits(0x4), West);
        assert_eq!(DpadDirection::from_bits(0x5), NorthWest);
    }

    #[test]
    fn test_dpad_unlisted_nibbles_are_neutral() {
        for nibble in [0x0, 0x3, 0x7, 0xB, 0xC, 0xD, 0xE, 0xF] {
            assert_eq!(DpadDirection::from_bits(nibble), Neutral, "nibble {nibble:#X}");
        }
    }

    #[test]
    fn test_dpad_ignores_high_nibble() {
        assert_eq!(DpadDirection::from_bits(0xF9), NorthEast);
    }

    #[test]
    fn test_steering_signed_mapping() {
        assert_eq!(Steering::from_raw(0x0000).signed(), 0);
        assert_eq!(Steering::from_raw(0x7FFF).signed(), 32767);
        assert_eq!(Steering::from_raw(0x8000).signed(), -32768);
        assert_eq!(Steering::from_raw(0xFFFF).signed(), -1);
    }

    #[test]
    fn test_steering_direction_magnitudes() {
        assert_eq!(Steering::CENTER.direction(), SteeringDirection::Center);
        assert_eq!(Steering::from_raw(1).direction(), SteeringDirection::Right(1));
        assert_eq!(
            Steering::from_raw(0x7FFF).direction(),
            SteeringDirection::Right(32767)
        );
        assert_eq!(Steering::from_raw(0xFFFF).direction(), SteeringDirection::Left(1));
        assert_eq!(
            Steering::from_raw(0x8000).direction(),
            SteeringDirection::Left(32768)
        );
    }

    #[test]
    fn test_steering_normalized_extremes() {
        assert_eq!(Steering::CENTER.normalized(), 0.0);
        assert_eq!(Steering::from_raw(0x8000).normalized(), -1.0);
        assert!(Steering::from_raw(0x7FFF).normalized() > 0.999);
    }

    #[test]
    fn test_button_names_unique() {
        let mut names: Vec<&str> = HoriButton::ALL.iter().map(|b| b.name()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), HoriButton::ALL.len());
    }
}
