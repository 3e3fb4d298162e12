//! Snapshot tests for the HORI input decoder.
//!
//! These lock in the status line and the reverse-engineered bit layout.

use insta::assert_snapshot;
use racing_wheel_hid_hori_protocol::{self as hori, DpadDirection, HoriButton, HoriError};

fn padded(prefix: [u8; 8]) -> Vec<u8> {
    let mut data = prefix.to_vec();
    data.resize(hori::REPORT_LEN, 0);
    data
}

/// Captured with the d-pad held up-right, Home and A held, accelerator
/// floored and the wheel at full left lock.
#[test]
fn test_end_to_end_capture() -> Result<(), HoriError> {
    let state = hori::decode(&[0x00, 0x00, 0x09, 0x14, 0x00, 0xFF, 0x00, 0x80])?;

    assert_eq!(state.dpad, DpadDirection::NorthEast);
    assert!(!state.plus && !state.minus);
    assert!(!state.shoulder_left && !state.shoulder_right);
    assert!(!state.paddle_down && !state.paddle_up);
    assert!(state.home);
    assert!(state.face_a);
    assert!(!state.face_b && !state.face_x && !state.face_y);
    assert_eq!(state.brake, 0);
    assert_eq!(state.accel, 255);
    assert!(!state.zl);
    assert!(state.zr);
    assert_eq!(state.steering.raw(), 0x8000);
    assert_eq!(state.steering.signed(), -32768);

    assert_snapshot!(
        state.to_string(),
        @"Wheel: 0x8000 (-32768), Accel: ff, Brake: 00 | Byte2: [--|-.] Byte3: [--|HA---] ZL/ZR: [-R] | D-pad: NE"
    );
    Ok(())
}

#[test]
fn test_snapshot_all_buttons() -> Result<(), HoriError> {
    let state = hori::decode(&padded([0x00, 0x00, 0xF0, 0xF7, 0xFF, 0xFF, 0xFF, 0x7F]))?;
    assert_snapshot!(
        state.to_string(),
        @"Wheel: 0x7fff (32767), Accel: ff, Brake: ff | Byte2: [LR|+-] Byte3: [DU|HABXY] ZL/ZR: [LR] | D-pad: Neutral"
    );
    assert_eq!(state.pressed_buttons(), HoriButton::ALL.to_vec());
    Ok(())
}

#[test]
fn test_snapshot_near_center_left() -> Result<(), HoriError> {
    let state = hori::decode(&padded([0x00, 0x00, 0x06, 0x00, 0x80, 0x40, 0xFF, 0xFF]))?;
    assert_snapshot!(
        state.to_string(),
        @"Wheel: 0xffff (-1), Accel: 40, Brake: 80 | Byte2: [--|-.] Byte3: [--|-----] ZL/ZR: [--] | D-pad: SW"
    );
    Ok(())
}

#[test]
fn test_snapshot_pressed_button_names() -> Result<(), HoriError> {
    let state = hori::decode(&padded([0x00, 0x00, 0x30, 0x01, 0x00, 0x00, 0x00, 0x00]))?;
    let names: Vec<&str> = state.pressed_buttons().iter().map(|b| b.name()).collect();
    assert_snapshot!(names.join(","), @"+,-,Paddle Down");
    Ok(())
}

#[test]
fn test_state_serializes_with_field_names() -> Result<(), Box<dyn std::error::Error>> {
    let state = hori::decode(&padded([0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00]))?;
    let json = serde_json::to_value(state)?;
    assert_eq!(json["dpad"], "North");
    assert_eq!(json["steering"], 0);
    assert_eq!(json["zr"], false);
    Ok(())
}
