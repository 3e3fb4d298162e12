//! Terminal rendering for the capture tool

use colored::*;
use openracing_control_mapper::{ByteDiff, ChangeRecord, Classification, ControlMapping};
use openracing_hid_common::{HidDeviceInfo, RawReport};
use racing_wheel_hid_hori_protocol::{HoriInputState, is_hori_wheel};

const RULE_WIDTH: usize = 80;

/// Value lists longer than this are summarised by count only.
const MAX_LISTED_VALUES: usize = 20;

pub fn rule() -> String {
    "=".repeat(RULE_WIDTH)
}

pub fn print_banner(title: &str) {
    println!();
    println!("{}", rule().cyan().bold());
    println!("  {}", title.cyan().bold());
    println!("{}", rule().cyan().bold());
    println!();
}

// ── Device list ──────────────────────────────────────────────────────────────

pub fn device_table_header() -> String {
    format!(
        "{:<8} {:<8} {:<12} {:<20} Product",
        "VID", "PID", "Usage Page", "Manufacturer"
    )
}

pub fn format_device_row(info: &HidDeviceInfo) -> String {
    format!(
        "{:<8} {:<8} {:<12} {:<20} {}",
        format!("0x{:04X}", info.vendor_id),
        format!("0x{:04X}", info.product_id),
        info.usage_page
            .map_or_else(|| "-".to_string(), |page| format!("0x{page:04X}")),
        info.manufacturer.as_deref().unwrap_or("(unknown)"),
        info.product_name.as_deref().unwrap_or("(unknown)"),
    )
}

pub fn print_device_list(devices: &[HidDeviceInfo]) {
    if devices.is_empty() {
        println!("{}", "No HID devices found.".yellow());
        return;
    }
    println!("{}", device_table_header().bold());
    println!("{}", "-".repeat(RULE_WIDTH));
    for info in devices {
        let row = format_device_row(info);
        if is_hori_wheel(info.vendor_id, info.product_id) {
            println!("{}  {}", row.green().bold(), "<- racing wheel".green());
        } else {
            println!("{row}");
        }
    }
}

// ── Control mapping ──────────────────────────────────────────────────────────

fn class_color(class: Classification) -> Color {
    match class {
        Classification::Button => Color::Magenta,
        Classification::MultiBit => Color::Cyan,
        Classification::Analog => Color::Green,
    }
}

/// Detail lines for one changed byte, without the header line.
pub fn change_details(change: &ChangeRecord) -> Vec<String> {
    let mut lines = vec![
        format!(
            "Range: 0x{:02X} - 0x{:02X} ({:3} - {:3})",
            change.min_observed, change.max_observed, change.min_observed, change.max_observed
        ),
        format!("Unique values: {}", change.observed_values.len()),
    ];
    if change.observed_values.len() <= MAX_LISTED_VALUES {
        let values: Vec<String> = change
            .observed_values
            .iter()
            .map(|v| format!("0x{v:02X}"))
            .collect();
        lines.push(format!("Values seen: {}", values.join(", ")));
    }
    if let Some(bits) = change.active_bits {
        lines.push("Bit analysis:".to_string());
        for bit in bits.bits() {
            lines.push(format!("  Bit {bit}: ACTIVE"));
        }
    }
    lines
}

pub fn print_mapping(mapping: &ControlMapping) {
    println!(
        "{}",
        format!("Captured {} samples", mapping.samples).green()
    );
    println!();
    if mapping.changes.is_empty() {
        print_no_changes();
        return;
    }
    println!("{}", "Changes Detected:".bold());
    println!();
    for change in &mapping.changes {
        println!(
            "  {}: {}",
            format!("Byte {:2}", change.byte_index).color(class_color(change.classification)),
            change.classification
        );
        for line in change_details(change) {
            println!("    {line}");
        }
        println!();
    }
}

pub fn print_no_changes() {
    println!("{}", "No changes detected!".yellow());
    println!("  Make sure you moved the control during monitoring.");
}

// ── Live comparison ──────────────────────────────────────────────────────────

pub fn compare_header() -> &'static str {
    "Byte | Baseline | Current | Diff | Binary (Current) | Binary (Baseline)"
}

pub fn format_compare_row(row: &ByteDiff) -> String {
    format!(
        "{:4} | 0x{:02X} {:3} | 0x{:02X} {:3} | {:+4} | {:08b}         | {:08b}",
        row.index,
        row.baseline,
        row.baseline,
        row.current,
        row.current,
        row.delta(),
        row.current,
        row.baseline
    )
}

pub fn print_compare_table(rows: &[ByteDiff]) {
    // Clear screen and home the cursor.
    print!("\x1B[2J\x1B[1;1H");
    println!("{}", "LIVE REPORT COMPARISON".bold());
    println!("{}", rule().cyan());
    println!();
    println!("{}", compare_header());
    println!("{}", "-".repeat(RULE_WIDTH));
    for row in rows {
        let line = format_compare_row(row);
        if !row.changed() {
            println!("{line}");
        } else if row.is_large() {
            println!("{}", line.green());
        } else {
            println!("{}", line.yellow());
        }
    }
    println!();
    println!(
        "{}",
        "Move controls to see changes. Press Ctrl+C to exit.".yellow()
    );
}

// ── Live decode ──────────────────────────────────────────────────────────────

pub fn print_state(state: &HoriInputState, report: &RawReport) {
    println!("{state}");
    if !state.pressed_buttons().is_empty() {
        let names: Vec<&str> = state.pressed_buttons().iter().map(|b| b.name()).collect();
        println!("  {} {}", "pressed:".dimmed(), names.join(", "));
    }
    println!("  {} {}", "raw:".dimmed(), report.hex_prefix(16).dimmed());
}

#[cfg(test)]
mod tests {
    use super::*;
    use openracing_control_mapper::ClassifierThresholds;
    use std::collections::BTreeSet;

    #[test]
    fn test_compare_row_format() {
        let row = ByteDiff {
            index: 5,
            baseline: 0x00,
            current: 0xFF,
        };
        insta::assert_snapshot!(
            format_compare_row(&row),
            @"   5 | 0x00   0 | 0xFF 255 | +255 | 11111111         | 00000000"
        );

        let row = ByteDiff {
            index: 12,
            baseline: 0x80,
            current: 0x7C,
        };
        insta::assert_snapshot!(
            format_compare_row(&row),
            @"  12 | 0x80 128 | 0x7C 124 |   -4 | 01111100         | 10000000"
        );
    }

    #[test]
    fn test_device_row_format() {
        let info = HidDeviceInfo::new(0x0F0D, 0x013E, "/dev/hidraw3")
            .with_manufacturer("HORI CO.,LTD.")
            .with_product_name("HORI Racing Wheel Switch")
            .with_usage(0x0001, 0x0005);
        insta::assert_snapshot!(
            format_device_row(&info),
            @"0x0F0D   0x013E   0x0001       HORI CO.,LTD.        HORI Racing Wheel Switch"
        );

        let bare = HidDeviceInfo::new(0x1234, 0x0001, "/dev/hidraw0");
        assert!(format_device_row(&bare).ends_with("(unknown)"));
    }

    #[test]
    fn test_change_details_for_hat_switch() {
        let values: BTreeSet<u8> = [0x02, 0x04, 0x06].into_iter().collect();
        let change = ChangeRecord::new(2, values, 0x00, 0x06, &ClassifierThresholds::default());
        let details = change_details(&change);
        assert_eq!(
            details,
            vec![
                "Range: 0x00 - 0x06 (  0 -   6)".to_string(),
                "Unique values: 3".to_string(),
                "Values seen: 0x02, 0x04, 0x06".to_string(),
                "Bit analysis:".to_string(),
                "  Bit 1: ACTIVE".to_string(),
                "  Bit 2: ACTIVE".to_string(),
            ]
        );
    }

    #[test]
    fn test_change_details_for_wide_axis() {
        let values: BTreeSet<u8> = (0..=200).collect();
        let change = ChangeRecord::new(6, values, 0, 200, &ClassifierThresholds::default());
        let details = change_details(&change);
        assert_eq!(details.len(), 2);
        assert_eq!(details[1], "Unique values: 201");
    }
}
