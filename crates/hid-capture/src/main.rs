#![deny(static_mut_refs)]

mod commands;
mod hid_source;
mod output;
mod replay;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use commands::{DeviceSelector, MapOptions};
use racing_wheel_hid_hori_protocol::{PRODUCT_RACING_WHEEL_SWITCH, VENDOR_ID};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Capture, decode and map HID reports from a HORI racing wheel.
#[derive(Parser)]
#[command(
    name = "hid-capture",
    about = "HID report capture, live decode and control mapping for the HORI Racing Wheel"
)]
struct Cli {
    /// Verbose output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// YAML mapper configuration
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug, Clone)]
struct DeviceArgs {
    /// Vendor ID (hex, e.g. 0x0F0D)
    #[arg(long, value_parser = parse_hex_u16, default_value = "0x0F0D")]
    vid: u16,
    /// Product ID (hex, e.g. 0x013E)
    #[arg(long, value_parser = parse_hex_u16, default_value = "0x013E")]
    pid: u16,
}

#[derive(Subcommand)]
enum Commands {
    /// List all connected HID devices
    List,
    /// Record raw reports to JSON Lines
    Capture {
        #[command(flatten)]
        device: DeviceArgs,
        /// Capture duration in seconds
        #[arg(long, default_value = "5")]
        duration: u64,
        /// Write captures to this file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Decode reports live, printing each new input state
    Test {
        #[command(flatten)]
        device: DeviceArgs,
        /// Print states as JSON
        #[arg(long)]
        json: bool,
        /// Decode a capture file instead of the device
        #[arg(long)]
        replay: Option<PathBuf>,
    },
    /// Find the report bytes each control moves
    Map {
        #[command(flatten)]
        device: DeviceArgs,
        /// Control to map (repeatable; defaults to the configured list)
        #[arg(long = "control")]
        controls: Vec<String>,
        /// Map from a capture file instead of the device
        #[arg(long)]
        replay: Option<PathBuf>,
        /// Read attempts per control when replaying
        #[arg(long, requires = "replay")]
        reads: Option<usize>,
        /// Do not wait for ENTER between steps
        #[arg(long, short = 'y')]
        yes: bool,
        /// Mapping log to append to
        #[arg(long)]
        log: Option<PathBuf>,
    },
    /// Show live reports byte-by-byte against a neutral baseline
    Compare {
        #[command(flatten)]
        device: DeviceArgs,
        /// Compare a capture file instead of the device
        #[arg(long)]
        replay: Option<PathBuf>,
    },
    /// Dump the HID report descriptor
    Descriptor {
        #[command(flatten)]
        device: DeviceArgs,
        /// Use the captured descriptor without opening the device
        #[arg(long)]
        known: bool,
        /// Save <PREFIX>.bin and <PREFIX>.c
        #[arg(long, value_name = "PREFIX")]
        save: Option<PathBuf>,
    },
}

fn parse_hex_u16(s: &str) -> Result<u16, String> {
    let s = s.trim_start_matches("0x").trim_start_matches("0X");
    u16::from_str_radix(s, 16).map_err(|e| format!("invalid hex value '{s}': {e}"))
}

impl DeviceArgs {
    fn selector<'a>(&self, replay: Option<&'a PathBuf>) -> DeviceSelector<'a> {
        DeviceSelector {
            vendor_id: self.vid,
            product_id: self.pid,
            replay: replay.map(PathBuf::as_path),
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            format!(
                "hid_capture={log_level},openracing_control_mapper={log_level},\
                 openracing_hid_common={log_level}"
            )
            .into()
        }))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let config = commands::load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::List => commands::list(),
        Commands::Capture {
            device,
            duration,
            output,
        } => {
            let stop = commands::install_stop_handler()?;
            commands::capture(
                device.selector(None),
                &config,
                Duration::from_secs(duration),
                output.as_deref(),
                &stop,
            )
            .map(drop)
        }
        Commands::Test {
            device,
            json,
            replay,
        } => {
            let stop = commands::install_stop_handler()?;
            commands::test(device.selector(replay.as_ref()), &config, json, &stop).map(drop)
        }
        Commands::Map {
            device,
            controls,
            replay,
            reads,
            yes,
            log,
        } => {
            let options = MapOptions {
                controls: commands::ensure_controls(controls, &config)?,
                interactive: !yes && replay.is_none(),
                log_path: log.unwrap_or_else(|| config.log_path.clone()),
                reads_per_control: reads,
            };
            let stop = commands::install_stop_handler()?;
            commands::map(device.selector(replay.as_ref()), &config, &options, stop).map(drop)
        }
        Commands::Compare { device, replay } => {
            let stop = commands::install_stop_handler()?;
            commands::compare(device.selector(replay.as_ref()), &config, stop).map(drop)
        }
        Commands::Descriptor {
            device,
            known,
            save,
        } => commands::descriptor(device.selector(None), &config, known, save.as_deref())
            .map(drop),
    }
}

// ── BDD-style scenario tests ────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    type TestResult = Result<(), Box<dyn std::error::Error>>;

    // ═══ Scenario: VID/PID Hex Parsing ══════════════════════════════════════

    /// GIVEN a valid hex string with or without the 0x prefix
    /// WHEN parse_hex_u16 is called
    /// THEN it returns the correct u16 value
    #[test]
    fn given_hex_string_when_parsed_then_correct_u16_returned() {
        assert_eq!(parse_hex_u16("0x0F0D"), Ok(0x0F0D));
        assert_eq!(parse_hex_u16("0X013E"), Ok(0x013E));
        assert_eq!(parse_hex_u16("013e"), Ok(0x013E));
        assert_eq!(parse_hex_u16("F"), Ok(15));
    }

    /// GIVEN malformed, empty or overflowing hex strings
    /// WHEN parse_hex_u16 is called
    /// THEN each returns an error
    #[test]
    fn given_invalid_hex_when_parsed_then_error_returned() {
        assert!(parse_hex_u16("ZZZZ").is_err());
        assert!(parse_hex_u16("").is_err());
        assert!(parse_hex_u16("0x").is_err());
        assert!(parse_hex_u16("0x10000").is_err());
    }

    // ═══ Scenario: Command line parsing ═════════════════════════════════════

    /// GIVEN a bare map command
    /// WHEN the command line is parsed
    /// THEN the device defaults to the HORI wheel
    #[test]
    fn given_map_without_ids_when_parsed_then_hori_wheel_selected() -> TestResult {
        let cli = Cli::try_parse_from(["hid-capture", "map"])?;
        let Commands::Map {
            device,
            controls,
            yes,
            ..
        } = cli.command
        else {
            return Err("expected map command".into());
        };
        assert_eq!(device.vid, VENDOR_ID);
        assert_eq!(device.pid, PRODUCT_RACING_WHEEL_SWITCH);
        assert!(controls.is_empty());
        assert!(!yes);
        Ok(())
    }

    /// GIVEN repeated --control flags and a replay file
    /// WHEN the command line is parsed
    /// THEN the controls keep their order
    #[test]
    fn given_repeated_controls_when_parsed_then_order_kept() -> TestResult {
        let cli = Cli::try_parse_from([
            "hid-capture",
            "-vv",
            "map",
            "--control",
            "Brake Pedal",
            "--control",
            "D-Pad Up",
            "--replay",
            "wheel.jsonl",
            "--reads",
            "40",
        ])?;
        assert_eq!(cli.verbose, 2);
        let Commands::Map {
            controls,
            replay,
            reads,
            ..
        } = cli.command
        else {
            return Err("expected map command".into());
        };
        assert_eq!(controls, vec!["Brake Pedal", "D-Pad Up"]);
        assert_eq!(replay, Some(PathBuf::from("wheel.jsonl")));
        assert_eq!(reads, Some(40));
        Ok(())
    }

    /// GIVEN --reads without --replay
    /// WHEN the command line is parsed
    /// THEN parsing fails
    #[test]
    fn given_reads_without_replay_when_parsed_then_rejected() {
        assert!(Cli::try_parse_from(["hid-capture", "map", "--reads", "10"]).is_err());
    }

    /// GIVEN explicit IDs and a global config after the subcommand
    /// WHEN the command line is parsed
    /// THEN both are picked up
    #[test]
    fn given_explicit_ids_when_parsed_then_overrides_defaults() -> TestResult {
        let cli = Cli::try_parse_from([
            "hid-capture",
            "capture",
            "--vid",
            "0x046D",
            "--pid",
            "c24f",
            "--config",
            "mapper.yaml",
        ])?;
        assert_eq!(cli.config, Some(PathBuf::from("mapper.yaml")));
        let Commands::Capture {
            device, duration, ..
        } = cli.command
        else {
            return Err("expected capture command".into());
        };
        assert_eq!(device.vid, 0x046D);
        assert_eq!(device.pid, 0xC24F);
        assert_eq!(duration, 5);
        Ok(())
    }

    /// GIVEN the descriptor command with --known and --save
    /// WHEN the command line is parsed
    /// THEN the flags map onto the descriptor options
    #[test]
    fn given_descriptor_flags_when_parsed_then_options_set() -> TestResult {
        let cli = Cli::try_parse_from(["hid-capture", "descriptor", "--known", "--save", "hori"])?;
        let Commands::Descriptor { known, save, .. } = cli.command else {
            return Err("expected descriptor command".into());
        };
        assert!(known);
        assert_eq!(save, Some(PathBuf::from("hori")));
        Ok(())
    }
}
