//! Subcommand implementations

use crate::hid_source::{HidApiSource, enumerate};
use crate::output;
use crate::replay::{CapturedReport, ReplaySource};
use anyhow::{Context, Result, bail};
use colored::*;
use hidapi::HidApi;
use openracing_control_mapper::{
    MapperConfig, MapperError, MappingLog, MappingSession, MonitorBudget,
};
use openracing_hid_common::report_descriptor::{descriptor_crc32, dump, format_c_array};
use openracing_hid_common::{DeviceInputSource, RawReport, ReadOutcome};
use racing_wheel_hid_hori_protocol::{HoriInputState, REPORT_DESCRIPTOR, decode};
use std::fs::File;
use std::io::{BufRead, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};
use tracing::{debug, info, warn};

/// Live decode logs a summary every this many reports.
const SUMMARY_EVERY: usize = 100;

/// How often a pending prompt looks at the stop flag.
const PROMPT_POLL: Duration = Duration::from_millis(100);

pub type InputSource = Box<dyn DeviceInputSource>;

/// Where reports come from: the live device or a capture file.
#[derive(Debug, Clone, Copy)]
pub struct DeviceSelector<'a> {
    pub vendor_id: u16,
    pub product_id: u16,
    pub replay: Option<&'a Path>,
}

/// Open the selected source. For replays the number of stored reports is
/// returned alongside, since replay reads never block.
pub fn open_source(
    selector: DeviceSelector<'_>,
    config: &MapperConfig,
) -> Result<(InputSource, Option<usize>)> {
    if let Some(path) = selector.replay {
        let source = ReplaySource::open(path)?;
        let count = source.remaining();
        info!(path = %path.display(), reports = count, "Replaying capture");
        return Ok((Box::new(source), Some(count)));
    }

    let api = HidApi::new().context("Failed to initialize HidApi")?;
    let source = HidApiSource::open(
        &api,
        selector.vendor_id,
        selector.product_id,
        config.report_size,
    )
    .with_context(|| {
        format!(
            "Failed to open device VID=0x{:04X} PID=0x{:04X}",
            selector.vendor_id, selector.product_id
        )
    })?;
    Ok((Box::new(source), None))
}

pub fn install_stop_handler() -> Result<Arc<AtomicBool>> {
    let stop = Arc::new(AtomicBool::new(false));
    let stop_clone = Arc::clone(&stop);
    ctrlc::set_handler(move || stop_clone.store(true, Ordering::SeqCst))
        .context("failed to install Ctrl-C handler")?;
    Ok(stop)
}

/// Lines typed on stdin, read on a helper thread so a prompt can give way
/// to Ctrl-C instead of blocking until ENTER.
pub fn spawn_stdin_reader() -> Receiver<()> {
    let (tx, rx) = mpsc::channel();
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            if line.is_err() || tx.send(()).is_err() {
                break;
            }
        }
    });
    rx
}

/// Wait for ENTER. A raised stop flag ends the wait with `Interrupted`;
/// a closed stdin is treated as ENTER.
fn wait_for_enter(
    prompt: &str,
    lines: &Receiver<()>,
    stop: &AtomicBool,
) -> Result<(), MapperError> {
    print!("{prompt}");
    std::io::stdout().flush()?;
    loop {
        if stop.load(Ordering::SeqCst) {
            return Err(MapperError::Interrupted);
        }
        match lines.recv_timeout(PROMPT_POLL) {
            Ok(()) | Err(RecvTimeoutError::Disconnected) => return Ok(()),
            Err(RecvTimeoutError::Timeout) => {}
        }
    }
}

// ── list ─────────────────────────────────────────────────────────────────────

pub fn list() -> Result<()> {
    let api = HidApi::new().context("Failed to initialize HidApi")?;
    output::print_device_list(&enumerate(&api));
    Ok(())
}

// ── capture ──────────────────────────────────────────────────────────────────

pub fn capture(
    selector: DeviceSelector<'_>,
    config: &MapperConfig,
    duration: Duration,
    out_path: Option<&Path>,
    stop: &AtomicBool,
) -> Result<usize> {
    let (mut source, _) = open_source(selector, config)?;
    let info = source.device_info().clone();

    let mut sink: Box<dyn Write> = match out_path {
        Some(path) => Box::new(BufWriter::new(
            File::create(path)
                .with_context(|| format!("failed to create '{}'", path.display()))?,
        )),
        None => Box::new(BufWriter::new(std::io::stdout())),
    };

    eprintln!(
        "Capturing from VID=0x{:04X} PID=0x{:04X} for {}s (Ctrl-C to stop early)...",
        info.vendor_id,
        info.product_id,
        duration.as_secs()
    );

    let start = Instant::now();
    let mut count = 0usize;
    while start.elapsed() < duration && !stop.load(Ordering::SeqCst) {
        let report = match source
            .read_report(config.read_timeout())
            .context("HID read error")?
        {
            ReadOutcome::Report(report) => report,
            ReadOutcome::Timeout => continue,
        };
        let ts_ns = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| u64::try_from(d.as_nanos()).unwrap_or(u64::MAX))
            .unwrap_or(0);
        let entry = CapturedReport::new(ts_ns, info.vendor_id, info.product_id, report.as_bytes());
        writeln!(sink, "{}", serde_json::to_string(&entry)?).context("write failed")?;
        count += 1;
    }
    sink.flush().context("flush failed")?;
    source.release();

    eprintln!("Captured {count} report(s).");
    if let Some(path) = out_path {
        eprintln!("Captures saved to '{}'.", path.display());
    }
    Ok(count)
}

// ── test ─────────────────────────────────────────────────────────────────────

/// Decodes a report stream and surfaces only state changes.
#[derive(Debug, Default)]
pub struct LiveDecoder {
    last: Option<HoriInputState>,
    decoded: usize,
    malformed: usize,
}

impl LiveDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// The new state if it differs from the previous one.
    pub fn push(&mut self, report: &RawReport) -> Option<HoriInputState> {
        let state = match decode(report.as_bytes()) {
            Ok(state) => state,
            Err(e) => {
                self.malformed += 1;
                debug!(error = %e, len = report.len(), "Skipping undecodable report");
                return None;
            }
        };
        self.decoded += 1;
        if self.decoded.is_multiple_of(SUMMARY_EVERY) {
            debug!(
                reports = self.decoded,
                steering = state.steering.signed(),
                accel = state.accel,
                brake = state.brake,
                dpad = %state.dpad,
                "Live decode summary"
            );
        }
        if self.last == Some(state) {
            return None;
        }
        self.last = Some(state);
        Some(state)
    }

    pub fn decoded(&self) -> usize {
        self.decoded
    }

    pub fn malformed(&self) -> usize {
        self.malformed
    }
}

pub fn test(
    selector: DeviceSelector<'_>,
    config: &MapperConfig,
    json: bool,
    stop: &AtomicBool,
) -> Result<usize> {
    let (mut source, replay_count) = open_source(selector, config)?;
    let mut decoder = LiveDecoder::new();

    if !json {
        output::print_banner("HORI Racing Wheel - Real-time Input Tester");
        println!("{}", "Waiting for input data... (Ctrl-C to stop)".yellow());
    }

    let mut attempts = 0usize;
    while !stop.load(Ordering::SeqCst) && replay_count.is_none_or(|n| attempts < n) {
        attempts += 1;
        let report = match source
            .read_report(config.read_timeout())
            .context("HID read error")?
        {
            ReadOutcome::Report(report) => report,
            ReadOutcome::Timeout => continue,
        };
        if let Some(state) = decoder.push(&report) {
            if json {
                println!("{}", serde_json::to_string(&state)?);
            } else {
                output::print_state(&state, &report);
            }
        }
    }
    source.release();

    info!(
        decoded = decoder.decoded(),
        malformed = decoder.malformed(),
        "Live decode stopped"
    );
    Ok(decoder.decoded())
}

// ── map ──────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct MapOptions {
    pub controls: Vec<String>,
    pub interactive: bool,
    pub log_path: PathBuf,
    /// Read attempts per control; replays only.
    pub reads_per_control: Option<usize>,
}

/// Per-control window: wall-clock for a live device, read count for a
/// replay (split evenly across the controls unless given).
pub fn control_budget(
    config: &MapperConfig,
    replay_count: Option<usize>,
    controls: usize,
    reads_per_control: Option<usize>,
) -> MonitorBudget {
    match (replay_count, reads_per_control) {
        (Some(_), Some(reads)) => MonitorBudget::Reads(reads),
        (Some(total), None) => {
            let remaining = total.saturating_sub(config.baseline_samples);
            MonitorBudget::Reads((remaining / controls.max(1)).max(1))
        }
        (None, _) => MonitorBudget::Duration(config.monitor_duration()),
    }
}

pub fn map(
    selector: DeviceSelector<'_>,
    config: &MapperConfig,
    options: &MapOptions,
    stop: Arc<AtomicBool>,
) -> Result<usize> {
    let (source, replay_count) = open_source(selector, config)?;
    let budget = control_budget(
        config,
        replay_count,
        options.controls.len(),
        options.reads_per_control,
    );
    let session = MappingSession::open(source, config.clone())
        .context("Could not start a mapping session")?
        .with_stop_flag(stop);
    let log = MappingLog::new(&options.log_path);
    let lines = spawn_stdin_reader();
    run_mapping(session, &log, options, budget, &lines)
}

/// Drive a session through baseline capture and one window per control.
///
/// Ctrl-C ends the run early at any prompt or read; controls mapped so far
/// stay in the log and the device is released before returning.
pub fn run_mapping<S: DeviceInputSource>(
    mut session: MappingSession<S>,
    log: &MappingLog,
    options: &MapOptions,
    budget: MonitorBudget,
    lines: &Receiver<()>,
) -> Result<usize> {
    output::print_banner("HORI Racing Wheel - Interactive Control Mapper");
    println!(
        "{} {}",
        "Device:".green(),
        session.device_info().display_name()
    );
    println!();

    let mut mapped = 0usize;
    let outcome = map_controls(&mut session, log, options, budget, lines, &mut mapped);
    session.release();

    match outcome {
        Ok(()) => {}
        Err(e) if matches!(e.downcast_ref::<MapperError>(), Some(MapperError::Interrupted)) => {
            println!();
            println!("{}", "Mapping interrupted".yellow());
        }
        Err(e) => return Err(e),
    }

    println!("{}", "Mapping Session Complete!".green().bold());
    println!(
        "Mapped {mapped} control(s). Results appended to {}",
        log.path().display()
    );
    Ok(mapped)
}

fn map_controls<S: DeviceInputSource>(
    session: &mut MappingSession<S>,
    log: &MappingLog,
    options: &MapOptions,
    budget: MonitorBudget,
    lines: &Receiver<()>,
    mapped: &mut usize,
) -> Result<()> {
    let stop = session.stop_flag();

    println!("{}", "Step 1: Capture Neutral Position".bold());
    println!("Place all controls in neutral position:");
    println!("  - Steering wheel centered");
    println!("  - All pedals released");
    println!("  - No buttons pressed");
    println!("  - D-pad centered");
    println!();
    if options.interactive {
        wait_for_enter("Press ENTER when ready...", lines, &stop)?;
    }

    println!(
        "{}",
        "Capturing baseline... Keep all controls in neutral position!".yellow()
    );
    let baseline = session
        .capture_baseline()
        .context("Failed to capture baseline")?;
    println!(
        "{}",
        format!("Baseline captured ({} bytes)", baseline.len()).green()
    );
    println!("  Baseline: {}...", baseline.report().hex_prefix(20));
    println!();

    for control in &options.controls {
        println!("{} {}", "Mapping:".bold(), control.bold());
        if options.interactive {
            println!("  1. Keep the control in neutral position");
            println!("  2. Press ENTER to start monitoring");
            println!("  3. Move ONLY this control while monitoring");
            println!("  4. Return to neutral before time runs out");
            wait_for_enter("", lines, &stop)?;
        }
        println!("{}", "MOVE THE CONTROL NOW!".yellow());

        let Some(mapping) = session
            .map_control_with(control, budget)
            .with_context(|| format!("Mapping '{control}' failed"))?
        else {
            output::print_no_changes();
            println!();
            continue;
        };
        output::print_mapping(&mapping);
        log.append(&mapping)
            .with_context(|| format!("failed to append to '{}'", log.path().display()))?;
        println!(
            "{}",
            format!("Results saved to {}", log.path().display()).green()
        );
        *mapped += 1;
        println!();
    }
    Ok(())
}

// ── compare ──────────────────────────────────────────────────────────────────

pub fn compare(
    selector: DeviceSelector<'_>,
    config: &MapperConfig,
    stop: Arc<AtomicBool>,
) -> Result<usize> {
    let (source, replay_count) = open_source(selector, config)?;
    let mut session = MappingSession::open(source, config.clone())
        .context("Could not start a comparison session")?
        .with_stop_flag(stop);

    println!(
        "{}",
        "Capturing baseline... Keep all controls in neutral position!".yellow()
    );
    session
        .capture_baseline()
        .context("Failed to capture baseline")?;

    let budget = replay_count.map(MonitorBudget::Reads);
    let shown = match session.live_compare(budget, |_, rows| output::print_compare_table(rows)) {
        Ok(shown) => shown,
        Err(MapperError::Interrupted) => 0,
        Err(e) => return Err(e).context("Live comparison failed"),
    };
    session.release();
    println!();
    println!("{}", "Live mode stopped".green());
    Ok(shown)
}

// ── descriptor ───────────────────────────────────────────────────────────────

pub fn descriptor(
    selector: DeviceSelector<'_>,
    config: &MapperConfig,
    known: bool,
    save: Option<&Path>,
) -> Result<Vec<u8>> {
    let bytes = if known {
        REPORT_DESCRIPTOR.to_vec()
    } else {
        let (source, _) = open_source(selector, config)?;
        let mut session = MappingSession::open(source, config.clone())
            .context("Could not open device for descriptor fetch")?;
        match session.fetch_descriptor() {
            Some(bytes) => bytes,
            None => {
                warn!("Device refused the descriptor request; using the captured copy");
                REPORT_DESCRIPTOR.to_vec()
            }
        }
    };

    print_descriptor(&bytes);
    if let Some(prefix) = save {
        save_descriptor(prefix, &bytes)?;
    }
    Ok(bytes)
}

fn print_descriptor(bytes: &[u8]) {
    println!("{}", format!("Report descriptor: {} bytes", bytes.len()).bold());
    println!("CRC32: 0x{:08X}", descriptor_crc32(bytes));
    println!();
    print!("{}", format_c_array("hori_report_descriptor", bytes));
    println!();
    print!("{}", dump(bytes));
}

/// Write `<prefix>.bin` (raw) and `<prefix>.c` (C array).
pub fn save_descriptor(prefix: &Path, bytes: &[u8]) -> Result<(PathBuf, PathBuf)> {
    let bin = prefix.with_extension("bin");
    let c_src = prefix.with_extension("c");
    std::fs::write(&bin, bytes).with_context(|| format!("failed to write '{}'", bin.display()))?;
    std::fs::write(&c_src, format_c_array("hori_report_descriptor", bytes))
        .with_context(|| format!("failed to write '{}'", c_src.display()))?;
    println!("Saved {} and {}", bin.display(), c_src.display());
    Ok((bin, c_src))
}

pub fn load_config(path: Option<&Path>) -> Result<MapperConfig> {
    match path {
        Some(path) => MapperConfig::load(path)
            .with_context(|| format!("failed to load config '{}'", path.display())),
        None => Ok(MapperConfig::default()),
    }
}

pub fn ensure_controls(controls: Vec<String>, config: &MapperConfig) -> Result<Vec<String>> {
    let controls = if controls.is_empty() {
        config.controls.clone()
    } else {
        controls
    };
    if controls.is_empty() {
        bail!("no controls to map: pass --control or list them in the config");
    }
    Ok(controls)
}
