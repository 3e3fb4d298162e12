//! Mapping session state machine
//!
//! ```text
//! Uninitialized ──capture──▶ BaselineCaptured ──monitor──▶ Analyzed
//!                                  ▲    │                     │
//!                                  │    └──── Monitoring ◀────┘ monitor
//!                                  └──────── recapture ───────┘
//! ```
//!
//! The session owns its input source and releases it when dropped, so every
//! exit path (including an interrupted monitor) gives the device back.

use crate::baseline::{Baseline, select_mode};
use crate::config::MapperConfig;
use crate::diff::{ByteDiff, LIVE_COMPARE_BYTES, diff_reports};
use crate::mapping_log::ControlMapping;
use crate::monitor::{ChangeTracker, MonitorBudget, MonitorOutcome};
use crate::{MapperError, MapperResult};
use openracing_hid_common::{
    DeviceInputSource, EndpointDescriptor, HidCommonError, HidDeviceInfo, RawReport,
    ReadOutcome, find_interrupt_in,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Uninitialized,
    BaselineCaptured,
    Monitoring,
    Analyzed,
}

pub struct MappingSession<S: DeviceInputSource> {
    source: S,
    config: MapperConfig,
    endpoint: EndpointDescriptor,
    baseline: Option<Baseline>,
    state: SessionState,
    stop: Arc<AtomicBool>,
    released: bool,
}

impl<S: DeviceInputSource> MappingSession<S> {
    /// Take ownership of `source` and check it has an interrupt-IN endpoint.
    ///
    /// On failure the source is released before the error is returned.
    pub fn open(mut source: S, config: MapperConfig) -> MapperResult<Self> {
        if let Err(e) = config.validate() {
            source.release();
            return Err(e);
        }

        let endpoints = match source.list_endpoints() {
            Ok(endpoints) => endpoints,
            Err(e) => {
                source.release();
                return Err(MapperError::DeviceUnavailable(e.to_string()));
            }
        };

        let Some(endpoint) = find_interrupt_in(&endpoints) else {
            let interface = source
                .device_info()
                .interface_number
                .and_then(|n| u8::try_from(n).ok())
                .unwrap_or(0);
            warn!(path = %source.device_info().path, interface, "No interrupt IN endpoint");
            source.release();
            return Err(MapperError::from_device(HidCommonError::EndpointNotFound {
                interface,
            }));
        };

        info!(
            device = %source.device_info().display_name(),
            endpoint = format_args!("0x{:02X}", endpoint.address),
            max_packet = endpoint.max_packet_size,
            "Mapping session opened"
        );

        Ok(Self {
            source,
            config,
            endpoint,
            baseline: None,
            state: SessionState::Uninitialized,
            stop: Arc::new(AtomicBool::new(false)),
            released: false,
        })
    }

    /// Share an externally owned stop flag (e.g. set by a Ctrl-C handler).
    pub fn with_stop_flag(mut self, stop: Arc<AtomicBool>) -> Self {
        self.stop = stop;
        self
    }

    pub fn stop_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop)
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn baseline(&self) -> Option<&Baseline> {
        self.baseline.as_ref()
    }

    pub fn endpoint(&self) -> EndpointDescriptor {
        self.endpoint
    }

    pub fn config(&self) -> &MapperConfig {
        &self.config
    }

    pub fn device_info(&self) -> &HidDeviceInfo {
        self.source.device_info()
    }

    /// Capture a baseline with the configured sample count and interval.
    pub fn capture_baseline(&mut self) -> MapperResult<&Baseline> {
        let (count, interval) = (self.config.baseline_samples, self.config.sample_interval());
        self.capture_baseline_with(count, interval)
    }

    /// Read `sample_count` times and keep the most common report.
    ///
    /// Timeouts are skipped, not retried. If no read produced a report the
    /// previous baseline (if any) is kept and `InsufficientSamples` returned.
    /// The stop flag is checked before every read.
    pub fn capture_baseline_with(
        &mut self,
        sample_count: usize,
        sample_interval: Duration,
    ) -> MapperResult<&Baseline> {
        let mut reports = Vec::with_capacity(sample_count);
        for attempt in 0..sample_count {
            self.check_stop()?;
            if let Some(report) = self.read_one()? {
                reports.push(report);
            }
            if attempt + 1 < sample_count && !sample_interval.is_zero() {
                std::thread::sleep(sample_interval);
            }
        }

        let Some(baseline) = select_mode(&reports) else {
            warn!(attempts = sample_count, "Baseline capture got no reports");
            return Err(MapperError::InsufficientSamples {
                attempts: sample_count,
            });
        };

        info!(
            bytes = baseline.len(),
            samples = baseline.samples(),
            occurrences = baseline.occurrences(),
            prefix = %baseline.report().hex_prefix(20),
            "Baseline captured"
        );
        self.state = SessionState::BaselineCaptured;
        Ok(self.baseline.insert(baseline))
    }

    /// Capture a fresh baseline. The current one is replaced only if the
    /// new capture succeeds.
    pub fn recapture(&mut self) -> MapperResult<&Baseline> {
        self.capture_baseline()
    }

    /// Use a known report as the baseline without reading.
    pub fn set_baseline(&mut self, baseline: Baseline) {
        self.baseline = Some(baseline);
        self.state = SessionState::BaselineCaptured;
    }

    /// Watch for divergence from the baseline until `budget` runs out.
    pub fn monitor(&mut self, budget: MonitorBudget) -> MapperResult<MonitorOutcome> {
        let baseline = self.baseline.as_ref().ok_or(MapperError::NoBaseline)?;
        let mut tracker = ChangeTracker::new(baseline.as_bytes());

        let previous = self.state;
        self.state = SessionState::Monitoring;
        let result = self.run_monitor(budget, &mut tracker);
        let read_attempts = match result {
            Ok(attempts) => attempts,
            Err(e) => {
                self.state = previous;
                return Err(e);
            }
        };

        let samples = tracker.samples();
        let changes = tracker.finish(&self.config.classifier);
        info!(
            samples,
            read_attempts,
            changed_bytes = changes.len(),
            "Monitoring window complete"
        );

        self.state = SessionState::Analyzed;
        Ok(MonitorOutcome {
            samples,
            read_attempts,
            changes,
        })
    }

    /// Monitor for the configured duration and name the result.
    ///
    /// `Ok(None)` means nothing moved: no control was detected.
    pub fn map_control(&mut self, control: &str) -> MapperResult<Option<ControlMapping>> {
        let budget = MonitorBudget::Duration(self.config.monitor_duration());
        self.map_control_with(control, budget)
    }

    pub fn map_control_with(
        &mut self,
        control: &str,
        budget: MonitorBudget,
    ) -> MapperResult<Option<ControlMapping>> {
        let outcome = self.monitor(budget)?;
        if outcome.is_empty() {
            info!(control, samples = outcome.samples, "No control detected");
            return Ok(None);
        }
        Ok(Some(ControlMapping {
            control: control.to_string(),
            samples: outcome.samples,
            changes: outcome.changes,
        }))
    }

    /// Stream per-byte comparisons of live reports against the baseline.
    ///
    /// Returns the number of reports shown. Only the stop flag or a device
    /// error ends an unbounded run.
    pub fn live_compare<F>(
        &mut self,
        budget: Option<MonitorBudget>,
        mut on_report: F,
    ) -> MapperResult<usize>
    where
        F: FnMut(&RawReport, &[ByteDiff]),
    {
        let baseline = self
            .baseline
            .as_ref()
            .ok_or(MapperError::NoBaseline)?
            .report()
            .clone();

        let started = Instant::now();
        let mut attempts = 0usize;
        let mut shown = 0usize;
        while !budget_spent(budget, started, attempts) {
            self.check_stop()?;
            attempts += 1;
            if let Some(report) = self.read_one()? {
                let rows = diff_reports(baseline.as_bytes(), report.as_bytes(), LIVE_COMPARE_BYTES);
                on_report(&report, &rows);
                shown += 1;
            }
        }
        Ok(shown)
    }

    /// Fetch the HID report descriptor. Unavailability is logged, not fatal.
    pub fn fetch_descriptor(&mut self) -> Option<Vec<u8>> {
        match self.source.report_descriptor() {
            Ok(descriptor) => {
                debug!(len = descriptor.len(), "Fetched report descriptor");
                Some(descriptor)
            }
            Err(e) => {
                warn!(error = %e, "Report descriptor unavailable");
                None
            }
        }
    }

    /// Give the device back. Idempotent; also runs on drop.
    pub fn release(&mut self) {
        if !self.released {
            self.source.release();
            self.released = true;
            debug!("Input source released");
        }
    }

    fn run_monitor(
        &mut self,
        budget: MonitorBudget,
        tracker: &mut ChangeTracker,
    ) -> MapperResult<usize> {
        let started = Instant::now();
        let mut attempts = 0usize;
        while !budget_spent(Some(budget), started, attempts) {
            self.check_stop()?;
            attempts += 1;
            if let Some(report) = self.read_one()? {
                tracker.observe(report.as_bytes());
                if tracker.samples() % 100 == 0 {
                    debug!(samples = tracker.samples(), "Monitoring");
                }
            }
        }
        Ok(attempts)
    }

    fn read_one(&mut self) -> MapperResult<Option<RawReport>> {
        if self.released {
            return Err(MapperError::DeviceUnavailable(
                "input source already released".to_string(),
            ));
        }
        match self.source.read_report(self.config.read_timeout()) {
            Ok(ReadOutcome::Report(report)) => Ok(Some(report)),
            Ok(ReadOutcome::Timeout) => Ok(None),
            Err(e) => Err(MapperError::from_device(e)),
        }
    }

    fn check_stop(&self) -> MapperResult<()> {
        if self.stop.load(Ordering::SeqCst) {
            return Err(MapperError::Interrupted);
        }
        Ok(())
    }
}

impl<S: DeviceInputSource> Drop for MappingSession<S> {
    fn drop(&mut self) {
        self.release();
    }
}

fn budget_spent(budget: Option<MonitorBudget>, started: Instant, attempts: usize) -> bool {
    match budget {
        None => false,
        Some(MonitorBudget::Duration(limit)) => started.elapsed() >= limit,
        Some(MonitorBudget::Reads(limit)) => attempts >= limit,
    }
}
