//! JSON Lines capture files and offline replay.
//!
//! One report per line:
//!
//! ```text
//! {"ts_ns":1718000000000000000,"vid":"0x0F0D","pid":"0x013E","report":"000009140000ff00"}
//! ```

use anyhow::{Context, Result, anyhow};
use openracing_hid_common::{
    DeviceInputSource, EndpointDescriptor, HidCommonError, HidCommonResult, HidDeviceInfo,
    RawReport, ReadOutcome,
};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::time::Duration;

// ── Types ────────────────────────────────────────────────────────────────────

/// A single captured HID input report as stored in the JSON Lines capture file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapturedReport {
    /// Timestamp in nanoseconds (Unix epoch).
    pub ts_ns: u64,
    /// Vendor ID as hex string (e.g. `"0x0F0D"`).
    pub vid: String,
    /// Product ID as hex string (e.g. `"0x013E"`).
    pub pid: String,
    /// Report bytes as lowercase hex string.
    pub report: String,
}

impl CapturedReport {
    pub fn new(ts_ns: u64, vendor_id: u16, product_id: u16, report: &[u8]) -> Self {
        Self {
            ts_ns,
            vid: format!("0x{vendor_id:04X}"),
            pid: format!("0x{product_id:04X}"),
            report: encode_hex(report),
        }
    }

    pub fn bytes(&self) -> Result<Vec<u8>> {
        decode_hex(&self.report)
    }
}

// ── Parsing helpers ──────────────────────────────────────────────────────────

pub fn parse_capture_line(line: &str) -> Result<CapturedReport> {
    serde_json::from_str(line).with_context(|| format!("failed to parse capture line: {line}"))
}

pub fn encode_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

/// Decode a hex string (either case, no separators) into raw bytes.
pub fn decode_hex(s: &str) -> Result<Vec<u8>> {
    if !s.len().is_multiple_of(2) {
        return Err(anyhow!(
            "hex string has odd length ({} chars): '{s}'",
            s.len()
        ));
    }
    s.as_bytes()
        .chunks(2)
        .enumerate()
        .map(|(i, pair)| {
            std::str::from_utf8(pair)
                .ok()
                .and_then(|digits| u8::from_str_radix(digits, 16).ok())
                .ok_or_else(|| anyhow!("invalid hex byte at index {i} in '{s}'"))
        })
        .collect()
}

/// Parse a VID/PID hex string (e.g. `"0x0F0D"` or `"0F0D"`) to `u16`.
pub fn parse_vid_str(s: &str) -> Result<u16> {
    let s = s.trim();
    let digits = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s);
    u16::from_str_radix(digits, 16)
        .with_context(|| format!("invalid VID/PID value '{s}', expected hex like 0x0F0D"))
}

/// Read every report in a capture file. Blank lines are skipped.
pub fn read_capture_file(path: &Path) -> Result<Vec<CapturedReport>> {
    let file = File::open(path).with_context(|| format!("failed to open '{}'", path.display()))?;
    read_captures(BufReader::new(file))
}

pub fn read_captures(reader: impl BufRead) -> Result<Vec<CapturedReport>> {
    let mut entries = Vec::new();
    for (number, line) in reader.lines().enumerate() {
        let line = line.with_context(|| format!("failed to read line {}", number + 1))?;
        if line.trim().is_empty() {
            continue;
        }
        entries.push(parse_capture_line(line.trim())?);
    }
    Ok(entries)
}

// ── Replay source ────────────────────────────────────────────────────────────

/// Serves captured reports in file order, then times out forever.
///
/// Reads never sleep, so callers bound their loops by read count rather than
/// wall-clock time.
#[derive(Debug)]
pub struct ReplaySource {
    info: HidDeviceInfo,
    reports: VecDeque<RawReport>,
    released: bool,
}

impl ReplaySource {
    pub fn open(path: &Path) -> Result<Self> {
        let entries = read_capture_file(path)?;
        Self::from_captures(format!("replay://{}", path.display()), &entries)
    }

    /// Device identity comes from the first entry; an empty capture replays as
    /// an unidentified device that only times out.
    pub fn from_captures(path: impl Into<String>, entries: &[CapturedReport]) -> Result<Self> {
        let (vendor_id, product_id) = match entries.first() {
            Some(first) => (parse_vid_str(&first.vid)?, parse_vid_str(&first.pid)?),
            None => (0, 0),
        };
        let reports = entries
            .iter()
            .map(|entry| entry.bytes().map(RawReport::new))
            .collect::<Result<VecDeque<_>>>()?;
        Ok(Self {
            info: HidDeviceInfo::new(vendor_id, product_id, path),
            reports,
            released: false,
        })
    }

    pub fn remaining(&self) -> usize {
        self.reports.len()
    }
}

impl DeviceInputSource for ReplaySource {
    fn device_info(&self) -> &HidDeviceInfo {
        &self.info
    }

    fn list_endpoints(&self) -> HidCommonResult<Vec<EndpointDescriptor>> {
        let max_packet = self
            .reports
            .iter()
            .map(RawReport::len)
            .max()
            .and_then(|len| u16::try_from(len).ok())
            .unwrap_or(64);
        Ok(vec![EndpointDescriptor::interrupt_in(0, 0x81, max_packet)])
    }

    fn read_report(&mut self, _timeout: Duration) -> HidCommonResult<ReadOutcome> {
        if self.released {
            return Err(HidCommonError::DeviceUnavailable(
                "replay already released".into(),
            ));
        }
        Ok(self
            .reports
            .pop_front()
            .map_or(ReadOutcome::Timeout, ReadOutcome::Report))
    }

    fn report_descriptor(&mut self) -> HidCommonResult<Vec<u8>> {
        Err(HidCommonError::DescriptorUnavailable(
            "capture files carry no descriptor".into(),
        ))
    }

    fn release(&mut self) {
        self.released = true;
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn capture(reports: &[&[u8]]) -> Vec<CapturedReport> {
        reports
            .iter()
            .enumerate()
            .map(|(i, r)| CapturedReport::new(i as u64 * 1_000_000, 0x0F0D, 0x013E, r))
            .collect()
    }

    #[test]
    fn test_parse_capture_line_all_fields() -> Result<()> {
        let line = r#"{"ts_ns":1234567890,"vid":"0x0F0D","pid":"0x013E","report":"000009140000ff00"}"#;
        let entry = parse_capture_line(line)?;
        assert_eq!(entry.ts_ns, 1_234_567_890);
        assert_eq!(entry.vid, "0x0F0D");
        assert_eq!(entry.pid, "0x013E");
        assert_eq!(entry.bytes()?, vec![0x00, 0x00, 0x09, 0x14, 0x00, 0x00, 0xFF, 0x00]);
        Ok(())
    }

    #[test]
    fn test_parse_capture_line_missing_field() {
        let line = r#"{"ts_ns":1234,"vid":"0x0F0D","pid":"0x013E"}"#;
        assert!(parse_capture_line(line).is_err());
    }

    #[test]
    fn test_captured_report_line_format() -> Result<()> {
        let entry = CapturedReport::new(42, 0x0F0D, 0x013E, &[0x00, 0xAB, 0xff]);
        insta::assert_snapshot!(
            serde_json::to_string(&entry)?,
            @r#"{"ts_ns":42,"vid":"0x0F0D","pid":"0x013E","report":"00abff"}"#
        );
        Ok(())
    }

    #[test]
    fn test_decode_hex() -> Result<()> {
        assert_eq!(decode_hex("0102ABcd")?, vec![0x01, 0x02, 0xAB, 0xCD]);
        assert!(decode_hex("")?.is_empty());
        assert!(decode_hex("012").is_err());
        assert!(decode_hex("0xZZ").is_err());
        Ok(())
    }

    #[test]
    fn test_parse_vid_str() -> Result<()> {
        assert_eq!(parse_vid_str("0x0F0D")?, 0x0F0D);
        assert_eq!(parse_vid_str("013e")?, 0x013E);
        assert!(parse_vid_str("0xGGGG").is_err());
        Ok(())
    }

    #[test]
    fn test_read_captures_skips_blank_lines() -> Result<()> {
        let text = "\n{\"ts_ns\":1,\"vid\":\"0x0F0D\",\"pid\":\"0x013E\",\"report\":\"00\"}\n  \n";
        let entries = read_captures(text.as_bytes())?;
        assert_eq!(entries.len(), 1);
        Ok(())
    }

    #[test]
    fn test_replay_serves_reports_then_times_out() -> Result<()> {
        let mut source = ReplaySource::from_captures("replay://mem", &capture(&[&[1, 2], &[3, 4]]))?;
        assert_eq!(source.device_info().vendor_id, 0x0F0D);
        assert_eq!(source.device_info().product_id, 0x013E);
        assert_eq!(source.remaining(), 2);

        let timeout = Duration::from_millis(100);
        assert_eq!(
            source.read_report(timeout)?,
            ReadOutcome::Report(RawReport::new(vec![1, 2]))
        );
        assert_eq!(
            source.read_report(timeout)?,
            ReadOutcome::Report(RawReport::new(vec![3, 4]))
        );
        assert_eq!(source.read_report(timeout)?, ReadOutcome::Timeout);
        assert_eq!(source.read_report(timeout)?, ReadOutcome::Timeout);
        Ok(())
    }

    #[test]
    fn test_replay_after_release_is_unavailable() -> Result<()> {
        let mut source = ReplaySource::from_captures("replay://mem", &capture(&[&[1]]))?;
        source.release();
        source.release();
        let err = source.read_report(Duration::ZERO);
        assert!(matches!(err, Err(e) if e.is_device_unavailable()));
        Ok(())
    }

    #[test]
    fn test_replay_endpoint_and_descriptor() -> Result<()> {
        let mut source = ReplaySource::from_captures("replay://mem", &capture(&[&[0; 64]]))?;
        let endpoints = source.list_endpoints()?;
        assert_eq!(endpoints.len(), 1);
        assert!(endpoints[0].is_interrupt_in());
        assert_eq!(endpoints[0].max_packet_size, 64);
        assert!(matches!(
            source.report_descriptor(),
            Err(HidCommonError::DescriptorUnavailable(_))
        ));
        Ok(())
    }

    #[test]
    fn test_replay_open_from_file() -> Result<()> {
        let mut file = tempfile::NamedTempFile::new()?;
        for entry in capture(&[&[0x00, 0x00, 0x0F], &[0x00, 0x00, 0x00]]) {
            writeln!(file, "{}", serde_json::to_string(&entry)?)?;
        }
        file.flush()?;

        let source = ReplaySource::open(file.path())?;
        assert_eq!(source.remaining(), 2);
        assert!(source.device_info().path.starts_with("replay://"));
        Ok(())
    }
}
