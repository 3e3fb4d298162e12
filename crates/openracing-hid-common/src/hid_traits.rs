//! HID device traits

use crate::{EndpointDescriptor, HidCommonResult, HidDeviceInfo, RawReport};
use std::time::Duration;

/// Result of one bounded blocking read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadOutcome {
    Report(RawReport),
    /// Nothing arrived before the timeout. Not an error.
    Timeout,
}

impl ReadOutcome {
    pub fn into_report(self) -> Option<RawReport> {
        match self {
            ReadOutcome::Report(report) => Some(report),
            ReadOutcome::Timeout => None,
        }
    }
}

/// Blocking source of interrupt-IN reports from one opened device.
///
/// Implementations own the device handle. [`release`](Self::release) must be
/// idempotent: callers invoke it on every exit path, including after an
/// interrupted read loop.
pub trait DeviceInputSource {
    fn device_info(&self) -> &HidDeviceInfo;

    fn list_endpoints(&self) -> HidCommonResult<Vec<EndpointDescriptor>>;

    fn read_report(&mut self, timeout: Duration) -> HidCommonResult<ReadOutcome>;

    /// Raw HID report descriptor, or `DescriptorUnavailable`.
    fn report_descriptor(&mut self) -> HidCommonResult<Vec<u8>>;

    fn release(&mut self);
}

impl<S: DeviceInputSource + ?Sized> DeviceInputSource for Box<S> {
    fn device_info(&self) -> &HidDeviceInfo {
        (**self).device_info()
    }

    fn list_endpoints(&self) -> HidCommonResult<Vec<EndpointDescriptor>> {
        (**self).list_endpoints()
    }

    fn read_report(&mut self, timeout: Duration) -> HidCommonResult<ReadOutcome> {
        (**self).read_report(timeout)
    }

    fn report_descriptor(&mut self) -> HidCommonResult<Vec<u8>> {
        (**self).report_descriptor()
    }

    fn release(&mut self) {
        (**self).release()
    }
}

pub mod mock {
    use super::*;
    use crate::HidCommonError;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    /// One scripted read result.
    #[derive(Debug, Clone)]
    pub enum MockRead {
        Report(Vec<u8>),
        Timeout,
        Disconnect,
    }

    #[derive(Debug, Default)]
    struct MockState {
        reads: VecDeque<MockRead>,
        reads_attempted: usize,
        released: bool,
    }

    /// Scripted input source. Once the script runs dry every read times out.
    ///
    /// Clones share state, so a test can keep a handle to inspect reads and
    /// release status after moving the source into a session.
    #[derive(Debug, Clone)]
    pub struct MockInputSource {
        info: HidDeviceInfo,
        endpoints: Vec<EndpointDescriptor>,
        descriptor: Option<Vec<u8>>,
        state: Arc<Mutex<MockState>>,
    }

    impl MockInputSource {
        pub fn new(vendor_id: u16, product_id: u16) -> Self {
            Self {
                info: HidDeviceInfo::new(vendor_id, product_id, "mock://0"),
                endpoints: vec![EndpointDescriptor::interrupt_in(0, 0x81, 64)],
                descriptor: None,
                state: Arc::new(Mutex::new(MockState::default())),
            }
        }

        pub fn with_endpoints(mut self, endpoints: Vec<EndpointDescriptor>) -> Self {
            self.endpoints = endpoints;
            self
        }

        pub fn with_descriptor(mut self, descriptor: impl Into<Vec<u8>>) -> Self {
            self.descriptor = Some(descriptor.into());
            self
        }

        pub fn queue_report(&self, data: impl Into<Vec<u8>>) {
            self.queue(MockRead::Report(data.into()));
        }

        pub fn queue_reports<I, R>(&self, reports: I)
        where
            I: IntoIterator<Item = R>,
            R: Into<Vec<u8>>,
        {
            for report in reports {
                self.queue_report(report);
            }
        }

        pub fn queue_timeout(&self) {
            self.queue(MockRead::Timeout);
        }

        pub fn queue(&self, read: MockRead) {
            let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
            state.reads.push_back(read);
        }

        pub fn pending(&self) -> usize {
            let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
            state.reads.len()
        }

        pub fn reads_attempted(&self) -> usize {
            let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
            state.reads_attempted
        }

        pub fn is_released(&self) -> bool {
            let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
            state.released
        }
    }

    impl DeviceInputSource for MockInputSource {
        fn device_info(&self) -> &HidDeviceInfo {
            &self.info
        }

        fn list_endpoints(&self) -> HidCommonResult<Vec<EndpointDescriptor>> {
            Ok(self.endpoints.clone())
        }

        fn read_report(&mut self, _timeout: Duration) -> HidCommonResult<ReadOutcome> {
            let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
            if state.released {
                return Err(HidCommonError::Disconnected);
            }
            state.reads_attempted += 1;
            match state.reads.pop_front() {
                Some(MockRead::Report(bytes)) => Ok(ReadOutcome::Report(RawReport::new(bytes))),
                Some(MockRead::Timeout) | None => Ok(ReadOutcome::Timeout),
                Some(MockRead::Disconnect) => Err(HidCommonError::Disconnected),
            }
        }

        fn report_descriptor(&mut self) -> HidCommonResult<Vec<u8>> {
            self.descriptor.clone().ok_or_else(|| {
                HidCommonError::DescriptorUnavailable("mock device has no descriptor".into())
            })
        }

        fn release(&mut self) {
            let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
            state.released = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::mock::*;
    use super::*;
    use crate::HidCommonError;

    const TIMEOUT: Duration = Duration::from_millis(100);

    #[test]
    fn test_mock_reads_in_order_then_times_out() -> Result<(), HidCommonError> {
        let mut source = MockInputSource::new(0x0F0D, 0x013E);
        source.queue_report(vec![0x01]);
        source.queue_timeout();
        source.queue_report(vec![0x02]);

        assert_eq!(
            source.read_report(TIMEOUT)?,
            ReadOutcome::Report(RawReport::new(vec![0x01]))
        );
        assert_eq!(source.read_report(TIMEOUT)?, ReadOutcome::Timeout);
        assert_eq!(
            source.read_report(TIMEOUT)?.into_report(),
            Some(RawReport::new(vec![0x02]))
        );
        assert_eq!(source.read_report(TIMEOUT)?, ReadOutcome::Timeout);
        assert_eq!(source.reads_attempted(), 4);
        Ok(())
    }

    #[test]
    fn test_mock_release_is_shared_between_clones() {
        let handle = MockInputSource::new(0x0F0D, 0x013E);
        let mut source = handle.clone();
        assert!(!handle.is_released());

        source.release();
        source.release();
        assert!(handle.is_released());
        assert!(matches!(
            source.read_report(TIMEOUT),
            Err(HidCommonError::Disconnected)
        ));
    }

    #[test]
    fn test_mock_descriptor_unavailable_by_default() {
        let mut source = MockInputSource::new(0x0F0D, 0x013E);
        assert!(matches!(
            source.report_descriptor(),
            Err(HidCommonError::DescriptorUnavailable(_))
        ));

        let mut source = MockInputSource::new(0x0F0D, 0x013E).with_descriptor(vec![0x05, 0x01]);
        assert_eq!(source.report_descriptor().ok(), Some(vec![0x05, 0x01]));
    }

    #[test]
    fn test_boxed_source_delegates() -> Result<(), HidCommonError> {
        let handle = MockInputSource::new(0x0F0D, 0x013E);
        handle.queue_report(vec![0xAB]);
        let mut boxed: Box<dyn DeviceInputSource> = Box::new(handle.clone());

        assert_eq!(boxed.device_info().vendor_id, 0x0F0D);
        assert_eq!(boxed.list_endpoints()?.len(), 1);
        assert!(matches!(boxed.read_report(TIMEOUT)?, ReadOutcome::Report(_)));
        boxed.release();
        assert!(handle.is_released());
        Ok(())
    }
}
