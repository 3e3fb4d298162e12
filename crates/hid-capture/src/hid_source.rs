//! hidapi-backed input source

use hidapi::{DeviceInfo, HidApi, HidDevice};
use openracing_hid_common::{
    DeviceInputSource, EndpointDescriptor, HidCommonError, HidCommonResult, HidDeviceInfo,
    RawReport, ReadOutcome,
};
use racing_wheel_hid_hori_protocol::descriptor::MAX_DESCRIPTOR_LEN;
use std::time::Duration;
use tracing::debug;

/// hidapi hides the USB endpoint table; the interrupt-IN pipe it reads from
/// is reported as this single endpoint.
const HIDAPI_ENDPOINT_ADDRESS: u8 = 0x81;

pub fn device_info_from_hidapi(dev: &DeviceInfo) -> HidDeviceInfo {
    let mut info = HidDeviceInfo::new(
        dev.vendor_id(),
        dev.product_id(),
        dev.path().to_string_lossy().into_owned(),
    )
    .with_interface(dev.interface_number())
    .with_usage(dev.usage_page(), dev.usage());
    info.release_number = Some(dev.release_number());
    if let Some(serial) = dev.serial_number() {
        info = info.with_serial(serial);
    }
    if let Some(manufacturer) = dev.manufacturer_string() {
        info = info.with_manufacturer(manufacturer);
    }
    if let Some(product) = dev.product_string() {
        info = info.with_product_name(product);
    }
    info
}

/// Every HID device hidapi can see.
pub fn enumerate(api: &HidApi) -> Vec<HidDeviceInfo> {
    api.device_list().map(device_info_from_hidapi).collect()
}

pub struct HidApiSource {
    info: HidDeviceInfo,
    device: Option<HidDevice>,
    report_size: usize,
}

impl HidApiSource {
    /// Open the first interface matching `vendor_id`/`product_id`.
    pub fn open(
        api: &HidApi,
        vendor_id: u16,
        product_id: u16,
        report_size: usize,
    ) -> HidCommonResult<Self> {
        let dev = api
            .device_list()
            .find(|d| d.vendor_id() == vendor_id && d.product_id() == product_id)
            .ok_or_else(|| {
                HidCommonError::DeviceUnavailable(format!(
                    "no device with VID=0x{vendor_id:04X} PID=0x{product_id:04X}"
                ))
            })?;

        let info = device_info_from_hidapi(dev);
        let device = dev
            .open_device(api)
            .map_err(|e| HidCommonError::DeviceUnavailable(format!("{}: {e}", info.path)))?;

        debug!(path = %info.path, report_size, "Opened HID device");
        Ok(Self {
            info,
            device: Some(device),
            report_size,
        })
    }

    fn device(&self) -> HidCommonResult<&HidDevice> {
        self.device
            .as_ref()
            .ok_or_else(|| HidCommonError::DeviceUnavailable("device already released".into()))
    }
}

impl DeviceInputSource for HidApiSource {
    fn device_info(&self) -> &HidDeviceInfo {
        &self.info
    }

    fn list_endpoints(&self) -> HidCommonResult<Vec<EndpointDescriptor>> {
        let interface = self
            .info
            .interface_number
            .and_then(|n| u8::try_from(n).ok())
            .unwrap_or(0);
        let max_packet = u16::try_from(self.report_size).unwrap_or(u16::MAX);
        Ok(vec![EndpointDescriptor::interrupt_in(
            interface,
            HIDAPI_ENDPOINT_ADDRESS,
            max_packet,
        )])
    }

    fn read_report(&mut self, timeout: Duration) -> HidCommonResult<ReadOutcome> {
        let timeout_ms = i32::try_from(timeout.as_millis()).unwrap_or(i32::MAX);
        let mut buf = vec![0u8; self.report_size];
        let n = self
            .device()?
            .read_timeout(&mut buf, timeout_ms)
            .map_err(|e| HidCommonError::ReadError(e.to_string()))?;
        if n == 0 {
            return Ok(ReadOutcome::Timeout);
        }
        buf.truncate(n);
        Ok(ReadOutcome::Report(RawReport::new(buf)))
    }

    fn report_descriptor(&mut self) -> HidCommonResult<Vec<u8>> {
        let mut buf = vec![0u8; MAX_DESCRIPTOR_LEN];
        let n = self
            .device()?
            .get_report_descriptor(&mut buf)
            .map_err(|e| HidCommonError::DescriptorUnavailable(e.to_string()))?;
        if n == 0 {
            return Err(HidCommonError::DescriptorUnavailable(
                "device returned an empty descriptor".into(),
            ));
        }
        buf.truncate(n);
        Ok(buf)
    }

    fn release(&mut self) {
        if self.device.take().is_some() {
            debug!(path = %self.info.path, "Closed HID device");
        }
    }
}
