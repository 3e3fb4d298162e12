//! Device and endpoint information types for HID devices

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HidDeviceInfo {
    pub vendor_id: u16,
    pub product_id: u16,
    pub release_number: Option<u16>,
    pub serial_number: Option<String>,
    pub manufacturer: Option<String>,
    pub product_name: Option<String>,
    pub interface_number: Option<i32>,
    pub usage_page: Option<u16>,
    pub usage: Option<u16>,
    pub path: String,
}

impl HidDeviceInfo {
    pub fn new(vendor_id: u16, product_id: u16, path: impl Into<String>) -> Self {
        Self {
            vendor_id,
            product_id,
            release_number: None,
            serial_number: None,
            manufacturer: None,
            product_name: None,
            interface_number: None,
            usage_page: None,
            usage: None,
            path: path.into(),
        }
    }

    pub fn with_serial(mut self, serial: impl Into<String>) -> Self {
        self.serial_number = Some(serial.into());
        self
    }

    pub fn with_manufacturer(mut self, manufacturer: impl Into<String>) -> Self {
        self.manufacturer = Some(manufacturer.into());
        self
    }

    pub fn with_product_name(mut self, name: impl Into<String>) -> Self {
        self.product_name = Some(name.into());
        self
    }

    pub fn with_interface(mut self, interface_number: i32) -> Self {
        self.interface_number = Some(interface_number);
        self
    }

    pub fn with_usage(mut self, usage_page: u16, usage: u16) -> Self {
        self.usage_page = Some(usage_page);
        self.usage = Some(usage);
        self
    }

    pub fn matches(&self, vendor_id: u16, product_id: u16) -> bool {
        self.vendor_id == vendor_id && self.product_id == product_id
    }

    pub fn display_name(&self) -> String {
        self.product_name
            .clone()
            .or_else(|| self.manufacturer.clone())
            .unwrap_or_else(|| format!("{:04x}:{:04x}", self.vendor_id, self.product_id))
    }
}

/// USB endpoint transfer type (`bmAttributes & 0x03`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransferType {
    Control,
    Isochronous,
    Bulk,
    Interrupt,
}

impl TransferType {
    pub fn from_attributes(attributes: u8) -> Self {
        match attributes & 0x03 {
            0 => TransferType::Control,
            1 => TransferType::Isochronous,
            2 => TransferType::Bulk,
            _ => TransferType::Interrupt,
        }
    }
}

/// One endpoint of the HID interface, as listed by the input source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointDescriptor {
    pub interface_number: u8,
    /// `bEndpointAddress`; bit 7 set means device-to-host.
    pub address: u8,
    /// `bmAttributes`; the low two bits carry the transfer type.
    pub attributes: u8,
    pub max_packet_size: u16,
    /// Polling interval in frames.
    pub interval: u8,
}

impl EndpointDescriptor {
    pub const DIRECTION_IN: u8 = 0x80;

    pub fn interrupt_in(interface_number: u8, address: u8, max_packet_size: u16) -> Self {
        Self {
            interface_number,
            address: address | Self::DIRECTION_IN,
            attributes: 0x03,
            max_packet_size,
            interval: 1,
        }
    }

    pub fn is_in(&self) -> bool {
        self.address & Self::DIRECTION_IN != 0
    }

    pub fn transfer_type(&self) -> TransferType {
        TransferType::from_attributes(self.attributes)
    }

    pub fn is_interrupt_in(&self) -> bool {
        self.is_in() && self.transfer_type() == TransferType::Interrupt
    }
}

/// First interrupt-IN endpoint in listing order.
pub fn find_interrupt_in(endpoints: &[EndpointDescriptor]) -> Option<EndpointDescriptor> {
    endpoints.iter().copied().find(EndpointDescriptor::is_interrupt_in)
}
