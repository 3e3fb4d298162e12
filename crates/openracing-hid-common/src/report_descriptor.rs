//! Diagnostic dump of HID report descriptors.
//!
//! This only names short items (type, tag, payload) so a captured descriptor
//! can be eyeballed next to raw reports. It does not build a usage model and
//! nothing decodes reports from it.

use crc32fast::Hasher;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemType {
    Main,
    Global,
    Local,
    Reserved,
}

impl ItemType {
    fn from_prefix(prefix: u8) -> Self {
        match (prefix >> 2) & 0x03 {
            0 => ItemType::Main,
            1 => ItemType::Global,
            2 => ItemType::Local,
            _ => ItemType::Reserved,
        }
    }
}

/// One short item: prefix byte plus 0, 1, 2 or 4 little-endian payload bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DescriptorItem {
    pub offset: usize,
    pub item_type: ItemType,
    pub tag: u8,
    pub bytes: Vec<u8>,
    pub value: u32,
    /// Collection nesting depth the item is printed at.
    pub depth: usize,
}

impl DescriptorItem {
    /// `"Usage Page (0x0001)"`-style name for the item.
    pub fn describe(&self) -> String {
        let v = self.value;
        match (self.item_type, self.tag) {
            (ItemType::Main, 8) => format!("Input ({})", describe_main_flags(v)),
            (ItemType::Main, 9) => format!("Output ({})", describe_main_flags(v)),
            (ItemType::Main, 10) => format!("Collection ({})", collection_name(v)),
            (ItemType::Main, 11) => format!("Feature ({})", describe_main_flags(v)),
            (ItemType::Main, 12) => "End Collection".to_string(),
            (ItemType::Main, tag) => format!("Main Item {tag}: {v}"),
            (ItemType::Global, 0) => format!("Usage Page (0x{v:04X})"),
            (ItemType::Global, 1) => format!("Logical Minimum ({})", self.signed_value()),
            (ItemType::Global, 2) => format!("Logical Maximum ({})", self.signed_value()),
            (ItemType::Global, 3) => format!("Physical Minimum ({v})"),
            (ItemType::Global, 4) => format!("Physical Maximum ({v})"),
            (ItemType::Global, 5) => format!("Unit Exponent ({v})"),
            (ItemType::Global, 6) => format!("Unit ({v})"),
            (ItemType::Global, 7) => format!("Report Size ({v})"),
            (ItemType::Global, 8) => format!("Report ID ({v})"),
            (ItemType::Global, 9) => format!("Report Count ({v})"),
            (ItemType::Global, 10) => "Push".to_string(),
            (ItemType::Global, 11) => "Pop".to_string(),
            (ItemType::Global, tag) => format!("Global Item {tag}: {v}"),
            (ItemType::Local, 0) => format!("Usage (0x{v:02X})"),
            (ItemType::Local, 1) => format!("Usage Minimum (0x{v:02X})"),
            (ItemType::Local, 2) => format!("Usage Maximum (0x{v:02X})"),
            (ItemType::Local, 3) => format!("Designator Index ({v})"),
            (ItemType::Local, 4) => format!("Designator Minimum ({v})"),
            (ItemType::Local, 5) => format!("Designator Maximum ({v})"),
            (ItemType::Local, 7) => format!("String Index ({v})"),
            (ItemType::Local, 8) => format!("String Minimum ({v})"),
            (ItemType::Local, 9) => format!("String Maximum ({v})"),
            (ItemType::Local, 10) => format!("Delimiter ({v})"),
            (ItemType::Local, tag) => format!("Local Item {tag}: {v}"),
            (ItemType::Reserved, tag) => format!("Reserved Item {tag}: {v}"),
        }
    }

    /// Payload bytes after the prefix.
    pub fn payload_len(&self) -> usize {
        self.bytes.len().saturating_sub(1)
    }

    /// Sign-extended payload, for logical extents.
    pub fn signed_value(&self) -> i64 {
        match self.payload_len() {
            1 => i64::from(self.value as u8 as i8),
            2 => i64::from(self.value as u16 as i16),
            4 => i64::from(self.value as i32),
            _ => i64::from(self.value),
        }
    }

    pub fn hex(&self) -> String {
        crate::hex_bytes(self.bytes.iter().copied())
    }
}

/// Split a descriptor into short items. A truncated final item keeps
/// whatever payload bytes are present; long items (`0xFE`) are skipped whole.
pub fn parse_items(data: &[u8]) -> Vec<DescriptorItem> {
    let mut items = Vec::new();
    let mut depth = 0usize;
    let mut offset = 0usize;

    while let Some(&prefix) = data.get(offset) {
        if prefix == 0xFE {
            let long_len = data.get(offset + 1).copied().unwrap_or(0) as usize;
            tracing::trace!(offset, long_len, "skipping long item");
            offset = offset.saturating_add(3 + long_len);
            continue;
        }

        let size = match prefix & 0x03 {
            3 => 4,
            n => n as usize,
        };
        let end = (offset + 1 + size).min(data.len());
        let payload = data.get(offset + 1..end).unwrap_or_default();
        let value = payload
            .iter()
            .rev()
            .fold(0u32, |acc, &b| (acc << 8) | u32::from(b));

        let item_type = ItemType::from_prefix(prefix);
        let tag = (prefix >> 4) & 0x0F;

        if item_type == ItemType::Main && tag == 12 {
            depth = depth.saturating_sub(1);
        }

        let mut bytes = Vec::with_capacity(1 + payload.len());
        bytes.push(prefix);
        bytes.extend_from_slice(payload);

        items.push(DescriptorItem {
            offset,
            item_type,
            tag,
            bytes,
            value,
            depth,
        });

        if item_type == ItemType::Main && tag == 10 {
            depth += 1;
        }
        offset = end;
    }

    items
}

/// Human-readable listing, one item per line, indented by collection depth.
pub fn dump(data: &[u8]) -> String {
    let mut out = String::new();
    for item in parse_items(data) {
        let indent = "  ".repeat(item.depth);
        out.push_str(&format!("{indent}{:<20} {}\n", item.hex(), item.describe()));
    }
    out
}

/// `static const uint8_t reportDescriptor[] = { ... };`, 16 bytes per row.
pub fn format_c_array(name: &str, data: &[u8]) -> String {
    let mut out = format!("static const uint8_t {name}[] = {{\n");
    for chunk in data.chunks(16) {
        let row = chunk
            .iter()
            .map(|b| format!("0x{b:02X}"))
            .collect::<Vec<_>>()
            .join(", ");
        out.push_str(&format!("    {row},\n"));
    }
    out.push_str("};\n");
    out
}

pub fn descriptor_crc32(data: &[u8]) -> u32 {
    let mut hasher = Hasher::new();
    hasher.update(data);
    hasher.finalize()
}

fn describe_main_flags(value: u32) -> String {
    let mut flags = vec![
        if value & 0x01 != 0 { "Constant" } else { "Data" },
        if value & 0x02 != 0 { "Variable" } else { "Array" },
        if value & 0x04 != 0 { "Relative" } else { "Absolute" },
    ];
    for (bit, name) in [
        (0x08, "Wrap"),
        (0x10, "Non Linear"),
        (0x20, "No Preferred"),
        (0x40, "Null State"),
        (0x100, "Buffered Bytes"),
    ] {
        if value & bit != 0 {
            flags.push(name);
        }
    }
    flags.join(", ")
}

fn collection_name(value: u32) -> String {
    match value {
        0x00 => "Physical".to_string(),
        0x01 => "Application".to_string(),
        0x02 => "Logical".to_string(),
        0x03 => "Report".to_string(),
        0x04 => "Named Array".to_string(),
        0x05 => "Usage Switch".to_string(),
        0x06 => "Usage Modifier".to_string(),
        other => format!("Reserved 0x{other:02X}"),
    }
}
