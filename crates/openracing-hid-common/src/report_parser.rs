//! HID report parsing utilities

use crate::{HidCommonError, HidCommonResult};

/// Cursor over a borrowed report that fails instead of reading past the end.
pub struct ReportParser<'a> {
    buffer: &'a [u8],
    position: usize,
}

impl<'a> ReportParser<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            buffer: data,
            position: 0,
        }
    }

    pub fn remaining(&self) -> usize {
        self.buffer.len().saturating_sub(self.position)
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn read_u8(&mut self) -> HidCommonResult<u8> {
        let value = self.peek_u8()?;
        self.position += 1;
        Ok(value)
    }

    pub fn read_u16_le(&mut self) -> HidCommonResult<u16> {
        let lo = self.read_u8()?;
        let hi = self.read_u8()?;
        Ok(u16::from_le_bytes([lo, hi]))
    }

    pub fn read_bytes(&mut self, count: usize) -> HidCommonResult<&'a [u8]> {
        let end = self
            .position
            .checked_add(count)
            .filter(|end| *end <= self.buffer.len())
            .ok_or_else(|| unexpected_end(self.position, count))?;
        let result = self
            .buffer
            .get(self.position..end)
            .ok_or_else(|| unexpected_end(self.position, count))?;
        self.position = end;
        Ok(result)
    }

    pub fn peek_u8(&self) -> HidCommonResult<u8> {
        self.buffer
            .get(self.position)
            .copied()
            .ok_or_else(|| unexpected_end(self.position, 1))
    }

    pub fn skip(&mut self, count: usize) {
        self.position = self.position.saturating_add(count).min(self.buffer.len());
    }

    pub fn reset(&mut self) {
        self.position = 0;
    }

    pub fn slice(&self) -> &'a [u8] {
        self.buffer
    }
}

fn unexpected_end(position: usize, wanted: usize) -> HidCommonError {
    HidCommonError::InvalidReport(format!(
        "Unexpected end of data: wanted {wanted} byte(s) at offset {position}"
    ))
}
