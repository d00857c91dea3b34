//! Little-endian primitives for the documentation chunk

#![allow(clippy::cast_possible_truncation)] // Lengths are u32 on the wire; blobs > 4GB are unsupported

use crate::error::{ReadError, ReadResult};

/// Append-only byte buffer
#[derive(Debug, Default)]
pub(crate) struct ByteWriter {
    buf: Vec<u8>,
}

impl ByteWriter {
    pub fn new() -> Self {
        Self { buf: Vec::new() }
    }

    pub fn write_u8(&mut self, value: u8) {
        self.buf.push(value);
    }

    pub fn write_u16(&mut self, value: u16) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    pub fn write_u32(&mut self, value: u32) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    pub fn write_i64(&mut self, value: i64) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    pub fn write_len(&mut self, len: usize) {
        self.write_u32(len as u32);
    }

    /// Length-prefixed raw bytes
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.write_len(bytes.len());
        self.buf.extend_from_slice(bytes);
    }

    /// Length-prefixed UTF-8 string
    pub fn write_str(&mut self, s: &str) {
        self.write_bytes(s.as_bytes());
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}

/// Bounds-checked cursor over chunk bytes
///
/// Every failure is reported as `ReadError::Malformed` with the offset
/// where decoding stopped.
#[derive(Debug)]
pub(crate) struct ByteReader<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, offset: 0 }
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn is_at_end(&self) -> bool {
        self.offset == self.data.len()
    }

    pub fn malformed(&self, reason: impl Into<String>) -> ReadError {
        ReadError::Malformed {
            offset: self.offset,
            reason: reason.into(),
        }
    }

    fn take(&mut self, len: usize) -> ReadResult<&'a [u8]> {
        let end = self
            .offset
            .checked_add(len)
            .filter(|end| *end <= self.data.len())
            .ok_or_else(|| {
                self.malformed(format!(
                    "need {len} bytes, {} left",
                    self.data.len() - self.offset
                ))
            })?;
        let slice = &self.data[self.offset..end];
        self.offset = end;
        Ok(slice)
    }

    fn take_array<const N: usize>(&mut self) -> ReadResult<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    pub fn read_u8(&mut self) -> ReadResult<u8> {
        Ok(self.take_array::<1>()?[0])
    }

    pub fn read_u16(&mut self) -> ReadResult<u16> {
        self.take_array().map(u16::from_le_bytes)
    }

    pub fn read_u32(&mut self) -> ReadResult<u32> {
        self.take_array().map(u32::from_le_bytes)
    }

    pub fn read_i64(&mut self) -> ReadResult<i64> {
        self.take_array().map(i64::from_le_bytes)
    }

    pub fn read_len(&mut self) -> ReadResult<usize> {
        self.read_u32().map(|len| len as usize)
    }

    /// Read an element count, rejecting counts the remaining bytes cannot hold
    pub fn read_count(&mut self, min_element_size: usize) -> ReadResult<usize> {
        let count = self.read_len()?;
        let remaining = self.data.len() - self.offset;
        if count.saturating_mul(min_element_size) > remaining {
            return Err(self.malformed(format!("count {count} exceeds remaining data")));
        }
        Ok(count)
    }

    pub fn read_bytes(&mut self) -> ReadResult<Vec<u8>> {
        let len = self.read_len()?;
        self.take(len).map(<[u8]>::to_vec)
    }

    pub fn read_str(&mut self) -> ReadResult<String> {
        let start = self.offset;
        let len = self.read_len()?;
        let bytes = self.take(len)?;
        std::str::from_utf8(bytes)
            .map(str::to_string)
            .map_err(|_| ReadError::Malformed {
                offset: start,
                reason: "string is not valid utf8".to_string(),
            })
    }
}
