//! Primitive encodings of the binary module format.
//!
//! Integers in tables and operands use the variable-length u30/s32 encoding:
//! seven value bits per byte, high bit set when another byte follows, at
//! most five bytes. Fixed-width fields are little-endian.

use crate::error::AbcError;
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::Cursor;

/// Cursor over module bytes
pub struct AbcReader<'a> {
    cursor: Cursor<&'a [u8]>,
}

impl<'a> AbcReader<'a> {
    /// Start reading at the beginning of `bytes`
    pub fn new(bytes: &'a [u8]) -> Self {
        Self {
            cursor: Cursor::new(bytes),
        }
    }

    /// Current byte offset
    pub fn position(&self) -> u64 {
        self.cursor.position()
    }

    /// Bytes left to read
    pub fn remaining(&self) -> u64 {
        (self.cursor.get_ref().len() as u64).saturating_sub(self.cursor.position())
    }

    fn truncated(&self) -> AbcError {
        AbcError::Truncated {
            offset: self.cursor.position(),
        }
    }

    /// Read one byte
    pub fn read_u8(&mut self) -> Result<u8, AbcError> {
        self.cursor.read_u8().map_err(|_| self.truncated())
    }

    /// Read a little-endian u16
    pub fn read_u16(&mut self) -> Result<u16, AbcError> {
        self.cursor
            .read_u16::<LittleEndian>()
            .map_err(|_| self.truncated())
    }

    /// Read a little-endian IEEE double
    pub fn read_d64(&mut self) -> Result<f64, AbcError> {
        self.cursor
            .read_f64::<LittleEndian>()
            .map_err(|_| self.truncated())
    }

    fn read_var_u32(&mut self) -> Result<u32, AbcError> {
        let mut result: u32 = 0;
        for shift in (0..35).step_by(7) {
            let byte = self.read_u8()?;
            result |= u32::from(byte & 0x7f).wrapping_shl(shift);
            if byte & 0x80 == 0 {
                return Ok(result);
            }
        }
        Err(AbcError::InvalidU30 {
            offset: self.cursor.position(),
        })
    }

    /// Read a variable-length unsigned 30-bit integer
    pub fn read_u30(&mut self) -> Result<u32, AbcError> {
        let start = self.cursor.position();
        let value = self.read_var_u32()?;
        if value >> 30 != 0 {
            return Err(AbcError::InvalidU30 { offset: start });
        }
        Ok(value)
    }

    /// Read a variable-length signed 32-bit integer
    pub fn read_s32(&mut self) -> Result<i32, AbcError> {
        Ok(self.read_var_u32()? as i32)
    }

    /// Read a u30 length followed by that many UTF-8 bytes
    pub fn read_string(&mut self) -> Result<String, AbcError> {
        let len = self.read_u30()? as u64;
        let start = self.cursor.position();
        if self.remaining() < len {
            return Err(AbcError::Truncated {
                offset: self.cursor.get_ref().len() as u64,
            });
        }
        let bytes = &self.cursor.get_ref()[start as usize..(start + len) as usize];
        let s = std::str::from_utf8(bytes)
            .map_err(|_| AbcError::InvalidUtf8 { offset: start })?
            .to_string();
        self.cursor.set_position(start + len);
        Ok(s)
    }
}

/// Append-only encoder, the inverse of [`AbcReader`]
#[derive(Debug, Default)]
pub struct AbcWriter {
    bytes: Vec<u8>,
}

impl AbcWriter {
    /// Create an empty encoder
    pub fn new() -> Self {
        Self::default()
    }

    /// Write one byte
    pub fn write_u8(&mut self, value: u8) {
        self.bytes.push(value);
    }

    /// Write a little-endian u16
    pub fn write_u16(&mut self, value: u16) {
        // Writing into a Vec cannot fail.
        let _ = self.bytes.write_u16::<LittleEndian>(value);
    }

    /// Write a little-endian IEEE double
    pub fn write_d64(&mut self, value: f64) {
        let _ = self.bytes.write_f64::<LittleEndian>(value);
    }

    fn write_var_u32(&mut self, mut value: u32) {
        loop {
            let byte = (value & 0x7f) as u8;
            value >>= 7;
            if value == 0 {
                self.bytes.push(byte);
                return;
            }
            self.bytes.push(byte | 0x80);
        }
    }

    /// Write a variable-length unsigned integer
    pub fn write_u30(&mut self, value: u32) {
        debug_assert!(value >> 30 == 0, "u30 overflow");
        self.write_var_u32(value);
    }

    /// Write a variable-length signed integer
    pub fn write_s32(&mut self, value: i32) {
        self.write_var_u32(value as u32);
    }

    /// Write a length-prefixed UTF-8 string
    pub fn write_string(&mut self, value: &str) {
        self.write_u30(value.len() as u32);
        self.bytes.extend_from_slice(value.as_bytes());
    }

    /// Finish and return the encoded bytes
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}
