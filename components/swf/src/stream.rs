//! Byte and bit readers over container data.
//!
//! Fixed-width fields are little-endian. Rectangles are bit-packed,
//! most significant bit first.

use crate::error::SwfError;
use byteorder::{LittleEndian, ReadBytesExt};
use std::io::Cursor;

/// Cursor over one tag body or header
pub struct SwfStream<'a> {
    cursor: Cursor<&'a [u8]>,
    base: usize,
}

impl<'a> SwfStream<'a> {
    /// Read `bytes`, reporting offsets relative to `base`
    pub fn new(bytes: &'a [u8], base: usize) -> Self {
        Self {
            cursor: Cursor::new(bytes),
            base,
        }
    }

    /// Current offset within the file
    pub fn offset(&self) -> usize {
        self.base + self.cursor.position() as usize
    }

    /// Bytes left to read
    pub fn remaining(&self) -> usize {
        self.cursor
            .get_ref()
            .len()
            .saturating_sub(self.cursor.position() as usize)
    }

    fn truncated(&self) -> SwfError {
        SwfError::Truncated {
            offset: self.offset(),
        }
    }

    /// Read one byte
    pub fn read_u8(&mut self) -> Result<u8, SwfError> {
        self.cursor.read_u8().map_err(|_| self.truncated())
    }

    /// Read a little-endian u16
    pub fn read_u16(&mut self) -> Result<u16, SwfError> {
        self.cursor
            .read_u16::<LittleEndian>()
            .map_err(|_| self.truncated())
    }

    /// Read a little-endian u32
    pub fn read_u32(&mut self) -> Result<u32, SwfError> {
        self.cursor
            .read_u32::<LittleEndian>()
            .map_err(|_| self.truncated())
    }

    /// Read an 8.8 fixed-point number
    pub fn read_fixed8(&mut self) -> Result<f64, SwfError> {
        Ok(f64::from(self.read_u16()?) / 256.0)
    }

    /// Read a NUL-terminated string; a missing terminator ends at the data end
    pub fn read_cstring(&mut self) -> Result<String, SwfError> {
        let start = self.cursor.position() as usize;
        let data = &self.cursor.get_ref()[start..];
        let len = data.iter().position(|b| *b == 0).unwrap_or(data.len());
        let text = String::from_utf8_lossy(&data[..len]).into_owned();
        let consumed = (len + 1).min(data.len());
        self.cursor.set_position((start + consumed) as u64);
        Ok(text)
    }

    /// Read `len` raw bytes
    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8], SwfError> {
        if self.remaining() < len {
            return Err(self.truncated());
        }
        let start = self.cursor.position() as usize;
        let data: &'a [u8] = *self.cursor.get_ref();
        self.cursor.set_position((start + len) as u64);
        Ok(&data[start..start + len])
    }

    /// Everything left
    pub fn read_rest(&mut self) -> &'a [u8] {
        let start = (self.cursor.position() as usize).min(self.cursor.get_ref().len());
        let data: &'a [u8] = *self.cursor.get_ref();
        self.cursor.set_position(data.len() as u64);
        &data[start..]
    }
}

/// Frame bounds in twips
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect {
    /// Left edge
    pub x_min: i32,
    /// Right edge
    pub x_max: i32,
    /// Top edge
    pub y_min: i32,
    /// Bottom edge
    pub y_max: i32,
}

impl Rect {
    /// Bits needed to store every coordinate as a signed field
    pub fn bits(&self) -> u32 {
        [self.x_min, self.x_max, self.y_min, self.y_max]
            .iter()
            .map(|v| {
                if *v >= 0 {
                    33 - v.leading_zeros()
                } else {
                    33 - (!v).leading_zeros()
                }
            })
            .max()
            .unwrap_or(1)
            .clamp(1, 31)
    }

    /// Encoded size in bytes for a rect whose first byte is `first`
    pub fn encoded_len(first: u8) -> usize {
        let nbits = usize::from(first >> 3);
        (5 + 4 * nbits + 7) / 8
    }

    /// Decode a bit-packed rect
    pub fn read(data: &[u8], base: usize) -> Result<Rect, SwfError> {
        let mut bits = BitReader::new(data, base);
        let nbits = bits.read_ub(5)?;
        Ok(Rect {
            x_min: bits.read_sb(nbits)?,
            x_max: bits.read_sb(nbits)?,
            y_min: bits.read_sb(nbits)?,
            y_max: bits.read_sb(nbits)?,
        })
    }

    /// Encode as a bit-packed rect
    pub fn write(&self, out: &mut Vec<u8>) {
        let nbits = self.bits();
        let mut bits = BitWriter::default();
        bits.write_ub(nbits, 5);
        for v in [self.x_min, self.x_max, self.y_min, self.y_max] {
            bits.write_ub(v as u32, nbits);
        }
        out.extend_from_slice(&bits.finish());
    }
}

struct BitReader<'a> {
    data: &'a [u8],
    base: usize,
    bit: usize,
}

impl<'a> BitReader<'a> {
    fn new(data: &'a [u8], base: usize) -> Self {
        Self { data, base, bit: 0 }
    }

    fn read_ub(&mut self, count: u32) -> Result<u32, SwfError> {
        let mut value = 0u32;
        for _ in 0..count {
            let byte = self.data.get(self.bit / 8).ok_or(SwfError::Truncated {
                offset: self.base + self.bit / 8,
            })?;
            let set = (byte >> (7 - self.bit % 8)) & 1;
            value = (value << 1) | u32::from(set);
            self.bit += 1;
        }
        Ok(value)
    }

    fn read_sb(&mut self, count: u32) -> Result<i32, SwfError> {
        if count == 0 {
            return Ok(0);
        }
        let raw = self.read_ub(count)?;
        let shift = 32 - count;
        Ok(((raw << shift) as i32) >> shift)
    }
}

#[derive(Default)]
struct BitWriter {
    bytes: Vec<u8>,
    bit: usize,
}

impl BitWriter {
    fn write_ub(&mut self, value: u32, count: u32) {
        for i in (0..count).rev() {
            if self.bit % 8 == 0 {
                self.bytes.push(0);
            }
            if (value >> i) & 1 == 1 {
                if let Some(last) = self.bytes.last_mut() {
                    *last |= 1 << (7 - self.bit % 8);
                }
            }
            self.bit += 1;
        }
    }

    fn finish(self) -> Vec<u8> {
        self.bytes
    }
}
