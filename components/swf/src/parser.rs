//! Push parser that turns raw container bytes into tags.
//!
//! Input may arrive in pieces of any size. The 8-byte preamble is read
//! raw; the rest is inflated on the fly for `CWS` files and buffered. Tags
//! are applied only once their whole body is available.

use crate::error::SwfError;
use crate::file::{SwfFile, SwfHeader, Symbol};
use crate::stream::{Rect, SwfStream};
use crate::tag::SwfTag;
use byteorder::{ByteOrder, LittleEndian};
use flate2::{Decompress, FlushDecompress, Status};

/// Size of the signature, version and length preamble
pub const PREAMBLE_LEN: usize = 8;

const INFLATE_CHUNK: usize = 16 * 1024;

/// Tags applied by one [`SwfParser::scan`]
#[derive(Debug, Default)]
pub(crate) struct Scan {
    pub(crate) tags: usize,
    pub(crate) bytes: usize,
    pub(crate) eager: Vec<Symbol>,
}

#[derive(Default)]
pub(crate) struct SwfParser {
    preamble: Vec<u8>,
    compressed: bool,
    version: u8,
    file_length: usize,
    inflater: Option<Decompress>,
    body: Vec<u8>,
    position: usize,
    file: Option<SwfFile>,
}

impl SwfParser {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn file(&self) -> Option<&SwfFile> {
        self.file.as_ref()
    }

    /// Uncompressed bytes received so far, preamble included
    pub(crate) fn bytes_received(&self) -> usize {
        self.preamble.len() + self.body.len()
    }

    /// Declared uncompressed length, once the preamble is in
    pub(crate) fn file_length(&self) -> usize {
        self.file_length
    }

    /// Buffer more input
    pub(crate) fn push(&mut self, mut data: &[u8]) -> Result<(), SwfError> {
        if self.preamble.len() < PREAMBLE_LEN {
            let take = (PREAMBLE_LEN - self.preamble.len()).min(data.len());
            self.preamble.extend_from_slice(&data[..take]);
            data = &data[take..];
            if self.preamble.len() < PREAMBLE_LEN {
                return Ok(());
            }
            self.read_preamble()?;
        }
        if self.compressed {
            self.inflate(data)
        } else {
            self.body.extend_from_slice(data);
            Ok(())
        }
    }

    fn read_preamble(&mut self) -> Result<(), SwfError> {
        match &self.preamble[..3] {
            b"FWS" => self.compressed = false,
            b"CWS" => {
                self.compressed = true;
                self.inflater = Some(Decompress::new(true));
            }
            b"ZWS" => return Err(SwfError::UnsupportedCompression("LZMA")),
            other => {
                return Err(SwfError::InvalidSignature(
                    String::from_utf8_lossy(other).into_owned(),
                ))
            }
        }
        self.version = self.preamble[3];
        self.file_length = LittleEndian::read_u32(&self.preamble[4..8]) as usize;
        Ok(())
    }

    fn inflate(&mut self, mut input: &[u8]) -> Result<(), SwfError> {
        let inflater = match self.inflater.as_mut() {
            Some(inflater) => inflater,
            None => return Ok(()),
        };
        let mut buffer = vec![0u8; INFLATE_CHUNK];
        loop {
            let before_in = inflater.total_in();
            let before_out = inflater.total_out();
            let status = inflater
                .decompress(input, &mut buffer, FlushDecompress::None)
                .map_err(|e| SwfError::Decompress(e.to_string()))?;
            let consumed = (inflater.total_in() - before_in) as usize;
            let produced = (inflater.total_out() - before_out) as usize;
            input = &input[consumed..];
            self.body.extend_from_slice(&buffer[..produced]);

            if status == Status::StreamEnd {
                self.inflater = None;
                return Ok(());
            }
            let drained = produced < buffer.len();
            if (input.is_empty() && drained) || (consumed == 0 && produced == 0) {
                return Ok(());
            }
        }
    }

    /// Read the header once enough of the body is buffered.
    ///
    /// Returns `false` while more data is needed.
    pub(crate) fn parse_header(&mut self) -> Result<bool, SwfError> {
        if self.file.is_some() {
            return Ok(true);
        }
        if self.preamble.len() < PREAMBLE_LEN {
            return Ok(false);
        }
        let first = match self.body.first() {
            Some(first) => *first,
            None => return Ok(false),
        };
        let rect_len = Rect::encoded_len(first);
        if self.body.len() < rect_len + 4 {
            return Ok(false);
        }
        let bounds = Rect::read(&self.body[..rect_len], PREAMBLE_LEN)?;
        let mut stream =
            SwfStream::new(&self.body[rect_len..rect_len + 4], PREAMBLE_LEN + rect_len);
        let frame_rate = stream.read_fixed8()?;
        let frame_count = stream.read_u16()?;

        self.position = rect_len + 4;
        let mut file = SwfFile::new(SwfHeader {
            compressed: self.compressed,
            version: self.version,
            file_length: self.file_length,
            bounds,
            frame_rate,
            frame_count,
        });
        file.bytes_loaded = PREAMBLE_LEN + self.position;
        self.file = Some(file);
        Ok(true)
    }

    /// Apply every complete tag in the buffer
    pub(crate) fn scan(&mut self) -> Result<Scan, SwfError> {
        let mut scan = Scan::default();
        let file = match self.file.as_mut() {
            Some(file) => file,
            None => return Ok(scan),
        };
        let start = self.position;
        while !file.is_complete() {
            let rest = &self.body[self.position..];
            if rest.len() < 2 {
                break;
            }
            let code_and_length = LittleEndian::read_u16(rest);
            let code = code_and_length >> 6;
            let mut length = usize::from(code_and_length & 0x3f);
            let mut header_len = 2;
            if length == 0x3f {
                if rest.len() < 6 {
                    break;
                }
                length = LittleEndian::read_u32(&rest[2..6]) as usize;
                header_len = 6;
            }
            if rest.len() - header_len < length {
                break;
            }
            let offset = PREAMBLE_LEN + self.position;
            let body = &rest[header_len..header_len + length];
            let outcome = file.apply_tag(
                SwfTag::from_code(code),
                offset,
                body,
                offset + header_len,
            )?;
            self.position += header_len + length;
            file.bytes_loaded = PREAMBLE_LEN + self.position;
            scan.tags += 1;
            scan.eager.extend(outcome.eager);
        }
        scan.bytes = self.position - start;
        Ok(scan)
    }
}
