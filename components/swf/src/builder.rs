//! Encoder for container files, used by tests and the fuzz mill

use crate::file::{ABC_LAZY_INITIALIZE, FILE_ATTRIBUTE_AS3};
use crate::parser::PREAMBLE_LEN;
use crate::stream::Rect;
use crate::tag::SwfTag;
use byteorder::{LittleEndian, WriteBytesExt};
use flate2::write::ZlibEncoder;
use flate2::Compression;
use std::io::Write;

/// Builds a container file tag by tag.
///
/// An End tag is appended by [`SwfBuilder::build`].
#[derive(Debug, Clone)]
pub struct SwfBuilder {
    version: u8,
    compressed: bool,
    bounds: Rect,
    frame_rate: f64,
    frames: u16,
    tags: Vec<(SwfTag, Vec<u8>)>,
}

impl Default for SwfBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SwfBuilder {
    /// Version 10, 550x400 pixels, 24 fps, uncompressed
    pub fn new() -> Self {
        Self {
            version: 10,
            compressed: false,
            bounds: Rect {
                x_min: 0,
                x_max: 11000,
                y_min: 0,
                y_max: 8000,
            },
            frame_rate: 24.0,
            frames: 0,
            tags: Vec::new(),
        }
    }

    /// Set the format version
    pub fn version(mut self, version: u8) -> Self {
        self.version = version;
        self
    }

    /// Zlib-compress the body (`CWS`)
    pub fn compressed(mut self, compressed: bool) -> Self {
        self.compressed = compressed;
        self
    }

    /// Set the stage bounds in twips
    pub fn bounds(mut self, bounds: Rect) -> Self {
        self.bounds = bounds;
        self
    }

    /// Set the frame rate; stored as 8.8 fixed point
    pub fn frame_rate(mut self, frame_rate: f64) -> Self {
        self.frame_rate = frame_rate;
        self
    }

    /// Number of tags added so far
    pub fn tag_count(&self) -> usize {
        self.tags.len()
    }

    /// Append a tag with a raw body
    pub fn tag(mut self, tag: SwfTag, body: Vec<u8>) -> Self {
        if tag == SwfTag::ShowFrame {
            self.frames = self.frames.saturating_add(1);
        }
        self.tags.push((tag, body));
        self
    }

    /// FileAttributes with the AS3 flag
    pub fn as3(self) -> Self {
        self.file_attributes(FILE_ATTRIBUTE_AS3)
    }

    /// FileAttributes with the given flags
    pub fn file_attributes(self, flags: u32) -> Self {
        let mut body = Vec::new();
        let _ = body.write_u32::<LittleEndian>(flags);
        self.tag(SwfTag::FileAttributes, body)
    }

    /// SetBackgroundColor from 0xRRGGBB
    pub fn background_color(self, rgb: u32) -> Self {
        let body = vec![(rgb >> 16) as u8, (rgb >> 8) as u8, rgb as u8];
        self.tag(SwfTag::SetBackgroundColor, body)
    }

    /// DoABC with the lazy-initialize flag
    pub fn do_abc(self, name: &str, data: Vec<u8>) -> Self {
        self.do_abc_with_flags(name, ABC_LAZY_INITIALIZE, data)
    }

    /// DoABC with explicit flags
    pub fn do_abc_with_flags(self, name: &str, flags: u32, data: Vec<u8>) -> Self {
        let mut body = Vec::with_capacity(data.len() + name.len() + 5);
        let _ = body.write_u32::<LittleEndian>(flags);
        push_cstring(&mut body, name);
        body.extend_from_slice(&data);
        self.tag(SwfTag::DoAbc, body)
    }

    /// DoABC-define carrying bare module bytes
    pub fn do_abc_define(self, data: Vec<u8>) -> Self {
        self.tag(SwfTag::DoAbcDefine, data)
    }

    /// SymbolClass binding one id to a class name
    pub fn symbol_class(self, id: u16, name: &str) -> Self {
        self.tag(SwfTag::SymbolClass, named_ids(&[(id, name)]))
    }

    /// ExportAssets for one id
    pub fn export(self, id: u16, name: &str) -> Self {
        self.tag(SwfTag::ExportAssets, named_ids(&[(id, name)]))
    }

    /// Label the current frame
    pub fn frame_label(self, label: &str) -> Self {
        let mut body = Vec::new();
        push_cstring(&mut body, label);
        self.tag(SwfTag::FrameLabel, body)
    }

    /// DefineBitsLossless2 with an opaque payload
    pub fn define_image(self, id: u16, payload: &[u8]) -> Self {
        let mut body = Vec::with_capacity(payload.len() + 2);
        let _ = body.write_u16::<LittleEndian>(id);
        body.extend_from_slice(payload);
        self.tag(SwfTag::DefineBitsLossless2, body)
    }

    /// DefineFont3 with a name and no glyphs
    pub fn define_font(self, id: u16, name: &str) -> Self {
        let name = &name.as_bytes()[..name.len().min(255)];
        let mut body = Vec::new();
        let _ = body.write_u16::<LittleEndian>(id);
        body.push(0);
        body.push(0);
        body.push(name.len() as u8);
        body.extend_from_slice(name);
        let _ = body.write_u16::<LittleEndian>(0);
        self.tag(SwfTag::DefineFont3, body)
    }

    /// DefineBinaryData
    pub fn define_binary_data(self, id: u16, data: &[u8]) -> Self {
        let mut body = Vec::with_capacity(data.len() + 6);
        let _ = body.write_u16::<LittleEndian>(id);
        let _ = body.write_u32::<LittleEndian>(0);
        body.extend_from_slice(data);
        self.tag(SwfTag::DefineBinaryData, body)
    }

    /// Close the current frame
    pub fn show_frame(self) -> Self {
        self.tag(SwfTag::ShowFrame, Vec::new())
    }

    /// Encode the file
    pub fn build(&self) -> Vec<u8> {
        // Writing into a Vec cannot fail.
        let mut body = Vec::new();
        self.bounds.write(&mut body);
        let rate = (self.frame_rate * 256.0).round().clamp(0.0, f64::from(u16::MAX)) as u16;
        let _ = body.write_u16::<LittleEndian>(rate);
        let _ = body.write_u16::<LittleEndian>(self.frames);
        for (tag, data) in &self.tags {
            write_tag(&mut body, *tag, data);
        }
        write_tag(&mut body, SwfTag::End, &[]);

        let mut out = Vec::with_capacity(body.len() + PREAMBLE_LEN);
        out.extend_from_slice(if self.compressed { b"CWS" } else { b"FWS" });
        out.push(self.version);
        let _ = out.write_u32::<LittleEndian>((body.len() + PREAMBLE_LEN) as u32);
        if self.compressed {
            let mut encoder = ZlibEncoder::new(out, Compression::default());
            let _ = encoder.write_all(&body);
            encoder.finish().unwrap_or_default()
        } else {
            out.extend_from_slice(&body);
            out
        }
    }
}

fn push_cstring(out: &mut Vec<u8>, text: &str) {
    out.extend(text.bytes().filter(|b| *b != 0));
    out.push(0);
}

fn named_ids(entries: &[(u16, &str)]) -> Vec<u8> {
    let mut body = Vec::new();
    let _ = body.write_u16::<LittleEndian>(entries.len() as u16);
    for (id, name) in entries {
        let _ = body.write_u16::<LittleEndian>(*id);
        push_cstring(&mut body, name);
    }
    body
}

fn write_tag(out: &mut Vec<u8>, tag: SwfTag, body: &[u8]) {
    let code = tag.code() << 6;
    if body.len() >= 0x3f || tag.is_image() {
        let _ = out.write_u16::<LittleEndian>(code | 0x3f);
        let _ = out.write_u32::<LittleEndian>(body.len() as u32);
    } else {
        let _ = out.write_u16::<LittleEndian>(code | body.len() as u16);
    }
    out.extend_from_slice(body);
}
