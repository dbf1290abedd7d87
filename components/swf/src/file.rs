//! Container file model, filled in tag by tag while loading

use crate::error::SwfError;
use crate::stream::{Rect, SwfStream};
use crate::tag::SwfTag;
use std::collections::BTreeMap;

/// DoABC flag: defer execution until a class is needed
pub const ABC_LAZY_INITIALIZE: u32 = 1;

/// FileAttributes flag: the file carries AS3 bytecode
pub const FILE_ATTRIBUTE_AS3: u32 = 0x08;

/// A bytecode module embedded in the container
#[derive(Debug, Clone, PartialEq)]
pub struct AbcBlock {
    /// Name from the DoABC tag, empty for DoABC-define
    pub name: String,
    /// DoABC flags
    pub flags: u32,
    /// Module bytes
    pub data: Vec<u8>,
    /// Frame the block belongs to
    pub frame: usize,
}

impl AbcBlock {
    /// Whether execution should wait until a class is needed
    pub fn is_lazy(&self) -> bool {
        self.flags & ABC_LAZY_INITIALIZE != 0
    }
}

/// One frame of the main timeline
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SwfFrame {
    /// Label from a FrameLabel tag
    pub label: Option<String>,
    /// Indices into [`SwfFile::abc_blocks`]
    pub abc_blocks: Vec<usize>,
    /// Display-list and other tags recorded in the frame
    pub tag_count: usize,
}

/// Kind of a dictionary entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolKind {
    /// Bitmap
    Image,
    /// Font
    Font,
    /// Raw embedded bytes
    BinaryData,
}

/// A character definition from the dictionary
#[derive(Debug, Clone, PartialEq)]
pub struct Symbol {
    /// Character id
    pub id: u16,
    /// Kind of definition
    pub kind: SymbolKind,
    /// Defining tag
    pub tag: SwfTag,
    /// Font name, when the definition has one
    pub name: Option<String>,
    /// Body size in bytes
    pub length: usize,
}

impl Symbol {
    /// Whether the loader announces the symbol as soon as it is parsed
    pub fn is_eager(&self) -> bool {
        matches!(self.kind, SymbolKind::Image | SymbolKind::Font)
    }
}

/// Position and size of a tag in the uncompressed file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TagRecord {
    /// Tag
    pub tag: SwfTag,
    /// File offset of the tag header
    pub offset: usize,
    /// Body length
    pub length: usize,
}

/// Header fields read before any tag
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SwfHeader {
    /// Whether the body is zlib-compressed
    pub compressed: bool,
    /// Format version
    pub version: u8,
    /// Uncompressed length including the 8-byte preamble
    pub file_length: usize,
    /// Stage bounds in twips
    pub bounds: Rect,
    /// Frames per second
    pub frame_rate: f64,
    /// Declared number of frames
    pub frame_count: u16,
}

/// A container file as far as it has been loaded.
#[derive(Debug, Clone, PartialEq)]
pub struct SwfFile {
    /// Header fields
    pub header: SwfHeader,
    /// FileAttributes flags, if the tag was present
    pub attributes: Option<u32>,
    /// Stage background color as 0xRRGGBB
    pub background_color: Option<u32>,
    /// Bytecode modules in file order
    pub abc_blocks: Vec<AbcBlock>,
    /// Completed frames
    pub frames: Vec<SwfFrame>,
    /// Dictionary by character id
    pub dictionary: BTreeMap<u16, Symbol>,
    /// Class names bound to character ids; id 0 is the document class
    pub symbol_classes: Vec<(u16, String)>,
    /// Exported symbol names
    pub exports: Vec<(u16, String)>,
    /// Every tag seen, in order
    pub tags: Vec<TagRecord>,
    /// Uncompressed bytes parsed so far, preamble included
    pub bytes_loaded: usize,
    pending_frame: SwfFrame,
    ended: bool,
}

/// What applying one tag discovered
#[derive(Debug, Default)]
pub(crate) struct TagOutcome {
    pub(crate) eager: Option<Symbol>,
}

impl SwfFile {
    pub(crate) fn new(header: SwfHeader) -> Self {
        Self {
            header,
            attributes: None,
            background_color: None,
            abc_blocks: Vec::new(),
            frames: Vec::new(),
            dictionary: BTreeMap::new(),
            symbol_classes: Vec::new(),
            exports: Vec::new(),
            tags: Vec::new(),
            bytes_loaded: 0,
            pending_frame: SwfFrame::default(),
            ended: false,
        }
    }

    /// Whether the End tag has been reached
    pub fn is_complete(&self) -> bool {
        self.ended
    }

    /// Document class name, if a SymbolClass tag bound id 0
    pub fn main_class(&self) -> Option<&str> {
        self.symbol_classes
            .iter()
            .find(|(id, _)| *id == 0)
            .map(|(_, name)| name.as_str())
    }

    /// Whether the file declares AS3 content
    pub fn is_as3(&self) -> bool {
        self.attributes
            .map(|flags| flags & FILE_ATTRIBUTE_AS3 != 0)
            .unwrap_or(false)
    }

    /// Bytecode blocks of frame `index`
    pub fn frame_abc_blocks(&self, index: usize) -> impl Iterator<Item = &AbcBlock> + '_ {
        self.frames
            .get(index)
            .map(|frame| frame.abc_blocks.as_slice())
            .unwrap_or(&[])
            .iter()
            .filter_map(move |i| self.abc_blocks.get(*i))
    }

    /// Fold one tag into the file
    pub(crate) fn apply_tag(
        &mut self,
        tag: SwfTag,
        offset: usize,
        body: &[u8],
        body_offset: usize,
    ) -> Result<TagOutcome, SwfError> {
        self.tags.push(TagRecord {
            tag,
            offset,
            length: body.len(),
        });
        let malformed = |e: SwfError| match e {
            SwfError::Truncated { .. } => SwfError::MalformedTag {
                tag: tag.name(),
                offset,
                message: e.to_string(),
            },
            other => other,
        };
        self.decode_tag(tag, body, body_offset).map_err(malformed)
    }

    fn decode_tag(
        &mut self,
        tag: SwfTag,
        body: &[u8],
        body_offset: usize,
    ) -> Result<TagOutcome, SwfError> {
        let mut outcome = TagOutcome::default();
        let mut stream = SwfStream::new(body, body_offset);
        match tag {
            SwfTag::End => {
                let frame = std::mem::take(&mut self.pending_frame);
                if frame.label.is_some() || !frame.abc_blocks.is_empty() {
                    self.frames.push(frame);
                }
                self.ended = true;
            }
            SwfTag::ShowFrame => {
                let frame = std::mem::take(&mut self.pending_frame);
                self.frames.push(frame);
            }
            SwfTag::DoAbc => {
                let flags = stream.read_u32()?;
                let name = stream.read_cstring()?;
                let data = stream.read_rest().to_vec();
                self.push_abc(name, flags, data);
            }
            SwfTag::DoAbcDefine => {
                let data = stream.read_rest().to_vec();
                self.push_abc(String::new(), 0, data);
            }
            SwfTag::SymbolClass => {
                let count = stream.read_u16()?;
                for _ in 0..count {
                    let id = stream.read_u16()?;
                    let name = stream.read_cstring()?;
                    self.symbol_classes.push((id, name));
                }
            }
            SwfTag::ExportAssets => {
                let count = stream.read_u16()?;
                for _ in 0..count {
                    let id = stream.read_u16()?;
                    let name = stream.read_cstring()?;
                    self.exports.push((id, name));
                }
            }
            SwfTag::FrameLabel => {
                self.pending_frame.label = Some(stream.read_cstring()?);
            }
            SwfTag::FileAttributes => {
                self.attributes = Some(stream.read_u32()?);
            }
            SwfTag::SetBackgroundColor => {
                let rgb = stream.read_bytes(3)?;
                self.background_color = Some(
                    (u32::from(rgb[0]) << 16) | (u32::from(rgb[1]) << 8) | u32::from(rgb[2]),
                );
            }
            SwfTag::DefineBinaryData => {
                let id = stream.read_u16()?;
                stream.read_u32()?;
                let symbol = Symbol {
                    id,
                    kind: SymbolKind::BinaryData,
                    tag,
                    name: None,
                    length: stream.remaining(),
                };
                self.dictionary.insert(id, symbol);
            }
            _ if tag.is_image() || tag.is_font() => {
                let id = stream.read_u16()?;
                let (kind, name) = if tag.is_image() {
                    (SymbolKind::Image, None)
                } else {
                    (SymbolKind::Font, font_name(tag, &mut stream)?)
                };
                let symbol = Symbol {
                    id,
                    kind,
                    tag,
                    name,
                    length: body.len(),
                };
                self.dictionary.insert(id, symbol.clone());
                outcome.eager = Some(symbol);
            }
            _ => {
                self.pending_frame.tag_count += 1;
            }
        }
        Ok(outcome)
    }

    fn push_abc(&mut self, name: String, flags: u32, data: Vec<u8>) {
        let index = self.abc_blocks.len();
        self.abc_blocks.push(AbcBlock {
            name,
            flags,
            data,
            frame: self.frames.len(),
        });
        self.pending_frame.abc_blocks.push(index);
    }
}

fn font_name(tag: SwfTag, stream: &mut SwfStream<'_>) -> Result<Option<String>, SwfError> {
    match tag {
        SwfTag::DefineFont2 | SwfTag::DefineFont3 => {
            stream.read_u8()?;
            stream.read_u8()?;
            let len = usize::from(stream.read_u8()?);
            let bytes = stream.read_bytes(len)?;
            let name = String::from_utf8_lossy(bytes);
            Ok(Some(name.trim_end_matches('\0').to_string()))
        }
        SwfTag::DefineFont4 => {
            stream.read_u8()?;
            Ok(Some(stream.read_cstring()?))
        }
        _ => Ok(None),
    }
}
