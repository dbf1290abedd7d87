//! Container tag codes

/// Tag codes understood by the loader.
///
/// Anything else is kept as [`SwfTag::Unknown`] with its raw code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SwfTag {
    /// End of the file or of a sprite
    End,
    /// Closes the current frame
    ShowFrame,
    /// Vector shape definition
    DefineShape,
    /// Places a character on the display list
    PlaceObject,
    /// Removes a character from the display list
    RemoveObject,
    /// JPEG image without tables
    DefineBits,
    /// Button definition
    DefineButton,
    /// Shared JPEG tables
    JpegTables,
    /// Stage background color
    SetBackgroundColor,
    /// Font glyphs
    DefineFont,
    /// Static text
    DefineText,
    /// AVM1 actions
    DoAction,
    /// Font metrics for DefineFont
    DefineFontInfo,
    /// Event sound
    DefineSound,
    /// Starts an event sound
    StartSound,
    /// Lossless bitmap
    DefineBitsLossless,
    /// JPEG with embedded tables
    DefineBitsJpeg2,
    /// Extended shape definition
    DefineShape2,
    /// Password hash for protection
    Protect,
    /// Version 2 place object
    PlaceObject2,
    /// Version 2 remove object
    RemoveObject2,
    /// Shape with alpha
    DefineShape3,
    /// Dynamic text field
    DefineEditText,
    /// Movie clip
    DefineSprite,
    /// Named frame
    FrameLabel,
    /// Streaming sound header
    SoundStreamHead2,
    /// JPEG with alpha channel
    DefineBitsJpeg3,
    /// Lossless bitmap with alpha
    DefineBitsLossless2,
    /// Shared symbols
    ExportAssets,
    /// Extended font
    DefineFont2,
    /// AS3 bytecode without flags or name
    DoAbcDefine,
    /// Font with CFF glyphs in twentieths
    DefineFont3,
    /// Class names bound to character ids
    SymbolClass,
    /// Per-file flags
    FileAttributes,
    /// XMP metadata
    Metadata,
    /// Scene and frame labels
    DefineSceneAndFrameLabelData,
    /// AS3 bytecode with flags and name
    DoAbc,
    /// Shape with stroke hints
    DefineShape4,
    /// Arbitrary embedded bytes
    DefineBinaryData,
    /// JPEG with deblocking
    DefineBitsJpeg4,
    /// Embedded OpenType font
    DefineFont4,
    /// Any other tag
    Unknown(u16),
}

const KNOWN: &[(u16, SwfTag, &str)] = &[
    (0, SwfTag::End, "END"),
    (1, SwfTag::ShowFrame, "SHOW_FRAME"),
    (2, SwfTag::DefineShape, "DEFINE_SHAPE"),
    (4, SwfTag::PlaceObject, "PLACE_OBJECT"),
    (5, SwfTag::RemoveObject, "REMOVE_OBJECT"),
    (6, SwfTag::DefineBits, "DEFINE_BITS"),
    (7, SwfTag::DefineButton, "DEFINE_BUTTON"),
    (8, SwfTag::JpegTables, "JPEG_TABLES"),
    (9, SwfTag::SetBackgroundColor, "SET_BACKGROUND_COLOR"),
    (10, SwfTag::DefineFont, "DEFINE_FONT"),
    (11, SwfTag::DefineText, "DEFINE_TEXT"),
    (12, SwfTag::DoAction, "DO_ACTION"),
    (13, SwfTag::DefineFontInfo, "DEFINE_FONT_INFO"),
    (14, SwfTag::DefineSound, "DEFINE_SOUND"),
    (15, SwfTag::StartSound, "START_SOUND"),
    (20, SwfTag::DefineBitsLossless, "DEFINE_BITS_LOSSLESS"),
    (21, SwfTag::DefineBitsJpeg2, "DEFINE_BITS_JPEG2"),
    (22, SwfTag::DefineShape2, "DEFINE_SHAPE2"),
    (24, SwfTag::Protect, "PROTECT"),
    (26, SwfTag::PlaceObject2, "PLACE_OBJECT2"),
    (28, SwfTag::RemoveObject2, "REMOVE_OBJECT2"),
    (32, SwfTag::DefineShape3, "DEFINE_SHAPE3"),
    (37, SwfTag::DefineEditText, "DEFINE_EDIT_TEXT"),
    (39, SwfTag::DefineSprite, "DEFINE_SPRITE"),
    (43, SwfTag::FrameLabel, "FRAME_LABEL"),
    (45, SwfTag::SoundStreamHead2, "SOUND_STREAM_HEAD2"),
    (35, SwfTag::DefineBitsJpeg3, "DEFINE_BITS_JPEG3"),
    (36, SwfTag::DefineBitsLossless2, "DEFINE_BITS_LOSSLESS2"),
    (56, SwfTag::ExportAssets, "EXPORT_ASSETS"),
    (48, SwfTag::DefineFont2, "DEFINE_FONT2"),
    (72, SwfTag::DoAbcDefine, "DO_ABC_DEFINE"),
    (75, SwfTag::DefineFont3, "DEFINE_FONT3"),
    (76, SwfTag::SymbolClass, "SYMBOL_CLASS"),
    (69, SwfTag::FileAttributes, "FILE_ATTRIBUTES"),
    (77, SwfTag::Metadata, "METADATA"),
    (86, SwfTag::DefineSceneAndFrameLabelData, "DEFINE_SCENE_AND_FRAME_LABEL_DATA"),
    (82, SwfTag::DoAbc, "DO_ABC"),
    (83, SwfTag::DefineShape4, "DEFINE_SHAPE4"),
    (87, SwfTag::DefineBinaryData, "DEFINE_BINARY_DATA"),
    (90, SwfTag::DefineBitsJpeg4, "DEFINE_BITS_JPEG4"),
    (91, SwfTag::DefineFont4, "DEFINE_FONT4"),
];

impl SwfTag {
    /// Classify a raw tag code
    pub fn from_code(code: u16) -> Self {
        KNOWN
            .iter()
            .find(|(c, _, _)| *c == code)
            .map(|(_, tag, _)| *tag)
            .unwrap_or(SwfTag::Unknown(code))
    }

    /// Raw tag code
    pub fn code(self) -> u16 {
        match self {
            SwfTag::Unknown(code) => code,
            tag => KNOWN
                .iter()
                .find(|(_, t, _)| *t == tag)
                .map(|(c, _, _)| *c)
                .unwrap_or_default(),
        }
    }

    /// Upper-case name, or `TAG<code>` for unknown tags
    pub fn name(self) -> String {
        KNOWN
            .iter()
            .find(|(_, t, _)| *t == self)
            .map(|(_, _, name)| name.to_string())
            .unwrap_or_else(|| format!("TAG{}", self.code()))
    }

    /// Look a tag up by name; `CODE_` prefixes are accepted
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.strip_prefix("CODE_").unwrap_or(name);
        KNOWN
            .iter()
            .find(|(_, _, n)| *n == name)
            .map(|(_, tag, _)| *tag)
    }

    /// Whether the tag defines a bitmap
    pub fn is_image(self) -> bool {
        matches!(
            self,
            SwfTag::DefineBits
                | SwfTag::DefineBitsJpeg2
                | SwfTag::DefineBitsJpeg3
                | SwfTag::DefineBitsJpeg4
                | SwfTag::DefineBitsLossless
                | SwfTag::DefineBitsLossless2
        )
    }

    /// Whether the tag defines a font
    pub fn is_font(self) -> bool {
        matches!(
            self,
            SwfTag::DefineFont | SwfTag::DefineFont2 | SwfTag::DefineFont3 | SwfTag::DefineFont4
        )
    }

    /// Whether the tag carries a bytecode module
    pub fn is_abc(self) -> bool {
        matches!(self, SwfTag::DoAbc | SwfTag::DoAbcDefine)
    }
}

impl std::fmt::Display for SwfTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name())
    }
}
