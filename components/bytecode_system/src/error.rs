//! Error types for module decoding, assembly, verification and catalogs

use thiserror::Error;

/// Structural errors raised while decoding a module.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AbcError {
    /// The buffer ended in the middle of a structure
    #[error("unexpected end of data at offset {offset}")]
    Truncated {
        /// Byte offset where more data was expected
        offset: u64,
    },
    /// Version header is not supported
    #[error("unsupported version {major}.{minor}")]
    UnsupportedVersion {
        /// Major version
        major: u16,
        /// Minor version
        minor: u16,
    },
    /// A variable-length integer does not fit 30 bits
    #[error("invalid u30 at offset {offset}")]
    InvalidU30 {
        /// Byte offset of the integer
        offset: u64,
    },
    /// A string constant is not valid UTF-8
    #[error("invalid UTF-8 string at offset {offset}")]
    InvalidUtf8 {
        /// Byte offset of the string
        offset: u64,
    },
    /// Unknown constant kind tag
    #[error("unknown constant kind {kind}")]
    UnknownConstantKind {
        /// The tag byte
        kind: u8,
    },
    /// Constant pool index out of range
    #[error("constant index {index} out of range")]
    ConstantOutOfRange {
        /// The index
        index: u32,
    },
    /// Constant has the wrong kind for its use
    #[error("constant {index} is not a {expected}")]
    ConstantKind {
        /// The index
        index: u32,
        /// Kind required by the reference
        expected: &'static str,
    },
    /// Method index out of range
    #[error("method index {index} out of range")]
    MethodOutOfRange {
        /// The index
        index: u32,
    },
    /// Unknown opcode byte
    #[error("unknown opcode 0x{opcode:02x} at offset {offset}")]
    UnknownOpcode {
        /// The opcode byte
        opcode: u8,
        /// Byte offset of the opcode
        offset: u64,
    },
    /// A method declares more local slots than a frame may hold
    #[error("method {method} declares {count} locals, more than {}", crate::module::MAX_LOCALS)]
    TooManyLocals {
        /// Method index
        method: u32,
        /// Declared local count
        count: u32,
    },
    /// Unknown definition kind tag
    #[error("unknown definition kind {kind}")]
    UnknownDefinitionKind {
        /// The tag byte
        kind: u8,
    },
    /// Data remains after the module
    #[error("{count} trailing bytes after module")]
    TrailingBytes {
        /// Number of unread bytes
        count: u64,
    },
}

/// Errors raised by the text assembler.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("line {line}: {message}")]
pub struct AssembleError {
    /// 1-based source line
    pub line: usize,
    /// Description of the problem
    pub message: String,
}

impl AssembleError {
    pub(crate) fn new(line: usize, message: impl Into<String>) -> Self {
        Self {
            line,
            message: message.into(),
        }
    }
}

/// A method rejected by the verifier.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("verify error in {method} at instruction {instruction}: {message}")]
pub struct VerifyError {
    /// Name of the method
    pub method: String,
    /// Offending instruction index
    pub instruction: usize,
    /// Description of the problem
    pub message: String,
}

/// Errors raised while building or reading a global-symbol catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The JSON index is malformed
    #[error("invalid catalog index: {0}")]
    Index(#[from] serde_json::Error),
    /// An index entry points outside the block buffer
    #[error("catalog entry {name} ({offset}+{length}) exceeds {size} bytes of module data")]
    OutOfRange {
        /// Entry name
        name: String,
        /// Entry offset
        offset: usize,
        /// Entry length
        length: usize,
        /// Size of the block buffer
        size: usize,
    },
    /// The module stored for an entry does not decode
    #[error("catalog entry {name}: {source}")]
    Module {
        /// Entry name
        name: String,
        /// Decoding failure
        source: AbcError,
    },
}
