//! Container loading errors

use thiserror::Error;

/// Errors raised while loading a container file.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SwfError {
    /// The first three bytes are not a known signature
    #[error("invalid signature {0:?}")]
    InvalidSignature(String),
    /// The signature names a compression scheme the loader lacks
    #[error("unsupported compression: {0}")]
    UnsupportedCompression(&'static str),
    /// The zlib body does not inflate
    #[error("decompression failed: {0}")]
    Decompress(String),
    /// A structure ended before its declared size
    #[error("unexpected end of data at offset {offset}")]
    Truncated {
        /// File offset where more data was expected
        offset: usize,
    },
    /// The input ended before the file was complete
    #[error("file ended after {loaded} of {expected} bytes")]
    Incomplete {
        /// Bytes of the uncompressed file seen
        loaded: usize,
        /// Declared uncompressed length
        expected: usize,
    },
    /// A tag body does not match its declared layout
    #[error("malformed {tag} tag at offset {offset}: {message}")]
    MalformedTag {
        /// Tag name
        tag: String,
        /// File offset of the tag header
        offset: usize,
        /// Description of the problem
        message: String,
    },
    /// Data was pushed after the load ended
    #[error("load already finished")]
    Closed,
}
