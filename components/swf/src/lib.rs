//! Container files embedding bytecode modules
//!
//! This crate reads the tag-based container format incrementally and
//! reports what it finds through a listener.
//!
//! # Features
//!
//! - `FWS` and zlib-compressed `CWS` files, whole or streamed in chunks
//! - Frames, bytecode blocks, dictionary, symbol classes and exports
//! - Eagerly announced images and fonts with acknowledgement gating
//! - A builder for writing files
//!
//! # Example
//!
//! ```
//! use swf::{FileLoader, LoadListener, SwfBuilder, SwfError, SwfFile};
//!
//! struct Frames(usize);
//!
//! impl LoadListener for Frames {
//!     fn on_load_open(&mut self, _file: &SwfFile) {}
//!     fn on_load_error(&mut self, _error: &SwfError) {}
//!     fn on_load_complete(&mut self, file: &SwfFile) {
//!         self.0 = file.frames.len();
//!     }
//! }
//!
//! let bytes = SwfBuilder::new().compressed(true).show_frame().show_frame().build();
//! let mut loader = FileLoader::new(Frames(0));
//! loader.load_bytes(&bytes).unwrap();
//! assert_eq!(loader.listener().0, 2);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod builder;
pub mod error;
pub mod file;
pub mod loader;
mod parser;
pub mod stream;
pub mod tag;

// Re-export main types at crate root
pub use builder::SwfBuilder;
pub use error::SwfError;
pub use file::{
    AbcBlock, SwfFile, SwfFrame, SwfHeader, Symbol, SymbolKind, TagRecord, ABC_LAZY_INITIALIZE,
    FILE_ATTRIBUTE_AS3,
};
pub use loader::{FileLoader, LoadListener, LoadProgress, SymbolsAck};
pub use parser::PREAMBLE_LEN;
pub use stream::{Rect, SwfStream};
pub use tag::SwfTag;
