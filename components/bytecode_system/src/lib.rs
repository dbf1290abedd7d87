//! Bytecode modules for the virtual machine
//!
//! This crate defines the instruction set, the binary module format and the
//! tools that work on it.
//!
//! # Features
//!
//! - Stack-based instruction set with constant pool operands
//! - Binary module decoding and encoding with structural validation
//! - Text assembler and an assembler-compatible disassembly trace
//! - Stack-depth verifier
//! - Lazily decoded global-symbol catalogs
//!
//! # Example
//!
//! ```
//! use bytecode_system::assemble;
//!
//! let module = assemble(
//!     ".method main\n  pushstring \"hi\"\n  returnvalue\n.end\n.init main",
//!     "hi.abc",
//! )
//! .unwrap();
//! module.verify().unwrap();
//! assert!(module.disassemble().contains("pushstring \"hi\""));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod assembler;
pub mod catalog;
pub mod disassembler;
pub mod error;
pub mod module;
pub mod opcode;
pub mod reader;
pub mod verifier;

// Re-export main types at crate root
pub use assembler::assemble;
pub use catalog::{AbcCatalog, CatalogEntry};
pub use error::{AbcError, AssembleError, CatalogError, VerifyError};
pub use module::{
    AbcFile, Constant, Definition, DefinitionKind, MethodInfo, MAJOR_VERSION, MAX_LOCALS,
    MINOR_VERSION,
};
pub use opcode::{OperandKind, Opcode};
pub use reader::{AbcReader, AbcWriter};
pub use verifier::verify_method;
