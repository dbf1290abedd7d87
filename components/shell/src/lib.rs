//! AVM shell library
//!
//! Drives bytecode modules (`.abc`), container files (`.swf`) and unit-test
//! scripts (`.js`) through the parse, disassemble, compile and execute
//! pipelines. The `avm-shell` binary is a thin wrapper around [`Shell`].
//!
//! # Example
//!
//! ```
//! use clap::Parser;
//! use core_types::IndentingWriter;
//! use shell::{Cli, Outcome, Shell};
//!
//! let cli = Cli::try_parse_from(["avm-shell", "--parse"]).unwrap();
//! let (writer, _) = IndentingWriter::captured();
//! let mut shell = Shell::new(cli, writer).unwrap();
//! assert_eq!(shell.run().unwrap(), Outcome::Passed);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod cli;
pub mod error;
pub mod extract;
pub mod fuzz;
pub mod host;
pub mod parse;
pub mod shell;
pub mod timeline;
pub mod unit;

// Re-export main types at crate root
pub use cli::{Cli, InputKind};
pub use error::{ParseFailure, ShellError, ShellResult};
pub use extract::extract_abcs_from_swf;
pub use fuzz::{MilledSwf, MilledTag, Mill};
pub use host::ShellPlayer;
pub use parse::{ignore_tag, parse_file, DatabaseRecord, ParseOptions};
pub use shell::{Outcome, Shell};
pub use timeline::{Counter, SectionStats, Timeline, TimelineSnapshot};
pub use unit::{test_entry, TestSession, UnitTestReport};
