//! Capabilities the embedding program hands to running bytecode
//!
//! Native intrinsics never reach process state directly. Output, shell
//! commands and unit-test registration all go through a [`Host`] passed by
//! `&mut` into each execution.

use core_types::{IndentingWriter, Value};

/// An entry pushed onto the unit-test queue by `pushUnitTest`
#[derive(Debug, Clone, PartialEq)]
pub enum UnitTestRegistration {
    /// Run the following test this many times; zero skips it
    Repeat(u32),
    /// A test closure
    Test {
        /// Name of the method backing the closure
        name: String,
        /// The callable value
        function: Value,
    },
}

/// Services available to natives while bytecode runs.
pub trait Host {
    /// Output of the `trace` native
    fn trace(&mut self, message: &str);

    /// `fscommand(command, args)` from hosted content
    fn fs_command(&mut self, _command: &str, _args: &str) {}

    /// `pushUnitTest(value)` from a test script
    fn register_unit_test(&mut self, _registration: UnitTestRegistration) {}
}

/// Host that writes traces to a diagnostics writer and ignores the rest
#[derive(Debug, Clone)]
pub struct WriterHost {
    writer: IndentingWriter,
}

impl WriterHost {
    /// Create a host writing to `writer`
    pub fn new(writer: IndentingWriter) -> Self {
        Self { writer }
    }
}

impl Host for WriterHost {
    fn trace(&mut self, message: &str) {
        self.writer.write_ln(message);
    }
}
