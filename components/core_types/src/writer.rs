//! Indenting diagnostics writer.
//!
//! Every component writes user-visible output through an [`IndentingWriter`].
//! The writer has two kinds of channels:
//!
//! - essential output (`write_ln`, `red_ln`, `enter`/`leave`), always shown,
//!   used for disassembly, reports and test failures;
//! - diagnostic channels (`info_ln`, `warn_ln`, `error_ln`), gated by the
//!   [`LogLevel`] and silenced entirely in porcelain mode.
//!
//! `debug_ln` is essential output that is only shown at [`LogLevel::Debug`].

use std::cell::{Cell, RefCell};
use std::io::{self, Write};
use std::rc::Rc;

const RED: &str = "\x1b[91m";
const RESET: &str = "\x1b[0m";
const INDENT: &str = "  ";

/// Verbosity threshold for diagnostic output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    /// Only errors
    Error,
    /// Errors and warnings
    Warn,
    /// Informational messages
    Info,
    /// Everything, including debug lines
    Debug,
}

struct Sinks {
    out: Box<dyn Write>,
    err: Box<dyn Write>,
    level: LogLevel,
    porcelain: bool,
    colors: bool,
}

/// In-memory sink, mostly used to capture output in tests.
#[derive(Clone, Default)]
pub struct SharedBuffer {
    bytes: Rc<RefCell<Vec<u8>>>,
}

impl SharedBuffer {
    /// Create an empty buffer
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything written so far, lossily decoded as UTF-8
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.bytes.borrow()).into_owned()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.bytes.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Shared writer with indentation and level-gated channels.
///
/// Clones share both the sinks and the indentation; [`IndentingWriter::fork`]
/// shares the sinks but starts with its own indentation.
///
/// # Examples
///
/// ```
/// use core_types::{IndentingWriter, LogLevel};
///
/// let (writer, buffer) = IndentingWriter::captured();
/// writer.enter("Module:");
/// writer.write_ln("method main");
/// writer.leave("");
/// writer.debug_ln("hidden at the default level");
///
/// assert_eq!(buffer.contents(), "Module:\n  method main\n");
/// ```
#[derive(Clone)]
pub struct IndentingWriter {
    sinks: Rc<RefCell<Sinks>>,
    padding: Rc<Cell<usize>>,
}

impl IndentingWriter {
    fn with_sinks(out: Box<dyn Write>, err: Box<dyn Write>) -> Self {
        Self {
            sinks: Rc::new(RefCell::new(Sinks {
                out,
                err,
                level: LogLevel::Warn,
                porcelain: false,
                colors: false,
            })),
            padding: Rc::new(Cell::new(0)),
        }
    }

    /// Writer on the process stdout and stderr
    pub fn stdout() -> Self {
        Self::with_sinks(Box::new(io::stdout()), Box::new(io::stderr()))
    }

    /// Writer sending both channels into one in-memory buffer
    pub fn captured() -> (Self, SharedBuffer) {
        let buffer = SharedBuffer::new();
        let writer = Self::with_sinks(Box::new(buffer.clone()), Box::new(buffer.clone()));
        (writer, buffer)
    }

    /// Writer with separate in-memory buffers for stdout and stderr
    pub fn captured_split() -> (Self, SharedBuffer, SharedBuffer) {
        let out = SharedBuffer::new();
        let err = SharedBuffer::new();
        let writer = Self::with_sinks(Box::new(out.clone()), Box::new(err.clone()));
        (writer, out, err)
    }

    /// A writer on the same sinks with its own indentation
    pub fn fork(&self) -> Self {
        Self {
            sinks: Rc::clone(&self.sinks),
            padding: Rc::new(Cell::new(0)),
        }
    }

    /// Set the diagnostic threshold
    pub fn set_log_level(&self, level: LogLevel) {
        self.sinks.borrow_mut().level = level;
    }

    /// Current diagnostic threshold
    pub fn log_level(&self) -> LogLevel {
        self.sinks.borrow().level
    }

    /// Silence every diagnostic channel
    pub fn set_porcelain(&self, porcelain: bool) {
        self.sinks.borrow_mut().porcelain = porcelain;
    }

    /// Whether diagnostic channels are silenced
    pub fn is_porcelain(&self) -> bool {
        self.sinks.borrow().porcelain
    }

    /// Enable ANSI colors for red lines
    pub fn set_colors(&self, colors: bool) {
        self.sinks.borrow_mut().colors = colors;
    }

    fn emit(&self, to_err: bool, line: &str) {
        let pad = INDENT.repeat(self.padding.get());
        let mut sinks = self.sinks.borrow_mut();
        let sink = if to_err { &mut sinks.err } else { &mut sinks.out };
        // Output is best effort, like println!.
        let _ = writeln!(sink, "{}{}", pad, line);
    }

    /// Essential output line
    pub fn write_ln(&self, line: &str) {
        self.emit(false, line);
    }

    /// Essential output, one call per line of `text`
    pub fn write_lns(&self, text: &str) {
        for line in text.lines() {
            self.write_ln(line);
        }
    }

    /// Essential output shown only at [`LogLevel::Debug`]
    pub fn debug_ln(&self, line: &str) {
        if self.log_level() >= LogLevel::Debug {
            self.write_ln(line);
        }
    }

    /// Informational diagnostic
    pub fn info_ln(&self, line: &str) {
        let (level, porcelain) = {
            let sinks = self.sinks.borrow();
            (sinks.level, sinks.porcelain)
        };
        if !porcelain && level >= LogLevel::Info {
            self.emit(false, line);
        }
    }

    /// Warning diagnostic
    pub fn warn_ln(&self, line: &str) {
        let (level, porcelain) = {
            let sinks = self.sinks.borrow();
            (sinks.level, sinks.porcelain)
        };
        if !porcelain && level >= LogLevel::Warn {
            self.emit(true, line);
        }
    }

    /// Error diagnostic
    pub fn error_ln(&self, line: &str) {
        if !self.is_porcelain() {
            self.emit(true, line);
        }
    }

    /// Essential failure line, red when colors are enabled
    pub fn red_ln(&self, line: &str) {
        if self.sinks.borrow().colors {
            self.write_ln(&format!("{}{}{}", RED, line, RESET));
        } else {
            self.write_ln(line);
        }
    }

    /// [`IndentingWriter::red_ln`] for each line
    pub fn red_lns<S: AsRef<str>>(&self, lines: &[S]) {
        for line in lines {
            self.red_ln(line.as_ref());
        }
    }

    /// Write a header line and indent
    pub fn enter(&self, line: &str) {
        self.write_ln(line);
        self.indent();
    }

    /// Outdent and write a footer line unless it is empty
    pub fn leave(&self, line: &str) {
        self.outdent();
        if !line.is_empty() {
            self.write_ln(line);
        }
    }

    /// Increase indentation
    pub fn indent(&self) {
        self.padding.set(self.padding.get() + 1);
    }

    /// Decrease indentation
    pub fn outdent(&self) {
        self.padding.set(self.padding.get().saturating_sub(1));
    }
}

impl std::fmt::Debug for IndentingWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndentingWriter")
            .field("padding", &self.padding.get())
            .field("level", &self.log_level())
            .finish()
    }
}
