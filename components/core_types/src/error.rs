//! VM error types and error handling.
//!
//! This module provides the error raised while running bytecode, along with
//! the stack trace captured at the throw site.

use crate::StackFrame;
use std::fmt;

/// The kind of VM error.
///
/// These correspond to the error classes the intrinsics can raise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// A user-level `throw` or failed assertion
    Error,
    /// Type error (e.g., calling a non-function)
    TypeError,
    /// Reference to an undefined global
    ReferenceError,
    /// Value out of allowed range, including call stack exhaustion
    RangeError,
    /// Bytecode rejected by the verifier
    VerifyError,
    /// Internal engine error
    InternalError,
}

impl ErrorKind {
    /// The class name shown in diagnostics.
    pub fn name(&self) -> &'static str {
        match self {
            ErrorKind::Error => "Error",
            ErrorKind::TypeError => "TypeError",
            ErrorKind::ReferenceError => "ReferenceError",
            ErrorKind::RangeError => "RangeError",
            ErrorKind::VerifyError => "VerifyError",
            ErrorKind::InternalError => "InternalError",
        }
    }
}

/// A VM error with message and stack trace.
///
/// This struct represents an exception that escaped the running bytecode.
/// It includes the error class, message and the call stack at the throw
/// site, innermost frame first.
///
/// # Examples
///
/// ```
/// use core_types::{ErrorKind, VmError};
///
/// let error = VmError::new(ErrorKind::ReferenceError, "missing is not defined");
///
/// assert_eq!(error.to_string(), "ReferenceError: missing is not defined");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct VmError {
    /// The class of error
    pub kind: ErrorKind,
    /// Human-readable error message
    pub message: String,
    /// Stack trace (call stack at the time of the error)
    pub stack: Vec<StackFrame>,
}

impl VmError {
    /// Create an error without stack information.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            stack: Vec::new(),
        }
    }

    /// Attach a frame to the stack trace.
    pub fn with_frame(mut self, frame: StackFrame) -> Self {
        self.stack.push(frame);
        self
    }

    /// Renders the stack trace, one frame per line.
    pub fn stack_lines(&self) -> Vec<String> {
        self.stack.iter().map(|frame| format!("    at {}", frame)).collect()
    }
}

impl fmt::Display for VmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind.name(), self.message)
    }
}

impl std::error::Error for VmError {}
