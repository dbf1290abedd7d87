//! Core value types, errors and diagnostics output for the AVM shell.
//!
//! This crate provides the foundational types shared by every component of
//! the harness: the VM value representation, execution errors with stack
//! traces, and the indenting writer used for all user-visible output.
//!
//! # Overview
//!
//! - [`Value`] - Tagged representation of VM values
//! - [`VmError`] - Execution errors with stack traces
//! - [`ErrorKind`] - Classes of VM errors
//! - [`StackFrame`] - Call stack frame information
//! - [`IndentingWriter`] - Shared, level-gated diagnostics writer
//!
//! # Examples
//!
//! ```
//! use core_types::{ErrorKind, Value, VmError};
//!
//! let num = Value::Int(42);
//! assert!(num.is_truthy());
//! assert_eq!(num.type_of(), "number");
//!
//! let error = VmError::new(ErrorKind::TypeError, "value is not a function");
//! assert_eq!(error.message, "value is not a function");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

mod error;
mod source;
mod value;
mod writer;

pub use error::{ErrorKind, VmError};
pub use source::StackFrame;
pub use value::{FunctionRef, Value};
pub use writer::{IndentingWriter, LogLevel, SharedBuffer};
