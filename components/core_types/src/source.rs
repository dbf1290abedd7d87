//! Stack frame type for VM error tracking.

use std::fmt;

/// Represents a single frame in a VM call stack.
///
/// Contains the method being executed, the label of the module that defines
/// it and the instruction index that was executing.
///
/// # Examples
///
/// ```
/// use core_types::StackFrame;
///
/// let frame = StackFrame::new("main", "hello.abc", 4);
///
/// assert_eq!(frame.method_name, "main");
/// assert_eq!(frame.to_string(), "main (hello.abc:4)");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackFrame {
    /// Name of the method
    pub method_name: String,
    /// Label of the module defining the method
    pub module_label: String,
    /// Index of the instruction that was executing
    pub instruction: usize,
}

impl StackFrame {
    /// Create a new stack frame
    pub fn new(
        method_name: impl Into<String>,
        module_label: impl Into<String>,
        instruction: usize,
    ) -> Self {
        Self {
            method_name: method_name.into(),
            module_label: module_label.into(),
            instruction,
        }
    }
}

impl fmt::Display for StackFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}:{})", self.method_name, self.module_label, self.instruction)
    }
}
