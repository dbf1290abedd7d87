//! Activation state of one running method

use bytecode_system::{AbcFile, MethodInfo, Opcode, MAX_LOCALS};
use core_types::{ErrorKind, FunctionRef, Value, VmError};
use std::rc::Rc;

/// Execution context for a single method invocation
///
/// Holds the locals, the operand stack and the instruction pointer. The
/// module is shared so the dispatcher can read code while the domain is
/// borrowed mutably.
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    /// The module defining the method
    pub abc: Rc<AbcFile>,
    /// Which method is running
    pub function: FunctionRef,
    /// Local slots, parameters first
    pub locals: Vec<Value>,
    /// Operand stack
    pub stack: Vec<Value>,
    /// Index of the next instruction
    pub instruction_pointer: usize,
}

impl ExecutionContext {
    /// Create a context with `args` copied into the parameter slots.
    ///
    /// Missing arguments are undefined and extra arguments are dropped.
    pub fn new(abc: Rc<AbcFile>, function: FunctionRef, args: &[Value]) -> Result<Self, VmError> {
        let method = abc.method(function.method).map_err(|e| {
            VmError::new(ErrorKind::InternalError, e.to_string())
        })?;
        let count = method.local_count as usize;
        if method.local_count > MAX_LOCALS {
            return Err(VmError::new(
                ErrorKind::RangeError,
                format!("{} locals exceed the limit of {}", count, MAX_LOCALS),
            ));
        }
        let mut locals = Vec::new();
        locals.try_reserve_exact(count).map_err(|e| {
            VmError::new(
                ErrorKind::RangeError,
                format!("cannot allocate {} locals: {}", count, e),
            )
        })?;
        locals.resize(count, Value::Undefined);
        for (slot, arg) in locals
            .iter_mut()
            .zip(args.iter())
            .take(method.param_count as usize)
        {
            *slot = arg.clone();
        }
        Ok(Self {
            abc,
            function,
            locals,
            stack: Vec::with_capacity(16),
            instruction_pointer: 0,
        })
    }

    /// The method being executed
    pub fn method(&self) -> &MethodInfo {
        // The constructor checked the index.
        &self.abc.methods()[self.function.method as usize]
    }

    /// Name of the method being executed
    pub fn method_name(&self) -> &str {
        self.abc.method_name(self.function.method)
    }

    /// Advance the instruction pointer and return the current instruction
    pub fn fetch(&mut self) -> Option<Opcode> {
        let op = self.method().code.get(self.instruction_pointer).copied();
        if op.is_some() {
            self.instruction_pointer += 1;
        }
        op
    }

    /// Push onto the operand stack
    pub fn push(&mut self, value: Value) {
        self.stack.push(value);
    }

    /// Pop from the operand stack
    pub fn pop(&mut self) -> Result<Value, VmError> {
        self.stack
            .pop()
            .ok_or_else(|| VmError::new(ErrorKind::InternalError, "operand stack underflow"))
    }

    /// Pop the two top values as `(second, top)`
    pub fn pop2(&mut self) -> Result<(Value, Value), VmError> {
        let b = self.pop()?;
        let a = self.pop()?;
        Ok((a, b))
    }

    /// Read a local slot
    pub fn get_local(&self, index: u32) -> Result<Value, VmError> {
        self.locals.get(index as usize).cloned().ok_or_else(|| {
            VmError::new(ErrorKind::InternalError, format!("local {} out of range", index))
        })
    }

    /// Write a local slot
    pub fn set_local(&mut self, index: u32, value: Value) -> Result<(), VmError> {
        let slot = self.locals.get_mut(index as usize).ok_or_else(|| {
            VmError::new(ErrorKind::InternalError, format!("local {} out of range", index))
        })?;
        *slot = value;
        Ok(())
    }
}
