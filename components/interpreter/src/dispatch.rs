//! Dispatch loop for bytecode execution
//!
//! Handles calls and individual opcode execution.

use bytecode_system::{Constant, Opcode};
use core_types::{ErrorKind, FunctionRef, StackFrame, Value, VmError};
use std::cmp::Ordering;

use crate::context::ExecutionContext;
use crate::domain::{DomainScope, SecurityDomain, MAX_CALL_DEPTH};
use crate::host::Host;
use crate::natives;

impl SecurityDomain {
    pub(crate) fn call_value(
        &mut self,
        callee: &Value,
        args: &[Value],
        host: &mut dyn Host,
        depth: usize,
    ) -> Result<Value, VmError> {
        match callee {
            Value::Function(function) => self.call_function(*function, args, host, depth),
            Value::NativeFunction(name) => natives::call(self, name, args, host),
            other => Err(VmError::new(
                ErrorKind::TypeError,
                format!("{} is not a function", other),
            )),
        }
    }

    pub(crate) fn call_function(
        &mut self,
        function: FunctionRef,
        args: &[Value],
        host: &mut dyn Host,
        depth: usize,
    ) -> Result<Value, VmError> {
        if depth >= MAX_CALL_DEPTH {
            return Err(VmError::new(
                ErrorKind::RangeError,
                "Maximum call stack size exceeded",
            ));
        }
        let (abc, scope) = self.loaded(function.module)?;
        let mut ctx = ExecutionContext::new(abc, function, args)?;
        self.run(&mut ctx, scope, host, depth).map_err(|e| {
            let pc = ctx.instruction_pointer.saturating_sub(1);
            e.with_frame(StackFrame::new(ctx.method_name(), ctx.abc.label(), pc))
        })
    }

    fn constant(ctx: &ExecutionContext, index: u32) -> Result<Value, VmError> {
        match ctx.abc.constant(index) {
            Ok(Constant::Int(n)) => Ok(Value::Int(*n)),
            Ok(Constant::Double(n)) => Ok(Value::Double(*n)),
            Ok(Constant::String(s)) => Ok(Value::String(s.clone())),
            Err(e) => Err(VmError::new(ErrorKind::InternalError, e.to_string())),
        }
    }

    fn name(ctx: &ExecutionContext, index: u32) -> Result<String, VmError> {
        ctx.abc
            .string_constant(index)
            .map(str::to_string)
            .map_err(|e| VmError::new(ErrorKind::InternalError, e.to_string()))
    }

    /// Execute bytecode in the given context until it returns or throws
    fn run(
        &mut self,
        ctx: &mut ExecutionContext,
        scope: DomainScope,
        host: &mut dyn Host,
        depth: usize,
    ) -> Result<Value, VmError> {
        loop {
            let pc = ctx.instruction_pointer;
            let op = match ctx.fetch() {
                Some(op) => op,
                None => {
                    // Only reachable for unverified code
                    return Ok(Value::Undefined);
                }
            };

            if self.options().trace_interpreter {
                self.writer().write_ln(&format!(
                    "{} {:>4}: {}",
                    ctx.method_name(),
                    pc,
                    ctx.abc.instruction_text(&op)
                ));
            }

            match op {
                Opcode::PushUndefined => ctx.push(Value::Undefined),
                Opcode::PushNull => ctx.push(Value::Null),
                Opcode::PushTrue => ctx.push(Value::Boolean(true)),
                Opcode::PushFalse => ctx.push(Value::Boolean(false)),
                Opcode::PushInt(i) | Opcode::PushDouble(i) | Opcode::PushString(i) => {
                    let value = Self::constant(ctx, i)?;
                    ctx.push(value);
                }
                Opcode::Pop => {
                    ctx.pop()?;
                }
                Opcode::Dup => {
                    let value = ctx.pop()?;
                    ctx.push(value.clone());
                    ctx.push(value);
                }
                Opcode::Swap => {
                    let (a, b) = ctx.pop2()?;
                    ctx.push(b);
                    ctx.push(a);
                }
                Opcode::GetGlobal(i) => {
                    let name = Self::name(ctx, i)?;
                    let value = self.resolve_global(scope, &name, host, depth + 1)?;
                    ctx.push(value);
                }
                Opcode::SetGlobal(i) => {
                    let name = Self::name(ctx, i)?;
                    let value = ctx.pop()?;
                    self.set_global(scope, name, value);
                }
                Opcode::GetLocal(i) => {
                    let value = ctx.get_local(i)?;
                    ctx.push(value);
                }
                Opcode::SetLocal(i) => {
                    let value = ctx.pop()?;
                    ctx.set_local(i, value)?;
                }
                Opcode::Add => {
                    let (a, b) = ctx.pop2()?;
                    ctx.push(add(&a, &b));
                }
                Opcode::Subtract => {
                    let (a, b) = ctx.pop2()?;
                    ctx.push(Value::from_number(a.to_number() - b.to_number()));
                }
                Opcode::Multiply => {
                    let (a, b) = ctx.pop2()?;
                    ctx.push(Value::from_number(a.to_number() * b.to_number()));
                }
                Opcode::Divide => {
                    let (a, b) = ctx.pop2()?;
                    ctx.push(Value::from_number(a.to_number() / b.to_number()));
                }
                Opcode::Modulo => {
                    let (a, b) = ctx.pop2()?;
                    ctx.push(Value::from_number(a.to_number() % b.to_number()));
                }
                Opcode::Negate => {
                    let a = ctx.pop()?;
                    ctx.push(Value::from_number(-a.to_number()));
                }
                Opcode::Equals => {
                    let (a, b) = ctx.pop2()?;
                    ctx.push(Value::Boolean(loose_equals(&a, &b)));
                }
                Opcode::StrictEquals => {
                    let (a, b) = ctx.pop2()?;
                    ctx.push(Value::Boolean(a.strict_equals(&b)));
                }
                Opcode::LessThan => {
                    let (a, b) = ctx.pop2()?;
                    ctx.push(Value::Boolean(compare(&a, &b) == Some(Ordering::Less)));
                }
                Opcode::LessEquals => {
                    let (a, b) = ctx.pop2()?;
                    ctx.push(Value::Boolean(matches!(
                        compare(&a, &b),
                        Some(Ordering::Less | Ordering::Equal)
                    )));
                }
                Opcode::GreaterThan => {
                    let (a, b) = ctx.pop2()?;
                    ctx.push(Value::Boolean(compare(&a, &b) == Some(Ordering::Greater)));
                }
                Opcode::GreaterEquals => {
                    let (a, b) = ctx.pop2()?;
                    ctx.push(Value::Boolean(matches!(
                        compare(&a, &b),
                        Some(Ordering::Greater | Ordering::Equal)
                    )));
                }
                Opcode::Not => {
                    let a = ctx.pop()?;
                    ctx.push(Value::Boolean(!a.is_truthy()));
                }
                Opcode::TypeOf => {
                    let a = ctx.pop()?;
                    ctx.push(Value::String(a.type_of().to_string()));
                }
                Opcode::Jump(target) => ctx.instruction_pointer = target as usize,
                Opcode::IfTrue(target) => {
                    if ctx.pop()?.is_truthy() {
                        ctx.instruction_pointer = target as usize;
                    }
                }
                Opcode::IfFalse(target) => {
                    if !ctx.pop()?.is_truthy() {
                        ctx.instruction_pointer = target as usize;
                    }
                }
                Opcode::NewFunction(method) => {
                    ctx.push(Value::Function(FunctionRef {
                        module: ctx.function.module,
                        method,
                    }));
                }
                Opcode::Call(argc) => {
                    let at = ctx.stack.len().checked_sub(argc as usize).ok_or_else(|| {
                        VmError::new(ErrorKind::InternalError, "operand stack underflow")
                    })?;
                    let args = ctx.stack.split_off(at);
                    let callee = ctx.pop()?;
                    let result = self.call_value(&callee, &args, host, depth + 1)?;
                    ctx.push(result);
                }
                Opcode::ReturnValue => return ctx.pop(),
                Opcode::ReturnVoid => return Ok(Value::Undefined),
                Opcode::Throw => {
                    let value = ctx.pop()?;
                    return Err(VmError::new(ErrorKind::Error, value.to_string()));
                }
            }
        }
    }
}

/// `+`: concatenation when either side is a string, numeric otherwise
pub fn add(a: &Value, b: &Value) -> Value {
    match (a, b) {
        (Value::String(x), _) => Value::String(format!("{}{}", x, b)),
        (_, Value::String(y)) => Value::String(format!("{}{}", a, y)),
        (Value::Int(x), Value::Int(y)) => Value::from_number(f64::from(*x) + f64::from(*y)),
        _ => Value::from_number(a.to_number() + b.to_number()),
    }
}

/// Loose equality with the usual coercions
pub fn loose_equals(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Undefined | Value::Null, Value::Undefined | Value::Null) => true,
        (Value::Undefined | Value::Null, _) | (_, Value::Undefined | Value::Null) => false,
        (Value::String(x), Value::String(y)) => x == y,
        _ if is_primitive(a) && is_primitive(b) => a.to_number() == b.to_number(),
        _ => a.strict_equals(b),
    }
}

fn is_primitive(value: &Value) -> bool {
    matches!(
        value,
        Value::Int(_) | Value::Double(_) | Value::String(_) | Value::Boolean(_)
    )
}

/// Relational comparison; strings compare by code unit, everything else
/// numerically. `None` when either side is NaN.
pub fn compare(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        _ => a.to_number().partial_cmp(&b.to_number()),
    }
}
