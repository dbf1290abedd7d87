//! Bytecode verifier
//!
//! Checks each method before it runs: local indices and branch targets are
//! in range, and the operand stack never underflows, has one depth at every
//! join point, and control never runs past the last instruction.

use crate::error::VerifyError;
use crate::module::{AbcFile, MethodInfo, MAX_LOCALS};
use crate::opcode::Opcode;

/// `(pops, pushes)` of an instruction
fn stack_effect(op: &Opcode) -> (usize, usize) {
    match *op {
        Opcode::PushUndefined
        | Opcode::PushNull
        | Opcode::PushTrue
        | Opcode::PushFalse
        | Opcode::PushInt(_)
        | Opcode::PushDouble(_)
        | Opcode::PushString(_)
        | Opcode::GetGlobal(_)
        | Opcode::GetLocal(_)
        | Opcode::NewFunction(_) => (0, 1),
        Opcode::Pop | Opcode::SetGlobal(_) | Opcode::SetLocal(_) => (1, 0),
        Opcode::IfTrue(_) | Opcode::IfFalse(_) | Opcode::ReturnValue | Opcode::Throw => (1, 0),
        Opcode::Dup => (1, 2),
        Opcode::Swap => (2, 2),
        Opcode::Add
        | Opcode::Subtract
        | Opcode::Multiply
        | Opcode::Divide
        | Opcode::Modulo
        | Opcode::Equals
        | Opcode::StrictEquals
        | Opcode::LessThan
        | Opcode::LessEquals
        | Opcode::GreaterThan
        | Opcode::GreaterEquals => (2, 1),
        Opcode::Negate | Opcode::Not | Opcode::TypeOf => (1, 1),
        Opcode::Call(argc) => (argc as usize + 1, 1),
        Opcode::Jump(_) | Opcode::ReturnVoid => (0, 0),
    }
}

impl AbcFile {
    /// Verify every method of the module.
    ///
    /// # Errors
    ///
    /// Returns the first [`VerifyError`] found.
    pub fn verify(&self) -> Result<(), VerifyError> {
        for (index, method) in self.methods.iter().enumerate() {
            verify_method(self.method_name(index as u32), method)?;
        }
        Ok(())
    }
}

/// Verify one method, returning its maximum operand stack depth.
pub fn verify_method(name: &str, method: &MethodInfo) -> Result<usize, VerifyError> {
    let fail = |instruction: usize, message: String| VerifyError {
        method: name.to_string(),
        instruction,
        message,
    };

    if method.local_count > MAX_LOCALS {
        return Err(fail(
            0,
            format!("{} locals exceed the limit of {}", method.local_count, MAX_LOCALS),
        ));
    }
    if method.local_count < method.param_count {
        return Err(fail(
            0,
            format!(
                "{} locals cannot hold {} parameters",
                method.local_count, method.param_count
            ),
        ));
    }

    let len = method.code.len();
    for (pc, op) in method.code.iter().enumerate() {
        match *op {
            Opcode::GetLocal(i) | Opcode::SetLocal(i) if i >= method.local_count => {
                return Err(fail(pc, format!("local {} out of range", i)));
            }
            Opcode::Jump(t) | Opcode::IfTrue(t) | Opcode::IfFalse(t) if t as usize >= len => {
                return Err(fail(pc, format!("branch target {} out of range", t)));
            }
            _ => {}
        }
    }

    let mut depth_at: Vec<Option<usize>> = vec![None; len];
    let mut worklist = vec![(0usize, 0usize)];
    let mut max_depth = 0;

    while let Some((pc, depth)) = worklist.pop() {
        if pc >= len {
            return Err(fail(pc, "control falls off the end of the method".to_string()));
        }
        match depth_at[pc] {
            Some(seen) if seen == depth => continue,
            Some(seen) => {
                return Err(fail(
                    pc,
                    format!("stack depth {} conflicts with {} at join", depth, seen),
                ));
            }
            None => depth_at[pc] = Some(depth),
        }

        let op = &method.code[pc];
        let (pops, pushes) = stack_effect(op);
        if depth < pops {
            return Err(fail(
                pc,
                format!("{} needs {} operands, stack has {}", op.mnemonic(), pops, depth),
            ));
        }
        let next = depth - pops + pushes;
        max_depth = max_depth.max(next);

        match *op {
            Opcode::Jump(t) => worklist.push((t as usize, next)),
            Opcode::IfTrue(t) | Opcode::IfFalse(t) => {
                worklist.push((t as usize, next));
                worklist.push((pc + 1, next));
            }
            Opcode::ReturnValue | Opcode::ReturnVoid | Opcode::Throw => {}
            _ => worklist.push((pc + 1, next)),
        }
    }

    Ok(max_depth)
}
