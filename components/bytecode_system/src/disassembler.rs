//! Structural trace of a module.
//!
//! The trace is written in the assembler's syntax, so a disassembly can be
//! fed back to [`crate::assemble`]. Header metadata goes into comments.

use crate::module::{AbcFile, Constant, DefinitionKind};
use crate::opcode::{OperandKind, Opcode};
use core_types::IndentingWriter;
use std::collections::BTreeSet;

/// Quote `s` as an assembler string literal
pub fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => out.push_str(&format!("\\u{{{:x}}}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Names are written bare when they are plain identifiers
pub(crate) fn is_bare_name(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '$' | '.' | ':'))
}

fn name(s: &str) -> String {
    if is_bare_name(s) {
        s.to_string()
    } else {
        quote(s)
    }
}

fn constant_text(constant: &Constant) -> String {
    match constant {
        Constant::Int(n) => format!("int {}", n),
        Constant::Double(n) => format!("double {:?}", n),
        Constant::String(s) => format!("string {}", quote(s)),
    }
}

impl AbcFile {
    /// Write the full structural trace of the module.
    pub fn trace(&self, writer: &IndentingWriter) {
        writer.write_ln(&format!(
            "; abc {} version={}.{} constants={} methods={} definitions={}",
            self.label,
            self.major_version,
            self.minor_version,
            self.constants.len(),
            self.methods.len(),
            self.definitions.len()
        ));

        for (index, method) in self.methods.iter().enumerate() {
            writer.write_ln(&format!(
                ".method {} params={} locals={}",
                name(self.method_name(index as u32)),
                method.param_count,
                method.local_count
            ));
            let targets: BTreeSet<u32> = method
                .code
                .iter()
                .filter_map(|op| match op {
                    Opcode::Jump(t) | Opcode::IfTrue(t) | Opcode::IfFalse(t) => Some(*t),
                    _ => None,
                })
                .collect();
            writer.indent();
            for (pc, op) in method.code.iter().enumerate() {
                if targets.contains(&(pc as u32)) {
                    writer.write_ln(&format!("L{}:", pc));
                }
                writer.write_ln(&self.instruction_text(op));
            }
            for target in targets.range(method.code.len() as u32..) {
                writer.write_ln(&format!("L{}:", target));
            }
            writer.outdent();
            writer.write_ln(".end");
        }

        for definition in &self.definitions {
            let def_name = name(self.string_constant(definition.name).unwrap_or(""));
            match definition.kind {
                DefinitionKind::Slot(Some(index)) => {
                    let value = self
                        .constant(index)
                        .map(constant_text)
                        .unwrap_or_else(|_| "undefined".to_string());
                    writer.write_ln(&format!(".slot {} {}", def_name, value));
                }
                DefinitionKind::Slot(None) => {
                    writer.write_ln(&format!(".slot {} undefined", def_name));
                }
                DefinitionKind::Method(index) => {
                    writer.write_ln(&format!(
                        ".function {} {}",
                        def_name,
                        name(self.method_name(index))
                    ));
                }
            }
        }

        writer.write_ln(&format!(".init {}", name(self.method_name(self.init))));
    }

    /// The trace as a string
    pub fn disassemble(&self) -> String {
        let (writer, buffer) = IndentingWriter::captured();
        self.trace(&writer);
        buffer.contents()
    }

    /// Assembly text of one instruction
    pub fn instruction_text(&self, op: &Opcode) -> String {
        let operand = match op.operand() {
            Some(operand) => operand,
            None => return op.mnemonic().to_string(),
        };
        let text = match op.operand_kind() {
            OperandKind::IntConstant
            | OperandKind::DoubleConstant
            | OperandKind::StringConstant => {
                match self.constant(operand) {
                    Ok(Constant::Int(n)) => n.to_string(),
                    Ok(Constant::Double(n)) => format!("{:?}", n),
                    Ok(Constant::String(s)) => quote(s),
                    Err(_) => format!("#{}", operand),
                }
            }
            OperandKind::Name => name(self.string_constant(operand).unwrap_or("")),
            OperandKind::Method => name(self.method_name(operand)),
            OperandKind::Target => format!("L{}", operand),
            OperandKind::Local | OperandKind::Count | OperandKind::None => operand.to_string(),
        };
        format!("{} {}", op.mnemonic(), text)
    }
}
