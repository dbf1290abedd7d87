//! Text assembler
//!
//! Builds an [`AbcFile`] from line-oriented assembly:
//!
//! ```text
//! ; comment
//! .method NAME [params=N] [locals=M]
//!   LABEL:
//!   mnemonic [operand]
//! .end
//! .slot NAME (int N | double X | string "S" | undefined)
//! .function NAME METHOD
//! .init METHOD
//! ```
//!
//! Methods are referenced by name and may be used before they are declared.
//! Constants are interned in first-use order.

use crate::error::AssembleError;
use crate::module::{
    AbcFile, Constant, Definition, DefinitionKind, MethodInfo, MAJOR_VERSION, MINOR_VERSION,
};
use crate::opcode::{OperandKind, Opcode};
use regex::Regex;
use std::collections::HashMap;

const NAME: &str = r#"("(?:[^"\\]|\\.)*"|[^\s"]+)"#;

/// Operand whose value depends on something declared later
enum Pending {
    Ready(Opcode),
    Branch { code: u8, label: String, line: usize },
    Closure { method: String, line: usize },
}

struct PendingMethod {
    name: u32,
    param_count: u32,
    local_count: u32,
    code: Vec<Pending>,
    labels: HashMap<String, u32>,
}

struct Patterns {
    method: Regex,
    slot: Regex,
    function: Regex,
    init: Regex,
    label: Regex,
    instruction: Regex,
}

impl Patterns {
    fn new() -> Self {
        // The patterns are literals; failure here is a programming error.
        let compile = |pattern: String| Regex::new(&pattern).expect("valid assembler pattern");
        Self {
            method: compile(format!(
                r"^\.method\s+{}(?:\s+params=(\d+))?(?:\s+locals=(\d+))?$",
                NAME
            )),
            slot: compile(format!(
                r"^\.slot\s+{}\s+(int|double|string|undefined)(?:\s+(.+))?$",
                NAME
            )),
            function: compile(format!(r"^\.function\s+{}\s+{}$", NAME, NAME)),
            init: compile(format!(r"^\.init\s+{}$", NAME)),
            label: compile(r"^([A-Za-z_$][\w$]*):$".to_string()),
            instruction: compile(r"^([a-z]+)(?:\s+(.+))?$".to_string()),
        }
    }
}

#[derive(Default)]
struct Assembler {
    constants: Vec<Constant>,
    strings: HashMap<String, u32>,
    ints: HashMap<i32, u32>,
    doubles: HashMap<u64, u32>,
    methods: Vec<PendingMethod>,
    method_names: HashMap<String, u32>,
    definitions: Vec<(u32, PendingDefinition)>,
    init: Option<(String, usize)>,
}

enum PendingDefinition {
    Slot(Option<u32>),
    Method { method: String, line: usize },
}

/// Assemble `source` into a module labelled `label`.
///
/// # Errors
///
/// Returns the first [`AssembleError`] found, with its 1-based line number.
pub fn assemble(source: &str, label: impl Into<String>) -> Result<AbcFile, AssembleError> {
    let patterns = Patterns::new();
    let mut asm = Assembler::default();
    let mut current: Option<(PendingMethod, usize)> = None;
    let mut last_line = 0;

    for (index, raw) in source.lines().enumerate() {
        let line_no = index + 1;
        last_line = line_no;
        let line = strip_comment(raw).trim();
        if line.is_empty() {
            continue;
        }

        if let Some((method, _)) = current.as_mut() {
            if line == ".end" {
                if let Some((method, _)) = current.take() {
                    asm.methods.push(method);
                }
                continue;
            }
            if line.starts_with('.') {
                return Err(AssembleError::new(line_no, "directive inside method body"));
            }
            if let Some(caps) = patterns.label.captures(line) {
                let at = method.code.len() as u32;
                if method.labels.insert(caps[1].to_string(), at).is_some() {
                    return Err(AssembleError::new(
                        line_no,
                        format!("duplicate label {}", &caps[1]),
                    ));
                }
                continue;
            }
            let caps = patterns
                .instruction
                .captures(line)
                .ok_or_else(|| AssembleError::new(line_no, format!("cannot parse `{}`", line)))?;
            let operand = caps.get(2).map(|m| m.as_str().trim());
            let op = asm.instruction(&caps[1], operand, line_no)?;
            method.code.push(op);
            continue;
        }

        if let Some(caps) = patterns.method.captures(line) {
            let name = parse_name(&caps[1], line_no)?;
            if asm.method_names.contains_key(&name) {
                return Err(AssembleError::new(
                    line_no,
                    format!("duplicate method {}", name),
                ));
            }
            let param_count = parse_count(caps.get(2).map(|m| m.as_str()), 0, line_no)?;
            let local_count = parse_count(caps.get(3).map(|m| m.as_str()), param_count, line_no)?;
            if local_count < param_count {
                return Err(AssembleError::new(
                    line_no,
                    format!("locals={} is less than params={}", local_count, param_count),
                ));
            }
            let index = asm.methods.len() as u32;
            asm.method_names.insert(name.clone(), index);
            let name = asm.intern_string(name);
            current = Some((
                PendingMethod {
                    name,
                    param_count,
                    local_count,
                    code: Vec::new(),
                    labels: HashMap::new(),
                },
                line_no,
            ));
        } else if let Some(caps) = patterns.slot.captures(line) {
            let name = parse_name(&caps[1], line_no)?;
            let name = asm.intern_string(name);
            let value = caps.get(3).map(|m| m.as_str().trim());
            let slot = match (&caps[2], value) {
                ("undefined", None) => None,
                ("int", Some(text)) => Some(asm.intern_int(parse_int(text, line_no)?)),
                ("double", Some(text)) => Some(asm.intern_double(parse_double(text, line_no)?)),
                ("string", Some(text)) => {
                    let s = parse_string(text, line_no)?;
                    Some(asm.intern_string(s))
                }
                (kind, _) => {
                    return Err(AssembleError::new(
                        line_no,
                        format!("malformed {} slot value", kind),
                    ))
                }
            };
            asm.definitions.push((name, PendingDefinition::Slot(slot)));
        } else if let Some(caps) = patterns.function.captures(line) {
            let name = parse_name(&caps[1], line_no)?;
            let method = parse_name(&caps[2], line_no)?;
            let name = asm.intern_string(name);
            asm.definitions.push((
                name,
                PendingDefinition::Method {
                    method,
                    line: line_no,
                },
            ));
        } else if let Some(caps) = patterns.init.captures(line) {
            if asm.init.is_some() {
                return Err(AssembleError::new(line_no, "duplicate .init"));
            }
            asm.init = Some((parse_name(&caps[1], line_no)?, line_no));
        } else if line == ".end" {
            return Err(AssembleError::new(line_no, ".end outside method"));
        } else {
            return Err(AssembleError::new(
                line_no,
                format!("unexpected `{}` outside method", line),
            ));
        }
    }

    if let Some((_, line)) = current {
        return Err(AssembleError::new(line, "method is missing .end"));
    }
    asm.finish(label.into(), last_line)
}

impl Assembler {
    fn intern_string(&mut self, s: String) -> u32 {
        if let Some(&index) = self.strings.get(&s) {
            return index;
        }
        let index = self.constants.len() as u32;
        self.constants.push(Constant::String(s.clone()));
        self.strings.insert(s, index);
        index
    }

    fn intern_int(&mut self, n: i32) -> u32 {
        if let Some(&index) = self.ints.get(&n) {
            return index;
        }
        let index = self.constants.len() as u32;
        self.constants.push(Constant::Int(n));
        self.ints.insert(n, index);
        index
    }

    fn intern_double(&mut self, n: f64) -> u32 {
        if let Some(&index) = self.doubles.get(&n.to_bits()) {
            return index;
        }
        let index = self.constants.len() as u32;
        self.constants.push(Constant::Double(n));
        self.doubles.insert(n.to_bits(), index);
        index
    }

    fn instruction(
        &mut self,
        mnemonic: &str,
        operand: Option<&str>,
        line: usize,
    ) -> Result<Pending, AssembleError> {
        let code = Opcode::code_for_mnemonic(mnemonic)
            .ok_or_else(|| AssembleError::new(line, format!("unknown mnemonic {}", mnemonic)))?;
        let kind = Opcode::operand_kind_of(code).unwrap_or(OperandKind::None);

        let text = match (kind, operand) {
            (OperandKind::None, None) => return self.ready(code, 0, line),
            (OperandKind::None, Some(_)) => {
                return Err(AssembleError::new(
                    line,
                    format!("{} takes no operand", mnemonic),
                ))
            }
            (_, None) => {
                return Err(AssembleError::new(
                    line,
                    format!("{} requires an operand", mnemonic),
                ))
            }
            (_, Some(text)) => text,
        };

        let value = match kind {
            OperandKind::IntConstant => self.intern_int(parse_int(text, line)?),
            OperandKind::DoubleConstant => self.intern_double(parse_double(text, line)?),
            OperandKind::StringConstant => {
                let s = parse_string(text, line)?;
                self.intern_string(s)
            }
            OperandKind::Name => {
                let s = parse_name(text, line)?;
                self.intern_string(s)
            }
            OperandKind::Local | OperandKind::Count => parse_index(text, line)?,
            OperandKind::Target => match text.parse::<u32>() {
                Ok(index) => index,
                Err(_) => {
                    return Ok(Pending::Branch {
                        code,
                        label: text.to_string(),
                        line,
                    })
                }
            },
            OperandKind::Method => {
                return Ok(Pending::Closure {
                    method: parse_name(text, line)?,
                    line,
                })
            }
            OperandKind::None => 0,
        };
        self.ready(code, value, line)
    }

    fn ready(&self, code: u8, operand: u32, line: usize) -> Result<Pending, AssembleError> {
        Opcode::from_parts(code, operand)
            .map(Pending::Ready)
            .ok_or_else(|| AssembleError::new(line, format!("unknown opcode 0x{:02x}", code)))
    }

    fn resolve_method(&self, name: &str, line: usize) -> Result<u32, AssembleError> {
        self.method_names
            .get(name)
            .copied()
            .ok_or_else(|| AssembleError::new(line, format!("undefined method {}", name)))
    }

    fn finish(self, label: String, last_line: usize) -> Result<AbcFile, AssembleError> {
        let (init_name, init_line) = self
            .init
            .clone()
            .ok_or_else(|| AssembleError::new(last_line, "missing .init directive"))?;
        let init = self.resolve_method(&init_name, init_line)?;

        let mut methods = Vec::with_capacity(self.methods.len());
        for method in &self.methods {
            let mut code = Vec::with_capacity(method.code.len());
            for pending in &method.code {
                let op = match pending {
                    Pending::Ready(op) => *op,
                    Pending::Branch { code, label, line } => {
                        let target = method.labels.get(label).copied().ok_or_else(|| {
                            AssembleError::new(*line, format!("undefined label {}", label))
                        })?;
                        match Opcode::from_parts(*code, target) {
                            Some(op) => op,
                            None => return Err(AssembleError::new(*line, "invalid branch")),
                        }
                    }
                    Pending::Closure { method, line } => {
                        Opcode::NewFunction(self.resolve_method(method, *line)?)
                    }
                };
                code.push(op);
            }
            methods.push(MethodInfo {
                name: method.name,
                param_count: method.param_count,
                local_count: method.local_count,
                code,
            });
        }

        let mut definitions = Vec::with_capacity(self.definitions.len());
        for (name, pending) in &self.definitions {
            let kind = match pending {
                PendingDefinition::Slot(value) => DefinitionKind::Slot(*value),
                PendingDefinition::Method { method, line } => {
                    DefinitionKind::Method(self.resolve_method(method, *line)?)
                }
            };
            definitions.push(Definition { name: *name, kind });
        }

        Ok(AbcFile {
            label,
            minor_version: MINOR_VERSION,
            major_version: MAJOR_VERSION,
            constants: self.constants,
            methods,
            definitions,
            init,
        })
    }
}

/// Drop a trailing `;` comment, ignoring semicolons inside string literals.
fn strip_comment(line: &str) -> &str {
    let mut in_string = false;
    let mut escaped = false;
    for (i, c) in line.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' if in_string => escaped = true,
            '"' => in_string = !in_string,
            ';' if !in_string => return &line[..i],
            _ => {}
        }
    }
    line
}

fn parse_count(text: Option<&str>, default: u32, line: usize) -> Result<u32, AssembleError> {
    match text {
        Some(text) => parse_index(text, line),
        None => Ok(default),
    }
}

fn parse_index(text: &str, line: usize) -> Result<u32, AssembleError> {
    match text.parse::<u32>() {
        Ok(n) if n >> 30 == 0 => Ok(n),
        _ => Err(AssembleError::new(line, format!("invalid index {}", text))),
    }
}

fn parse_int(text: &str, line: usize) -> Result<i32, AssembleError> {
    text.parse::<i32>()
        .map_err(|_| AssembleError::new(line, format!("invalid int {}", text)))
}

fn parse_double(text: &str, line: usize) -> Result<f64, AssembleError> {
    text.parse::<f64>()
        .map_err(|_| AssembleError::new(line, format!("invalid double {}", text)))
}

fn parse_name(text: &str, line: usize) -> Result<String, AssembleError> {
    if text.starts_with('"') {
        parse_string(text, line)
    } else if text.chars().any(char::is_whitespace) {
        Err(AssembleError::new(line, format!("invalid name {}", text)))
    } else {
        Ok(text.to_string())
    }
}

fn parse_string(text: &str, line: usize) -> Result<String, AssembleError> {
    let inner = text
        .strip_prefix('"')
        .and_then(|t| t.strip_suffix('"'))
        .ok_or_else(|| {
            AssembleError::new(line, format!("expected string literal, found {}", text))
        })?;

    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c == '"' {
            return Err(AssembleError::new(line, "unescaped quote in string"));
        }
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('"') => out.push('"'),
            Some('\\') => out.push('\\'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some('u') => {
                let rest: String = chars.by_ref().take_while(|c| *c != '}').collect();
                let decoded = rest
                    .strip_prefix('{')
                    .and_then(|hex| u32::from_str_radix(hex, 16).ok())
                    .and_then(char::from_u32)
                    .ok_or_else(|| AssembleError::new(line, "invalid \\u escape"))?;
                out.push(decoded);
            }
            other => {
                return Err(AssembleError::new(
                    line,
                    format!("invalid escape \\{}", other.map(String::from).unwrap_or_default()),
                ))
            }
        }
    }
    Ok(out)
}
