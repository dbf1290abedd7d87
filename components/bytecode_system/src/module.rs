//! Bytecode modules - the parsed, immutable unit of executable code
//!
//! A module holds a constant pool, a method table, the top-level
//! definitions it exports when loaded, and the index of its initializer.
//!
//! Binary layout:
//!
//! ```text
//! u16 minor_version, u16 major_version
//! u30 constant_count, constant*      (u8 kind, payload)
//! u30 method_count, method*          (u30 name, u30 params, u30 locals, u30 code_count, instruction*)
//! u30 definition_count, definition*  (u30 name, u8 kind, u30 payload)
//! u30 init_method
//! ```

use crate::error::AbcError;
use crate::opcode::{OperandKind, Opcode};
use crate::reader::{AbcReader, AbcWriter};

/// Supported minor version
pub const MINOR_VERSION: u16 = 16;
/// Supported major version
pub const MAJOR_VERSION: u16 = 46;
/// Largest number of local slots a method may declare
pub const MAX_LOCALS: u32 = u16::MAX as u32;

const CONSTANT_INT: u8 = 1;
const CONSTANT_DOUBLE: u8 = 2;
const CONSTANT_STRING: u8 = 3;

const DEFINITION_SLOT: u8 = 0;
const DEFINITION_METHOD: u8 = 1;

/// An entry of the constant pool
#[derive(Debug, Clone, PartialEq)]
pub enum Constant {
    /// 32-bit signed integer
    Int(i32),
    /// Double
    Double(f64),
    /// UTF-8 string, also used for names
    String(String),
}

impl Constant {
    fn kind_name(&self) -> &'static str {
        match self {
            Constant::Int(_) => "int",
            Constant::Double(_) => "double",
            Constant::String(_) => "string",
        }
    }
}

/// A method body
#[derive(Debug, Clone, PartialEq)]
pub struct MethodInfo {
    /// Name (string constant index)
    pub name: u32,
    /// Number of parameters, stored in the first local slots
    pub param_count: u32,
    /// Number of local slots, parameters included
    pub local_count: u32,
    /// Instructions
    pub code: Vec<Opcode>,
}

/// What a top-level definition binds its name to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefinitionKind {
    /// A slot initialized from a constant, or undefined
    Slot(Option<u32>),
    /// A method closure
    Method(u32),
}

/// A top-level definition exported into the loading scope
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Definition {
    /// Name (string constant index)
    pub name: u32,
    /// Bound value
    pub kind: DefinitionKind,
}

/// A parsed bytecode module.
///
/// Modules are immutable once constructed; the VM shares them behind `Rc`.
///
/// # Example
///
/// ```
/// use bytecode_system::{assemble, AbcFile};
///
/// let source = r#"
/// .method main
///     pushint 42
///     returnvalue
/// .end
/// .function answer main
/// .init main
/// "#;
/// let module = assemble(source, "answer.abc").unwrap();
/// let bytes = module.to_bytes();
///
/// let parsed = AbcFile::parse(&bytes, "answer.abc").unwrap();
/// assert_eq!(parsed.definition_names(), vec!["answer"]);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct AbcFile {
    pub(crate) label: String,
    pub(crate) minor_version: u16,
    pub(crate) major_version: u16,
    pub(crate) constants: Vec<Constant>,
    pub(crate) methods: Vec<MethodInfo>,
    pub(crate) definitions: Vec<Definition>,
    pub(crate) init: u32,
}

impl AbcFile {
    /// Decode and structurally validate a module.
    ///
    /// # Errors
    ///
    /// Returns [`AbcError`] when the bytes are truncated, use an unsupported
    /// version, reference constants or methods that do not exist, contain
    /// unknown opcodes, or carry trailing data.
    pub fn parse(bytes: &[u8], label: impl Into<String>) -> Result<Self, AbcError> {
        let mut reader = AbcReader::new(bytes);

        let minor_version = reader.read_u16()?;
        let major_version = reader.read_u16()?;
        if major_version != MAJOR_VERSION {
            return Err(AbcError::UnsupportedVersion {
                major: major_version,
                minor: minor_version,
            });
        }

        let constant_count = reader.read_u30()?;
        let mut constants = Vec::with_capacity(constant_count.min(4096) as usize);
        for _ in 0..constant_count {
            let kind = reader.read_u8()?;
            let constant = match kind {
                CONSTANT_INT => Constant::Int(reader.read_s32()?),
                CONSTANT_DOUBLE => Constant::Double(reader.read_d64()?),
                CONSTANT_STRING => Constant::String(reader.read_string()?),
                _ => return Err(AbcError::UnknownConstantKind { kind }),
            };
            constants.push(constant);
        }

        let method_count = reader.read_u30()?;
        let mut methods = Vec::with_capacity(method_count.min(4096) as usize);
        for index in 0..method_count {
            let name = reader.read_u30()?;
            let param_count = reader.read_u30()?;
            let local_count = reader.read_u30()?;
            if local_count > MAX_LOCALS {
                return Err(AbcError::TooManyLocals {
                    method: index,
                    count: local_count,
                });
            }
            let code_count = reader.read_u30()?;
            let mut code = Vec::with_capacity(code_count.min(65536) as usize);
            for _ in 0..code_count {
                let offset = reader.position();
                let byte = reader.read_u8()?;
                let kind = Opcode::operand_kind_of(byte)
                    .ok_or(AbcError::UnknownOpcode { opcode: byte, offset })?;
                let operand = if kind == OperandKind::None {
                    0
                } else {
                    reader.read_u30()?
                };
                let opcode = Opcode::from_parts(byte, operand)
                    .ok_or(AbcError::UnknownOpcode { opcode: byte, offset })?;
                code.push(opcode);
            }
            methods.push(MethodInfo {
                name,
                param_count,
                local_count,
                code,
            });
        }

        let definition_count = reader.read_u30()?;
        let mut definitions = Vec::with_capacity(definition_count.min(4096) as usize);
        for _ in 0..definition_count {
            let name = reader.read_u30()?;
            let kind = reader.read_u8()?;
            let payload = reader.read_u30()?;
            let kind = match kind {
                DEFINITION_SLOT => DefinitionKind::Slot(payload.checked_sub(1)),
                DEFINITION_METHOD => DefinitionKind::Method(payload),
                _ => return Err(AbcError::UnknownDefinitionKind { kind }),
            };
            definitions.push(Definition { name, kind });
        }

        let init = reader.read_u30()?;

        if reader.remaining() > 0 {
            return Err(AbcError::TrailingBytes {
                count: reader.remaining(),
            });
        }

        let module = Self {
            label: label.into(),
            minor_version,
            major_version,
            constants,
            methods,
            definitions,
            init,
        };
        module.validate_references()?;
        Ok(module)
    }

    /// Check that every index stored in the module resolves.
    pub(crate) fn validate_references(&self) -> Result<(), AbcError> {
        self.method(self.init)?;
        for method in &self.methods {
            self.string_constant(method.name)?;
            for op in &method.code {
                match *op {
                    Opcode::PushInt(i) => self.expect_kind(i, "int")?,
                    Opcode::PushDouble(i) => self.expect_kind(i, "double")?,
                    Opcode::PushString(i) | Opcode::GetGlobal(i) | Opcode::SetGlobal(i) => {
                        self.expect_kind(i, "string")?
                    }
                    Opcode::NewFunction(i) => {
                        self.method(i)?;
                    }
                    _ => {}
                }
            }
        }
        for definition in &self.definitions {
            self.string_constant(definition.name)?;
            match definition.kind {
                DefinitionKind::Slot(Some(index)) => {
                    self.constant(index)?;
                }
                DefinitionKind::Slot(None) => {}
                DefinitionKind::Method(index) => {
                    self.method(index)?;
                }
            }
        }
        Ok(())
    }

    fn expect_kind(&self, index: u32, expected: &'static str) -> Result<(), AbcError> {
        let constant = self.constant(index)?;
        if constant.kind_name() != expected {
            return Err(AbcError::ConstantKind { index, expected });
        }
        Ok(())
    }

    /// Encode the module in the binary format
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut writer = AbcWriter::new();
        writer.write_u16(self.minor_version);
        writer.write_u16(self.major_version);

        writer.write_u30(self.constants.len() as u32);
        for constant in &self.constants {
            match constant {
                Constant::Int(n) => {
                    writer.write_u8(CONSTANT_INT);
                    writer.write_s32(*n);
                }
                Constant::Double(n) => {
                    writer.write_u8(CONSTANT_DOUBLE);
                    writer.write_d64(*n);
                }
                Constant::String(s) => {
                    writer.write_u8(CONSTANT_STRING);
                    writer.write_string(s);
                }
            }
        }

        writer.write_u30(self.methods.len() as u32);
        for method in &self.methods {
            writer.write_u30(method.name);
            writer.write_u30(method.param_count);
            writer.write_u30(method.local_count);
            writer.write_u30(method.code.len() as u32);
            for op in &method.code {
                writer.write_u8(op.code());
                if let Some(operand) = op.operand() {
                    writer.write_u30(operand);
                }
            }
        }

        writer.write_u30(self.definitions.len() as u32);
        for definition in &self.definitions {
            writer.write_u30(definition.name);
            match definition.kind {
                DefinitionKind::Slot(value) => {
                    writer.write_u8(DEFINITION_SLOT);
                    writer.write_u30(value.map_or(0, |index| index + 1));
                }
                DefinitionKind::Method(index) => {
                    writer.write_u8(DEFINITION_METHOD);
                    writer.write_u30(index);
                }
            }
        }

        writer.write_u30(self.init);
        writer.into_bytes()
    }

    /// Identifying label, usually the file name
    pub fn label(&self) -> &str {
        &self.label
    }

    /// `(major, minor)` version
    pub fn version(&self) -> (u16, u16) {
        (self.major_version, self.minor_version)
    }

    /// Constant pool
    pub fn constants(&self) -> &[Constant] {
        &self.constants
    }

    /// Method table
    pub fn methods(&self) -> &[MethodInfo] {
        &self.methods
    }

    /// Top-level definitions
    pub fn definitions(&self) -> &[Definition] {
        &self.definitions
    }

    /// Index of the initializer method
    pub fn init_method(&self) -> u32 {
        self.init
    }

    /// Constant at `index`
    pub fn constant(&self, index: u32) -> Result<&Constant, AbcError> {
        self.constants
            .get(index as usize)
            .ok_or(AbcError::ConstantOutOfRange { index })
    }

    /// String constant at `index`
    pub fn string_constant(&self, index: u32) -> Result<&str, AbcError> {
        match self.constant(index)? {
            Constant::String(s) => Ok(s),
            _ => Err(AbcError::ConstantKind {
                index,
                expected: "string",
            }),
        }
    }

    /// Method at `index`
    pub fn method(&self, index: u32) -> Result<&MethodInfo, AbcError> {
        self.methods
            .get(index as usize)
            .ok_or(AbcError::MethodOutOfRange { index })
    }

    /// Name of a method; modules are validated on construction so this
    /// falls back to an empty string only for hand-built tables
    pub fn method_name(&self, index: u32) -> &str {
        self.method(index)
            .and_then(|m| self.string_constant(m.name))
            .unwrap_or("")
    }

    /// Names of the top-level definitions, in declaration order
    pub fn definition_names(&self) -> Vec<&str> {
        self.definitions
            .iter()
            .filter_map(|d| self.string_constant(d.name).ok())
            .collect()
    }

    /// Every symbol the module defines or references: definition names,
    /// method names and global names used by `getglobal`/`setglobal`.
    /// Sorted and deduplicated.
    pub fn symbol_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .definition_names()
            .into_iter()
            .map(str::to_string)
            .collect();
        for method in &self.methods {
            if let Ok(name) = self.string_constant(method.name) {
                names.push(name.to_string());
            }
            for op in &method.code {
                if let Opcode::GetGlobal(i) | Opcode::SetGlobal(i) = op {
                    if let Ok(name) = self.string_constant(*i) {
                        names.push(name.to_string());
                    }
                }
            }
        }
        names.sort();
        names.dedup();
        names
    }
}
