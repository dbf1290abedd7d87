//! Bytecode opcodes
//!
//! Defines the instruction set of the stack machine. Operands that name
//! constants, methods or locals are indices into the owning module's tables.

/// Bytecode opcodes for module execution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Opcode {
    // Literals
    /// Push undefined
    PushUndefined,
    /// Push null
    PushNull,
    /// Push boolean true
    PushTrue,
    /// Push boolean false
    PushFalse,
    /// Push an int constant from the pool
    PushInt(u32),
    /// Push a double constant from the pool
    PushDouble(u32),
    /// Push a string constant from the pool
    PushString(u32),

    // Stack manipulation
    /// Discard the top value
    Pop,
    /// Duplicate the top value
    Dup,
    /// Exchange the two top values
    Swap,

    // Variables
    /// Resolve a global by name (string constant index)
    GetGlobal(u32),
    /// Store the top value into a global of the executing scope
    SetGlobal(u32),
    /// Push a local slot
    GetLocal(u32),
    /// Pop into a local slot
    SetLocal(u32),

    // Arithmetic
    /// Add, or concatenate when either operand is a string
    Add,
    /// Subtract top from second-top
    Subtract,
    /// Multiply top two values
    Multiply,
    /// Divide second-top by top
    Divide,
    /// Remainder of second-top by top
    Modulo,
    /// Negate top value
    Negate,

    // Comparison and logic
    /// Loose equality
    Equals,
    /// Strict equality
    StrictEquals,
    /// second-top < top
    LessThan,
    /// second-top <= top
    LessEquals,
    /// second-top > top
    GreaterThan,
    /// second-top >= top
    GreaterEquals,
    /// Logical negation of truthiness
    Not,
    /// Replace top value with its type name
    TypeOf,

    // Control flow (operands are absolute instruction indices)
    /// Unconditional jump
    Jump(u32),
    /// Pop and jump when truthy
    IfTrue(u32),
    /// Pop and jump when falsy
    IfFalse(u32),

    // Functions
    /// Push a closure over a method of this module
    NewFunction(u32),
    /// Call with the given argument count: `[callee, args..] -> [result]`
    Call(u32),
    /// Return the top value
    ReturnValue,
    /// Return undefined
    ReturnVoid,
    /// Throw the top value
    Throw,
}

/// How an opcode's operand is encoded and displayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperandKind {
    /// No operand
    None,
    /// Constant pool index holding an int
    IntConstant,
    /// Constant pool index holding a double
    DoubleConstant,
    /// Constant pool index holding a string
    StringConstant,
    /// Constant pool index holding a name
    Name,
    /// Local slot index
    Local,
    /// Instruction index
    Target,
    /// Method index
    Method,
    /// Argument count
    Count,
}

/// Opcode byte values and mnemonics, kept in one table so the binary codec,
/// the assembler and the disassembler cannot drift apart.
const TABLE: &[(u8, &str, OperandKind)] = &[
    (0x03, "throw", OperandKind::None),
    (0x10, "jump", OperandKind::Target),
    (0x11, "iftrue", OperandKind::Target),
    (0x12, "iffalse", OperandKind::Target),
    (0x20, "pushnull", OperandKind::None),
    (0x21, "pushundefined", OperandKind::None),
    (0x26, "pushtrue", OperandKind::None),
    (0x27, "pushfalse", OperandKind::None),
    (0x29, "pop", OperandKind::None),
    (0x2a, "dup", OperandKind::None),
    (0x2b, "swap", OperandKind::None),
    (0x2c, "pushstring", OperandKind::StringConstant),
    (0x2d, "pushint", OperandKind::IntConstant),
    (0x2f, "pushdouble", OperandKind::DoubleConstant),
    (0x40, "newfunction", OperandKind::Method),
    (0x41, "call", OperandKind::Count),
    (0x47, "returnvoid", OperandKind::None),
    (0x48, "returnvalue", OperandKind::None),
    (0x60, "getglobal", OperandKind::Name),
    (0x61, "setglobal", OperandKind::Name),
    (0x62, "getlocal", OperandKind::Local),
    (0x63, "setlocal", OperandKind::Local),
    (0x90, "negate", OperandKind::None),
    (0x95, "typeof", OperandKind::None),
    (0x96, "not", OperandKind::None),
    (0xa0, "add", OperandKind::None),
    (0xa1, "subtract", OperandKind::None),
    (0xa2, "multiply", OperandKind::None),
    (0xa3, "divide", OperandKind::None),
    (0xa4, "modulo", OperandKind::None),
    (0xab, "equals", OperandKind::None),
    (0xac, "strictequals", OperandKind::None),
    (0xad, "lessthan", OperandKind::None),
    (0xae, "lessequals", OperandKind::None),
    (0xaf, "greaterthan", OperandKind::None),
    (0xb0, "greaterequals", OperandKind::None),
];

impl Opcode {
    /// Byte value of the opcode in the binary format
    pub fn code(&self) -> u8 {
        match self {
            Opcode::Throw => 0x03,
            Opcode::Jump(_) => 0x10,
            Opcode::IfTrue(_) => 0x11,
            Opcode::IfFalse(_) => 0x12,
            Opcode::PushNull => 0x20,
            Opcode::PushUndefined => 0x21,
            Opcode::PushTrue => 0x26,
            Opcode::PushFalse => 0x27,
            Opcode::Pop => 0x29,
            Opcode::Dup => 0x2a,
            Opcode::Swap => 0x2b,
            Opcode::PushString(_) => 0x2c,
            Opcode::PushInt(_) => 0x2d,
            Opcode::PushDouble(_) => 0x2f,
            Opcode::NewFunction(_) => 0x40,
            Opcode::Call(_) => 0x41,
            Opcode::ReturnVoid => 0x47,
            Opcode::ReturnValue => 0x48,
            Opcode::GetGlobal(_) => 0x60,
            Opcode::SetGlobal(_) => 0x61,
            Opcode::GetLocal(_) => 0x62,
            Opcode::SetLocal(_) => 0x63,
            Opcode::Negate => 0x90,
            Opcode::TypeOf => 0x95,
            Opcode::Not => 0x96,
            Opcode::Add => 0xa0,
            Opcode::Subtract => 0xa1,
            Opcode::Multiply => 0xa2,
            Opcode::Divide => 0xa3,
            Opcode::Modulo => 0xa4,
            Opcode::Equals => 0xab,
            Opcode::StrictEquals => 0xac,
            Opcode::LessThan => 0xad,
            Opcode::LessEquals => 0xae,
            Opcode::GreaterThan => 0xaf,
            Opcode::GreaterEquals => 0xb0,
        }
    }

    /// The operand carried by this opcode, if any
    pub fn operand(&self) -> Option<u32> {
        match *self {
            Opcode::PushInt(i)
            | Opcode::PushDouble(i)
            | Opcode::PushString(i)
            | Opcode::GetGlobal(i)
            | Opcode::SetGlobal(i)
            | Opcode::GetLocal(i)
            | Opcode::SetLocal(i)
            | Opcode::Jump(i)
            | Opcode::IfTrue(i)
            | Opcode::IfFalse(i)
            | Opcode::NewFunction(i)
            | Opcode::Call(i) => Some(i),
            _ => None,
        }
    }

    /// Assembly mnemonic
    pub fn mnemonic(&self) -> &'static str {
        let code = self.code();
        TABLE
            .iter()
            .find(|(c, _, _)| *c == code)
            .map(|(_, name, _)| *name)
            .unwrap_or("unknown")
    }

    /// Operand kind of this opcode
    pub fn operand_kind(&self) -> OperandKind {
        Self::operand_kind_of(self.code()).unwrap_or(OperandKind::None)
    }

    /// Operand kind for a raw opcode byte, `None` when the byte is not an opcode
    pub fn operand_kind_of(code: u8) -> Option<OperandKind> {
        TABLE.iter().find(|(c, _, _)| *c == code).map(|(_, _, kind)| *kind)
    }

    /// Opcode byte for a mnemonic
    pub fn code_for_mnemonic(mnemonic: &str) -> Option<u8> {
        TABLE.iter().find(|(_, name, _)| *name == mnemonic).map(|(code, _, _)| *code)
    }

    /// Build an opcode from its byte value and operand.
    ///
    /// The operand is ignored for opcodes that take none. Returns `None` for
    /// unknown bytes.
    pub fn from_parts(code: u8, operand: u32) -> Option<Opcode> {
        let op = match code {
            0x03 => Opcode::Throw,
            0x10 => Opcode::Jump(operand),
            0x11 => Opcode::IfTrue(operand),
            0x12 => Opcode::IfFalse(operand),
            0x20 => Opcode::PushNull,
            0x21 => Opcode::PushUndefined,
            0x26 => Opcode::PushTrue,
            0x27 => Opcode::PushFalse,
            0x29 => Opcode::Pop,
            0x2a => Opcode::Dup,
            0x2b => Opcode::Swap,
            0x2c => Opcode::PushString(operand),
            0x2d => Opcode::PushInt(operand),
            0x2f => Opcode::PushDouble(operand),
            0x40 => Opcode::NewFunction(operand),
            0x41 => Opcode::Call(operand),
            0x47 => Opcode::ReturnVoid,
            0x48 => Opcode::ReturnValue,
            0x60 => Opcode::GetGlobal(operand),
            0x61 => Opcode::SetGlobal(operand),
            0x62 => Opcode::GetLocal(operand),
            0x63 => Opcode::SetLocal(operand),
            0x90 => Opcode::Negate,
            0x95 => Opcode::TypeOf,
            0x96 => Opcode::Not,
            0xa0 => Opcode::Add,
            0xa1 => Opcode::Subtract,
            0xa2 => Opcode::Multiply,
            0xa3 => Opcode::Divide,
            0xa4 => Opcode::Modulo,
            0xab => Opcode::Equals,
            0xac => Opcode::StrictEquals,
            0xad => Opcode::LessThan,
            0xae => Opcode::LessEquals,
            0xaf => Opcode::GreaterThan,
            0xb0 => Opcode::GreaterEquals,
            _ => return None,
        };
        Some(op)
    }

    /// Whether control never falls through to the next instruction
    pub fn is_unconditional_terminator(&self) -> bool {
        matches!(
            self,
            Opcode::Jump(_) | Opcode::ReturnValue | Opcode::ReturnVoid | Opcode::Throw
        )
    }
}
