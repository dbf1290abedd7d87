//! VM value representation.
//!
//! This module provides the `Value` enum manipulated by the interpreter's
//! operand stack, locals and global namespaces.

use std::fmt;

/// Reference to a method defined by a module loaded into a security domain.
///
/// `module` is the index into the owning domain's module table, so a
/// `FunctionRef` is only meaningful inside the domain that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FunctionRef {
    /// Index into the domain's loaded-module table
    pub module: usize,
    /// Index into the module's method table
    pub method: u32,
}

/// Represents any VM value.
///
/// # Examples
///
/// ```
/// use core_types::Value;
///
/// let undefined = Value::Undefined;
/// let number = Value::Int(42);
/// let float = Value::Double(3.5);
///
/// assert!(!undefined.is_truthy());
/// assert!(number.is_truthy());
/// assert_eq!(float.to_string(), "3.5");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// The undefined value
    Undefined,
    /// The null value
    Null,
    /// Boolean (true or false)
    Boolean(bool),
    /// Signed 32-bit integer
    Int(i32),
    /// IEEE 754 double-precision floating point
    Double(f64),
    /// String value
    String(String),
    /// A bytecode method closure
    Function(FunctionRef),
    /// Native intrinsic referenced by name
    NativeFunction(String),
}

impl Value {
    /// Returns whether this value is truthy.
    ///
    /// Falsy values are undefined, null, false, zero, NaN and the empty
    /// string. Functions are always truthy.
    ///
    /// # Examples
    ///
    /// ```
    /// use core_types::Value;
    ///
    /// assert!(!Value::Undefined.is_truthy());
    /// assert!(!Value::Int(0).is_truthy());
    /// assert!(!Value::Double(f64::NAN).is_truthy());
    /// assert!(Value::String("x".to_string()).is_truthy());
    /// ```
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Undefined | Value::Null => false,
            Value::Boolean(b) => *b,
            Value::Int(n) => *n != 0,
            Value::Double(n) => !n.is_nan() && *n != 0.0,
            Value::String(s) => !s.is_empty(),
            Value::Function(_) | Value::NativeFunction(_) => true,
        }
    }

    /// Returns the `typeof` name of this value.
    pub fn type_of(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Null => "object",
            Value::Boolean(_) => "boolean",
            Value::Int(_) | Value::Double(_) => "number",
            Value::String(_) => "string",
            Value::Function(_) | Value::NativeFunction(_) => "function",
        }
    }

    /// Numeric conversion used by the arithmetic and comparison opcodes.
    pub fn to_number(&self) -> f64 {
        match self {
            Value::Undefined => f64::NAN,
            Value::Null => 0.0,
            Value::Boolean(b) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            }
            Value::Int(n) => f64::from(*n),
            Value::Double(n) => *n,
            Value::String(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    0.0
                } else {
                    trimmed.parse().unwrap_or(f64::NAN)
                }
            }
            Value::Function(_) | Value::NativeFunction(_) => f64::NAN,
        }
    }

    /// Builds the narrowest numeric value for `n`.
    ///
    /// Integral results that fit in 32 bits stay `Int`, everything else is
    /// a `Double`.
    pub fn from_number(n: f64) -> Value {
        if n.fract() == 0.0
            && n >= f64::from(i32::MIN)
            && n <= f64::from(i32::MAX)
            && !(n == 0.0 && n.is_sign_negative())
        {
            Value::Int(n as i32)
        } else {
            Value::Double(n)
        }
    }

    /// Strict equality: no coercion except between the two numeric forms.
    pub fn strict_equals(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Int(_) | Value::Double(_), Value::Int(_) | Value::Double(_)) => {
                self.to_number() == other.to_number()
            }
            _ => self == other,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => write!(f, "undefined"),
            Value::Null => write!(f, "null"),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Int(n) => write!(f, "{}", n),
            Value::Double(n) => {
                if n.is_nan() {
                    write!(f, "NaN")
                } else if n.is_infinite() {
                    if n.is_sign_positive() {
                        write!(f, "Infinity")
                    } else {
                        write!(f, "-Infinity")
                    }
                } else if n.fract() == 0.0 && n.abs() < 1e15 {
                    // Integer-valued doubles display without decimal point
                    write!(f, "{}", *n as i64)
                } else {
                    let mut buffer = ryu::Buffer::new();
                    write!(f, "{}", buffer.format_finite(*n))
                }
            }
            Value::String(s) => write!(f, "{}", s),
            Value::Function(func) => {
                write!(f, "[function Function#{}.{}]", func.module, func.method)
            }
            Value::NativeFunction(name) => write!(f, "function {}() {{ [native code] }}", name),
        }
    }
}
