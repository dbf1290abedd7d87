//! Unit tests for Value

use core_types::{FunctionRef, Value};

#[test]
fn test_truthiness() {
    assert!(!Value::Undefined.is_truthy());
    assert!(!Value::Null.is_truthy());
    assert!(!Value::Boolean(false).is_truthy());
    assert!(!Value::Int(0).is_truthy());
    assert!(!Value::Double(0.0).is_truthy());
    assert!(Value::Int(-1).is_truthy());
    assert!(Value::NativeFunction("trace".to_string()).is_truthy());
    assert!(Value::Function(FunctionRef { module: 0, method: 0 }).is_truthy());
}

#[test]
fn test_type_of() {
    assert_eq!(Value::Undefined.type_of(), "undefined");
    assert_eq!(Value::Null.type_of(), "object");
    assert_eq!(Value::Double(1.5).type_of(), "number");
    assert_eq!(Value::String("s".to_string()).type_of(), "string");
    assert_eq!(Value::NativeFunction("trace".to_string()).type_of(), "function");
}

#[test]
fn test_to_number() {
    assert_eq!(Value::Boolean(true).to_number(), 1.0);
    assert_eq!(Value::Null.to_number(), 0.0);
    assert_eq!(Value::String(" 12 ".to_string()).to_number(), 12.0);
    assert!(Value::String("abc".to_string()).to_number().is_nan());
    assert!(Value::Undefined.to_number().is_nan());
}

#[test]
fn test_from_number_keeps_negative_zero_as_double() {
    assert_eq!(Value::from_number(-0.0), Value::Double(-0.0));
    assert_eq!(Value::from_number(-4.0), Value::Int(-4));
}

#[test]
fn test_display() {
    assert_eq!(Value::Int(42).to_string(), "42");
    assert_eq!(Value::Boolean(false).to_string(), "false");
    assert_eq!(Value::Double(f64::INFINITY).to_string(), "Infinity");
    assert_eq!(Value::Double(1.25).to_string(), "1.25");
    assert_eq!(Value::String("hi".to_string()).to_string(), "hi");
}
