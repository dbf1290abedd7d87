//! Native intrinsics installed into the system scope on initialization

use core_types::{ErrorKind, Value, VmError};

use crate::domain::SecurityDomain;
use crate::host::{Host, UnitTestRegistration};

/// Names bound to native functions
pub const NAMES: &[&str] = &[
    "trace",
    "fscommand",
    "pushUnitTest",
    "assert",
    "assertEquals",
    "getTimer",
];

fn arg(args: &[Value], index: usize) -> Value {
    args.get(index).cloned().unwrap_or(Value::Undefined)
}

fn with_message(prefix: String, args: &[Value], index: usize) -> String {
    match args.get(index) {
        Some(Value::Undefined) | None => prefix,
        Some(message) => format!("{}: {}", prefix, message),
    }
}

/// Call native `name`
pub fn call(
    domain: &mut SecurityDomain,
    name: &str,
    args: &[Value],
    host: &mut dyn Host,
) -> Result<Value, VmError> {
    match name {
        "trace" => {
            let line = args
                .iter()
                .map(Value::to_string)
                .collect::<Vec<_>>()
                .join(" ");
            host.trace(&line);
            Ok(Value::Undefined)
        }
        "fscommand" => {
            let command = arg(args, 0).to_string();
            let rest = match arg(args, 1) {
                Value::Undefined => String::new(),
                other => other.to_string(),
            };
            host.fs_command(&command, &rest);
            Ok(Value::Undefined)
        }
        "pushUnitTest" => {
            let registration = match arg(args, 0) {
                Value::Int(n) => UnitTestRegistration::Repeat(n.max(0) as u32),
                // A fractional count repeats up to the next whole number.
                Value::Double(n) if n.is_finite() => {
                    UnitTestRegistration::Repeat(n.max(0.0).ceil() as u32)
                }
                function @ (Value::Function(_) | Value::NativeFunction(_)) => {
                    UnitTestRegistration::Test {
                        name: domain.function_name(&function),
                        function,
                    }
                }
                other => {
                    return Err(VmError::new(
                        ErrorKind::TypeError,
                        format!("pushUnitTest expects a function or a count, got {}", other),
                    ))
                }
            };
            host.register_unit_test(registration);
            Ok(Value::Undefined)
        }
        "assert" => {
            if arg(args, 0).is_truthy() {
                Ok(Value::Undefined)
            } else {
                Err(VmError::new(
                    ErrorKind::Error,
                    with_message("Assertion failed".to_string(), args, 1),
                ))
            }
        }
        "assertEquals" => {
            let actual = arg(args, 0);
            let expected = arg(args, 1);
            if actual.strict_equals(&expected) {
                Ok(Value::Undefined)
            } else {
                Err(VmError::new(
                    ErrorKind::Error,
                    with_message(format!("expected {} but was {}", expected, actual), args, 2),
                ))
            }
        }
        "getTimer" => {
            let elapsed = i32::try_from(domain.elapsed_ms()).unwrap_or(i32::MAX);
            Ok(Value::Int(elapsed))
        }
        _ => Err(VmError::new(
            ErrorKind::ReferenceError,
            format!("unknown native {}", name),
        )),
    }
}
