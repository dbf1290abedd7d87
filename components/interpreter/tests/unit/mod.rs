//! Unit tests for bytecode execution semantics

use bytecode_system::assemble;
use core_types::{ErrorKind, FunctionRef, IndentingWriter, Value, VmError};
use interpreter::{DomainOptions, DomainScope, Host, SecurityDomain, UnitTestRegistration};
use std::rc::Rc;

#[derive(Default)]
struct Recorder {
    traces: Vec<String>,
    commands: Vec<(String, String)>,
    tests: Vec<UnitTestRegistration>,
}

impl Host for Recorder {
    fn trace(&mut self, message: &str) {
        self.traces.push(message.to_string());
    }

    fn fs_command(&mut self, command: &str, args: &str) {
        self.commands.push((command.to_string(), args.to_string()));
    }

    fn register_unit_test(&mut self, registration: UnitTestRegistration) {
        self.tests.push(registration);
    }
}

fn domain_with(options: DomainOptions) -> SecurityDomain {
    let mut domain = SecurityDomain::new(options);
    domain.initialize();
    domain
}

fn domain() -> SecurityDomain {
    let (writer, _) = IndentingWriter::captured();
    domain_with(DomainOptions::default().with_writer(writer))
}

fn run_in(domain: &mut SecurityDomain, source: &str, host: &mut Recorder) -> Result<Value, VmError> {
    let abc = assemble(source, "test.abc").unwrap();
    domain.execute_abc(DomainScope::Application, Rc::new(abc), host)
}

fn run(source: &str) -> (Result<Value, VmError>, Recorder) {
    let mut host = Recorder::default();
    let result = run_in(&mut domain(), source, &mut host);
    (result, host)
}

// ============================================================================
// Arithmetic and control flow
// ============================================================================

#[test]
fn test_integer_arithmetic() {
    let (result, _) = run(
        ".method main\n  pushint 10\n  pushint 5\n  add\n  pushint 3\n  multiply\n  pushint 2\n  subtract\n  returnvalue\n.end\n.init main",
    );
    assert_eq!(result.unwrap(), Value::Int(43));
}

#[test]
fn test_division_produces_doubles() {
    let (result, _) = run(".method main\n  pushint 7\n  pushint 2\n  divide\n  returnvalue\n.end\n.init main");
    assert_eq!(result.unwrap(), Value::Double(3.5));
}

#[test]
fn test_string_concatenation() {
    let (result, _) = run(
        ".method main\n  pushstring \"n=\"\n  pushdouble 2.5\n  add\n  returnvalue\n.end\n.init main",
    );
    assert_eq!(result.unwrap(), Value::String("n=2.5".to_string()));
}

#[test]
fn test_typeof() {
    let (result, _) = run(".method main\n  pushnull\n  typeof\n  returnvalue\n.end\n.init main");
    assert_eq!(result.unwrap(), Value::String("object".to_string()));
}

#[test]
fn test_loop_sums_range() {
    let source = "
.method main locals=2
  pushint 0
  setlocal 0
  pushint 1
  setlocal 1
top:
  getlocal 1
  pushint 10
  lessequals
  iffalse done
  getlocal 0
  getlocal 1
  add
  setlocal 0
  getlocal 1
  pushint 1
  add
  setlocal 1
  jump top
done:
  getlocal 0
  returnvalue
.end
.init main
";
    let (result, _) = run(source);
    assert_eq!(result.unwrap(), Value::Int(55));
}

#[test]
fn test_recursive_factorial() {
    let source = "
.method fact params=1
  getlocal 0
  pushint 1
  lessequals
  iffalse recurse
  pushint 1
  returnvalue
recurse:
  getlocal 0
  getglobal fact
  getlocal 0
  pushint 1
  subtract
  call 1
  multiply
  returnvalue
.end
.method main
  getglobal fact
  pushint 5
  call 1
  returnvalue
.end
.function fact fact
.init main
";
    let (result, _) = run(source);
    assert_eq!(result.unwrap(), Value::Int(120));
}

// ============================================================================
// Errors
// ============================================================================

#[test]
fn test_throw_carries_stack_innermost_first() {
    let source = "
.method inner
  pushstring \"boom\"
  throw
.end
.method main
  newfunction inner
  call 0
  returnvalue
.end
.init main
";
    let err = run(source).0.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Error);
    assert_eq!(err.message, "boom");
    assert_eq!(err.stack.len(), 2);
    assert_eq!(err.stack[0].method_name, "inner");
    assert_eq!(err.stack[0].instruction, 1);
    assert_eq!(err.stack[1].method_name, "main");
    assert_eq!(err.stack_lines()[1], "    at main (test.abc:1)");
}

#[test]
fn test_undefined_global_is_reference_error() {
    let err = run(".method main\n  getglobal missing\n  returnvalue\n.end\n.init main")
        .0
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::ReferenceError);
    assert_eq!(err.to_string(), "ReferenceError: missing is not defined");
}

#[test]
fn test_calling_non_function_is_type_error() {
    let err = run(".method main\n  pushint 3\n  call 0\n  returnvalue\n.end\n.init main")
        .0
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::TypeError);
}

#[test]
fn test_unbounded_recursion_is_range_error() {
    let source = ".method spin\n  getglobal spin\n  call 0\n  returnvalue\n.end\n.function spin spin\n.init spin";
    let err = run(source).0.unwrap_err();
    assert_eq!(err.kind, ErrorKind::RangeError);
}

#[test]
fn test_verifier_runs_on_load() {
    let (writer, _) = IndentingWriter::captured();
    let mut debug = domain_with(DomainOptions::default().with_writer(writer.clone()));
    let source = ".method main\n  add\n  returnvalue\n.end\n.init main";
    let err = run_in(&mut debug, source, &mut Recorder::default()).unwrap_err();
    assert_eq!(err.kind, ErrorKind::VerifyError);
    assert_eq!(debug.module_count(), 0);

    let mut release = domain_with(DomainOptions::default().with_writer(writer).with_release(true));
    let err = run_in(&mut release, source, &mut Recorder::default()).unwrap_err();
    assert_eq!(err.kind, ErrorKind::InternalError);
}

// ============================================================================
// Scopes
// ============================================================================

#[test]
fn test_setglobal_writes_executing_scope() {
    let mut domain = domain();
    run_in(
        &mut domain,
        ".method main\n  pushint 7\n  setglobal counter\n  returnvoid\n.end\n.init main",
        &mut Recorder::default(),
    )
    .unwrap();
    assert_eq!(
        domain.get_global(DomainScope::Application, "counter"),
        Some(&Value::Int(7))
    );
    assert!(domain.get_global(DomainScope::System, "counter").is_none());
}

#[test]
fn test_invoke_defined_function() {
    let mut domain = domain();
    let mut host = Recorder::default();
    run_in(
        &mut domain,
        ".method double params=1\n  getlocal 0\n  pushint 2\n  multiply\n  returnvalue\n.end\n.method main\n  returnvoid\n.end\n.function double double\n.init main",
        &mut host,
    )
    .unwrap();
    let double = domain
        .get_global(DomainScope::Application, "double")
        .cloned()
        .unwrap();
    assert_eq!(
        domain.invoke(&double, &[Value::Int(21)], &mut host).unwrap(),
        Value::Int(42)
    );
}

// ============================================================================
// Natives
// ============================================================================

#[test]
fn test_trace_joins_arguments() {
    let (_, host) = run(
        ".method main\n  getglobal trace\n  pushstring \"a\"\n  pushint 1\n  pushtrue\n  call 3\n  pop\n  returnvoid\n.end\n.init main",
    );
    assert_eq!(host.traces, vec!["a 1 true"]);
}

#[test]
fn test_fscommand_reaches_host() {
    let (_, host) = run(
        ".method main\n  getglobal fscommand\n  pushstring \"quit\"\n  call 1\n  pop\n  returnvoid\n.end\n.init main",
    );
    assert_eq!(host.commands, vec![("quit".to_string(), String::new())]);
}

#[test]
fn test_push_unit_test_registrations() {
    let source = "
.method testAddition
  returnvoid
.end
.method main
  getglobal pushUnitTest
  pushint 3
  call 1
  pop
  getglobal pushUnitTest
  newfunction testAddition
  call 1
  pop
  returnvoid
.end
.init main
";
    let (result, host) = run(source);
    result.unwrap();
    assert_eq!(
        host.tests,
        vec![
            UnitTestRegistration::Repeat(3),
            UnitTestRegistration::Test {
                name: "testAddition".to_string(),
                function: Value::Function(FunctionRef { module: 0, method: 0 }),
            },
        ]
    );
}

#[test]
fn test_fractional_repeat_rounds_up() {
    let (result, host) = run(
        ".method main\n  getglobal pushUnitTest\n  pushdouble 2.5\n  call 1\n  pop\n  getglobal pushUnitTest\n  pushdouble -0.5\n  call 1\n  returnvalue\n.end\n.init main",
    );
    result.unwrap();
    assert_eq!(
        host.tests,
        vec![UnitTestRegistration::Repeat(3), UnitTestRegistration::Repeat(0)]
    );
}

#[test]
fn test_assert_equals_failure_message() {
    let err = run(
        ".method main\n  getglobal assertEquals\n  pushint 1\n  pushint 2\n  pushstring \"sum\"\n  call 3\n  returnvalue\n.end\n.init main",
    )
    .0
    .unwrap_err();
    assert_eq!(err.message, "expected 2 but was 1: sum");
}

#[test]
fn test_assert_passes_on_truthy() {
    let (result, _) = run(
        ".method main\n  getglobal assert\n  pushstring \"x\"\n  call 1\n  returnvalue\n.end\n.init main",
    );
    assert_eq!(result.unwrap(), Value::Undefined);
}

#[test]
fn test_interpreter_trace_channel() {
    let (writer, buffer) = IndentingWriter::captured();
    let mut domain = domain_with(
        DomainOptions::default()
            .with_writer(writer)
            .with_tracing(false, true),
    );
    run_in(
        &mut domain,
        ".method main\n  pushint 1\n  returnvalue\n.end\n.init main",
        &mut Recorder::default(),
    )
    .unwrap();
    assert!(buffer.contents().contains("main    0: pushint 1"));
    assert!(buffer.contents().contains("main    1: returnvalue"));
}
