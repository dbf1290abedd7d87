//! Contract tests for interpreter API
//!
//! These tests pin the public surface other components rely on.

use core_types::{IndentingWriter, Value};
use interpreter::{
    DomainOptions, DomainScope, Host, SecurityDomain, UnitTestRegistration, MAX_CALL_DEPTH,
};

struct Silent;

impl Host for Silent {
    fn trace(&mut self, _message: &str) {}
}

fn quiet() -> SecurityDomain {
    let (writer, _) = IndentingWriter::captured();
    SecurityDomain::new(DomainOptions::default().with_writer(writer))
}

/// initialize() installs the natives into the system scope only
#[test]
fn test_initialize_installs_natives() {
    let mut domain = quiet();
    assert!(!domain.is_initialized());
    domain.initialize();
    for name in ["trace", "fscommand", "pushUnitTest", "assert", "assertEquals", "getTimer"] {
        assert_eq!(
            domain.get_global(DomainScope::System, name),
            Some(&Value::NativeFunction(name.to_string()))
        );
        assert!(domain.scope(DomainScope::Application).get(name).is_none());
    }
}

/// Natives are callable through invoke
#[test]
fn test_invoke_native() {
    let mut domain = quiet();
    domain.initialize();
    let timer = domain.get_global(DomainScope::System, "getTimer").cloned().unwrap();
    let result = domain.invoke(&timer, &[], &mut Silent).unwrap();
    assert!(matches!(result, Value::Int(n) if n >= 0));
}

/// Host methods other than trace have no-op defaults
#[test]
fn test_host_defaults() {
    let mut host = Silent;
    host.fs_command("quit", "");
    host.register_unit_test(UnitTestRegistration::Repeat(0));
}

/// The depth limit is a public constant
#[test]
fn test_call_depth_limit() {
    assert_eq!(MAX_CALL_DEPTH, 256);
}
