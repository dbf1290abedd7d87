//! Bytecode / Interpreter Integration Tests
//!
//! Modules travel through their binary form before they run: assembled,
//! serialized, decoded again, then executed in a bootstrapped domain.

use bytecode_system::AbcFile;
use core_types::{ErrorKind, IndentingWriter, Value};
use integration_tests::fixtures::{module_bytes, Home};
use interpreter::{create_security_domain, CatalogPaths, DomainOptions, DomainScope, SecurityDomain, WriterHost};
use std::rc::Rc;

fn bootstrap(home: &Home, with_catalog: bool) -> (SecurityDomain, WriterHost, core_types::SharedBuffer) {
    let (writer, output) = IndentingWriter::captured();
    let mut host = WriterHost::new(writer.clone());
    let catalog = CatalogPaths::new(
        home.path("build/playerglobal/playerglobal.abcs"),
        home.path("build/playerglobal/playerglobal.json"),
    );
    let domain = create_security_domain(
        &home.path("src/avm2/generated/builtin/builtin.abc"),
        Some(&home.path("src/avm2/generated/shell/shell.abc")),
        with_catalog.then_some(&catalog),
        DomainOptions::default().with_writer(writer),
        &mut host,
    )
    .expect("bootstrap failed");
    (domain, host, output)
}

fn run(domain: &mut SecurityDomain, host: &mut WriterHost, source: &str) -> Result<Value, core_types::VmError> {
    let bytes = module_bytes(source, "app.abc");
    let abc = AbcFile::parse(&bytes, "app.abc").expect("decode failed");
    domain.execute_abc(DomainScope::Application, Rc::new(abc), host)
}

/// Test: the system scope sees the builtin and then the shell library
#[test]
fn test_bootstrap_order() {
    let home = Home::new();
    let (domain, _, _) = bootstrap(&home, false);
    assert_eq!(
        domain.get_global(DomainScope::Application, "runtimeName"),
        Some(&Value::String("builtin+shell".to_string()))
    );
    assert_eq!(domain.module_labels(DomainScope::System).len(), 2);
}

/// Test: application code calls into the builtin
#[test]
fn test_application_calls_builtin() {
    let home = Home::new();
    let (mut domain, mut host, _) = bootstrap(&home, false);
    let result = run(
        &mut domain,
        &mut host,
        ".method main\n  getglobal identity\n  pushint 5\n  call 1\n  returnvalue\n.end\n.init main",
    )
    .expect("execution failed");
    assert_eq!(result, Value::Int(5));
}

/// Test: catalog symbols load into the system scope on first use
#[test]
fn test_catalog_symbol_resolution() {
    let home = Home::new();
    let (mut domain, mut host, _) = bootstrap(&home, true);
    assert!(!domain.scope(DomainScope::System).contains("Stage"));

    let result = run(
        &mut domain,
        &mut host,
        ".method main\n  getglobal Stage\n  pushint 50\n  add\n  returnvalue\n.end\n.init main",
    )
    .expect("execution failed");
    assert_eq!(result, Value::Int(600));
    assert!(domain.scope(DomainScope::System).contains("Stage"));
    assert!(!domain.scope(DomainScope::Application).contains("Stage"));
}

/// Test: without the catalog the symbol is a reference error
#[test]
fn test_unresolved_symbol() {
    let home = Home::new();
    let (mut domain, mut host, _) = bootstrap(&home, false);
    let err = run(
        &mut domain,
        &mut host,
        ".method main\n  getglobal Stage\n  returnvalue\n.end\n.init main",
    )
    .unwrap_err();
    assert_eq!(err.kind, ErrorKind::ReferenceError);
    assert_eq!(err.to_string(), "ReferenceError: Stage is not defined");
}

/// Test: traces from application code reach the host
#[test]
fn test_trace_reaches_host() {
    let home = Home::new();
    let (mut domain, mut host, output) = bootstrap(&home, false);
    run(
        &mut domain,
        &mut host,
        ".method main\n  getglobal trace\n  getglobal runtimeName\n  call 1\n  pop\n  returnvoid\n.end\n.init main",
    )
    .expect("execution failed");
    assert_eq!(output.contents(), "builtin+shell\n");
}
