//! Integration tests for interpreter
//!
//! Bootstraps security domains from module files on disk.

use bytecode_system::assemble;
use core_types::{ErrorKind, IndentingWriter, Value};
use interpreter::{
    create_security_domain, BootstrapError, CatalogPaths, DomainOptions, DomainScope, WriterHost,
};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const BUILTIN: &str = "
.method init
  pushstring \"builtin\"
  setglobal runtimeName
  returnvoid
.end
.method identity params=1
  getlocal 0
  returnvalue
.end
.function identity identity
.slot version int 3
.init init
";

fn write_module(dir: &Path, name: &str, source: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, assemble(source, name).unwrap().to_bytes()).unwrap();
    path
}

fn options() -> (DomainOptions, WriterHost) {
    let (writer, _) = IndentingWriter::captured();
    (
        DomainOptions::default().with_writer(writer.clone()),
        WriterHost::new(writer),
    )
}

#[test]
fn test_builtin_definitions_visible_in_system_scope() {
    let dir = TempDir::new().unwrap();
    let builtin = write_module(dir.path(), "builtin.abc", BUILTIN);
    let (options, mut host) = options();

    let domain = create_security_domain(&builtin, None, None, options, &mut host).unwrap();
    let system = domain.scope(DomainScope::System);
    assert!(domain.is_initialized());
    assert!(system.contains("identity"));
    assert_eq!(system.get("version"), Some(&Value::Int(3)));
    assert_eq!(system.get("runtimeName"), Some(&Value::String("builtin".to_string())));
    assert!(domain.scope(DomainScope::Application).modules().is_empty());
}

#[test]
fn test_two_bootstraps_are_independent() {
    let dir = TempDir::new().unwrap();
    let builtin = write_module(dir.path(), "builtin.abc", BUILTIN);
    let (options, mut host) = options();

    let mut first = create_security_domain(&builtin, None, None, options.clone(), &mut host).unwrap();
    let second = create_security_domain(&builtin, None, None, options, &mut host).unwrap();
    first.set_global(DomainScope::System, "version", Value::Int(99));
    assert_eq!(
        second.get_global(DomainScope::System, "version"),
        Some(&Value::Int(3))
    );
}

#[test]
fn test_aux_library_runs_after_builtin() {
    let dir = TempDir::new().unwrap();
    let builtin = write_module(dir.path(), "builtin.abc", BUILTIN);
    let shell = write_module(
        dir.path(),
        "shell.abc",
        ".method init\n  getglobal runtimeName\n  pushstring \"+shell\"\n  add\n  setglobal runtimeName\n  returnvoid\n.end\n.init init",
    );
    let (options, mut host) = options();

    let domain = create_security_domain(&builtin, Some(&shell), None, options, &mut host).unwrap();
    assert_eq!(
        domain.get_global(DomainScope::System, "runtimeName"),
        Some(&Value::String("builtin+shell".to_string()))
    );
    assert_eq!(domain.module_labels(DomainScope::System).len(), 2);
}

#[test]
fn test_missing_builtin_is_io_error() {
    let dir = TempDir::new().unwrap();
    let (options, mut host) = options();
    let err = create_security_domain(&dir.path().join("nope.abc"), None, None, options, &mut host)
        .unwrap_err();
    assert!(matches!(err, BootstrapError::Io { .. }));
}

#[test]
fn test_corrupt_builtin_is_parse_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("builtin.abc");
    fs::write(&path, b"not a module").unwrap();
    let (options, mut host) = options();
    let err = create_security_domain(&path, None, None, options, &mut host).unwrap_err();
    assert!(matches!(err, BootstrapError::Parse { .. }));
}

#[test]
fn test_throwing_builtin_is_execution_error() {
    let dir = TempDir::new().unwrap();
    let builtin = write_module(
        dir.path(),
        "builtin.abc",
        ".method init\n  pushstring \"bad\"\n  throw\n.end\n.init init",
    );
    let (options, mut host) = options();
    match create_security_domain(&builtin, None, None, options, &mut host) {
        Err(BootstrapError::Execution { source, .. }) => assert_eq!(source.kind, ErrorKind::Error),
        other => panic!("unexpected result {:?}", other.map(|_| ())),
    }
}

fn write_catalog(dir: &Path) -> CatalogPaths {
    let lib = assemble(
        ".method init\n  pushint 11\n  setglobal Lazy\n  returnvoid\n.end\n.init init",
        "lazy.abc",
    )
    .unwrap()
    .to_bytes();
    let index = format!(
        r#"[{{"name": "lazy.abc", "offset": 0, "length": {}, "defs": ["Lazy"]}}]"#,
        lib.len()
    );
    let paths = CatalogPaths::new(dir.join("lib.abcs"), dir.join("lib.json"));
    fs::write(&paths.abcs, lib).unwrap();
    fs::write(&paths.index, index).unwrap();
    paths
}

#[test]
fn test_catalog_symbols_resolve_lazily() {
    let dir = TempDir::new().unwrap();
    let builtin = write_module(dir.path(), "builtin.abc", BUILTIN);
    let catalog = write_catalog(dir.path());
    let (options, mut host) = options();

    let mut domain = create_security_domain(&builtin, None, Some(&catalog), options, &mut host).unwrap();
    assert_eq!(domain.module_count(), 1);

    let app = assemble(
        ".method main\n  getglobal Lazy\n  getglobal Lazy\n  add\n  returnvalue\n.end\n.init main",
        "app.abc",
    )
    .unwrap();
    let result = domain
        .execute_abc(DomainScope::Application, std::rc::Rc::new(app), &mut host)
        .unwrap();
    assert_eq!(result, Value::Int(22));
    assert_eq!(
        domain.module_labels(DomainScope::System),
        vec![builtin.display().to_string().as_str(), "lazy.abc"]
    );
}

#[test]
fn test_runtime_trace_reports_catalog_activity() {
    let dir = TempDir::new().unwrap();
    let builtin = write_module(dir.path(), "builtin.abc", BUILTIN);
    let catalog = write_catalog(dir.path());
    let (writer, buffer) = IndentingWriter::captured();
    let options = DomainOptions::default()
        .with_writer(writer.clone())
        .with_tracing(true, false);
    let mut host = WriterHost::new(writer);

    let mut domain = create_security_domain(&builtin, None, Some(&catalog), options, &mut host).unwrap();
    let app = assemble(".method main\n  getglobal Lazy\n  returnvalue\n.end\n.init main", "app.abc").unwrap();
    domain
        .execute_abc(DomainScope::Application, std::rc::Rc::new(app), &mut host)
        .unwrap();

    let text = buffer.contents();
    assert!(text.contains("Catalog: resolving Lazy from lazy.abc"));
    assert!(text.contains("into application scope"));
}

#[test]
fn test_malformed_catalog_index() {
    let dir = TempDir::new().unwrap();
    let builtin = write_module(dir.path(), "builtin.abc", BUILTIN);
    let catalog = CatalogPaths::new(dir.path().join("x.abcs"), dir.path().join("x.json"));
    fs::write(&catalog.abcs, b"").unwrap();
    fs::write(&catalog.index, "{").unwrap();
    let (options, mut host) = options();
    let err = create_security_domain(&builtin, None, Some(&catalog), options, &mut host).unwrap_err();
    assert!(matches!(err, BootstrapError::Catalog(_)));
}

#[test]
fn test_failed_catalog_entry_keeps_its_error() {
    let dir = TempDir::new().unwrap();
    let builtin = write_module(dir.path(), "builtin.abc", BUILTIN);
    let broken = assemble(
        ".method init\n  pushstring \"broken\"\n  throw\n.end\n.init init",
        "broken.abc",
    )
    .unwrap()
    .to_bytes();
    let catalog = CatalogPaths::new(dir.path().join("lib.abcs"), dir.path().join("lib.json"));
    fs::write(
        &catalog.index,
        format!(
            r#"[{{"name": "broken.abc", "offset": 0, "length": {}, "defs": ["Broken"]}}]"#,
            broken.len()
        ),
    )
    .unwrap();
    fs::write(&catalog.abcs, broken).unwrap();
    let (options, mut host) = options();
    let mut domain = create_security_domain(&builtin, None, Some(&catalog), options, &mut host).unwrap();

    for label in ["first.abc", "second.abc"] {
        let app = assemble(".method main\n  getglobal Broken\n  returnvalue\n.end\n.init main", label).unwrap();
        let err = domain
            .execute_abc(DomainScope::Application, std::rc::Rc::new(app), &mut host)
            .unwrap_err();
        assert_eq!(err.to_string(), "Error: broken");
    }
    assert_eq!(domain.module_labels(DomainScope::System).len(), 2);
}
