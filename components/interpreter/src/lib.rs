//! Bytecode interpreter
//!
//! This crate provides the virtual machine that runs bytecode modules:
//! - Security domains with separate system and application scopes
//! - Lazy resolution of globals through a global-symbol catalog
//! - Stack-based dispatch with call depth limits and stack traces
//! - Native intrinsics reaching the embedder through the [`Host`] trait
//! - A bootstrapper that builds a domain from builtin modules on disk
//!
//! # Example
//!
//! ```
//! use bytecode_system::assemble;
//! use core_types::{IndentingWriter, Value};
//! use interpreter::{DomainOptions, DomainScope, SecurityDomain, WriterHost};
//! use std::rc::Rc;
//!
//! let (writer, _) = IndentingWriter::captured();
//! let mut domain = SecurityDomain::new(DomainOptions::default().with_writer(writer.clone()));
//! domain.initialize();
//!
//! let abc = assemble(
//!     ".method main\n  pushint 40\n  pushint 2\n  add\n  returnvalue\n.end\n.init main",
//!     "sum.abc",
//! )
//! .unwrap();
//! let result = domain
//!     .execute_abc(DomainScope::Application, Rc::new(abc), &mut WriterHost::new(writer))
//!     .unwrap();
//! assert_eq!(result, Value::Int(42));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod bootstrap;
pub mod context;
pub mod dispatch;
pub mod domain;
pub mod error;
pub mod host;
pub mod natives;

// Re-export main types at crate root
pub use bootstrap::{create_security_domain, CatalogPaths};
pub use context::ExecutionContext;
pub use domain::{
    ApplicationDomain, DomainOptions, DomainScope, ModuleId, SecurityDomain, MAX_CALL_DEPTH,
};
pub use error::BootstrapError;
pub use host::{Host, UnitTestRegistration, WriterHost};
