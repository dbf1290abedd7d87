//! Security domain bootstrapper
//!
//! Builds a ready-to-run domain from the builtin module, an optional
//! auxiliary library and an optional global-symbol catalog.

use bytecode_system::{AbcCatalog, AbcFile};
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use crate::domain::{DomainOptions, DomainScope, SecurityDomain};
use crate::error::BootstrapError;
use crate::host::Host;

/// Locations of a global-symbol catalog
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogPaths {
    /// Concatenated module bytes
    pub abcs: PathBuf,
    /// JSON index describing the entries
    pub index: PathBuf,
}

impl CatalogPaths {
    /// Pair a module buffer with its index
    pub fn new(abcs: impl Into<PathBuf>, index: impl Into<PathBuf>) -> Self {
        Self {
            abcs: abcs.into(),
            index: index.into(),
        }
    }
}

fn read(path: &Path) -> Result<Vec<u8>, BootstrapError> {
    fs::read(path).map_err(|source| BootstrapError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn read_module(path: &Path) -> Result<Rc<AbcFile>, BootstrapError> {
    let bytes = read(path)?;
    let label = path.display().to_string();
    AbcFile::parse(&bytes, label)
        .map(Rc::new)
        .map_err(|source| BootstrapError::Parse {
            path: path.to_path_buf(),
            source,
        })
}

/// Create and initialize a security domain.
///
/// Steps, in order: read and parse the builtin module, load it into the
/// system scope, attach the catalog, install the natives, run the builtin,
/// then load and run the auxiliary library in the system scope.
///
/// # Errors
///
/// Any failing step aborts with a [`BootstrapError`].
pub fn create_security_domain(
    builtin_path: &Path,
    aux_path: Option<&Path>,
    catalog: Option<&CatalogPaths>,
    options: DomainOptions,
    host: &mut dyn Host,
) -> Result<SecurityDomain, BootstrapError> {
    let builtin = read_module(builtin_path)?;

    let mut domain = SecurityDomain::new(options);
    let execution = |path: &Path| {
        let path = path.to_path_buf();
        move |source| BootstrapError::Execution { path, source }
    };
    let builtin_id = domain
        .load_abc(DomainScope::System, builtin)
        .map_err(execution(builtin_path))?;

    if let Some(paths) = catalog {
        let abcs = read(&paths.abcs)?;
        let index = fs::read_to_string(&paths.index).map_err(|source| BootstrapError::Io {
            path: paths.index.clone(),
            source,
        })?;
        let catalog = AbcCatalog::new(abcs, &index)?;
        domain
            .set_catalog(catalog)
            .map_err(execution(&paths.index))?;
    }

    domain.initialize();
    domain
        .execute_module(builtin_id, host)
        .map_err(execution(builtin_path))?;

    if let Some(aux_path) = aux_path {
        let aux = read_module(aux_path)?;
        domain
            .execute_abc(DomainScope::System, aux, host)
            .map_err(execution(aux_path))?;
    }

    if domain.options().trace_runtime {
        domain.writer().write_ln(&format!(
            "Security domain ready: {} module(s) in system scope",
            domain.scope(DomainScope::System).modules().len()
        ));
    }
    Ok(domain)
}
