//! Errors raised while bootstrapping a security domain

use bytecode_system::{AbcError, CatalogError};
use core_types::VmError;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Failure to build a security domain.
///
/// Bootstrapping never returns a partially initialized domain.
#[derive(Debug, Error)]
pub enum BootstrapError {
    /// A module or catalog file could not be read
    #[error("cannot read {}: {source}", path.display())]
    Io {
        /// File that failed
        path: PathBuf,
        /// Underlying error
        #[source]
        source: io::Error,
    },
    /// A module file does not decode
    #[error("cannot parse {}: {source}", path.display())]
    Parse {
        /// File that failed
        path: PathBuf,
        /// Decoding error
        #[source]
        source: AbcError,
    },
    /// The catalog index or buffer is malformed
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    /// A module was rejected on load or threw while initializing
    #[error("error executing {}: {source}", path.display())]
    Execution {
        /// Module that failed
        path: PathBuf,
        /// The VM error
        #[source]
        source: VmError,
    },
}
