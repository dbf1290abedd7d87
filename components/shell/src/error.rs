//! Error types for the shell

use bytecode_system::{AbcError, AssembleError};
use core_types::VmError;
use interpreter::BootstrapError;
use player::PlayerError;
use std::io;
use std::path::PathBuf;
use swf::SwfError;
use thiserror::Error;

/// Why an input file did not decode
#[derive(Debug, Error)]
pub enum ParseFailure {
    /// Bytecode module
    #[error(transparent)]
    Abc(#[from] AbcError),
    /// Container file
    #[error(transparent)]
    Swf(#[from] SwfError),
    /// Test script
    #[error(transparent)]
    Assemble(#[from] AssembleError),
}

/// Shell-level errors
#[derive(Debug, Error)]
pub enum ShellError {
    /// An input or output file could not be read or written
    #[error("cannot read {}: {source}", path.display())]
    Io {
        /// File that failed
        path: PathBuf,
        /// Underlying error
        #[source]
        source: io::Error,
    },

    /// An input file did not decode
    #[error("cannot parse {}: {source}", path.display())]
    Parse {
        /// File that failed
        path: PathBuf,
        /// Decoding error
        #[source]
        source: ParseFailure,
    },

    /// Bytecode threw outside a unit test
    #[error("error executing {}: {source}", path.display())]
    Execution {
        /// File being executed
        path: PathBuf,
        /// The VM error
        #[source]
        source: VmError,
    },

    /// A command line argument is not an input file
    #[error("unrecognized argument: {0}")]
    Argument(String),

    /// The security domain could not be built
    #[error(transparent)]
    Bootstrap(#[from] BootstrapError),
}

impl ShellError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        ShellError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn parse(path: impl Into<PathBuf>, source: impl Into<ParseFailure>) -> Self {
        ShellError::Parse {
            path: path.into(),
            source: source.into(),
        }
    }
}

impl From<PlayerError> for ShellError {
    fn from(err: PlayerError) -> Self {
        match err {
            PlayerError::Bootstrap(e) => ShellError::Bootstrap(e),
            PlayerError::Io { path, source } => ShellError::Io { path, source },
        }
    }
}

/// Result type for shell operations
pub type ShellResult<T> = Result<T, ShellError>;
