//! Player errors

use interpreter::BootstrapError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised before playback starts.
///
/// Failures during playback are logged instead, so one bad frame does not
/// end the run.
#[derive(Debug, Error)]
pub enum PlayerError {
    /// The player's security domain could not be created
    #[error(transparent)]
    Bootstrap(#[from] BootstrapError),
    /// The container file could not be opened
    #[error("cannot open {}: {source}", path.display())]
    Io {
        /// Path of the container
        path: PathBuf,
        /// Underlying failure
        source: std::io::Error,
    },
}
