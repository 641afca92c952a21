//! Errors that abort a launch.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Failures of the coordination files. Any of these makes the launch
/// protocol meaningless, so they end the process.
#[derive(Debug, Error)]
pub enum LaunchError {
    /// The data directory or its files could not be created.
    #[error("failed to prepare data directory '{}': {source}", path.display())]
    DataDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The running marker could not be created or removed.
    #[error("failed to update running marker '{}': {source}", path.display())]
    Marker {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The instance queue could not be read or written.
    #[error("instance queue '{}' failed: {source}", path.display())]
    Queue {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

pub type Result<T> = std::result::Result<T, LaunchError>;
