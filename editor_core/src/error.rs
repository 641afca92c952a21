//! Error taxonomy for session file operations.

use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Characters that may not appear in a file name chosen for saving.
pub const RESERVED_FILENAME_CHARS: &[char] = &['/', '\\', ':', '*', '?', '"', '<', '>', '|'];

/// Failure categories for loading, checking and saving a session's file.
#[derive(Debug, Error)]
pub enum FileError {
    /// The OS refused access to the file.
    #[error("No permissions to access '{}'", path.display())]
    PermissionDenied { path: PathBuf },

    /// The file does not exist.
    #[error("File '{}' does not exist", path.display())]
    NotFound { path: PathBuf },

    /// The bytes on disk are neither UTF-8 nor decodable by the legacy fallback.
    #[error("Could not decode '{}' as text", path.display())]
    DecodeFailure { path: PathBuf },

    /// The buffer could not be represented in any supported encoding.
    #[error("Could not encode text for '{}'", path.display())]
    EncodeFailure { path: PathBuf },

    /// The chosen file name contains a reserved character.
    #[error("Filename cannot contain symbols / \\ : * ? \" < > |")]
    InvalidFileName { name: String },

    /// Any other I/O failure.
    #[error("An unexpected error has occurred with '{}': {source}", path.display())]
    UnexpectedIo {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl FileError {
    /// Classifies an `io::Error` raised while touching `path`.
    pub fn from_io(path: &Path, err: io::Error) -> Self {
        let path = path.to_path_buf();
        match err.kind() {
            io::ErrorKind::PermissionDenied => FileError::PermissionDenied { path },
            io::ErrorKind::NotFound => FileError::NotFound { path },
            _ => FileError::UnexpectedIo { path, source: err },
        }
    }

    /// Returns true for errors that end the session when raised by a load
    /// or by the dirty re-check.
    pub fn is_fatal_to_session(&self) -> bool {
        matches!(
            self,
            FileError::PermissionDenied { .. }
                | FileError::DecodeFailure { .. }
                | FileError::UnexpectedIo { .. }
        )
    }

    /// Short dialog text shown to the user for this error.
    pub fn user_message(&self) -> &'static str {
        match self {
            FileError::PermissionDenied { .. } => "No permissions to view file",
            FileError::InvalidFileName { .. } => {
                "Filename cannot contain symbols / \\ : * ? \" < > |"
            }
            _ => "An unexpected error has occurred",
        }
    }
}

/// Rejects file names containing any reserved character.
pub fn validate_file_name(name: &str) -> Result<(), FileError> {
    if name.contains(RESERVED_FILENAME_CHARS) {
        Err(FileError::InvalidFileName {
            name: name.to_string(),
        })
    } else {
        Ok(())
    }
}
