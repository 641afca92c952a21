//! The directory whose presence means a primary process is running.

use crate::error::{LaunchError, Result};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Marks the primary process.
///
/// Creation uses a single `create_dir` call, which the OS performs
/// atomically, so two processes racing to become primary cannot both see
/// themselves as the creator.
#[derive(Debug, Clone)]
pub struct RunningMarker {
    path: PathBuf,
}

impl RunningMarker {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns true if some process holds the marker.
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Creates the marker. Returns `false` if it was already present, which
    /// happens when taking over from a process that died holding it.
    pub fn acquire(&self) -> Result<bool> {
        let err = |source| LaunchError::Marker {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(err)?;
        }
        match fs::create_dir(&self.path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => Ok(false),
            Err(e) => Err(err(e)),
        }
    }

    /// Removes the marker if present.
    pub fn release(&self) -> Result<()> {
        match fs::remove_dir(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(LaunchError::Marker {
                path: self.path.clone(),
                source: e,
            }),
        }
    }
}
