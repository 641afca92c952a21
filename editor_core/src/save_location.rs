//! Remembers the directory of the last successful save.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Single-line file holding an absolute directory path.
#[derive(Debug, Clone)]
pub struct SaveLocationStore {
    path: PathBuf,
}

impl SaveLocationStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the remembered directory if it still exists and is a directory.
    pub fn last_dir(&self) -> Option<PathBuf> {
        let content = fs::read_to_string(&self.path).ok()?;
        let dir = PathBuf::from(content.trim());
        if !dir.as_os_str().is_empty() && dir.is_dir() {
            Some(dir)
        } else {
            log::debug!("Ignoring stale save location {:?}", dir);
            None
        }
    }

    /// Records `dir` as the last save directory.
    pub fn remember(&self, dir: &Path) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, dir.to_string_lossy().as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_remember_and_recall() {
        let dir = TempDir::new().unwrap();
        let store = SaveLocationStore::new(dir.path().join("LastSaveLocation.txt"));
        assert_eq!(store.last_dir(), None);

        store.remember(dir.path()).unwrap();
        assert_eq!(store.last_dir(), Some(dir.path().to_path_buf()));
    }

    #[test]
    fn test_missing_directory_is_ignored() {
        let dir = TempDir::new().unwrap();
        let store = SaveLocationStore::new(dir.path().join("LastSaveLocation.txt"));
        store.remember(&dir.path().join("gone")).unwrap();
        assert_eq!(store.last_dir(), None);

        let file = dir.path().join("plain.txt");
        fs::write(&file, "x").unwrap();
        store.remember(&file).unwrap();
        assert_eq!(store.last_dir(), None);
    }
}
