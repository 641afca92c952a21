//! Per-user application data locations.

use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

/// Directory name under the platform's local data directory.
pub const APP_DIR_NAME: &str = "ShardEditor";

/// Environment variable that relocates the whole data directory.
pub const HOME_ENV_VAR: &str = "SHARD_HOME";

/// Locations of every file Shard keeps between runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppPaths {
    /// Root data directory.
    pub root: PathBuf,
    /// Directory whose presence marks a running primary process.
    pub running_marker: PathBuf,
    /// Newline-separated queue of paths handed off to the primary.
    pub queue_file: PathBuf,
    /// Tab-separated settings record.
    pub settings_file: PathBuf,
    /// Last directory a file was saved into.
    pub save_location_file: PathBuf,
}

impl AppPaths {
    /// Lays out all paths under `root`.
    pub fn in_dir(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            running_marker: root.join("run"),
            queue_file: root.join("files.temp"),
            settings_file: root.join("EditorSettings.txt"),
            save_location_file: root.join("LastSaveLocation.txt"),
            root,
        }
    }

    /// Resolves the data directory from `SHARD_HOME` or the platform default.
    pub fn from_env() -> Self {
        if let Some(home) = std::env::var_os(HOME_ENV_VAR).filter(|v| !v.is_empty()) {
            return Self::in_dir(PathBuf::from(home));
        }
        match dirs::data_local_dir() {
            Some(dir) => Self::in_dir(dir.join(APP_DIR_NAME)),
            None => Self::in_dir(PathBuf::from(APP_DIR_NAME)),
        }
    }

    /// Creates the root directory and the queue, settings and save-location
    /// files if they are missing.
    pub fn ensure(&self) -> io::Result<()> {
        fs::create_dir_all(&self.root)?;
        for file in [&self.queue_file, &self.settings_file, &self.save_location_file] {
            touch(file)?;
        }
        Ok(())
    }
}

/// Creates `path` if it does not exist, leaving existing content alone.
pub fn touch(path: &Path) -> io::Result<()> {
    OpenOptions::new().create(true).append(true).open(path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_layout() {
        let paths = AppPaths::in_dir("/data/ShardEditor");
        assert_eq!(paths.running_marker, Path::new("/data/ShardEditor/run"));
        assert_eq!(paths.queue_file, Path::new("/data/ShardEditor/files.temp"));
        assert_eq!(
            paths.settings_file,
            Path::new("/data/ShardEditor/EditorSettings.txt")
        );
    }

    #[test]
    fn test_ensure_creates_files_without_truncating() {
        let dir = TempDir::new().unwrap();
        let paths = AppPaths::in_dir(dir.path().join("app"));
        paths.ensure().unwrap();
        assert!(paths.queue_file.is_file());
        assert!(paths.settings_file.is_file());
        assert!(!paths.running_marker.exists());

        fs::write(&paths.queue_file, "\n/tmp/a.txt").unwrap();
        paths.ensure().unwrap();
        assert_eq!(fs::read_to_string(&paths.queue_file).unwrap(), "\n/tmp/a.txt");
    }
}
