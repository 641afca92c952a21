//! The on-disk queue of paths handed off to the primary process.
//!
//! Producers append `"\n<entry>"`. The consumer drains the whole file at
//! once, so blank lines are expected and skipped.

use crate::error::{LaunchError, Result};
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Line standing for "open a blank editor". `<` and `>` are reserved in
/// file names, so no saved file can collide with it.
pub const BLANK_ENTRY: &str = "<untitled>";

/// One open request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueueEntry {
    Blank,
    Path(PathBuf),
}

impl QueueEntry {
    pub fn from_request(path: Option<&Path>) -> Self {
        match path {
            Some(path) => QueueEntry::Path(path.to_path_buf()),
            None => QueueEntry::Blank,
        }
    }

    /// Path to open, or `None` for a blank editor.
    pub fn into_path(self) -> Option<PathBuf> {
        match self {
            QueueEntry::Blank => None,
            QueueEntry::Path(path) => Some(path),
        }
    }

    fn parse(line: &str) -> Option<Self> {
        let line = line.trim_end_matches('\r');
        if line.trim().is_empty() {
            None
        } else if line == BLANK_ENTRY {
            Some(QueueEntry::Blank)
        } else {
            Some(QueueEntry::Path(PathBuf::from(line)))
        }
    }

    fn to_line(&self) -> String {
        match self {
            QueueEntry::Blank => BLANK_ENTRY.to_string(),
            QueueEntry::Path(path) => path.to_string_lossy().into_owned(),
        }
    }
}

/// Shared queue file.
#[derive(Debug, Clone)]
pub struct QueueFile {
    path: PathBuf,
}

impl QueueFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn err(&self, source: io::Error) -> LaunchError {
        LaunchError::Queue {
            path: self.path.clone(),
            source,
        }
    }

    /// Appends one request.
    pub fn append(&self, entry: &QueueEntry) -> Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| self.err(e))?;
        file.write_all(format!("\n{}", entry.to_line()).as_bytes())
            .map_err(|e| self.err(e))?;
        log::info!("Handed off {:?}", entry);
        Ok(())
    }

    /// Returns true if the queue holds no requests.
    pub fn is_empty(&self) -> Result<bool> {
        match fs::read_to_string(&self.path) {
            Ok(content) => Ok(content.trim().is_empty()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(true),
            Err(e) => Err(self.err(e)),
        }
    }

    /// Takes every pending request, in the order written, and leaves the
    /// queue empty.
    ///
    /// The file is renamed aside before reading, so appends that open the
    /// queue after the rename go to the fresh file. A producer that opened
    /// the old file before the rename and writes after it has been read can
    /// still lose its line; the protocol is best-effort.
    pub fn drain(&self) -> Result<Vec<QueueEntry>> {
        let draining = self.path.with_extension("draining");
        match fs::rename(&self.path, &draining) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                self.reset()?;
                return Ok(Vec::new());
            }
            Err(e) => return Err(self.err(e)),
        }

        let content = fs::read_to_string(&draining).map_err(|e| self.err(e))?;
        fs::remove_file(&draining).map_err(|e| self.err(e))?;
        self.reset()?;

        let entries: Vec<QueueEntry> = content.lines().filter_map(QueueEntry::parse).collect();
        if !entries.is_empty() {
            log::info!("Drained {} queued request(s)", entries.len());
        }
        Ok(entries)
    }

    /// Ensures the queue file exists.
    fn reset(&self) -> Result<()> {
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map(|_| ())
            .map_err(|e| self.err(e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn queue() -> (TempDir, QueueFile) {
        let dir = TempDir::new().unwrap();
        let queue = QueueFile::new(dir.path().join("files.temp"));
        (dir, queue)
    }

    #[test]
    fn test_append_format() {
        let (_dir, queue) = queue();
        queue.append(&QueueEntry::Path(PathBuf::from("/tmp/a.txt"))).unwrap();
        queue.append(&QueueEntry::Blank).unwrap();
        assert_eq!(
            fs::read_to_string(queue.path()).unwrap(),
            "\n/tmp/a.txt\n<untitled>"
        );
        assert!(!queue.is_empty().unwrap());
    }

    #[test]
    fn test_drain_preserves_order_and_empties() {
        let (_dir, queue) = queue();
        let paths: Vec<PathBuf> = (0..5).map(|i| PathBuf::from(format!("/tmp/{i}.txt"))).collect();
        for path in &paths[..2] {
            queue.append(&QueueEntry::Path(path.clone())).unwrap();
        }
        queue.append(&QueueEntry::Blank).unwrap();
        for path in &paths[2..] {
            queue.append(&QueueEntry::Path(path.clone())).unwrap();
        }

        let drained = queue.drain().unwrap();
        let mut expected: Vec<QueueEntry> = paths[..2].iter().cloned().map(QueueEntry::Path).collect();
        expected.push(QueueEntry::Blank);
        expected.extend(paths[2..].iter().cloned().map(QueueEntry::Path));
        assert_eq!(drained, expected);

        assert!(queue.path().exists());
        assert_eq!(fs::read_to_string(queue.path()).unwrap(), "");
        assert!(queue.drain().unwrap().is_empty());
    }

    #[test]
    fn test_blank_lines_are_skipped() {
        let (_dir, queue) = queue();
        fs::write(queue.path(), "\n\n/tmp/x.txt\n   \n\r\n").unwrap();
        assert_eq!(
            queue.drain().unwrap(),
            vec![QueueEntry::Path(PathBuf::from("/tmp/x.txt"))]
        );
    }

    #[test]
    fn test_missing_queue_is_empty() {
        let (_dir, queue) = queue();
        assert!(queue.is_empty().unwrap());
        assert!(queue.drain().unwrap().is_empty());
        assert!(queue.path().exists());
    }
}
