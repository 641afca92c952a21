//! Native file pickers and message boxes via rfd.

use rfd::{FileDialog, MessageButtons, MessageDialog, MessageDialogResult, MessageLevel};
use shard_core::{CloseChoice, Dialogs};
use std::path::{Path, PathBuf};

/// Extension added to saved names that have none.
pub const DEFAULT_EXTENSION: &str = "txt";

/// Appends the default extension to `path` if its name has no extension.
pub fn with_default_extension(path: PathBuf) -> PathBuf {
    if path.extension().is_some() {
        path
    } else {
        path.with_extension(DEFAULT_EXTENSION)
    }
}

/// [`Dialogs`] backed by the platform's native dialogs.
#[derive(Debug, Default)]
pub struct NativeDialogs;

impl NativeDialogs {
    pub fn new() -> Self {
        Self
    }

    fn text_filters(dialog: FileDialog) -> FileDialog {
        dialog
            .add_filter("Text files", &["txt"])
            .add_filter("All files", &["*"])
    }
}

impl Dialogs for NativeDialogs {
    fn save_file(&mut self, initial_dir: &Path, initial_name: &str) -> Option<PathBuf> {
        let dialog = FileDialog::new()
            .set_title("Save As")
            .set_directory(initial_dir)
            .set_file_name(initial_name);
        match Self::text_filters(dialog).save_file() {
            Some(path) => Some(with_default_extension(path)),
            None => {
                log::info!("Save dialog cancelled or unavailable (try: apt install zenity)");
                None
            }
        }
    }

    fn open_file(&mut self, initial_dir: &Path) -> Option<PathBuf> {
        let dialog = FileDialog::new()
            .set_title("Open File")
            .set_directory(initial_dir);
        let picked = Self::text_filters(dialog).pick_file();
        if picked.is_none() {
            log::info!("Open file dialog cancelled or unavailable (try: apt install zenity)");
        }
        picked
    }

    fn confirm_close(&mut self, name: &str) -> CloseChoice {
        let result = MessageDialog::new()
            .set_level(MessageLevel::Warning)
            .set_title("File Unsaved")
            .set_description(format!(
                "Do you want to save the file '{}' before closing it?",
                name
            ))
            .set_buttons(MessageButtons::YesNoCancel)
            .show();
        match result {
            MessageDialogResult::Yes => CloseChoice::Save,
            MessageDialogResult::No => CloseChoice::Discard,
            _ => CloseChoice::Cancel,
        }
    }

    fn warning(&mut self, title: &str, message: &str) {
        log::warn!("{}: {}", title, message);
        let _ = MessageDialog::new()
            .set_level(MessageLevel::Warning)
            .set_title(title)
            .set_description(message)
            .set_buttons(MessageButtons::Ok)
            .show();
    }

    fn error(&mut self, title: &str, message: &str) {
        log::error!("{}: {}", title, message);
        let _ = MessageDialog::new()
            .set_level(MessageLevel::Error)
            .set_title(title)
            .set_description(message)
            .set_buttons(MessageButtons::Ok)
            .show();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_extension() {
        assert_eq!(
            with_default_extension(PathBuf::from("/tmp/notes")),
            PathBuf::from("/tmp/notes.txt")
        );
        assert_eq!(
            with_default_extension(PathBuf::from("/tmp/notes.md")),
            PathBuf::from("/tmp/notes.md")
        );
    }
}
