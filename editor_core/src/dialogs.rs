//! User-facing prompts needed by editor sessions.
//!
//! Sessions never talk to a windowing toolkit directly. They ask a
//! [`Dialogs`] implementation for paths and confirmations, and report
//! warnings and errors through it.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};

/// Answer to the "save before closing?" prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseChoice {
    /// Save, then close if the save succeeded.
    Save,
    /// Close without saving.
    Discard,
    /// Keep the session open.
    Cancel,
}

/// Prompts and notices shown on behalf of a session.
pub trait Dialogs {
    /// Asks for a path to save to. `None` means the user cancelled.
    fn save_file(&mut self, initial_dir: &Path, initial_name: &str) -> Option<PathBuf>;

    /// Asks for an existing file to open. `None` means the user cancelled.
    fn open_file(&mut self, initial_dir: &Path) -> Option<PathBuf>;

    /// Asks whether to save `name` before closing it.
    fn confirm_close(&mut self, name: &str) -> CloseChoice;

    fn warning(&mut self, title: &str, message: &str);

    fn error(&mut self, title: &str, message: &str);
}

/// A notice recorded by [`ScriptedDialogs`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Warning { title: String, message: String },
    Error { title: String, message: String },
}

/// Non-interactive [`Dialogs`] that replays queued answers and records
/// every notice. Prompts with no queued answer behave as if cancelled.
#[derive(Debug, Default)]
pub struct ScriptedDialogs {
    save_paths: VecDeque<Option<PathBuf>>,
    open_paths: VecDeque<Option<PathBuf>>,
    close_choices: VecDeque<CloseChoice>,
    /// Initial directories passed to save prompts, in order.
    pub save_prompts: Vec<PathBuf>,
    /// Names passed to close confirmations, in order.
    pub close_prompts: Vec<String>,
    /// Warnings and errors shown so far.
    pub notices: Vec<Notice>,
}

impl ScriptedDialogs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn answer_save(&mut self, path: Option<PathBuf>) -> &mut Self {
        self.save_paths.push_back(path);
        self
    }

    pub fn answer_open(&mut self, path: Option<PathBuf>) -> &mut Self {
        self.open_paths.push_back(path);
        self
    }

    pub fn answer_close(&mut self, choice: CloseChoice) -> &mut Self {
        self.close_choices.push_back(choice);
        self
    }

    pub fn warnings(&self) -> usize {
        self.notices
            .iter()
            .filter(|n| matches!(n, Notice::Warning { .. }))
            .count()
    }

    pub fn errors(&self) -> usize {
        self.notices
            .iter()
            .filter(|n| matches!(n, Notice::Error { .. }))
            .count()
    }
}

impl Dialogs for ScriptedDialogs {
    fn save_file(&mut self, initial_dir: &Path, _initial_name: &str) -> Option<PathBuf> {
        self.save_prompts.push(initial_dir.to_path_buf());
        self.save_paths.pop_front().flatten()
    }

    fn open_file(&mut self, _initial_dir: &Path) -> Option<PathBuf> {
        self.open_paths.pop_front().flatten()
    }

    fn confirm_close(&mut self, name: &str) -> CloseChoice {
        self.close_prompts.push(name.to_string());
        self.close_choices.pop_front().unwrap_or(CloseChoice::Cancel)
    }

    fn warning(&mut self, title: &str, message: &str) {
        self.notices.push(Notice::Warning {
            title: title.to_string(),
            message: message.to_string(),
        });
    }

    fn error(&mut self, title: &str, message: &str) {
        self.notices.push(Notice::Error {
            title: title.to_string(),
            message: message.to_string(),
        });
    }
}
