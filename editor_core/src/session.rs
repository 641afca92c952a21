//! One editor window: its buffer, the file it is bound to, and every
//! load/save transition.
//!
//! A session starts either Unbound (`is_new_file`, named "Untitled") or
//! Bound to a path. It becomes Bound after a successful load or its first
//! successful save and never goes back to Unbound on its own; the only way
//! back is the dirty check discovering that the bound file was deleted.
//!
//! The file a Bound session refers to is always `directory/display_name`.
//! Keeping the path split this way means a save-as only ever moves both
//! halves together, so the dirty check can never read a different file
//! than the one last written.

use crate::buffer::TextBuffer;
use crate::dialogs::{CloseChoice, Dialogs};
use crate::encoding::{self, TextEncoding};
use crate::error::{validate_file_name, FileError};
use crate::save_location::SaveLocationStore;
use crate::settings::{SettingsRecord, SettingsStore, WindowState};
use crossbeam_channel::{Receiver, Sender};
use std::fs;
use std::path::{Path, PathBuf};

/// Unique identifier for a session within one process.
pub type SessionId = usize;

/// Name shown for a session with no file.
pub const UNTITLED: &str = "Untitled";

/// Application name appended to every window title.
pub const APP_NAME: &str = "Shard";

/// Marker prefixed to the name of a dirty session.
pub const DIRTY_MARKER: &str = "*";

/// Lifecycle notifications consumed by the launch coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// A session finished constructing.
    Opened(SessionId),
    /// A session closed.
    Closed(SessionId),
}

/// Sending half of the session event channel.
#[derive(Debug, Clone)]
pub struct SessionNotifier {
    tx: Sender<SessionEvent>,
}

impl SessionNotifier {
    /// Creates a notifier and the receiver the coordinator listens on.
    pub fn channel() -> (Self, Receiver<SessionEvent>) {
        let (tx, rx) = crossbeam_channel::unbounded();
        (Self { tx }, rx)
    }

    fn send(&self, event: SessionEvent) {
        if self.tx.send(event).is_err() {
            log::warn!("Session event {:?} dropped: coordinator is gone", event);
        }
    }
}

/// Shared collaborators every session needs.
#[derive(Debug, Clone)]
pub struct SessionContext {
    pub settings: SettingsStore,
    pub save_location: SaveLocationStore,
    /// Directory used by sessions that have no file yet.
    pub default_dir: PathBuf,
    pub notifier: SessionNotifier,
}

/// Commands a front end dispatches to a session.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionCommand {
    /// Save to the bound file, prompting for a path if there is none.
    RequestSave,
    /// Always prompt for a new path.
    RequestSaveAs,
    /// Save directly to the given path.
    SaveTo(PathBuf),
    /// Close, asking first if there are unsaved changes.
    RequestClose,
    /// Open a file picked by the user.
    RequestOpen,
    /// Open a specific file.
    OpenPath(PathBuf),
    /// Open a new blank session.
    RequestNew,
    /// Re-run the dirty check and refresh the title.
    Refresh,
    /// Start editing settings; changes can be confirmed or cancelled.
    BeginSettings,
    SetSetting { key: String, value: String },
    ConfirmSettings,
    CancelSettings,
    /// The window was maximised or restored.
    WindowStateChanged(WindowState),
}

/// What the caller must do after a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    Continue,
    /// The session closed and must be dropped.
    Closed,
    /// A new session should be opened, for a path or blank.
    Spawn(Option<PathBuf>),
}

/// Where a save should go.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SaveRequest {
    /// Explicit target. Skips the save prompt.
    pub path: Option<PathBuf>,
    /// Prompt for a target even when the session is Bound.
    pub as_new_path: bool,
}

/// Result of a save that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    Saved(PathBuf),
    /// Bound and clean; nothing was written.
    Unchanged,
    /// The user cancelled the prompt or gave an empty name.
    Cancelled,
    /// The dirty re-check failed and the session was closed.
    SessionClosed,
}

/// Result of a close request that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseOutcome {
    Closed,
    /// The user cancelled, or the save-before-close did not complete.
    Kept,
}

/// Reads a file for a session, applying the encoding fallback.
pub fn load(path: &Path) -> Result<encoding::DecodedText, FileError> {
    encoding::read_text(path)
}

/// State of a single editor window.
#[derive(Debug)]
pub struct EditorSession {
    id: SessionId,
    buffer: TextBuffer,
    directory: PathBuf,
    display_name: String,
    is_new_file: bool,
    encoding: TextEncoding,
    title: String,
    settings: SettingsRecord,
    settings_backup: Option<SettingsRecord>,
    closed: bool,
}

impl EditorSession {
    /// Constructs a session, loading `path` if given.
    ///
    /// A missing file yields an empty session that keeps the requested
    /// name but stays Unbound. Permission and decode failures abort
    /// construction; no `Opened` event is sent in that case.
    pub fn open(
        id: SessionId,
        path: Option<&Path>,
        ctx: &SessionContext,
    ) -> Result<Self, FileError> {
        let settings = ctx.settings.load().unwrap_or_else(|e| {
            log::warn!("Failed to load settings from {:?}: {}", ctx.settings.path(), e);
            SettingsRecord::default()
        });

        let mut session = Self {
            id,
            buffer: TextBuffer::new(),
            directory: ctx.default_dir.clone(),
            display_name: UNTITLED.to_string(),
            is_new_file: true,
            encoding: TextEncoding::Utf8,
            title: String::new(),
            settings,
            settings_backup: None,
            closed: false,
        };

        if let Some(path) = path {
            let path = if path.is_absolute() {
                path.to_path_buf()
            } else {
                ctx.default_dir.join(path)
            };
            match load(&path) {
                Ok(decoded) => {
                    session.buffer = TextBuffer::from_text(&decoded.text);
                    session.encoding = decoded.encoding;
                    session.is_new_file = false;
                }
                Err(FileError::NotFound { .. }) => {
                    log::info!("{:?} does not exist yet, starting empty", path);
                }
                Err(e) => return Err(e),
            }
            session.bind_to(&path);
        }

        session.update_title(false);
        ctx.notifier.send(SessionEvent::Opened(id));
        log::info!("Session {} opened: {}", id, session.display_name);
        Ok(session)
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn buffer(&self) -> &TextBuffer {
        &self.buffer
    }

    pub fn buffer_mut(&mut self) -> &mut TextBuffer {
        &mut self.buffer
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// Directory the session's file lives in (or would be saved to).
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// The file this session reads and writes.
    pub fn file_path(&self) -> PathBuf {
        self.directory.join(&self.display_name)
    }

    /// True while the session has no confirmed file on disk.
    pub fn is_new_file(&self) -> bool {
        self.is_new_file
    }

    /// Encoding of the last load or save.
    pub fn encoding(&self) -> TextEncoding {
        self.encoding
    }

    /// Window title, including the dirty marker.
    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn settings(&self) -> &SettingsRecord {
        &self.settings
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    fn bind_to(&mut self, path: &Path) {
        if let Some(parent) = path.parent() {
            self.directory = parent.to_path_buf();
        }
        if let Some(name) = path.file_name() {
            self.display_name = name.to_string_lossy().into_owned();
        }
    }

    fn update_title(&mut self, dirty: bool) {
        let marker = if dirty { DIRTY_MARKER } else { "" };
        self.title = format!("{}{} - {}", marker, self.display_name, APP_NAME);
    }

    /// Compares the buffer with what is on disk and refreshes the title.
    ///
    /// Unbound sessions are dirty when the buffer holds anything besides
    /// newlines. Bound sessions re-read their file on every call. If the
    /// file has vanished the session drops back to Unbound and reports
    /// clean for this call. Other read failures are returned and are fatal
    /// to the session.
    pub fn is_dirty(&mut self) -> Result<bool, FileError> {
        let dirty = if self.is_new_file {
            !self.buffer.is_blank()
        } else {
            match load(&self.file_path()) {
                Ok(decoded) => !self.buffer.content_matches(&decoded.text),
                Err(FileError::NotFound { .. }) => {
                    log::info!("{:?} was removed, treating as a new file", self.file_path());
                    self.is_new_file = true;
                    false
                }
                Err(e) => return Err(e),
            }
        };
        self.update_title(dirty);
        Ok(dirty)
    }

    /// Writes the buffer.
    ///
    /// Without an explicit path or `as_new_path`, a Bound session writes
    /// straight to its file (or does nothing if clean). Otherwise the user
    /// is asked for a path, starting in the last save directory. A relative
    /// target is taken relative to the session's directory. The session is
    /// rebound only after the write succeeds.
    pub fn save(
        &mut self,
        request: SaveRequest,
        ctx: &SessionContext,
        dialogs: &mut dyn Dialogs,
    ) -> Result<SaveOutcome, FileError> {
        let target = match request.path {
            Some(path) => path,
            None if !request.as_new_path && !self.is_new_file => {
                match self.is_dirty() {
                    Ok(false) => return Ok(SaveOutcome::Unchanged),
                    Ok(true) => {}
                    Err(e) => {
                        if self.check_failed(e, ctx, dialogs) {
                            return Ok(SaveOutcome::SessionClosed);
                        }
                        return Ok(SaveOutcome::Cancelled);
                    }
                }
                // The dirty check may have found the file deleted.
                if self.is_new_file {
                    match self.prompt_save_path(ctx, dialogs) {
                        Some(path) => path,
                        None => return Ok(SaveOutcome::Cancelled),
                    }
                } else {
                    self.file_path()
                }
            }
            None => match self.prompt_save_path(ctx, dialogs) {
                Some(path) => path,
                None => return Ok(SaveOutcome::Cancelled),
            },
        };

        let name = target
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        if name.trim().is_empty() {
            return Ok(SaveOutcome::Cancelled);
        }
        validate_file_name(&name)?;
        let target = self.resolve(target);

        log::info!("Saving session {} to {:?}", self.id, target);
        if let Some(parent) = target.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| FileError::from_io(parent, e))?;
        }
        self.encoding = encoding::write_text(&target, &self.buffer.text())?;

        self.bind_to(&target);
        self.is_new_file = false;
        if let Err(e) = ctx.save_location.remember(&self.directory) {
            log::warn!("Failed to record save location: {}", e);
        }
        self.update_title(false);
        Ok(SaveOutcome::Saved(target))
    }

    /// Relative paths are taken relative to the session's directory.
    fn resolve(&self, path: PathBuf) -> PathBuf {
        if path.is_relative() {
            self.directory.join(path)
        } else {
            path
        }
    }

    fn prompt_save_path(&self, ctx: &SessionContext, dialogs: &mut dyn Dialogs) -> Option<PathBuf> {
        let initial_dir = ctx
            .save_location
            .last_dir()
            .unwrap_or_else(|| self.directory.clone());
        let chosen = dialogs.save_file(&initial_dir, &self.display_name);
        log::info!("User chose to save as: {:?}", chosen);
        chosen
    }

    /// Closes if clean, otherwise asks whether to save, discard or cancel.
    ///
    /// A failed dirty check is returned as an error; the caller must treat
    /// it as fatal. A failed save-before-close is reported through
    /// `dialogs` and keeps the session open.
    pub fn request_close(
        &mut self,
        ctx: &SessionContext,
        dialogs: &mut dyn Dialogs,
    ) -> Result<CloseOutcome, FileError> {
        let dirty = self.is_dirty()?;
        if !dirty || (self.is_new_file && self.buffer.is_blank()) {
            self.close(ctx);
            return Ok(CloseOutcome::Closed);
        }

        match dialogs.confirm_close(&self.display_name) {
            CloseChoice::Cancel => Ok(CloseOutcome::Kept),
            CloseChoice::Discard => {
                self.close(ctx);
                Ok(CloseOutcome::Closed)
            }
            CloseChoice::Save => match self.save(SaveRequest::default(), ctx, dialogs) {
                Ok(SaveOutcome::Saved(_)) | Ok(SaveOutcome::Unchanged) => {
                    self.close(ctx);
                    Ok(CloseOutcome::Closed)
                }
                Ok(SaveOutcome::SessionClosed) => Ok(CloseOutcome::Closed),
                Ok(SaveOutcome::Cancelled) => Ok(CloseOutcome::Kept),
                Err(e) => {
                    report_save_error(&e, dialogs);
                    Ok(CloseOutcome::Kept)
                }
            },
        }
    }

    /// Closes the session unconditionally. Sends `Closed` exactly once.
    pub fn close(&mut self, ctx: &SessionContext) {
        if self.closed {
            return;
        }
        self.closed = true;
        ctx.notifier.send(SessionEvent::Closed(self.id));
        log::info!("Session {} closed: {}", self.id, self.display_name);
    }

    fn close_with_error(&mut self, err: &FileError, ctx: &SessionContext, dialogs: &mut dyn Dialogs) {
        log::error!("Closing session {}: {}", self.id, err);
        self.close(ctx);
        dialogs.error("Error", err.user_message());
    }

    /// Handles a failed dirty check. Returns true if the session was closed.
    fn check_failed(&mut self, err: FileError, ctx: &SessionContext, dialogs: &mut dyn Dialogs) -> bool {
        if err.is_fatal_to_session() {
            self.close_with_error(&err, ctx, dialogs);
            true
        } else {
            log::warn!("Dirty check for session {} failed: {}", self.id, err);
            dialogs.error("Error", err.user_message());
            false
        }
    }

    fn check_outcome(&mut self, err: FileError, ctx: &SessionContext, dialogs: &mut dyn Dialogs) -> CommandOutcome {
        if self.check_failed(err, ctx, dialogs) {
            CommandOutcome::Closed
        } else {
            CommandOutcome::Continue
        }
    }

    /// Dispatches one command.
    pub fn handle(
        &mut self,
        command: SessionCommand,
        ctx: &SessionContext,
        dialogs: &mut dyn Dialogs,
    ) -> CommandOutcome {
        if self.closed {
            return CommandOutcome::Closed;
        }

        match command {
            SessionCommand::RequestSave => self.handle_save(SaveRequest::default(), ctx, dialogs),
            SessionCommand::RequestSaveAs => self.handle_save(
                SaveRequest {
                    path: None,
                    as_new_path: true,
                },
                ctx,
                dialogs,
            ),
            SessionCommand::SaveTo(path) => self.handle_save(
                SaveRequest {
                    path: Some(path),
                    as_new_path: true,
                },
                ctx,
                dialogs,
            ),
            SessionCommand::RequestClose => match self.request_close(ctx, dialogs) {
                Ok(CloseOutcome::Closed) => CommandOutcome::Closed,
                Ok(CloseOutcome::Kept) => CommandOutcome::Continue,
                Err(e) => self.check_outcome(e, ctx, dialogs),
            },
            SessionCommand::RequestOpen => match dialogs.open_file(&self.directory) {
                Some(path) => self.open_into(path, dialogs),
                None => CommandOutcome::Continue,
            },
            SessionCommand::OpenPath(path) => self.open_into(path, dialogs),
            SessionCommand::RequestNew => CommandOutcome::Spawn(None),
            SessionCommand::Refresh => match self.is_dirty() {
                Ok(_) => CommandOutcome::Continue,
                Err(e) => self.check_outcome(e, ctx, dialogs),
            },
            SessionCommand::BeginSettings => {
                self.settings_backup = Some(self.settings.clone());
                CommandOutcome::Continue
            }
            SessionCommand::SetSetting { key, value } => {
                if self.settings_backup.is_none() {
                    self.settings_backup = Some(self.settings.clone());
                }
                if let Err(e) = self.settings.set_by_key(&key, &value) {
                    dialogs.warning("Invalid Setting", &e.to_string());
                }
                CommandOutcome::Continue
            }
            SessionCommand::ConfirmSettings => {
                self.settings_backup = None;
                self.persist_settings(ctx);
                CommandOutcome::Continue
            }
            SessionCommand::CancelSettings => {
                if let Some(previous) = self.settings_backup.take() {
                    self.settings = previous;
                }
                CommandOutcome::Continue
            }
            SessionCommand::WindowStateChanged(state) => {
                if self.settings.window_state != state {
                    log::info!(
                        "Window state changed: {} -> {}",
                        self.settings.window_state.as_str(),
                        state.as_str()
                    );
                    self.settings.window_state = state;
                    self.persist_settings(ctx);
                }
                CommandOutcome::Continue
            }
        }
    }

    fn handle_save(
        &mut self,
        request: SaveRequest,
        ctx: &SessionContext,
        dialogs: &mut dyn Dialogs,
    ) -> CommandOutcome {
        match self.save(request, ctx, dialogs) {
            Ok(SaveOutcome::SessionClosed) => CommandOutcome::Closed,
            Ok(_) => CommandOutcome::Continue,
            Err(e) => {
                report_save_error(&e, dialogs);
                CommandOutcome::Continue
            }
        }
    }

    /// Loads `path` into this window if it is an untouched blank session,
    /// otherwise asks for a new session for it.
    fn open_into(&mut self, path: PathBuf, dialogs: &mut dyn Dialogs) -> CommandOutcome {
        let path = self.resolve(path);
        let decoded = match load(&path) {
            Ok(decoded) => decoded,
            Err(FileError::NotFound { .. }) => return CommandOutcome::Continue,
            Err(e) => {
                log::error!("Failed to open {:?}: {}", path, e);
                dialogs.error("Error", e.user_message());
                return CommandOutcome::Continue;
            }
        };

        if self.is_new_file && self.buffer.is_blank() && self.display_name == UNTITLED {
            self.buffer.set_text(&decoded.text);
            self.encoding = decoded.encoding;
            self.bind_to(&path);
            self.is_new_file = false;
            self.update_title(false);
            CommandOutcome::Continue
        } else {
            CommandOutcome::Spawn(Some(path))
        }
    }

    fn persist_settings(&self, ctx: &SessionContext) {
        if let Err(e) = ctx.settings.save(&self.settings) {
            log::error!("Failed to save settings: {}", e);
        }
    }
}

/// Shows the dialog matching a failed save. The session stays open.
fn report_save_error(err: &FileError, dialogs: &mut dyn Dialogs) {
    log::error!("Save failed: {}", err);
    match err {
        FileError::InvalidFileName { .. } => dialogs.warning("Invalid Filename", err.user_message()),
        FileError::PermissionDenied { .. } => {
            dialogs.error("Error", "No permissions to write to file")
        }
        _ => dialogs.error(
            "Error",
            "An unexpected error has occurred while saving the file",
        ),
    }
}
