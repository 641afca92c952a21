//! Shard Core - Editor session logic.
//!
//! This crate contains session state, file I/O and persisted preferences
//! without any dependencies on windowing or rendering systems.

pub mod buffer;
pub mod dialogs;
pub mod encoding;
pub mod error;
pub mod paths;
pub mod save_location;
pub mod session;
pub mod settings;
pub mod workspace;

pub use buffer::TextBuffer;
pub use dialogs::{CloseChoice, Dialogs, Notice, ScriptedDialogs};
pub use encoding::{DecodedText, TextEncoding};
pub use error::FileError;
pub use paths::AppPaths;
pub use save_location::SaveLocationStore;
pub use session::{
    CommandOutcome, EditorSession, SaveOutcome, SaveRequest, SessionCommand, SessionContext,
    SessionEvent, SessionId, SessionNotifier,
};
pub use settings::{SettingsError, SettingsField, SettingsRecord, SettingsStore, WindowState};
pub use workspace::{WindowInfo, Workspace};
