//! Shard UI - Dialogs and command handling.
//!
//! This crate turns user gestures into session commands. Dialogs are
//! native (rfd); text input comes from a line-oriented console.

pub mod app;
pub mod console;
pub mod dialogs;
pub mod input;

pub use app::EditorApp;
pub use console::spawn_console_reader;
pub use dialogs::NativeDialogs;
pub use input::{parse_command, EditorCommand};
