//! Console input handling and command mapping.

use shard_core::{SessionId, WindowState};
use std::path::PathBuf;

/// Represents an editor command typed at the console.
#[derive(Debug, Clone, PartialEq)]
pub enum EditorCommand {
    // Windows
    New,
    Open(Option<PathBuf>),
    List,
    Switch(SessionId),
    Close,
    QuitAll,

    // Text
    Show,
    Append(String),
    DeleteLine(usize),
    Clear,

    // File operations
    Save,
    SaveAs(Option<PathBuf>),

    // Settings
    Settings,
    Set { key: String, value: String },
    Apply,
    Revert,
    WindowState(WindowState),

    Help,
    /// A line that could not be parsed, with the reason.
    Invalid(String),
    /// The console was closed. Never produced by [`parse_command`].
    EndOfInput,
}

/// Usage text printed by `help`.
pub const HELP: &str = "\
new                 open a blank window
open [path]         open a file (asks for one if no path is given)
list                list windows
switch <id>         make window <id> active
show                print the active buffer
append <text>       append a line to the buffer
delete-line <n>     delete line <n> (1-based)
clear               empty the buffer
save                save the active window
save-as [path]      save under a new name
close               close the active window
quit                close every window
settings            start editing settings and print them
set <key> <value>   change a setting
apply | revert      keep or discard setting changes
state <normal|zoomed>
help";

fn optional_path(rest: &str) -> Option<PathBuf> {
    let rest = rest.trim();
    if rest.is_empty() {
        None
    } else {
        Some(PathBuf::from(rest))
    }
}

/// Parses one console line. Returns `None` for blank lines.
pub fn parse_command(line: &str) -> Option<EditorCommand> {
    let line = line.trim_end_matches(['\r', '\n']);
    if line.trim().is_empty() {
        return None;
    }
    let trimmed = line.trim_start();
    let (word, rest) = match trimmed.split_once(' ') {
        Some((word, rest)) => (word, rest),
        None => (trimmed, ""),
    };

    let command = match word {
        "new" => EditorCommand::New,
        "open" => EditorCommand::Open(optional_path(rest)),
        "list" | "ls" => EditorCommand::List,
        "switch" => match rest.trim().parse() {
            Ok(id) => EditorCommand::Switch(id),
            Err(_) => EditorCommand::Invalid(format!("not a window id: '{}'", rest.trim())),
        },
        "close" => EditorCommand::Close,
        "quit" | "exit" => EditorCommand::QuitAll,
        "show" => EditorCommand::Show,
        // Text after the first space is kept verbatim, spaces included.
        "append" => EditorCommand::Append(rest.to_string()),
        "delete-line" => match rest.trim().parse::<usize>() {
            Ok(n) if n > 0 => EditorCommand::DeleteLine(n - 1),
            _ => EditorCommand::Invalid(format!("not a line number: '{}'", rest.trim())),
        },
        "clear" => EditorCommand::Clear,
        "save" => EditorCommand::Save,
        "save-as" => EditorCommand::SaveAs(optional_path(rest)),
        "settings" => EditorCommand::Settings,
        "set" => match rest.trim().split_once(' ') {
            Some((key, value)) => EditorCommand::Set {
                key: key.to_string(),
                value: value.trim().to_string(),
            },
            None => EditorCommand::Invalid("usage: set <key> <value>".to_string()),
        },
        "apply" => EditorCommand::Apply,
        "revert" => EditorCommand::Revert,
        "state" => match WindowState::parse(rest.trim()) {
            Some(state) => EditorCommand::WindowState(state),
            None => EditorCommand::Invalid(format!("unknown window state: '{}'", rest.trim())),
        },
        "help" | "?" => EditorCommand::Help,
        other => EditorCommand::Invalid(format!("unknown command: '{}'", other)),
    };
    Some(command)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_lines_ignored() {
        assert_eq!(parse_command(""), None);
        assert_eq!(parse_command("   \r\n"), None);
    }

    #[test]
    fn test_file_commands() {
        assert_eq!(parse_command("save"), Some(EditorCommand::Save));
        assert_eq!(parse_command("save-as"), Some(EditorCommand::SaveAs(None)));
        assert_eq!(
            parse_command("save-as /tmp/my notes.txt\n"),
            Some(EditorCommand::SaveAs(Some(PathBuf::from("/tmp/my notes.txt"))))
        );
        assert_eq!(parse_command("open"), Some(EditorCommand::Open(None)));
    }

    #[test]
    fn test_append_keeps_spacing() {
        assert_eq!(
            parse_command("append   indented  text"),
            Some(EditorCommand::Append("  indented  text".to_string()))
        );
        assert_eq!(parse_command("append"), Some(EditorCommand::Append(String::new())));
    }

    #[test]
    fn test_numbers() {
        assert_eq!(parse_command("switch 3"), Some(EditorCommand::Switch(3)));
        assert_eq!(parse_command("delete-line 1"), Some(EditorCommand::DeleteLine(0)));
        assert!(matches!(parse_command("delete-line 0"), Some(EditorCommand::Invalid(_))));
        assert!(matches!(parse_command("switch x"), Some(EditorCommand::Invalid(_))));
    }

    #[test]
    fn test_settings_commands() {
        assert_eq!(
            parse_command("set bg sky blue"),
            Some(EditorCommand::Set {
                key: "bg".to_string(),
                value: "sky blue".to_string(),
            })
        );
        assert_eq!(
            parse_command("state zoomed"),
            Some(EditorCommand::WindowState(WindowState::Zoomed))
        );
        assert!(matches!(parse_command("set bg"), Some(EditorCommand::Invalid(_))));
        assert!(matches!(parse_command("frobnicate"), Some(EditorCommand::Invalid(_))));
    }
}
