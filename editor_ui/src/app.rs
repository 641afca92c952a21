//! Main editor application: maps console commands onto editor sessions.

use crate::console::spawn_console_reader;
use crate::input::{EditorCommand, HELP};
use crossbeam_channel::{Receiver, Sender};
use shard_core::{Dialogs, SessionCommand, SessionId, Workspace};
use shard_launch::InstanceHost;
use std::io::{BufRead, Write};
use std::path::PathBuf;

/// The main editor application.
///
/// All window state lives here and is only touched from the coordinator's
/// thread. Output (titles, buffer listings) goes to `out`.
pub struct EditorApp<D: Dialogs, W: Write> {
    /// The workspace managing every open session.
    pub workspace: Workspace,
    /// Dialog provider shared by all sessions.
    pub dialogs: D,
    commands: Sender<EditorCommand>,
    /// Incoming commands from the console reader.
    inbox: Receiver<EditorCommand>,
    /// Console input, read once this process starts serving.
    console: Option<Box<dyn BufRead + Send>>,
    out: W,
}

impl<D: Dialogs, W: Write> EditorApp<D, W> {
    /// Creates a new editor application.
    pub fn new(workspace: Workspace, dialogs: D, out: W) -> Self {
        let (commands, inbox) = crossbeam_channel::unbounded();
        Self {
            workspace,
            dialogs,
            commands,
            inbox,
            console: None,
            out,
        }
    }

    /// Reads commands from `input` once this process becomes the primary.
    pub fn with_console(mut self, input: impl BufRead + Send + 'static) -> Self {
        self.console = Some(Box::new(input));
        self
    }

    /// Sender for queueing commands to this app.
    pub fn commands(&self) -> Sender<EditorCommand> {
        self.commands.clone()
    }

    /// Returns the output sink.
    pub fn output(&self) -> &W {
        &self.out
    }

    /// Writes one line of output. A broken console is not worth stopping
    /// the editor for.
    fn say(&mut self, line: impl AsRef<str>) {
        if let Err(e) = writeln!(self.out, "{}", line.as_ref()) {
            log::debug!("Console output failed: {}", e);
        }
    }

    /// Prints the active window's title.
    fn print_status(&mut self) {
        let status = match self.workspace.active() {
            Some(session) => {
                let position = session.buffer().char_to_line_col(session.buffer().len_chars());
                format!(
                    "[{}] {}  Ln {}, Col {}",
                    session.id(),
                    session.title(),
                    position.0 + 1,
                    position.1
                )
            }
            None => "(no open windows)".to_string(),
        };
        self.say(status);
    }

    /// Dispatches a command to the active session.
    fn dispatch_active(&mut self, command: SessionCommand) {
        match self.workspace.active_id() {
            Some(id) => {
                self.workspace.dispatch(id, command, &mut self.dialogs);
            }
            None => self.say("(no open windows)"),
        }
    }

    /// Applies a text edit to the active buffer, then refreshes its title.
    fn edit_active(&mut self, edit: impl FnOnce(&mut shard_core::TextBuffer) -> bool) {
        let applied = match self.workspace.active_mut() {
            Some(session) => edit(session.buffer_mut()),
            None => {
                self.say("(no open windows)");
                return;
            }
        };
        if !applied {
            self.say("no such line");
            return;
        }
        self.dispatch_active(SessionCommand::Refresh);
    }

    fn show_active(&mut self) {
        let lines: Vec<String> = match self.workspace.active() {
            Some(session) => {
                let buffer = session.buffer();
                (0..buffer.len_lines())
                    .filter_map(|n| buffer.line(n).map(|text| format!("{:>4} | {}", n + 1, text)))
                    .collect()
            }
            None => vec!["(no open windows)".to_string()],
        };
        for line in lines {
            self.say(line);
        }
    }

    fn list_windows(&mut self) {
        let active = self.workspace.active_id();
        let windows = self.workspace.windows();
        if windows.is_empty() {
            self.say("(no open windows)");
        }
        for window in windows {
            let marker = if Some(window.id) == active { '>' } else { ' ' };
            self.say(format!(
                "{} [{}] {}  ({})",
                marker,
                window.id,
                window.title,
                window.path.display()
            ));
        }
    }

    /// Asks every window to close, in creation order.
    fn close_all(&mut self) {
        let ids: Vec<SessionId> = self.workspace.windows().iter().map(|w| w.id).collect();
        for id in ids {
            self.workspace
                .dispatch(id, SessionCommand::RequestClose, &mut self.dialogs);
        }
    }

    /// Without a console nothing could close the remaining windows, so
    /// whatever survives the close prompts is discarded.
    fn end_of_input(&mut self) {
        self.close_all();
        let remaining: Vec<(SessionId, String)> = self
            .workspace
            .windows()
            .into_iter()
            .map(|w| (w.id, w.title))
            .collect();
        for (id, title) in remaining {
            self.dialogs.warning(
                "Console Closed",
                &format!("Console input ended; '{}' was closed without saving", title),
            );
            self.workspace.discard(id);
        }
    }

    /// Executes a console command.
    pub fn execute(&mut self, command: EditorCommand) {
        log::debug!("Console command: {:?}", command);
        match command {
            EditorCommand::New => match self.workspace.active_id() {
                Some(_) => self.dispatch_active(SessionCommand::RequestNew),
                None => self.open_instance(None),
            },
            EditorCommand::Open(None) => self.dispatch_active(SessionCommand::RequestOpen),
            EditorCommand::Open(Some(path)) => match self.workspace.active_id() {
                Some(_) => self.dispatch_active(SessionCommand::OpenPath(path)),
                None => self.open_instance(Some(path)),
            },
            EditorCommand::List => {
                self.list_windows();
                return;
            }
            EditorCommand::Switch(id) => {
                if !self.workspace.set_active(id) {
                    self.say(format!("no window {}", id));
                }
            }
            EditorCommand::Close => self.dispatch_active(SessionCommand::RequestClose),
            EditorCommand::QuitAll => self.close_all(),
            EditorCommand::Show => {
                self.show_active();
                return;
            }
            EditorCommand::Append(text) => self.edit_active(|buffer| {
                buffer.append(&text);
                buffer.append("\n");
                true
            }),
            EditorCommand::DeleteLine(line) => self.edit_active(|buffer| buffer.remove_line(line)),
            EditorCommand::Clear => self.edit_active(|buffer| {
                buffer.set_text("");
                true
            }),
            EditorCommand::Save => self.dispatch_active(SessionCommand::RequestSave),
            EditorCommand::SaveAs(None) => self.dispatch_active(SessionCommand::RequestSaveAs),
            EditorCommand::SaveAs(Some(path)) => self.dispatch_active(SessionCommand::SaveTo(path)),
            EditorCommand::Settings => {
                self.dispatch_active(SessionCommand::BeginSettings);
                if let Some(settings) = self.workspace.active().map(|s| s.settings().to_string()) {
                    self.say(settings.trim_end());
                }
                return;
            }
            EditorCommand::Set { key, value } => {
                self.dispatch_active(SessionCommand::SetSetting { key, value })
            }
            EditorCommand::Apply => self.dispatch_active(SessionCommand::ConfirmSettings),
            EditorCommand::Revert => self.dispatch_active(SessionCommand::CancelSettings),
            EditorCommand::WindowState(state) => {
                self.dispatch_active(SessionCommand::WindowStateChanged(state))
            }
            EditorCommand::Help => {
                self.say(HELP);
                return;
            }
            EditorCommand::Invalid(reason) => {
                self.say(format!("{} (type 'help')", reason));
                return;
            }
            EditorCommand::EndOfInput => self.end_of_input(),
        }
        self.print_status();
    }
}

impl<D: Dialogs, W: Write> InstanceHost for EditorApp<D, W> {
    type Command = EditorCommand;

    fn open_instance(&mut self, path: Option<PathBuf>) {
        if self.workspace.spawn(path.as_deref(), &mut self.dialogs).is_some() {
            self.print_status();
        }
    }

    fn inbox(&self) -> Receiver<EditorCommand> {
        self.inbox.clone()
    }

    fn handle(&mut self, command: EditorCommand) {
        self.execute(command);
    }

    fn on_become_primary(&mut self) {
        let Some(input) = self.console.take() else {
            return;
        };
        if let Err(e) = spawn_console_reader(input, self.commands.clone()) {
            log::error!("Failed to start console reader: {}", e);
        }
    }
}
