//! Registry of the editor sessions living in this process.

use crate::dialogs::Dialogs;
use crate::error::FileError;
use crate::session::{CommandOutcome, EditorSession, SessionCommand, SessionContext, SessionId};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Information about one open window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowInfo {
    /// Session ID.
    pub id: SessionId,
    /// Window title, including the dirty marker.
    pub title: String,
    /// File the session is bound to (or would be saved to).
    pub path: PathBuf,
    /// Whether the session has no file on disk yet.
    pub is_new_file: bool,
}

/// Owns every open session and routes commands to them.
pub struct Workspace {
    ctx: SessionContext,
    /// Open sessions. IDs only grow, so key order is creation order.
    sessions: BTreeMap<SessionId, EditorSession>,
    /// Session that receives commands from the front end.
    active: Option<SessionId>,
    /// Next session ID to assign.
    next_id: SessionId,
}

impl Workspace {
    /// Creates an empty workspace.
    pub fn new(ctx: SessionContext) -> Self {
        Self {
            ctx,
            sessions: BTreeMap::new(),
            active: None,
            next_id: 0,
        }
    }

    pub fn context(&self) -> &SessionContext {
        &self.ctx
    }

    /// Constructs a session for `path` (or a blank one) and makes it active.
    pub fn open_session(&mut self, path: Option<&Path>) -> Result<SessionId, FileError> {
        let id = self.next_id;
        self.next_id += 1;

        let session = EditorSession::open(id, path, &self.ctx)?;

        self.sessions.insert(id, session);
        self.active = Some(id);
        Ok(id)
    }

    /// Like [`open_session`](Self::open_session), reporting a failed
    /// construction through `dialogs` instead of returning it.
    pub fn spawn(&mut self, path: Option<&Path>, dialogs: &mut dyn Dialogs) -> Option<SessionId> {
        match self.open_session(path) {
            Ok(id) => Some(id),
            Err(e) => {
                log::error!("Could not open {:?}: {}", path, e);
                dialogs.error("Error", e.user_message());
                None
            }
        }
    }

    /// Dispatches a command to a session, then applies the outcome: closed
    /// sessions are dropped and spawn requests open a new session.
    pub fn dispatch(
        &mut self,
        id: SessionId,
        command: SessionCommand,
        dialogs: &mut dyn Dialogs,
    ) -> Option<CommandOutcome> {
        let session = self.sessions.get_mut(&id)?;
        let outcome = session.handle(command, &self.ctx, dialogs);
        match &outcome {
            CommandOutcome::Continue => {}
            CommandOutcome::Closed => self.remove(id),
            CommandOutcome::Spawn(path) => {
                self.spawn(path.as_deref(), dialogs);
            }
        }
        Some(outcome)
    }

    /// Closes a session without asking about unsaved changes.
    pub fn discard(&mut self, id: SessionId) -> bool {
        match self.sessions.get_mut(&id) {
            Some(session) => {
                log::warn!("Discarding session {} ({})", id, session.display_name());
                session.close(&self.ctx);
            }
            None => return false,
        }
        self.remove(id);
        true
    }

    fn remove(&mut self, id: SessionId) {
        self.sessions.remove(&id);
        if self.active == Some(id) {
            self.active = self.sessions.keys().next_back().copied();
        }
    }

    /// Returns the active session ID.
    pub fn active_id(&self) -> Option<SessionId> {
        self.active
    }

    /// Makes `id` the active session.
    pub fn set_active(&mut self, id: SessionId) -> bool {
        if self.get(id).is_some() {
            self.active = Some(id);
            true
        } else {
            false
        }
    }

    pub fn get(&self, id: SessionId) -> Option<&EditorSession> {
        self.sessions.get(&id)
    }

    pub fn get_mut(&mut self, id: SessionId) -> Option<&mut EditorSession> {
        self.sessions.get_mut(&id)
    }

    pub fn active(&self) -> Option<&EditorSession> {
        self.active.and_then(|id| self.get(id))
    }

    pub fn active_mut(&mut self) -> Option<&mut EditorSession> {
        self.active.and_then(move |id| self.get_mut(id))
    }

    /// Returns the number of open sessions.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Returns information about all open windows in creation order.
    pub fn windows(&self) -> Vec<WindowInfo> {
        self.sessions
            .values()
            .map(|session| WindowInfo {
                id: session.id(),
                title: session.title().to_string(),
                path: session.file_path(),
                is_new_file: session.is_new_file(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialogs::{CloseChoice, ScriptedDialogs};
    use crate::save_location::SaveLocationStore;
    use crate::session::{SessionEvent, SessionNotifier};
    use crate::settings::SettingsStore;
    use crossbeam_channel::Receiver;
    use std::fs;
    use tempfile::TempDir;

    fn workspace() -> (TempDir, Workspace, Receiver<SessionEvent>) {
        let dir = TempDir::new().unwrap();
        let (notifier, events) = SessionNotifier::channel();
        let ctx = SessionContext {
            settings: SettingsStore::new(dir.path().join("EditorSettings.txt")),
            save_location: SaveLocationStore::new(dir.path().join("LastSaveLocation.txt")),
            default_dir: dir.path().to_path_buf(),
            notifier,
        };
        (dir, Workspace::new(ctx), events)
    }

    #[test]
    fn test_new_workspace() {
        let (_dir, ws, _events) = workspace();
        assert!(ws.active_id().is_none());
        assert!(ws.is_empty());
    }

    #[test]
    fn test_open_sessions() {
        let (_dir, mut ws, events) = workspace();
        let a = ws.open_session(None).unwrap();
        let b = ws.open_session(None).unwrap();

        assert_eq!(ws.len(), 2);
        assert_eq!(ws.active_id(), Some(b));
        assert!(ws.set_active(a));
        assert_eq!(ws.active_id(), Some(a));
        assert_eq!(
            events.try_iter().collect::<Vec<_>>(),
            vec![SessionEvent::Opened(a), SessionEvent::Opened(b)]
        );

        let windows = ws.windows();
        assert_eq!(windows[0].title, "Untitled - Shard");
        assert!(windows[1].is_new_file);
    }

    #[test]
    fn test_close_removes_session() {
        let (_dir, mut ws, events) = workspace();
        let a = ws.open_session(None).unwrap();
        let b = ws.open_session(None).unwrap();
        let mut dialogs = ScriptedDialogs::new();

        let outcome = ws.dispatch(b, SessionCommand::RequestClose, &mut dialogs);
        assert_eq!(outcome, Some(CommandOutcome::Closed));
        assert_eq!(ws.len(), 1);
        assert_eq!(ws.active_id(), Some(a));
        assert!(ws.get(b).is_none());
        assert_eq!(ws.dispatch(b, SessionCommand::Refresh, &mut dialogs), None);
        assert_eq!(events.try_iter().last(), Some(SessionEvent::Closed(b)));
    }

    #[test]
    fn test_new_command_spawns_session() {
        let (_dir, mut ws, _events) = workspace();
        let a = ws.open_session(None).unwrap();
        let mut dialogs = ScriptedDialogs::new();

        ws.dispatch(a, SessionCommand::RequestNew, &mut dialogs);
        assert_eq!(ws.len(), 2);
        assert_ne!(ws.active_id(), Some(a));
    }

    #[test]
    fn test_cancelled_close_keeps_session() {
        let (dir, mut ws, _events) = workspace();
        let path = dir.path().join("x.txt");
        fs::write(&path, "x").unwrap();
        let id = ws.open_session(Some(&path)).unwrap();
        ws.active_mut().unwrap().buffer_mut().append("y");

        let mut dialogs = ScriptedDialogs::new();
        dialogs.answer_close(CloseChoice::Cancel);
        ws.dispatch(id, SessionCommand::RequestClose, &mut dialogs);
        assert_eq!(ws.len(), 1);
        assert_eq!(ws.windows()[0].title, "*x.txt - Shard");
    }

    #[test]
    fn test_closed_sessions_are_dropped() {
        let (_dir, mut ws, _events) = workspace();
        let mut dialogs = ScriptedDialogs::new();
        let first = ws.open_session(None).unwrap();
        for _ in 0..50 {
            let id = ws.open_session(None).unwrap();
            ws.dispatch(id, SessionCommand::RequestClose, &mut dialogs);
        }
        let last = ws.open_session(None).unwrap();

        assert_eq!(ws.sessions.len(), 2);
        assert_eq!(
            ws.windows().iter().map(|w| w.id).collect::<Vec<_>>(),
            vec![first, last]
        );
        ws.dispatch(last, SessionCommand::RequestClose, &mut dialogs);
        assert_eq!(ws.active_id(), Some(first));
    }

    #[test]
    fn test_discard_skips_prompt() {
        let (_dir, mut ws, events) = workspace();
        let id = ws.open_session(None).unwrap();
        ws.active_mut().unwrap().buffer_mut().append("unsaved");

        assert!(ws.discard(id));
        assert!(ws.is_empty());
        assert!(!ws.discard(id));
        assert_eq!(events.try_iter().last(), Some(SessionEvent::Closed(id)));
    }
}
