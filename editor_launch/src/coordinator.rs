//! Decides whether this process becomes the primary instance, hands file
//! requests to an existing primary, and runs the primary's poll loop.
//!
//! The primary process holds the running marker and is the only consumer
//! of the queue file. Every poll tick it drains the queue, opens a session
//! per request and then checks the live session count. The count is only
//! looked at on a tick, so a hand-off that arrives just after the last
//! window closed is still opened instead of racing a shutdown.

use crate::error::{LaunchError, Result};
use crate::marker::RunningMarker;
use crate::queue::{QueueEntry, QueueFile};
use crossbeam_channel::{select, Receiver};
use shard_core::{AppPaths, SessionEvent};
use std::path::PathBuf;
use std::thread;
use std::time::Duration;

/// Interval between queue polls.
pub const POLL_INTERVAL: Duration = Duration::from_millis(69);

/// Wait before re-checking the queue when the marker is already present.
pub const CONTENTION_DELAY: Duration = Duration::from_millis(200);

/// Timing of the launch protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LaunchConfig {
    pub poll_interval: Duration,
    pub contention_delay: Duration,
}

impl Default for LaunchConfig {
    fn default() -> Self {
        Self {
            poll_interval: POLL_INTERVAL,
            contention_delay: CONTENTION_DELAY,
        }
    }
}

/// What the primary process hosts: something that can open editor
/// windows and react to front-end commands.
pub trait InstanceHost {
    type Command: Send + 'static;

    /// Opens a session for `path`, or a blank one.
    fn open_instance(&mut self, path: Option<PathBuf>);

    /// Commands from the front end, handled between poll ticks.
    fn inbox(&self) -> Receiver<Self::Command>;

    fn handle(&mut self, command: Self::Command);

    /// Called once this process has taken the marker, right before the
    /// poll loop starts. The front end must be live from here on, since
    /// nothing else can close the sessions it is about to serve.
    fn on_become_primary(&mut self) {}
}

/// Role this process took in [`LaunchCoordinator::start_or_handoff`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchRole {
    /// No primary was running; sessions were opened here.
    Primary,
    /// A primary was running; requests were queued for it.
    HandedOff,
}

/// How [`LaunchCoordinator::run`] ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// Another primary is live and will serve the queued requests.
    AlreadyRunning,
    /// Every session closed and the marker was removed.
    Finished,
}

/// Result of one poll tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    Continue,
    Shutdown,
}

/// Process-wide launch coordinator.
pub struct LaunchCoordinator {
    config: LaunchConfig,
    marker: RunningMarker,
    queue: QueueFile,
    events: Receiver<SessionEvent>,
    active_instances: i64,
}

impl LaunchCoordinator {
    /// Prepares the data directory and listens for session lifecycle events
    /// on `events`.
    pub fn new(
        paths: &AppPaths,
        config: LaunchConfig,
        events: Receiver<SessionEvent>,
    ) -> Result<Self> {
        paths.ensure().map_err(|source| LaunchError::DataDir {
            path: paths.root.clone(),
            source,
        })?;
        Ok(Self {
            config,
            marker: RunningMarker::new(&paths.running_marker),
            queue: QueueFile::new(&paths.queue_file),
            events,
            active_instances: 0,
        })
    }

    pub fn marker(&self) -> &RunningMarker {
        &self.marker
    }

    pub fn queue(&self) -> &QueueFile {
        &self.queue
    }

    /// Sessions known to be open, as of the last processed event.
    pub fn active_instances(&self) -> i64 {
        self.active_instances
    }

    /// Opens one session per requested path (a blank one if none) when no
    /// primary is running, otherwise queues the requests for the primary.
    pub fn start_or_handoff<H: InstanceHost>(
        &mut self,
        host: &mut H,
        requested: &[PathBuf],
    ) -> Result<LaunchRole> {
        let requests: Vec<Option<PathBuf>> = if requested.is_empty() {
            vec![None]
        } else {
            requested.iter().cloned().map(Some).collect()
        };

        if self.marker.exists() {
            for request in &requests {
                self.queue
                    .append(&QueueEntry::from_request(request.as_deref()))?;
            }
            Ok(LaunchRole::HandedOff)
        } else {
            for request in requests {
                log::info!("Creating instance for {:?}", request);
                host.open_instance(request);
            }
            self.collect_events();
            Ok(LaunchRole::Primary)
        }
    }

    /// Becomes the primary and serves until every session has closed.
    ///
    /// If the marker is already present, waits briefly and looks at the
    /// queue again. An empty queue means a live primary took our requests,
    /// so this process exits. A non-empty one means nobody is consuming
    /// it; the marker is stale and this process takes over.
    pub fn run<H: InstanceHost>(&mut self, host: &mut H) -> Result<RunOutcome> {
        if self.marker.exists() {
            thread::sleep(self.config.contention_delay);
            if self.queue.is_empty()? {
                log::info!("Shard is already running");
                return Ok(RunOutcome::AlreadyRunning);
            }
            log::warn!("Queued requests were not picked up, taking over as primary");
        }

        if !self.marker.acquire()? {
            log::debug!("Reusing existing running marker {:?}", self.marker.path());
        }
        log::info!("Starting primary instance");
        host.on_become_primary();
        self.serve(host)
    }

    /// The poll loop. Front-end commands are handled as they arrive; the
    /// queue and the session count are checked on every tick.
    fn serve<H: InstanceHost>(&mut self, host: &mut H) -> Result<RunOutcome> {
        let ticker = crossbeam_channel::tick(self.config.poll_interval);
        let inbox = host.inbox();
        let mut inbox_open = true;

        if self.poll(host)? == PollOutcome::Shutdown {
            return Ok(RunOutcome::Finished);
        }

        loop {
            let commands = if inbox_open {
                inbox.clone()
            } else {
                crossbeam_channel::never()
            };
            select! {
                recv(ticker) -> _ => {
                    if self.poll(host)? == PollOutcome::Shutdown {
                        return Ok(RunOutcome::Finished);
                    }
                }
                recv(commands) -> msg => match msg {
                    Ok(command) => host.handle(command),
                    Err(_) => {
                        log::debug!("Front-end inbox closed");
                        inbox_open = false;
                    }
                },
            }
        }
    }

    /// One tick: open every queued request, then shut down if no session
    /// is left.
    pub fn poll<H: InstanceHost>(&mut self, host: &mut H) -> Result<PollOutcome> {
        self.collect_events();
        for entry in self.queue.drain()? {
            log::info!("Creating instance for queued {:?}", entry);
            host.open_instance(entry.into_path());
        }
        self.collect_events();

        if self.active_instances <= 0 {
            log::info!("No instances left, shutting down");
            self.marker.release()?;
            return Ok(PollOutcome::Shutdown);
        }
        Ok(PollOutcome::Continue)
    }

    fn collect_events(&mut self) {
        for event in self.events.try_iter() {
            match event {
                SessionEvent::Opened(id) => {
                    self.active_instances += 1;
                    log::info!("Instance {} created, total: {}", id, self.active_instances);
                }
                SessionEvent::Closed(id) => {
                    self.active_instances -= 1;
                    log::info!("Instance {} closed, total: {}", id, self.active_instances);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::Sender;
    use shard_core::{
        CommandOutcome, SaveLocationStore, ScriptedDialogs, SessionCommand, SessionContext,
        SessionNotifier, SettingsStore, Workspace,
    };
    use std::fs;
    use tempfile::TempDir;

    /// Host backed by a real workspace with scripted dialogs.
    struct TestHost {
        workspace: Workspace,
        dialogs: ScriptedDialogs,
        tx: Sender<(usize, SessionCommand)>,
        rx: Receiver<(usize, SessionCommand)>,
        became_primary: bool,
    }

    impl InstanceHost for TestHost {
        type Command = (usize, SessionCommand);

        fn open_instance(&mut self, path: Option<PathBuf>) {
            self.workspace.spawn(path.as_deref(), &mut self.dialogs);
        }

        fn inbox(&self) -> Receiver<Self::Command> {
            self.rx.clone()
        }

        fn handle(&mut self, (id, command): Self::Command) {
            self.workspace.dispatch(id, command, &mut self.dialogs);
        }

        fn on_become_primary(&mut self) {
            assert!(self.workspace.len() <= 1, "hook must run before the queue is drained");
            self.became_primary = true;
        }
    }

    struct Fixture {
        dir: TempDir,
        paths: AppPaths,
        config: LaunchConfig,
    }

    impl Fixture {
        fn new() -> Self {
            let dir = TempDir::new().unwrap();
            let paths = AppPaths::in_dir(dir.path().join("ShardEditor"));
            let config = LaunchConfig {
                poll_interval: Duration::from_millis(5),
                contention_delay: Duration::from_millis(10),
            };
            Self { dir, paths, config }
        }

        fn process(&self) -> (LaunchCoordinator, TestHost) {
            let (notifier, events) = SessionNotifier::channel();
            let ctx = SessionContext {
                settings: SettingsStore::new(&self.paths.settings_file),
                save_location: SaveLocationStore::new(&self.paths.save_location_file),
                default_dir: self.dir.path().to_path_buf(),
                notifier,
            };
            let (tx, rx) = crossbeam_channel::unbounded();
            let host = TestHost {
                workspace: Workspace::new(ctx),
                dialogs: ScriptedDialogs::new(),
                tx,
                rx,
                became_primary: false,
            };
            let coordinator = LaunchCoordinator::new(&self.paths, self.config, events).unwrap();
            (coordinator, host)
        }
    }

    #[test]
    fn test_first_launch_opens_blank_session() {
        let fx = Fixture::new();
        let (mut coordinator, mut host) = fx.process();

        let role = coordinator.start_or_handoff(&mut host, &[]).unwrap();
        assert_eq!(role, LaunchRole::Primary);
        assert_eq!(host.workspace.len(), 1);
        assert_eq!(host.workspace.windows()[0].title, "Untitled - Shard");
        assert!(host.workspace.windows()[0].is_new_file);
        assert_eq!(coordinator.active_instances(), 1);

        coordinator.marker().acquire().unwrap();
        assert!(fx.paths.running_marker.is_dir());
        assert_eq!(coordinator.poll(&mut host).unwrap(), PollOutcome::Continue);
    }

    #[test]
    fn test_second_launch_hands_off() {
        let fx = Fixture::new();
        let (mut primary, mut primary_host) = fx.process();
        primary.start_or_handoff(&mut primary_host, &[]).unwrap();
        primary.marker().acquire().unwrap();

        let target = fx.dir.path().join("a.txt");
        fs::write(&target, "from disk").unwrap();

        let (mut second, mut second_host) = fx.process();
        let role = second
            .start_or_handoff(&mut second_host, &[target.clone()])
            .unwrap();
        assert_eq!(role, LaunchRole::HandedOff);
        assert!(second_host.workspace.is_empty());
        let queued = fs::read_to_string(&fx.paths.queue_file).unwrap();
        assert!(queued.lines().any(|line| line == target.to_string_lossy()));

        assert_eq!(primary.poll(&mut primary_host).unwrap(), PollOutcome::Continue);
        assert_eq!(primary_host.workspace.len(), 2);
        let opened = primary_host.workspace.active().unwrap();
        assert!(!opened.is_new_file());
        assert_eq!(opened.buffer().text(), "from disk");
        assert_eq!(primary.active_instances(), 2);

        // The queue was drained, so the second process stands down.
        assert_eq!(second.run(&mut second_host).unwrap(), RunOutcome::AlreadyRunning);
        assert!(!second_host.became_primary);
        assert!(second_host.workspace.is_empty());
    }

    #[test]
    fn test_drain_opens_in_append_order() {
        let fx = Fixture::new();
        let (mut primary, mut host) = fx.process();
        primary.start_or_handoff(&mut host, &[]).unwrap();
        primary.marker().acquire().unwrap();

        let names = ["one.txt", "two.txt", "three.txt", "four.txt"];
        let (mut producer_a, mut host_a) = fx.process();
        let (mut producer_b, mut host_b) = fx.process();
        let paths: Vec<PathBuf> = names.iter().map(|n| fx.dir.path().join(n)).collect();
        producer_a.start_or_handoff(&mut host_a, &paths[..3]).unwrap();
        producer_b.start_or_handoff(&mut host_b, &paths[3..]).unwrap();

        primary.poll(&mut host).unwrap();
        let opened: Vec<String> = host.workspace.windows()[1..]
            .iter()
            .map(|w| w.title.clone())
            .collect();
        assert_eq!(
            opened,
            names.iter().map(|n| format!("{n} - Shard")).collect::<Vec<_>>()
        );
        assert!(coordinator_queue_empty(&primary));
    }

    fn coordinator_queue_empty(coordinator: &LaunchCoordinator) -> bool {
        fs::read_to_string(coordinator.queue().path()).unwrap().is_empty()
    }

    #[test]
    fn test_shutdown_waits_for_tick() {
        let fx = Fixture::new();
        let (mut coordinator, mut host) = fx.process();
        coordinator.start_or_handoff(&mut host, &[]).unwrap();
        coordinator.marker().acquire().unwrap();

        let id = host.workspace.active_id().unwrap();
        let outcome = host
            .workspace
            .dispatch(id, SessionCommand::RequestClose, &mut host.dialogs);
        assert_eq!(outcome, Some(CommandOutcome::Closed));

        // Closing does not tear anything down by itself.
        assert!(fx.paths.running_marker.exists());
        assert_eq!(coordinator.poll(&mut host).unwrap(), PollOutcome::Shutdown);
        assert!(!fx.paths.running_marker.exists());
    }

    #[test]
    fn test_late_handoff_rescues_shutdown() {
        let fx = Fixture::new();
        let (mut coordinator, mut host) = fx.process();
        coordinator.start_or_handoff(&mut host, &[]).unwrap();
        coordinator.marker().acquire().unwrap();

        let id = host.workspace.active_id().unwrap();
        host.workspace
            .dispatch(id, SessionCommand::RequestClose, &mut host.dialogs);
        coordinator
            .queue()
            .append(&QueueEntry::Blank)
            .unwrap();

        assert_eq!(coordinator.poll(&mut host).unwrap(), PollOutcome::Continue);
        assert_eq!(host.workspace.len(), 1);
        assert!(fx.paths.running_marker.exists());
    }

    #[test]
    fn test_run_until_last_close() {
        let fx = Fixture::new();
        let (mut coordinator, mut host) = fx.process();
        coordinator.start_or_handoff(&mut host, &[]).unwrap();
        let id = host.workspace.active_id().unwrap();
        host.tx.send((id, SessionCommand::RequestClose)).unwrap();

        assert_eq!(coordinator.run(&mut host).unwrap(), RunOutcome::Finished);
        assert!(host.became_primary);
        assert!(!fx.paths.running_marker.exists());
        assert!(host.workspace.is_empty());
    }

    #[test]
    fn test_stale_marker_is_taken_over() {
        let fx = Fixture::new();
        fs::create_dir_all(&fx.paths.running_marker).unwrap();
        let target = fx.dir.path().join("orphan.txt");

        let (mut coordinator, mut host) = fx.process();
        let role = coordinator
            .start_or_handoff(&mut host, &[target.clone()])
            .unwrap();
        assert_eq!(role, LaunchRole::HandedOff);

        // Nobody drains the queue, so this process becomes primary, opens
        // its own request, and is told to close it.
        let tx = host.tx.clone();
        let closer = thread::spawn(move || {
            thread::sleep(Duration::from_millis(50));
            tx.send((0, SessionCommand::RequestClose)).unwrap();
        });
        assert_eq!(coordinator.run(&mut host).unwrap(), RunOutcome::Finished);
        assert!(host.became_primary);
        closer.join().unwrap();
        assert!(!fx.paths.running_marker.exists());
    }
}
