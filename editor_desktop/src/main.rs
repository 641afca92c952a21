//! Shard - a small multi-window text editor.
//!
//! Usage: shard [FILE]...
//!
//! The first process becomes the primary and hosts every window. Later
//! launches hand their files to it and exit.

use shard_core::{AppPaths, SaveLocationStore, SessionContext, SessionNotifier, SettingsStore, Workspace};
use shard_launch::{LaunchConfig, LaunchCoordinator, LaunchError, LaunchRole, RunOutcome};
use shard_ui::{EditorApp, NativeDialogs};
use std::env;
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

fn requested_paths(cwd: &std::path::Path) -> Vec<PathBuf> {
    env::args_os()
        .skip(1)
        .map(PathBuf::from)
        .map(|path| if path.is_absolute() { path } else { cwd.join(path) })
        .collect()
}

fn launch() -> Result<RunOutcome, LaunchError> {
    let paths = AppPaths::from_env();
    log::debug!("Data directory: {:?}", paths.root);

    let cwd = env::current_dir().unwrap_or_else(|_| paths.root.clone());
    let (notifier, events) = SessionNotifier::channel();
    let ctx = SessionContext {
        settings: SettingsStore::new(paths.settings_file.clone()),
        save_location: SaveLocationStore::new(paths.save_location_file.clone()),
        default_dir: cwd.clone(),
        notifier,
    };

    let mut coordinator = LaunchCoordinator::new(&paths, LaunchConfig::default(), events)?;

    // The console only starts if this process ends up serving.
    let mut app = EditorApp::new(Workspace::new(ctx), NativeDialogs::new(), io::stdout())
        .with_console(io::BufReader::new(io::stdin()));

    if coordinator.start_or_handoff(&mut app, &requested_paths(&cwd))? == LaunchRole::HandedOff {
        log::info!("Handing requests to the running instance");
    }

    coordinator.run(&mut app)
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!("Starting Shard");

    match launch() {
        Ok(RunOutcome::AlreadyRunning) => {
            log::info!("Shard exited: another instance is serving the request");
            ExitCode::SUCCESS
        }
        Ok(RunOutcome::Finished) => {
            log::info!("Shard exited");
            ExitCode::SUCCESS
        }
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
