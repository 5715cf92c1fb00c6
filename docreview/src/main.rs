//! docreview: terminal client for reviewing document-analysis results.
//!
//! # Startup sequence
//!
//! 1. Parse flags and load the config file. Both happen before the terminal is
//!    touched so usage errors print normally.
//! 2. Open the log file under the data directory and install the subscriber.
//! 3. `install_panic_hook()`, then `register_sigterm()`, then `init_tui()`.
//! 4. Spawn the event task, open the settings store, probe the server.
//! 5. Load `--results` or start polling `--job`, then run the event loop.
//!
//! Logging is installed before the terminal is touched so that failures during
//! terminal setup still reach `docreview.log`. The settings store is opened
//! before the first frame: theme, page size and persisted filters are all read
//! from it, so there is no "loading settings" state to draw.
//!
//! The job tracker is built before the capabilities probe. The probe runs under
//! the tracker's abort token, like every other non-job request.
//!
//! # Event loop
//!
//! - A 50 ms heartbeat arm polls the SIGTERM flag even when no events arrive.
//! - `Render` is the only place `terminal.draw()` is called.
//! - Keys go through [`handle_key`]; `KeyAction::Quit` breaks the loop.
//! - Job events are applied only if they belong to the tracked job.
//!
//! # Shutdown
//!
//! `restore_tui()` runs after the loop exits on every path except panics, which
//! the panic hook covers. `?` is only used before `init_tui()`; a failed draw
//! is logged and breaks the loop.

mod api;
mod app;
mod config;
mod event;
mod theme;
mod tui;
mod ui;

use std::fs::OpenOptions;
use std::path::Path;
use std::sync::atomic::Ordering;
use std::sync::{Arc, Mutex};

use docreview_core::storage::{MemoryStorage, SqliteStorage};
use docreview_core::types::ReviewResult;
use docreview_core::{
    logging, FilterCriteria, JobApi, JobTracker, SessionState, SettingsStore,
};

use crate::config::{config_path, Cli, Config};
use crate::ui::keybindings::{handle_key, KeyAction};

fn invalid_input(e: impl std::fmt::Display) -> std::io::Error {
    std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string())
}

fn open_settings(data_dir: &Path) -> SettingsStore {
    let path = data_dir.join("settings.db");
    let mut store = match SqliteStorage::open(&path) {
        Ok(storage) => SettingsStore::new(storage),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "settings db unavailable, using memory");
            SettingsStore::new(MemoryStorage::new())
        }
    };
    store.init();
    store
}

fn read_results(path: &Path) -> Result<ReviewResult, String> {
    let raw = std::fs::read_to_string(path).map_err(|e| format!("{}: {e}", path.display()))?;
    serde_json::from_str(&raw).map_err(|e| format!("{}: {e}", path.display()))
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    let cli = Cli::parse(std::env::args().skip(1)).map_err(invalid_input)?;
    if cli.help {
        println!("{}", config::USAGE);
        return Ok(());
    }

    let (config, config_err) = match Config::load_from(&config_path()) {
        Ok(c) => (c.with_env(), None),
        Err(e) => {
            eprintln!("docreview: {e}; using defaults");
            (Config::default().with_env(), Some(e))
        }
    };

    std::fs::create_dir_all(&config.data_dir)?;
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(config.data_dir.join("docreview.log"))?;
    let log = logging::init(Mutex::new(log_file), cli.debug || config.debug);
    if let Some(e) = config_err {
        tracing::warn!(error = %e, "config ignored, using defaults");
    }
    tracing::info!(server = %config.server_url, "docreview starting");

    tui::install_panic_hook();
    let term_flag = tui::register_sigterm()?;
    let mut terminal = tui::init_tui()?;

    let handler = event::EventHandler::new();
    event::spawn_event_task(handler.tx.clone());
    let tx = handler.tx;
    let mut rx = handler.rx;

    let settings = open_settings(&config.data_dir);
    let theme = theme::Theme::from_name(&settings.settings().ui.theme);
    let criteria = FilterCriteria::from_settings(&settings.settings().filters);
    let page_size = settings.settings().preferences.page_size;

    let mut state = match api::HttpJobApi::new(&config.server_url) {
        Ok(client) => {
            let client = Arc::new(client);
            let api: Arc<dyn JobApi> = client.clone();
            let tracker = JobTracker::new(api, config.poll_interval());
            let capabilities = client.capabilities(&tracker.abort_token()).await;
            let session = SessionState::new(capabilities, criteria, page_size);
            app::AppState::new(session, settings, theme, log, config.data_dir.clone())
                .with_tracker(tracker)
        }
        Err(e) => {
            tracing::error!(error = %e, "http client unavailable");
            let session = SessionState::new(Default::default(), criteria, page_size);
            app::AppState::new(session, settings, theme, log, config.data_dir.clone())
        }
    };

    if let Some(path) = &cli.results {
        match read_results(path) {
            Ok(result) => {
                let name = path.file_stem().map(|s| s.to_string_lossy().into_owned());
                state.load_result(result, name);
            }
            Err(e) => {
                tracing::warn!(error = %e, "could not load results");
                state.notice = Some(app::Notice { text: e, is_error: true });
            }
        }
    } else if let Some(job_id) = &cli.job {
        state.start_job(job_id, tx.clone());
    }

    'event_loop: loop {
        tokio::select! {
            // Heartbeat so SIGTERM is noticed even when no events arrive.
            _ = tokio::time::sleep(std::time::Duration::from_millis(50)) => {
                if term_flag.load(Ordering::Relaxed) {
                    break 'event_loop;
                }
            }
            maybe_event = rx.recv() => {
                match maybe_event {
                    Some(event::AppEvent::Render) => {
                        if let Err(e) = terminal.draw(|frame| ui::render(frame, &mut state)) {
                            tracing::error!(error = %e, "draw failed");
                            break 'event_loop;
                        }
                    }
                    Some(event::AppEvent::Key(key)) => {
                        if handle_key(key, &mut state) == KeyAction::Quit {
                            break 'event_loop;
                        }
                    }
                    Some(event::AppEvent::Job { job_id, event: job_event }) => {
                        state.apply_job_event(&job_id, job_event);
                    }
                    Some(event::AppEvent::Quit) | None => break 'event_loop,
                    _ => {}
                }
                if term_flag.load(Ordering::Relaxed) {
                    break 'event_loop;
                }
            }
        }
    }

    state.stop_polling();
    tracing::info!("docreview exiting");
    tui::restore_tui()?;
    Ok(())
}
