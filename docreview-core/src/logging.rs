//! Leveled logging with a runtime debug toggle.
//!
//! All crates log through `tracing`. [`init`] installs a registry with a
//! reloadable level filter so debug output can be switched on and off without
//! restarting.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::reload;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::Registry;

/// Controls the level of the installed subscriber.
#[derive(Clone)]
pub struct LogHandle {
    reload: Option<reload::Handle<LevelFilter, Registry>>,
    debug: Arc<AtomicBool>,
}

impl LogHandle {
    /// A handle not attached to any subscriber. Toggling only flips the flag.
    pub fn detached(debug: bool) -> Self {
        Self {
            reload: None,
            debug: Arc::new(AtomicBool::new(debug)),
        }
    }

    /// Switches between `DEBUG` and `INFO`.
    pub fn set_debug(&self, enabled: bool) {
        self.debug.store(enabled, Ordering::Relaxed);
        if let Some(handle) = &self.reload {
            if let Err(e) = handle.modify(|filter| *filter = level_for(enabled)) {
                tracing::warn!(error = %e, "could not change log level");
                return;
            }
        }
        tracing::info!(debug = enabled, "debug logging toggled");
    }

    pub fn is_debug(&self) -> bool {
        self.debug.load(Ordering::Relaxed)
    }
}

fn level_for(debug: bool) -> LevelFilter {
    if debug {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    }
}

/// Installs the global subscriber writing plain-text lines to `writer`.
///
/// If a global subscriber is already set (e.g. in tests) the existing one is
/// kept and the returned handle is detached.
pub fn init<W>(writer: W, debug: bool) -> LogHandle
where
    W: for<'a> MakeWriter<'a> + Send + Sync + 'static,
{
    let (filter, handle) = reload::Layer::new(level_for(debug));
    let installed = tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_target(true)
                .with_writer(writer),
        )
        .try_init();

    match installed {
        Ok(()) => LogHandle {
            reload: Some(handle),
            debug: Arc::new(AtomicBool::new(debug)),
        },
        Err(_) => LogHandle::detached(debug),
    }
}
