//! Event bus for docreview.
//!
//! Terminal input, timer ticks and job-polling results are normalised into a
//! single [`AppEvent`] and sent over one unbounded tokio channel. The main loop
//! owns the receiver and is the only place session state is mutated, so every
//! producer (terminal reader, timers, job forwarders) only ever sends.
//!
//! Two independent intervals drive the render and logic cycles:
//! - **Render interval** (33 ms, about 30 FPS): one `terminal.draw()` per event.
//! - **Tick interval** (250 ms, 4 Hz): periodic state updates.
//!
//! Job events carry the id of the job they belong to. A forwarder can still have
//! events in flight when its poll is stopped, so the receiver compares the id
//! against the job it is tracking and drops the rest.

use crossterm::event::{Event, EventStream, KeyEvent, KeyEventKind};
use docreview_core::{JobEvent, JobStream};
use futures::{FutureExt, StreamExt};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::interval;

/// Everything the main loop reacts to.
///
/// `#[non_exhaustive]` keeps match arms outside this module from breaking when
/// a new source is added.
#[derive(Debug)]
#[non_exhaustive]
pub enum AppEvent {
    /// Key press (`KeyEventKind::Press` only).
    ///
    /// Release and repeat events are filtered in [`spawn_event_task`]; some
    /// platforms report both press and release for every keystroke.
    Key(KeyEvent),
    Resize(u16, u16),
    Tick,
    /// Triggers exactly one `terminal.draw()`.
    Render,
    /// Progress or outcome of the polled analysis job `job_id`.
    Job { job_id: String, event: JobEvent },
    Quit,
}

/// Both ends of the event channel.
///
/// `tx` is cloned into every producer; `rx` belongs to the main loop.
pub struct EventHandler {
    pub tx: mpsc::UnboundedSender<AppEvent>,
    pub rx: mpsc::UnboundedReceiver<AppEvent>,
}

impl EventHandler {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self { tx, rx }
    }
}

impl Default for EventHandler {
    fn default() -> Self {
        Self::new()
    }
}

/// Spawns the task feeding terminal input and timer ticks into `tx`.
///
/// The task ends when the crossterm stream ends, after sending
/// [`AppEvent::Quit`]. Stream errors are logged and skipped.
///
/// - `reader.next().fuse()` keeps `select!` from polling a finished crossterm
///   stream.
/// - Send errors are ignored: a closed receiver means the app is shutting
///   down, and the runtime drops this task with it.
pub fn spawn_event_task(tx: mpsc::UnboundedSender<AppEvent>) {
    tokio::spawn(async move {
        let mut tick_interval = interval(Duration::from_millis(250));
        let mut render_interval = interval(Duration::from_millis(33));
        let mut reader = EventStream::new();

        loop {
            let tick_tick = tick_interval.tick();
            let render_tick = render_interval.tick();
            let crossterm_event = reader.next().fuse();

            tokio::select! {
                _ = tick_tick => {
                    let _ = tx.send(AppEvent::Tick);
                }
                _ = render_tick => {
                    let _ = tx.send(AppEvent::Render);
                }
                maybe_event = crossterm_event => {
                    match maybe_event {
                        Some(Ok(Event::Key(key))) if key.kind == KeyEventKind::Press => {
                            let _ = tx.send(AppEvent::Key(key));
                        }
                        Some(Ok(Event::Resize(w, h))) => {
                            let _ = tx.send(AppEvent::Resize(w, h));
                        }
                        Some(Err(e)) => {
                            tracing::warn!(error = %e, "terminal event stream error");
                        }
                        None => {
                            let _ = tx.send(AppEvent::Quit);
                            break;
                        }
                        _ => {}
                    }
                }
            }
        }
    });
}

/// Forwards every event of `stream` onto the bus, tagged with `job_id`, until
/// the stream ends.
///
/// Stopping the tracker ends the stream, which ends this task. Events already
/// on the bus at that point stay there; the receiver drops them by id.
pub fn forward_job_events(
    job_id: String,
    mut stream: JobStream,
    tx: mpsc::UnboundedSender<AppEvent>,
) {
    tokio::spawn(async move {
        while let Some(event) = stream.next().await {
            let tagged = AppEvent::Job { job_id: job_id.clone(), event };
            if tx.send(tagged).is_err() {
                stream.close();
                break;
            }
        }
    });
}
