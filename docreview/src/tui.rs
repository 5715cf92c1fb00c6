//! Terminal lifecycle: raw mode, alternate screen, panic and SIGTERM handling.
//!
//! **stderr, not stdout.** The UI is drawn to stderr. `--help` output and
//! anything a user pipes from the process stay on stdout, and
//! `docreview --job 42 > out.txt` still shows the interface.
//!
//! Three exit paths must leave the shell usable:
//! - normal quit and SIGTERM both break the main loop, which calls
//!   [`restore_tui`];
//! - a panic runs the hook from [`install_panic_hook`] before the message
//!   prints.
//!
//! Mouse capture is not enabled; the review panels are keyboard driven and the
//! terminal keeps native text selection for copying flagged passages.

use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use signal_hook::consts::SIGTERM;
use std::io::{stderr, BufWriter, Stderr};
use std::panic;
use std::sync::{atomic::AtomicBool, Arc};

/// Buffered stderr keeps each frame to a few write(2) calls.
pub type Tui = Terminal<CrosstermBackend<BufWriter<Stderr>>>;

/// Enables raw mode and enters the alternate screen.
///
/// Call [`restore_tui`] on every exit path; ratatui does not restore the
/// terminal on drop.
///
/// # Errors
///
/// Returns `Err` if raw mode, the screen switch, or `Terminal::new` fails.
pub fn init_tui() -> std::io::Result<Tui> {
    let mut out = BufWriter::new(stderr());
    enable_raw_mode()?;
    execute!(out, EnterAlternateScreen)?;
    Terminal::new(CrosstermBackend::new(out))
}

/// Leaves the alternate screen and disables raw mode. Idempotent.
///
/// # Errors
///
/// Returns `Err` if `disable_raw_mode` or `execute!` fails.
pub fn restore_tui() -> std::io::Result<()> {
    disable_raw_mode()?;
    execute!(stderr(), LeaveAlternateScreen)?;
    Ok(())
}

/// Restores the terminal before the previous panic hook prints, so the
/// message is readable and the shell usable.
///
/// Install before [`init_tui`].
pub fn install_panic_hook() {
    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        let _ = restore_tui();
        original_hook(panic_info);
    }));
}

/// Returns a flag that flips to `true` on SIGTERM.
///
/// The handler only stores into the atomic; the main loop polls it on a 50 ms
/// heartbeat and after every event, then exits through the normal restore path.
///
/// # Errors
///
/// Returns `Err` if the OS refuses the signal registration.
pub fn register_sigterm() -> std::io::Result<Arc<AtomicBool>> {
    let term = Arc::new(AtomicBool::new(false));
    signal_hook::flag::register(SIGTERM, Arc::clone(&term))?;
    Ok(term)
}
