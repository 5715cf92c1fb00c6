//! Keybinding dispatcher.
//!
//! Translates crossterm key events into `AppState` mutations and returns a
//! [`KeyAction`] for the event loop. Dispatch branches on `state.mode` first so
//! each mode has its own handler.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use docreview_core::types::Adjudication;

use crate::app::{AppState, ExportFormat, Mode};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Continue,
    Quit,
}

pub fn handle_key(key: KeyEvent, state: &mut AppState) -> KeyAction {
    match state.mode {
        Mode::HelpOverlay => handle_help(key, state),
        Mode::ConfirmQuit => handle_confirm_quit(key, state),
        Mode::Search => handle_search(key, state),
        Mode::Normal => handle_normal(key, state),
    }
}

// ---------------------------------------------------------------------------
// Normal mode
// ---------------------------------------------------------------------------

fn handle_normal(key: KeyEvent, state: &mut AppState) -> KeyAction {
    if let Some(action) = handle_motion_key(key, state) {
        return action;
    }

    match key.code {
        // Selection
        KeyCode::Char(' ') => state.toggle_current(),
        KeyCode::Char('a') => state.select_all(),
        KeyCode::Char('A') => state.select_none(),

        // Filters
        KeyCode::Char(c @ '1'..='5') => {
            state.toggle_severity(c as usize - '0' as usize);
        }
        KeyCode::Char('c') => state.chart_filter_by_severity(),
        KeyCode::Char('C') => state.chart_filter_by_category(),
        KeyCode::Char('x') => state.clear_chart_filter(),
        KeyCode::Char('v') => state.cycle_validation_filter(),
        KeyCode::Char('/') => state.begin_search(),
        KeyCode::Char('s') => state.cycle_sort(),

        // Review
        KeyCode::Char('y') => state.adjudicate_current(Adjudication::Confirm),
        KeyCode::Char('r') => state.adjudicate_current(Adjudication::Reject),
        KeyCode::Char('f') => state.adjudicate_current(Adjudication::Defer),
        KeyCode::Char('e') => state.export(ExportFormat::Json),
        KeyCode::Char('E') => state.export(ExportFormat::Csv),
        KeyCode::Char('X') => state.abort_job(),

        // General
        KeyCode::Tab => state.focus = state.focus.toggle(),
        KeyCode::Char('t') => state.cycle_theme(),
        KeyCode::Char('D') => state.toggle_debug(),
        KeyCode::Char('?') => {
            state.help_scroll = 0;
            state.mode = Mode::HelpOverlay;
        }
        KeyCode::Char('q') | KeyCode::Esc => {
            if state.request_quit() {
                return KeyAction::Quit;
            }
        }
        _ => {}
    }
    KeyAction::Continue
}

/// Cursor, scroll and page keys. `None` when `key` is not one of them.
fn handle_motion_key(key: KeyEvent, state: &mut AppState) -> Option<KeyAction> {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    let half = usize::from(state.detail_viewport_height / 2).max(1);

    match key.code {
        KeyCode::Char('j') | KeyCode::Down => state.move_down(1),
        KeyCode::Char('k') | KeyCode::Up => state.move_up(1),
        KeyCode::Char('g') | KeyCode::Home => state.move_top(),
        KeyCode::Char('G') | KeyCode::End => state.move_bottom(),
        KeyCode::Char('d') if ctrl => state.move_down(half),
        KeyCode::Char('u') if ctrl => state.move_up(half),
        KeyCode::Char('n') | KeyCode::PageDown => state.next_page(),
        KeyCode::Char('p') | KeyCode::PageUp => state.prev_page(),
        _ => return None,
    }
    Some(KeyAction::Continue)
}

// ---------------------------------------------------------------------------
// Search mode
// ---------------------------------------------------------------------------

fn handle_search(key: KeyEvent, state: &mut AppState) -> KeyAction {
    match key.code {
        KeyCode::Enter => state.end_search(true),
        KeyCode::Esc => state.end_search(false),
        KeyCode::Backspace => state.search_pop(),
        KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
            state.search_push(c);
        }
        _ => {}
    }
    KeyAction::Continue
}

// ---------------------------------------------------------------------------
// HelpOverlay mode
// ---------------------------------------------------------------------------

fn handle_help(key: KeyEvent, state: &mut AppState) -> KeyAction {
    match key.code {
        KeyCode::Char('j') | KeyCode::Down => {
            state.help_scroll = state.help_scroll.saturating_add(1);
        }
        KeyCode::Char('k') | KeyCode::Up => {
            state.help_scroll = state.help_scroll.saturating_sub(1);
        }
        KeyCode::Char('?') | KeyCode::Esc | KeyCode::Char('q') => state.mode = Mode::Normal,
        _ => {}
    }
    KeyAction::Continue
}

// ---------------------------------------------------------------------------
// ConfirmQuit mode
// ---------------------------------------------------------------------------

/// `y` quits (cancelling the running job), `n`/`Esc` returns to Normal.
fn handle_confirm_quit(key: KeyEvent, state: &mut AppState) -> KeyAction {
    match key.code {
        KeyCode::Char('y') | KeyCode::Char('Y') => {
            state.abort_job();
            KeyAction::Quit
        }
        KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
            state.mode = Mode::Normal;
            KeyAction::Continue
        }
        _ => KeyAction::Continue,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::tests::sample_app;
    use docreview_core::Severity;

    fn press(state: &mut AppState, code: KeyCode) -> KeyAction {
        handle_key(KeyEvent::new(code, KeyModifiers::NONE), state)
    }

    #[test]
    fn space_selects_and_advances() {
        let mut app = sample_app();
        press(&mut app, KeyCode::Char(' '));
        assert_eq!(app.session.selection_count(), 1);
        assert_eq!(app.cursor(), 1);
        press(&mut app, KeyCode::Char('A'));
        assert_eq!(app.session.selection_count(), 0);
    }

    #[test]
    fn number_keys_toggle_severities() {
        let mut app = sample_app();
        press(&mut app, KeyCode::Char('1'));
        assert!(!app.session.criteria().severities.contains(&Severity::Critical));
        press(&mut app, KeyCode::Char('1'));
        assert!(app.session.criteria().severities.contains(&Severity::Critical));
    }

    #[test]
    fn search_mode_captures_letters() {
        let mut app = sample_app();
        press(&mut app, KeyCode::Char('/'));
        assert_eq!(app.mode, Mode::Search);
        // 'q' is text here, not quit.
        assert_eq!(press(&mut app, KeyCode::Char('q')), KeyAction::Continue);
        assert_eq!(app.session.criteria().search_text, "q");
        press(&mut app, KeyCode::Backspace);
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.mode, Mode::Normal);
        assert_eq!(press(&mut app, KeyCode::Char('q')), KeyAction::Quit);
    }

    #[test]
    fn quit_with_running_job_asks_first() {
        let mut app = sample_app();
        app.session.flags.job_active = true;
        assert_eq!(press(&mut app, KeyCode::Char('q')), KeyAction::Continue);
        assert_eq!(app.mode, Mode::ConfirmQuit);
        assert_eq!(press(&mut app, KeyCode::Char('n')), KeyAction::Continue);
        assert_eq!(app.mode, Mode::Normal);
        press(&mut app, KeyCode::Char('q'));
        assert_eq!(press(&mut app, KeyCode::Char('y')), KeyAction::Quit);
    }

    #[test]
    fn adjudication_keys_record_decisions() {
        let mut app = sample_app();
        let first = app.current_issue().map(|e| e.key.clone()).unwrap();
        press(&mut app, KeyCode::Char('r'));
        assert_eq!(app.session.adjudication(&first), Some(Adjudication::Reject));
    }
}
