//! UI rendering. [`render`] is the single entry point called from
//! `terminal.draw()`.

mod layout;
pub mod help;
pub mod issue_detail;
pub mod issue_list;
pub mod keybindings;

use ratatui::Frame;

use crate::app::{AppState, Mode};
use layout::{compute_layout, inner_rect, render_status_bar};

/// Renders one frame: issue list, detail panel, status bar and, on top, the
/// help overlay when open.
///
/// The detail viewport height is cached in `state` for page-sized scrolling
/// on the next keypress.
pub fn render(frame: &mut Frame, state: &mut AppState) {
    let theme = state.theme.clone();
    let [list, detail, status_bar] = compute_layout(frame);
    state.detail_viewport_height = inner_rect(detail).height;

    issue_list::render_issue_list(frame, list, state, &theme);
    issue_detail::render_issue_detail(frame, detail, state, &theme);
    render_status_bar(frame, status_bar, state, &theme);

    if state.mode == Mode::HelpOverlay {
        help::render_help_overlay(frame, &theme, state.help_scroll);
    }
}
