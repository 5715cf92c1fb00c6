//! Two-panel layout and status bar.
//!
//! At `>= 100` columns the issue list and the detail panel sit side by side;
//! narrower terminals stack them vertically. A 1-row status bar is always at
//! the bottom.

use ratatui::{
    Frame,
    layout::{Constraint, Layout, Margin, Rect, Spacing},
    style::{Modifier, Style},
    symbols::merge::MergeStrategy,
    text::{Line, Span},
    widgets::{Block, BorderType, Paragraph},
};

use docreview_core::job::format_elapsed;
use docreview_core::{Severity, ValidationFilter};

use crate::app::{AppState, Mode};
use crate::theme::Theme;

const SIDE_BY_SIDE_MIN_WIDTH: u16 = 100;

/// Returns `[issue_list, detail, status_bar]` for the current frame.
pub fn compute_layout(frame: &Frame) -> [Rect; 3] {
    let [main_area, status_bar] =
        frame.area().layout(&Layout::vertical([Constraint::Fill(1), Constraint::Length(1)]));

    let split = if frame.area().width >= SIDE_BY_SIDE_MIN_WIDTH {
        Layout::horizontal([Constraint::Percentage(55), Constraint::Percentage(45)])
    } else {
        Layout::vertical([Constraint::Percentage(60), Constraint::Percentage(40)])
    };
    let split = split.spacing(Spacing::Overlap(1));

    let [list, detail] = main_area.layout(&split);
    [list, detail, status_bar]
}

/// Panel area minus the 1-cell border.
pub fn inner_rect(area: Rect) -> Rect {
    area.inner(Margin { vertical: 1, horizontal: 1 })
}

/// Bordered panel block; thick border when focused.
pub fn panel_block<'a>(title: String, is_focused: bool, theme: &Theme) -> Block<'a> {
    let border_style = if is_focused {
        Style::default().fg(theme.border_active)
    } else {
        Style::default().fg(theme.border_inactive)
    };
    let border_type = if is_focused { BorderType::Thick } else { BorderType::Plain };

    Block::bordered()
        .title(title)
        .border_type(border_type)
        .border_style(border_style)
        .merge_borders(MergeStrategy::Fuzzy)
}

/// Compact summary of the active filters, e.g. `sev:CH··· validated`.
fn filter_summary(state: &AppState) -> String {
    let criteria = state.session.criteria();
    if let Some(chart) = &criteria.chart_filter {
        return format!("chart {chart}");
    }
    let mut parts = Vec::new();
    if criteria.severities.len() != Severity::ALL.len() {
        let sevs: String = Severity::ALL
            .iter()
            .map(|s| {
                let initial = s.label().chars().next().unwrap_or('?');
                if criteria.severities.contains(s) { initial } else { '·' }
            })
            .collect();
        parts.push(format!("sev:{sevs}"));
    }
    if !criteria.categories.is_empty() {
        parts.push(format!("cat:{}", criteria.categories.len()));
    }
    match criteria.validation_filter {
        Some(ValidationFilter::Validated) => parts.push("validated".to_owned()),
        Some(ValidationFilter::Unvalidated) => parts.push("unvalidated".to_owned()),
        None => {}
    }
    if !criteria.search_text.is_empty() && state.mode != Mode::Search {
        parts.push(format!("/{}", criteria.search_text));
    }
    if parts.is_empty() { "all".to_owned() } else { parts.join(" ") }
}

/// Renders the status bar: mode, filters, selection, page, job progress and
/// the latest notice.
pub fn render_status_bar(frame: &mut Frame, area: Rect, state: &AppState, theme: &Theme) {
    let (mode_text, mode_fg) = match state.mode {
        Mode::Search => (" SEARCH ", theme.status_mode_search),
        Mode::Normal | Mode::HelpOverlay | Mode::ConfirmQuit => {
            (" NORMAL ", theme.status_mode_normal)
        }
    };
    let bold = Style::default().add_modifier(Modifier::BOLD);
    let mut spans = vec![Span::styled(mode_text, bold.fg(mode_fg))];

    if state.mode == Mode::Search {
        spans.push(Span::raw(format!(" /{}▏", state.session.criteria().search_text)));
    } else {
        spans.push(Span::raw(format!(
            " {} │ {} selected │ page {}/{} ",
            filter_summary(state),
            state.session.selection_count(),
            state.session.current_page() + 1,
            state.session.page_count(),
        )));
    }

    if let Some(job) = &state.job {
        let mut text = format!(
            "│ {} {:>3.0}% {}",
            job.phase,
            job.overall_progress * 100.0,
            format_elapsed(job.elapsed)
        );
        if !job.eta.is_empty() {
            text.push(' ');
            text.push_str(&job.eta);
        }
        spans.push(Span::raw(text));
    } else if state.session.flags.loading {
        spans.push(Span::raw("│ loading… "));
    }

    if state.mode == Mode::ConfirmQuit {
        spans.push(Span::styled(" │ Job still running. Quit? (y/n)", bold.fg(theme.status_error)));
    } else if let Some(notice) = &state.notice {
        let fg = if notice.is_error { theme.status_error } else { theme.status_bar_fg };
        spans.push(Span::styled(format!(" │ {}", notice.text), Style::default().fg(fg)));
    }
    if state.is_debug() {
        spans.push(Span::styled(" [debug]", Style::default().fg(theme.muted)));
    }

    frame.render_widget(
        Paragraph::new(Line::from(spans))
            .style(Style::default().bg(theme.status_bar_bg).fg(theme.status_bar_fg)),
        area,
    );
}
