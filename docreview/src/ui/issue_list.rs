//! Issue list panel: the current page of the filtered, sorted issues.

use docreview_core::state::SortKey;
use docreview_core::types::{Adjudication, IssueEntry};
use docreview_core::Severity;
use ratatui::{
    Frame,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{List, ListItem},
};

use crate::app::{AppState, PanelFocus};
use crate::theme::Theme;
use crate::ui::layout::panel_block;

fn severity_tag(severity: Severity) -> &'static str {
    match severity {
        Severity::Critical => "CRIT",
        Severity::High => "HIGH",
        Severity::Medium => "MED ",
        Severity::Low => "LOW ",
        Severity::Info => "INFO",
    }
}

fn decision_mark(decision: Option<Adjudication>) -> &'static str {
    match decision {
        Some(Adjudication::Confirm) => " ✓",
        Some(Adjudication::Reject) => " ✗",
        Some(Adjudication::Defer) => " …",
        None => "",
    }
}

fn issue_item(
    entry: &IssueEntry,
    selected: bool,
    decision: Option<Adjudication>,
    theme: &Theme,
) -> ListItem<'static> {
    let issue = &entry.issue;
    let check = if selected { "[x] " } else { "[ ] " };
    ListItem::new(Line::from(vec![
        Span::styled(check, Style::default().fg(theme.selected)),
        Span::styled(
            severity_tag(issue.severity),
            Style::default().fg(theme.badge(issue.severity)).add_modifier(Modifier::BOLD),
        ),
        Span::styled(format!(" {:<14.14} ", issue.category), Style::default().fg(theme.muted)),
        Span::raw(issue.message.clone()),
        Span::styled(decision_mark(decision), Style::default().fg(theme.suggestion)),
    ]))
}

fn title(state: &AppState) -> String {
    let session = &state.session;
    let sort = session.sort();
    let sort_label = match sort.key {
        SortKey::Position => "",
        SortKey::Severity if sort.descending => " ↓sev",
        SortKey::Severity => " ↑sev",
        SortKey::Category if sort.descending => " ↓cat",
        SortKey::Category => " ↑cat",
    };
    match session.document_name() {
        Some(name) => format!(
            " {name} · Issues ({}/{}){sort_label} ",
            session.filtered_len(),
            session.issues().len()
        ),
        None => format!(" Issues ({}/{}){sort_label} ", session.filtered_len(), session.issues().len()),
    }
}

/// Renders the issue list with the cursor highlight from `state.list_state`.
pub fn render_issue_list(frame: &mut Frame, area: Rect, state: &mut AppState, theme: &Theme) {
    let block = panel_block(title(state), state.focus == PanelFocus::IssueList, theme);
    let session = &state.session;

    let items: Vec<ListItem> = {
        let page = session.current_page_items();
        if page.is_empty() {
            let msg = if session.flags.loading {
                "Waiting for review results…"
            } else if session.issues().is_empty() {
                "No issues"
            } else {
                "No issues match the current filters"
            };
            vec![ListItem::new(Line::styled(msg, Style::default().fg(theme.muted)))]
        } else {
            page.iter()
                .map(|e| issue_item(e, session.is_selected(&e.key), session.adjudication(&e.key), theme))
                .collect()
        }
    };

    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default().fg(theme.border_active).add_modifier(Modifier::REVERSED));
    frame.render_stateful_widget(list, area, &mut state.list_state);
}
