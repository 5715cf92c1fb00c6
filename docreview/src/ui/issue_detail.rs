//! Detail panel for the issue under the cursor.

use docreview_core::types::IssueEntry;
use ratatui::{
    Frame,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Paragraph, Wrap},
};

use crate::app::{AppState, PanelFocus};
use crate::theme::Theme;
use crate::ui::layout::{inner_rect, panel_block};

const MARK_OPEN: &str = "<mark>";
const MARK_CLOSE: &str = "</mark>";

/// Splits `context` on inline `<mark>…</mark>` markers into `(text, marked)`
/// segments. `None` when the context carries no markers. An unclosed marker
/// runs to the end of the text.
fn marked_segments(context: &str) -> Option<Vec<(&str, bool)>> {
    if !context.contains(MARK_OPEN) {
        return None;
    }
    let mut segments = Vec::new();
    let mut rest = context;
    while let Some(start) = rest.find(MARK_OPEN) {
        segments.push((&rest[..start], false));
        let after = &rest[start + MARK_OPEN.len()..];
        let (inner, tail) = match after.find(MARK_CLOSE) {
            Some(end) => (&after[..end], &after[end + MARK_CLOSE.len()..]),
            None => (after, ""),
        };
        segments.push((inner, true));
        rest = tail;
    }
    segments.push((rest, false));
    segments.retain(|(text, _)| !text.is_empty());
    Some(segments)
}

/// Renders `context` with its highlighted part in the flagged colour.
///
/// Inline markers win; without them the first occurrence of `flagged` is
/// highlighted.
fn highlight_context<'a>(context: &'a str, flagged: Option<&str>, theme: &Theme) -> Line<'a> {
    let muted = Style::default().fg(theme.muted);
    let hit = Style::default().fg(theme.flagged).add_modifier(Modifier::BOLD);

    if let Some(segments) = marked_segments(context) {
        return Line::from(
            segments
                .into_iter()
                .map(|(text, marked)| Span::styled(text, if marked { hit } else { muted }))
                .collect::<Vec<_>>(),
        );
    }

    let Some(flagged) = flagged.filter(|f| !f.is_empty()) else {
        return Line::styled(context, muted);
    };
    match context.find(flagged) {
        Some(start) => {
            let end = start + flagged.len();
            Line::from(vec![
                Span::styled(&context[..start], muted),
                Span::styled(&context[start..end], hit),
                Span::styled(&context[end..], muted),
            ])
        }
        None => Line::styled(context, muted),
    }
}

fn detail_text<'a>(entry: &'a IssueEntry, state: &AppState, theme: &Theme) -> Text<'a> {
    let issue = &entry.issue;
    let label = Style::default().add_modifier(Modifier::BOLD);
    let mut lines = vec![
        Line::from(vec![
            Span::styled(
                issue.severity.label(),
                Style::default().fg(theme.badge(issue.severity)).add_modifier(Modifier::BOLD),
            ),
            Span::raw(" · "),
            Span::raw(issue.category.as_str()),
            Span::styled(format!("  #{}", entry.key), Style::default().fg(theme.muted)),
        ]),
        Line::default(),
        Line::from(issue.message.as_str()),
    ];

    if let Some(flagged) = &issue.flagged_text {
        lines.push(Line::default());
        lines.push(Line::from(vec![
            Span::styled("Flagged: ", label),
            Span::styled(flagged.as_str(), Style::default().fg(theme.flagged)),
        ]));
    }
    if let Some(context) = &issue.context {
        lines.push(Line::default());
        lines.push(Line::styled("Context", label));
        lines.push(highlight_context(context, issue.flagged_text.as_deref(), theme));
    }
    if let Some(suggestion) = &issue.suggestion {
        lines.push(Line::default());
        lines.push(Line::from(vec![
            Span::styled("Suggestion: ", label),
            Span::styled(suggestion.as_str(), Style::default().fg(theme.suggestion)),
        ]));
    }
    if let Some(source) = &issue.source {
        lines.push(Line::default());
        let validated = if source.is_validated { "validated" } else { "not validated" };
        let para = source
            .paragraph_index
            .map(|p| format!(" · paragraph {}", p + 1))
            .unwrap_or_default();
        lines.push(Line::styled(format!("Source: {validated}{para}"), Style::default().fg(theme.muted)));
    }

    if let Some(decision) = state.session.adjudication(&entry.key) {
        lines.push(Line::default());
        lines.push(Line::from(vec![
            Span::styled("Decision: ", label),
            Span::raw(decision.label()),
        ]));
    }
    if let Some(family) = state
        .session
        .families()
        .iter()
        .find(|f| f.members.contains(&entry.key))
    {
        lines.push(Line::styled(
            format!("{} similar issues flag \"{}\"", family.members.len() - 1, family.flagged_text),
            Style::default().fg(theme.muted),
        ));
    }
    Text::from(lines)
}

pub fn render_issue_detail(frame: &mut Frame, area: Rect, state: &AppState, theme: &Theme) {
    let block = panel_block(" Detail ".to_owned(), state.focus == PanelFocus::Detail, theme);
    let inner = inner_rect(area);
    frame.render_widget(block, area);

    let text = match state.current_issue() {
        Some(entry) => detail_text(entry, state, theme),
        None => Text::styled("Nothing selected", Style::default().fg(theme.muted)),
    };
    frame.render_widget(
        Paragraph::new(text)
            .wrap(Wrap { trim: false })
            .scroll((state.detail_scroll, 0)),
        inner,
    );
}
