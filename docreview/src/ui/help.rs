//! Help overlay: a centred modal over the panels, drawn in the same frame.

use ratatui::{
    Frame,
    layout::Constraint,
    text::{Line, Text},
    widgets::{Block, Clear, Paragraph, Wrap},
};

use crate::theme::Theme;

/// Draws the overlay. Skipped below 60 columns, where the modal would have
/// no usable area.
pub fn render_help_overlay(frame: &mut Frame, theme: &Theme, help_scroll: u16) {
    if frame.area().width < 60 {
        return;
    }

    let overlay_area = frame
        .area()
        .centered(Constraint::Percentage(80), Constraint::Percentage(80));
    frame.render_widget(Clear, overlay_area);

    let block = Block::bordered()
        .title(" Help · j/k scroll, ? or Esc to close ")
        .border_style(ratatui::style::Style::default().fg(theme.border_active));

    frame.render_widget(
        Paragraph::new(help_text())
            .block(block)
            .wrap(Wrap { trim: false })
            .scroll((help_scroll, 0)),
        overlay_area,
    );
}

fn help_text() -> Text<'static> {
    Text::from(vec![
        Line::from("Navigation"),
        Line::from("  j / k         Next / previous issue (scroll in detail panel)"),
        Line::from("  g / G         First / last issue on the page"),
        Line::from("  n / p         Next / previous page"),
        Line::from("  Tab           Switch between list and detail"),
        Line::from(""),
        Line::from("Selection"),
        Line::from("  Space         Toggle the issue under the cursor"),
        Line::from("  a / A         Select all visible / clear selection"),
        Line::from(""),
        Line::from("Filters"),
        Line::from("  1-5           Toggle Critical, High, Medium, Low, Info"),
        Line::from("  c / C         Show only this severity / category"),
        Line::from("  x             Clear the severity/category focus"),
        Line::from("  v             Cycle validation filter"),
        Line::from("  /             Search (Enter keeps, Esc clears)"),
        Line::from("  s             Cycle sort: source, severity, category"),
        Line::from(""),
        Line::from("Review"),
        Line::from("  y / r / f     Confirm / reject / defer the issue"),
        Line::from("  e / E         Export selection (or visible issues) as JSON / CSV"),
        Line::from("  X             Cancel the running analysis job"),
        Line::from(""),
        Line::from("General"),
        Line::from("  t             Cycle color theme"),
        Line::from("  D             Toggle debug logging"),
        Line::from("  ?             Open / close this help"),
        Line::from("  q / Esc       Quit"),
    ])
}
