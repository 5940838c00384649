//! Common UI components shared across views.
//!
//! This module contains the header bar, status bar, and help overlay.

use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use crate::app::{App, WidgetHealth};

/// Render the header bar with a health overview of all widgets.
pub fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let counts = app.health_counts();

    let overall = if counts.tripped > 0 {
        WidgetHealth::Tripped
    } else if counts.failing > 0 {
        WidgetHealth::Failing
    } else if counts.pending > 0 && counts.healthy == 0 {
        WidgetHealth::Pending
    } else {
        WidgetHealth::Healthy
    };

    let count_span = |n: usize, health: WidgetHealth| {
        if n > 0 {
            Span::styled(n.to_string(), app.theme.status_style(health))
        } else {
            Span::styled("0", Style::default().add_modifier(Modifier::DIM))
        }
    };

    let line = Line::from(vec![
        Span::styled(" ● ", app.theme.status_style(overall)),
        Span::styled("NODEWATCH ", Style::default().add_modifier(Modifier::BOLD)),
        Span::raw("│ "),
        count_span(counts.healthy, WidgetHealth::Healthy),
        Span::raw(" ok "),
        count_span(counts.failing, WidgetHealth::Failing),
        Span::raw(" failing "),
        count_span(counts.tripped, WidgetHealth::Tripped),
        Span::raw(" tripped │ "),
        Span::styled(
            app.widgets.len().to_string(),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::raw(" widgets │ "),
        Span::raw(app.source_description().to_string()),
    ]);

    frame.render_widget(Paragraph::new(line), area);
}

/// Render the status bar at the bottom.
///
/// Shows time since the last refresh and the available controls, or a
/// temporary status message.
pub fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    if let Some(msg) = app.get_status_message() {
        let paragraph =
            Paragraph::new(format!(" {} ", msg)).style(Style::default().fg(app.theme.highlight));
        frame.render_widget(paragraph, area);
        return;
    }

    let selected = app
        .selected_widget()
        .map(|w| w.title())
        .unwrap_or_default();
    let status = format!(
        " {} | Refreshed {:.1}s ago | Tab:select Enter:detail r:refresh R:remount ?:help q:quit",
        selected,
        app.last_refresh.elapsed().as_secs_f64(),
    );

    let paragraph = Paragraph::new(status).style(Style::default().add_modifier(Modifier::DIM));
    frame.render_widget(paragraph, area);
}

/// Render the help overlay with keyboard shortcuts.
///
/// Displayed as a centered modal on top of the dashboard.
pub fn render_help(frame: &mut Frame, app: &App, area: Rect) {
    let help_text = vec![
        Line::from(vec![Span::styled("Keyboard Shortcuts", app.theme.header)]),
        Line::from(""),
        Line::from(vec![Span::styled(
            " Navigation",
            Style::default().add_modifier(Modifier::BOLD),
        )]),
        Line::from("  Tab ↑/↓ j/k  Select widget"),
        Line::from("  Enter        Widget detail"),
        Line::from("  Esc          Close detail"),
        Line::from(""),
        Line::from(vec![Span::styled(
            " General",
            Style::default().add_modifier(Modifier::BOLD),
        )]),
        Line::from("  r            Refresh now"),
        Line::from("  R            Remount (reset breakers)"),
        Line::from("  e            Export to JSON"),
        Line::from("  q            Quit"),
        Line::from(""),
        Line::from(vec![Span::styled(
            "Press any key to close",
            Style::default().add_modifier(Modifier::DIM),
        )]),
    ];

    let block = Block::default()
        .title(" Help ")
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.highlight));

    let paragraph = Paragraph::new(help_text).block(block);

    let help_area = centered(area, 42, 18);
    frame.render_widget(Clear, help_area);
    frame.render_widget(paragraph, help_area);
}

/// A `width` x `height` rectangle centered in `area`, shrunk to fit.
pub(crate) fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width.saturating_sub(4));
    let height = height.min(area.height.saturating_sub(2));
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width, height)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_centered_fits_small_area() {
        let area = Rect::new(0, 0, 30, 10);
        let rect = centered(area, 42, 18);
        assert_eq!(rect.width, 26);
        assert_eq!(rect.height, 8);
        assert_eq!((rect.x, rect.y), (2, 1));
    }
}
