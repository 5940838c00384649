//! Detail overlay rendering.
//!
//! Displays a modal overlay with the fetch diagnostics of the selected
//! widget: phase, breaker, rate limiter and last query.

use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table},
    Frame,
};

use nodewatch_sdk::{FetchPhase, Query};

use crate::app::{App, Widget};
use crate::ui::common::centered;

/// Minimum width required for the detail overlay to render properly.
const MIN_OVERLAY_WIDTH: u16 = 50;
/// Minimum height required for the detail overlay to render properly.
const MIN_OVERLAY_HEIGHT: u16 = 16;

/// Render the widget detail as a modal overlay.
pub fn render_overlay(frame: &mut Frame, app: &App, area: Rect) {
    if area.width < MIN_OVERLAY_WIDTH || area.height < MIN_OVERLAY_HEIGHT {
        return;
    }
    let Some(widget) = app.selected_widget() else {
        return;
    };

    let overlay_area = centered(area, 72, 18);
    frame.render_widget(Clear, overlay_area);

    let block = Block::default()
        .title(format!(" {} ", widget.title()))
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.highlight));
    let inner = block.inner(overlay_area);
    frame.render_widget(block, overlay_area);

    let chunks = Layout::vertical([
        Constraint::Length(2), // Health line
        Constraint::Min(6),    // Diagnostics table
        Constraint::Length(1), // Footer
    ])
    .split(inner);

    let health = widget.health();
    let header = Line::from(vec![
        Span::raw(" Health: "),
        Span::styled(health.label(), app.theme.status_style(health)),
        Span::raw(format!("   Phase: {}", phase_label(widget.binding.controller().phase()))),
    ]);
    frame.render_widget(Paragraph::new(header), chunks[0]);

    let rows: Vec<Row> = diagnostics(app, widget)
        .into_iter()
        .map(|(key, value)| {
            Row::new(vec![
                Cell::from(key).style(Style::default().add_modifier(Modifier::BOLD)),
                Cell::from(value),
            ])
        })
        .collect();
    let table = Table::new(rows, [Constraint::Length(16), Constraint::Min(20)])
        .header(Row::new(vec!["Field", "Value"]).style(app.theme.header));
    frame.render_widget(table, chunks[1]);

    let footer = Paragraph::new(" ↑/↓:switch widget  Esc:close")
        .style(Style::default().add_modifier(Modifier::DIM));
    frame.render_widget(footer, chunks[2]);
}

fn phase_label(phase: FetchPhase) -> &'static str {
    match phase {
        FetchPhase::Idle => "idle",
        FetchPhase::Fetching => "fetching",
        FetchPhase::Success => "success",
        FetchPhase::Failed { tripped: false } => "failed",
        FetchPhase::Failed { tripped: true } => "failed (circuit open)",
    }
}

/// Key/value rows describing a widget's fetch state.
pub fn diagnostics(app: &App, widget: &Widget) -> Vec<(&'static str, String)> {
    let binding = &widget.binding;
    let circuit = binding.controller().circuit();
    let state = binding.snapshot();

    let mut rows = vec![
        ("Kind", binding.kind().to_string()),
        ("Node", widget.config.node_id.clone()),
        ("Variable", binding.variable().to_string()),
        ("Query", describe_query(&binding.query())),
        (
            "Failures",
            format!("{} / {}", circuit.consecutive_failures, circuit.max_failures),
        ),
        (
            "Circuit",
            if circuit.is_tripped() { "open" } else { "closed" }.to_string(),
        ),
    ];

    match app.client().limiter().entry(&widget.config.node_id) {
        Some(entry) => {
            rows.push(("Min interval", format!("{:?}", entry.min_interval)));
            rows.push((
                "Last call",
                entry
                    .last_call
                    .map(|t| format!("{:.1}s ago", t.elapsed().as_secs_f64()))
                    .unwrap_or_else(|| "never".to_string()),
            ));
        }
        None => rows.push(("Min interval", "no calls yet".to_string())),
    }

    rows.push(("Error", state.error.unwrap_or_else(|| "-".to_string())));
    rows
}

fn describe_query(query: &Query) -> String {
    match query {
        Query::Latest(variable) => format!("latest {}", variable),
        Query::Range(request) => format!(
            "{} from {} to {} limit {}",
            request.variable,
            request.from.map(|t| t.to_string()).unwrap_or_else(|| "-".into()),
            request.to.map(|t| t.to_string()).unwrap_or_else(|| "-".into()),
            request.limit.map(|l| l.to_string()).unwrap_or_else(|| "-".into()),
        ),
    }
}
