//! UI rendering for the dashboard.
//!
//! Every widget shares one frame: a bordered block whose body is a loading
//! spinner, an error panel, the `--` placeholder or the kind-specific view
//! of the current value.

pub mod chart;
pub mod common;
pub mod detail;
pub mod gauge;
pub mod readout;
mod theme;

pub use theme::Theme;

use ratatui::{
    layout::{Alignment, Constraint, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Paragraph, Wrap},
    Frame,
};

use crate::app::{App, Widget, WidgetHealth};
use crate::style::{StyleOverrides, WidgetStyles};

use self::chart::ChartProps;
use self::gauge::GaugeProps;
use self::readout::ReadoutProps;

/// Text shown when there is nothing to display.
pub const PLACEHOLDER: &str = "--";

const SPINNER: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// Kind-specific presentation props of a widget.
#[derive(Debug, Clone)]
pub enum Presentation {
    Readout(ReadoutProps),
    Chart(ChartProps),
    Gauge(GaugeProps),
}

/// Render all widgets in a grid of up to two columns.
pub fn render_dashboard(frame: &mut Frame, app: &App, area: Rect) {
    if app.widgets.is_empty() {
        let paragraph = Paragraph::new("No widgets configured")
            .alignment(Alignment::Center)
            .style(Style::default().fg(app.theme.muted));
        frame.render_widget(paragraph, centered_rows(area, 1));
        return;
    }

    let columns = if app.widgets.len() > 1 { 2 } else { 1 };
    let rows = app.widgets.len().div_ceil(columns);

    let row_areas = Layout::vertical(vec![Constraint::Ratio(1, rows as u32); rows]).split(area);
    for (row, row_area) in row_areas.iter().enumerate() {
        let cells =
            Layout::horizontal(vec![Constraint::Ratio(1, columns as u32); columns]).split(*row_area);
        for (column, cell) in cells.iter().enumerate() {
            let index = row * columns + column;
            if let Some(widget) = app.widgets.get(index) {
                render_widget(frame, *cell, widget, index == app.selected, &app.theme, app.tick);
            }
        }
    }
}

/// Render one widget from its current state.
pub fn render_widget(
    frame: &mut Frame,
    area: Rect,
    widget: &Widget,
    selected: bool,
    theme: &Theme,
    tick: u64,
) {
    let state = widget.binding.snapshot();
    let base = theme.widget_styles(selected);
    let overrides = widget
        .style_fn
        .as_ref()
        .map(|f| f(&state))
        .unwrap_or_default();
    let styles = base.merged(&overrides);

    let block = Block::bordered()
        .border_type(theme.border_type)
        .border_style(styles.border)
        .title(Span::styled(format!(" {} ", widget.title()), styles.title));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    if state.loading {
        render_loading(frame, inner, theme, tick);
        return;
    }
    if let Some(ref message) = state.error {
        render_error(frame, inner, message, theme);
        return;
    }

    match &widget.presentation {
        Presentation::Readout(props) => match state.scalar() {
            Some(value) => readout::render(frame, inner, props, value, &base, &overrides),
            None => render_placeholder(frame, inner, theme),
        },
        Presentation::Gauge(props) => {
            gauge::render(frame, inner, props, state.scalar(), &styles, theme)
        }
        Presentation::Chart(props) => {
            if state.series().is_empty() {
                render_placeholder(frame, inner, theme);
            } else {
                let line = chart_line(&base, props, &overrides, theme);
                chart::render(frame, inner, props, state.series(), line, theme);
            }
        }
    }
}

/// Styles of a widget for `state`: base, then kind-specific value style,
/// then the callback's overrides.
pub fn layered_styles(
    base: &WidgetStyles,
    value: Style,
    overrides: &StyleOverrides,
) -> WidgetStyles {
    WidgetStyles {
        value: base.value.patch(value),
        ..*base
    }
    .merged(overrides)
}

/// Chart line style: the configured color, then the callback's value style.
fn chart_line(
    base: &WidgetStyles,
    props: &ChartProps,
    overrides: &StyleOverrides,
    theme: &Theme,
) -> Style {
    layered_styles(base, chart::line_style(props, theme), overrides).value
}

fn render_loading(frame: &mut Frame, area: Rect, theme: &Theme, tick: u64) {
    let spinner = SPINNER[(tick as usize) % SPINNER.len()];
    let paragraph = Paragraph::new(format!("{} Loading...", spinner))
        .alignment(Alignment::Center)
        .style(Style::default().fg(theme.highlight));
    frame.render_widget(paragraph, centered_rows(area, 1));
}

fn render_error(frame: &mut Frame, area: Rect, message: &str, theme: &Theme) {
    let lines = vec![
        Line::from(Span::styled("Error", theme.status_style(WidgetHealth::Tripped))),
        Line::from(Span::styled(message.to_string(), Style::default().fg(theme.warning))),
    ];
    let paragraph = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });
    frame.render_widget(paragraph, centered_rows(area, 2));
}

fn render_placeholder(frame: &mut Frame, area: Rect, theme: &Theme) {
    let paragraph = Paragraph::new(PLACEHOLDER)
        .alignment(Alignment::Center)
        .style(Style::default().fg(theme.muted));
    frame.render_widget(paragraph, centered_rows(area, 1));
}

/// The `height` rows in the vertical middle of `area`.
pub(crate) fn centered_rows(area: Rect, height: u16) -> Rect {
    let height = height.min(area.height);
    let y = area.y + (area.height - height) / 2;
    Rect::new(area.x, y, area.width, height)
}

#[cfg(test)]
pub(crate) fn buffer_text(buffer: &ratatui::buffer::Buffer) -> String {
    let area = buffer.area;
    let mut text = String::new();
    for y in area.top()..area.bottom() {
        for x in area.left()..area.right() {
            text.push_str(buffer[(x, y)].symbol());
        }
        text.push('\n');
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    use nodewatch_sdk::{WidgetBinding, WidgetKind};
    use ratatui::{backend::TestBackend, Terminal};

    use crate::config::{KindConfig, WidgetConfig};

    fn draw(widget: &Widget) -> String {
        let mut terminal = Terminal::new(TestBackend::new(40, 8)).unwrap();
        terminal
            .draw(|frame| render_widget(frame, frame.area(), widget, false, &Theme::dark(), 0))
            .unwrap();
        buffer_text(terminal.backend().buffer())
    }

    #[test]
    fn test_idle_shows_placeholder_and_title() {
        let config = WidgetConfig {
            kind: KindConfig::Readout,
            title: Some("Temperature".into()),
            ..WidgetConfig::default()
        };
        let widget = Widget::new(config, WidgetBinding::new(WidgetKind::Readout, "t"));

        let text = draw(&widget);
        assert!(text.contains("Temperature"));
        assert!(text.contains(PLACEHOLDER));
    }

    #[test]
    fn test_loaded_readout_and_error_panel() {
        use std::time::Duration;

        use nodewatch_adapters::sim::SimulatedBackend;
        use nodewatch_sdk::Client;

        let client = Client::builder()
            .backend(SimulatedBackend::builder().empty_variable("co2").build())
            .rate_limit(Duration::ZERO)
            .build()
            .unwrap();

        let config = WidgetConfig {
            kind: KindConfig::Readout,
            node_id: "n1".into(),
            variable: "temperature".into(),
            unit: Some("°C".into()),
            number_format: Some("0.00".into()),
            ..WidgetConfig::default()
        };
        let mut binding = WidgetBinding::new(WidgetKind::Readout, "t");
        binding.set_variable(&config.variable);
        let task = binding.set_source(Some(client.clone()), &config.node_id).unwrap();
        tokio_test::block_on(task.run());

        let value = binding.snapshot().scalar().unwrap();
        let widget = Widget::new(config, binding);
        assert!(draw(&widget).contains(&format!("{:.2} °C", value)));

        let mut empty = WidgetBinding::new(WidgetKind::Readout, "co2");
        empty.set_variable("co2");
        tokio_test::block_on(empty.set_source(Some(client), "n1").unwrap().run());
        let widget = Widget::new(WidgetConfig::default(), empty);
        assert!(draw(&widget).contains(nodewatch_sdk::NO_DATA_MESSAGE));
    }

    #[test]
    fn test_chart_line_takes_value_override() {
        use ratatui::style::Color;

        let theme = Theme::dark();
        let base = theme.widget_styles(false);
        let props = ChartProps {
            color: Some(Color::Cyan),
            ..ChartProps::default()
        };

        let plain = chart_line(&base, &props, &StyleOverrides::default(), &theme);
        assert_eq!(plain.fg, Some(Color::Cyan));

        let overrides = StyleOverrides {
            value: Some(Style::default().fg(Color::Magenta)),
            ..StyleOverrides::default()
        };
        assert_eq!(
            chart_line(&base, &props, &overrides, &theme).fg,
            Some(Color::Magenta)
        );
    }

    #[test]
    fn test_centered_rows() {
        let area = Rect::new(0, 0, 10, 9);
        assert_eq!(centered_rows(area, 1), Rect::new(0, 4, 10, 1));
        assert_eq!(centered_rows(area, 20), area);
    }
}
