//! Time-series chart.

use std::fmt;

use ratatui::{
    layout::Rect,
    style::{Color, Style},
    symbols::Marker,
    widgets::{Axis, Chart, Dataset, GraphType},
    Frame,
};

use nodewatch_types::DataPoint;

use crate::format::{format_timestamp, TickFormatter};
use crate::ui::Theme;

/// Number of x-axis labels when none is configured.
pub const DEFAULT_TICK_COUNT: usize = 4;

/// Lowest upper bound of the y axis.
const MIN_Y_MAX: f64 = 10.0;

#[derive(Clone, Default)]
pub struct ChartProps {
    pub unit: Option<String>,
    pub tick_count: usize,
    /// Token pattern for x-axis labels; `%b %d %I:%M %p` style when unset.
    pub date_format: Option<String>,
    /// Replaces `date_format` for x-axis labels.
    pub tick_formatter: Option<TickFormatter>,
    /// Line color; the theme highlight when unset.
    pub color: Option<Color>,
}

impl ChartProps {
    /// Axis label for a timestamp in milliseconds.
    pub fn tick_label(&self, timestamp_ms: i64) -> String {
        match &self.tick_formatter {
            Some(format) => format(timestamp_ms),
            None => format_timestamp(timestamp_ms, self.date_format.as_deref()),
        }
    }
}

impl fmt::Debug for ChartProps {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChartProps")
            .field("unit", &self.unit)
            .field("tick_count", &self.tick_count)
            .field("date_format", &self.date_format)
            .field("tick_formatter", &self.tick_formatter.is_some())
            .field("color", &self.color)
            .finish()
    }
}

/// Points in chart coordinates: milliseconds and value.
pub fn chart_points(points: &[DataPoint]) -> Vec<(f64, f64)> {
    points
        .iter()
        .map(|p| (p.timestamp_ms() as f64, p.value))
        .collect()
}

/// Time bounds of the series. A single point gets a one-minute window.
pub fn x_bounds(points: &[(f64, f64)]) -> [f64; 2] {
    let first = points.iter().map(|p| p.0).fold(f64::INFINITY, f64::min);
    let last = points.iter().map(|p| p.0).fold(f64::NEG_INFINITY, f64::max);
    if !first.is_finite() {
        return [0.0, 1.0];
    }
    if last <= first {
        return [first - 30_000.0, first + 30_000.0];
    }
    [first, last]
}

/// Value bounds: from zero to the largest value, at least 10.
pub fn y_bounds(points: &[(f64, f64)]) -> [f64; 2] {
    let max = points.iter().map(|p| p.1).fold(MIN_Y_MAX, f64::max);
    [0.0, max]
}

/// `count` evenly spaced timestamps across `bounds`, formatted by `format`.
pub fn tick_labels(
    bounds: [f64; 2],
    count: usize,
    format: impl Fn(i64) -> String,
) -> Vec<String> {
    let label = |t: f64| format(t as i64);
    match count {
        0 => Vec::new(),
        1 => vec![label(bounds[0])],
        n => {
            let step = (bounds[1] - bounds[0]) / (n - 1) as f64;
            (0..n).map(|i| label(bounds[0] + step * i as f64)).collect()
        }
    }
}

/// Line style before any style callback is applied.
pub fn line_style(props: &ChartProps, theme: &Theme) -> Style {
    Style::default().fg(props.color.unwrap_or(theme.highlight))
}

/// Draw `series` with the line in `line`.
pub fn render(
    frame: &mut Frame,
    area: Rect,
    props: &ChartProps,
    series: &[DataPoint],
    line: Style,
    theme: &Theme,
) {
    let points = chart_points(series);
    let x = x_bounds(&points);
    let y = y_bounds(&points);
    let axis_style = Style::default().fg(theme.muted);

    let dataset = Dataset::default()
        .marker(Marker::Braille)
        .graph_type(GraphType::Line)
        .style(line)
        .data(&points);

    let chart = Chart::new(vec![dataset])
        .x_axis(
            Axis::default()
                .style(axis_style)
                .bounds(x)
                .labels(tick_labels(x, props.tick_count, |t| props.tick_label(t))),
        )
        .y_axis(
            Axis::default()
                .title(props.unit.clone().unwrap_or_default())
                .style(axis_style)
                .bounds(y)
                .labels(vec![
                    format!("{:.0}", y[0]),
                    format!("{:.0}", y[1] / 2.0),
                    format!("{:.0}", y[1]),
                ]),
        );

    frame.render_widget(chart, area);
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Arc;

    use ratatui::{backend::TestBackend, Terminal};

    use crate::ui::buffer_text;

    #[test]
    fn test_y_bounds_floor_at_ten() {
        assert_eq!(y_bounds(&[(0.0, 3.0), (1.0, 7.5)]), [0.0, 10.0]);
        assert_eq!(y_bounds(&[(0.0, 3.0), (1.0, 42.0)]), [0.0, 42.0]);
    }

    #[test]
    fn test_x_bounds() {
        assert_eq!(x_bounds(&[(2_000.0, 1.0), (1_000.0, 1.0)]), [1_000.0, 2_000.0]);
        assert_eq!(x_bounds(&[(60_000.0, 1.0)]), [30_000.0, 90_000.0]);
        assert_eq!(x_bounds(&[]), [0.0, 1.0]);
    }

    #[test]
    fn test_seconds_are_normalised() {
        let points = chart_points(&[DataPoint::new(1_700_000_000, 5.0)]);
        assert_eq!(points, vec![(1_700_000_000_000.0, 5.0)]);
    }

    #[test]
    fn test_tick_labels_count() {
        let bounds = [0.0, 3_600_000.0];
        let props = ChartProps::default();
        let label = |t| props.tick_label(t);
        assert_eq!(tick_labels(bounds, DEFAULT_TICK_COUNT, label).len(), 4);
        assert_eq!(tick_labels(bounds, 1, label).len(), 1);
        assert!(tick_labels(bounds, 0, label).is_empty());
    }

    #[test]
    fn test_tick_labels_use_pattern() {
        let props = ChartProps {
            date_format: Some("YYYY".into()),
            ..ChartProps::default()
        };
        let labels = tick_labels([0.0, 1.0], 2, |t| props.tick_label(t));
        assert!(labels.iter().all(|l| l == "1970" || l == "1969"));
    }

    #[test]
    fn test_tick_formatter_replaces_pattern() {
        let props = ChartProps {
            date_format: Some("YYYY".into()),
            tick_formatter: Some(Arc::new(|t: i64| format!("t+{}s", t / 1000))),
            ..ChartProps::default()
        };
        assert_eq!(
            tick_labels([0.0, 60_000.0], 3, |t| props.tick_label(t)),
            vec!["t+0s", "t+30s", "t+60s"]
        );
    }

    #[test]
    fn test_render_single_point() {
        let props = ChartProps {
            unit: Some("°C".into()),
            tick_count: 2,
            date_format: Some("HH:mm".into()),
            ..ChartProps::default()
        };
        let theme = Theme::dark();
        let mut terminal = Terminal::new(TestBackend::new(50, 12)).unwrap();
        terminal
            .draw(|frame| {
                render(
                    frame,
                    frame.area(),
                    &props,
                    &[DataPoint::new(1_700_000_000_000, 42.0)],
                    line_style(&props, &theme),
                    &theme,
                )
            })
            .unwrap();
        let text = buffer_text(terminal.backend().buffer());
        assert!(text.contains("42"));
        assert!(text.contains("°C"));
    }

    #[test]
    fn test_render_uses_line_style() {
        let props = ChartProps {
            tick_count: 2,
            ..ChartProps::default()
        };
        let series = [
            DataPoint::new(1_700_000_000_000, 2.0),
            DataPoint::new(1_700_000_060_000, 8.0),
        ];
        let mut terminal = Terminal::new(TestBackend::new(50, 12)).unwrap();
        terminal
            .draw(|frame| {
                render(
                    frame,
                    frame.area(),
                    &props,
                    &series,
                    Style::default().fg(Color::Magenta),
                    &Theme::dark(),
                )
            })
            .unwrap();
        let buffer = terminal.backend().buffer();
        assert!(buffer.content.iter().any(|cell| cell.fg == Color::Magenta));
    }
}
