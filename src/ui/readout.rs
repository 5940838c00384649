//! Numeric readout: the latest value as colored text.

use std::fmt;

use ratatui::{
    layout::{Alignment, Rect},
    style::{Color, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::format::{default_display_text, DisplayFormatter, DisplayText, UnitPosition};
use crate::style::{color_for, ColorRange, StyleOverrides, WidgetStyles};
use crate::ui::{centered_rows, layered_styles};

/// Value color when no range matches.
pub const FALLBACK_COLOR: Color = Color::Rgb(0x33, 0x33, 0x33);

#[derive(Clone, Default)]
pub struct ReadoutProps {
    pub unit: Option<String>,
    /// Number pattern such as `"0.00"`.
    pub number_format: Option<String>,
    pub color_ranges: Vec<ColorRange>,
    /// Replaces the default number formatting.
    pub formatter: Option<DisplayFormatter>,
}

impl ReadoutProps {
    pub fn display_text(&self, value: f64) -> DisplayText {
        match &self.formatter {
            Some(format) => format(value, self.unit.as_deref()),
            None => default_display_text(value, self.number_format.as_deref(), self.unit.as_deref()),
        }
    }

    pub fn value_color(&self, value: f64) -> Color {
        color_for(value, &self.color_ranges).unwrap_or(FALLBACK_COLOR)
    }
}

impl fmt::Debug for ReadoutProps {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReadoutProps")
            .field("unit", &self.unit)
            .field("number_format", &self.number_format)
            .field("color_ranges", &self.color_ranges)
            .field("formatter", &self.formatter.is_some())
            .finish()
    }
}

pub fn render(
    frame: &mut Frame,
    area: Rect,
    props: &ReadoutProps,
    value: f64,
    base: &WidgetStyles,
    overrides: &StyleOverrides,
) {
    let text = props.display_text(value);
    let styles = layered_styles(base, Style::default().fg(props.value_color(value)), overrides);
    let lines = text_lines(&text, styles.value, text.unit_style.unwrap_or(styles.unit));

    let height = lines.len() as u16;
    let paragraph = Paragraph::new(lines).alignment(Alignment::Center);
    frame.render_widget(paragraph, centered_rows(area, height));
}

/// Lay out value and unit according to the unit position.
pub(crate) fn text_lines(text: &DisplayText, value: Style, unit: Style) -> Vec<Line<'static>> {
    let value_span = Span::styled(text.text.clone(), value);
    let Some(ref unit_text) = text.unit_text else {
        return vec![Line::from(value_span)];
    };
    let unit_span = Span::styled(unit_text.clone(), unit);

    match text.position {
        UnitPosition::Before => vec![Line::from(vec![unit_span, Span::raw(" "), value_span])],
        UnitPosition::After => vec![Line::from(vec![value_span, Span::raw(" "), unit_span])],
        UnitPosition::Below => vec![Line::from(value_span), Line::from(unit_span)],
    }
}
