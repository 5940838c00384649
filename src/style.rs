//! Value colors, gauge zones and per-render style overrides.

use std::sync::Arc;

use ratatui::style::{Color, Style};

use nodewatch_types::RenderState;

/// Color used for values up to and including `max`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorRange {
    pub max: f64,
    pub color: Color,
}

/// Red up to 20, yellow up to 50, green above.
pub fn default_color_ranges() -> Vec<ColorRange> {
    vec![
        ColorRange {
            max: 20.0,
            color: Color::Red,
        },
        ColorRange {
            max: 50.0,
            color: Color::Yellow,
        },
        ColorRange {
            max: f64::INFINITY,
            color: Color::Green,
        },
    ]
}

/// Color of the first range whose `max` is at least `value`.
pub fn color_for(value: f64, ranges: &[ColorRange]) -> Option<Color> {
    ranges.iter().find(|r| value <= r.max).map(|r| r.color)
}

/// A colored band of a gauge, in value units. `from` is inclusive, `to`
/// exclusive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Zone {
    pub from: f64,
    pub to: f64,
    pub color: Color,
}

/// Green below 40, yellow to 60, red to 100.
pub fn default_zones() -> Vec<Zone> {
    vec![
        Zone {
            from: 0.0,
            to: 40.0,
            color: Color::Green,
        },
        Zone {
            from: 40.0,
            to: 60.0,
            color: Color::Yellow,
        },
        Zone {
            from: 60.0,
            to: 100.0,
            color: Color::Red,
        },
    ]
}

/// Clamp zones to `[min, max]`, drop empty ones and sort by start.
pub fn sanitize_zones(zones: &[Zone], min: f64, max: f64) -> Vec<Zone> {
    let mut safe: Vec<Zone> = zones
        .iter()
        .map(|z| Zone {
            from: z.from.max(min),
            to: z.to.min(max),
            color: z.color,
        })
        .filter(|z| z.to > z.from)
        .collect();
    safe.sort_by(|a, b| a.from.total_cmp(&b.from));
    safe
}

/// Parse a color name or `#rrggbb` string.
pub fn parse_color(value: &str) -> Option<Color> {
    value.trim().parse().ok()
}

/// Static styles of one widget.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct WidgetStyles {
    pub title: Style,
    pub value: Style,
    pub unit: Style,
    pub border: Style,
}

/// Styles returned by a [`StyleFn`] for one render. Fields left `None`
/// keep the widget's static style; set fields are patched on top of it.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct StyleOverrides {
    pub title: Option<Style>,
    pub value: Option<Style>,
    pub unit: Option<Style>,
    pub border: Option<Style>,
}

/// Style callback evaluated on every render with the current state.
pub type StyleFn = Arc<dyn Fn(&RenderState) -> StyleOverrides + Send + Sync>;

impl WidgetStyles {
    /// Apply overrides as the last layer.
    pub fn merged(&self, overrides: &StyleOverrides) -> WidgetStyles {
        let layer = |base: Style, over: Option<Style>| match over {
            Some(over) => base.patch(over),
            None => base,
        };
        WidgetStyles {
            title: layer(self.title, overrides.title),
            value: layer(self.value, overrides.value),
            unit: layer(self.unit, overrides.unit),
            border: layer(self.border, overrides.border),
        }
    }
}

/// Callback that colors the border while the widget shows an error.
pub fn error_border(color: Color) -> StyleFn {
    Arc::new(move |state: &RenderState| StyleOverrides {
        border: state.error.as_ref().map(|_| Style::default().fg(color)),
        ..StyleOverrides::default()
    })
}
