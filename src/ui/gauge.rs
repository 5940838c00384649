//! Radial gauge.
//!
//! Angles are in degrees, clockwise from twelve o'clock.

use std::fmt;

use ratatui::{
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Style},
    symbols::Marker,
    widgets::{
        canvas::{Canvas, Line as CanvasLine, Points},
        Paragraph,
    },
    Frame,
};

use crate::format::{format_number, DisplayFormatter, DisplayText, UnitPosition};
use crate::style::{sanitize_zones, WidgetStyles, Zone};
use crate::ui::readout::text_lines;
use crate::ui::{Theme, PLACEHOLDER};

/// Arc width as a fraction of the radius.
pub const DEFAULT_THICKNESS: f64 = 0.2;

const ARC_STEP_DEGREES: f64 = 1.5;
const FULL_TURN_DEGREES: f64 = 360.0;
const NEEDLE_LENGTH: f64 = 0.85;

/// Value range and sweep of a gauge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GaugeGeometry {
    pub min: f64,
    pub max: f64,
    pub start_angle: f64,
    pub end_angle: f64,
}

impl Default for GaugeGeometry {
    fn default() -> Self {
        Self {
            min: 0.0,
            max: 100.0,
            start_angle: -135.0,
            end_angle: 135.0,
        }
    }
}

impl GaugeGeometry {
    /// Clamp `value` into `[min, max]`.
    pub fn clamp(&self, value: f64) -> f64 {
        if self.max <= self.min {
            return self.min;
        }
        value.clamp(self.min, self.max)
    }

    /// Position of `value` along the range, from 0 to 1.
    pub fn fraction(&self, value: f64) -> f64 {
        let span = self.max - self.min;
        if span <= 0.0 {
            return 0.0;
        }
        (self.clamp(value) - self.min) / span
    }

    pub fn angle_for(&self, value: f64) -> f64 {
        self.start_angle + self.fraction(value) * (self.end_angle - self.start_angle)
    }
}

#[derive(Clone)]
pub struct GaugeProps {
    pub geometry: GaugeGeometry,
    pub zones: Vec<Zone>,
    pub show_needle: bool,
    pub thickness: f64,
    pub unit: Option<String>,
    pub number_format: Option<String>,
    /// Replaces the default `value / max` text.
    pub value_text: Option<DisplayFormatter>,
}

impl Default for GaugeProps {
    fn default() -> Self {
        Self {
            geometry: GaugeGeometry::default(),
            zones: crate::style::default_zones(),
            show_needle: false,
            thickness: DEFAULT_THICKNESS,
            unit: None,
            number_format: None,
            value_text: None,
        }
    }
}

impl fmt::Debug for GaugeProps {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GaugeProps")
            .field("geometry", &self.geometry)
            .field("zones", &self.zones)
            .field("show_needle", &self.show_needle)
            .field("thickness", &self.thickness)
            .field("unit", &self.unit)
            .field("value_text", &self.value_text.is_some())
            .finish()
    }
}

/// A zone mapped onto the dial.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoneArc {
    pub start_angle: f64,
    pub end_angle: f64,
    pub color: Color,
}

impl GaugeProps {
    /// Zones clamped to the range, as angles.
    pub fn arcs(&self) -> Vec<ZoneArc> {
        let geometry = &self.geometry;
        sanitize_zones(&self.zones, geometry.min, geometry.max)
            .into_iter()
            .map(|zone| ZoneArc {
                start_angle: geometry.angle_for(zone.from),
                end_angle: geometry.angle_for(zone.to),
                color: zone.color,
            })
            .collect()
    }

    pub fn display_text(&self, value: f64) -> DisplayText {
        if let Some(format) = &self.value_text {
            return format(value, self.unit.as_deref());
        }
        let number = |v: f64| match &self.number_format {
            Some(pattern) => format_number(v, pattern),
            None => v.to_string(),
        };
        DisplayText {
            text: format!("{} / {}", number(value), number(self.geometry.max)),
            unit_text: self.unit.clone().filter(|u| !u.is_empty()),
            position: UnitPosition::After,
            unit_style: None,
        }
    }

    fn inner_radius(&self) -> f64 {
        1.0 - self.thickness.clamp(0.05, 1.0)
    }
}

/// Point on the unit circle at `angle`, scaled by `radius`.
fn polar(angle: f64, radius: f64) -> (f64, f64) {
    let rad = angle.to_radians();
    (radius * rad.sin(), radius * rad.cos())
}

/// Sample an annulus sector between two radii. Sweeps wider than a full
/// turn are drawn as one turn.
fn band(start: f64, end: f64, inner: f64, outer: f64) -> Vec<(f64, f64)> {
    if !start.is_finite() || !end.is_finite() {
        return Vec::new();
    }
    let (from, to) = if start <= end { (start, end) } else { (end, start) };
    let to = to.min(from + FULL_TURN_DEGREES);
    let rings = (((outer - inner) / 0.05).ceil() as usize).max(1);
    let mut coords = Vec::new();
    for ring in 0..=rings {
        let radius = inner + (outer - inner) * ring as f64 / rings as f64;
        let mut angle = from;
        while angle <= to {
            coords.push(polar(angle, radius));
            angle += ARC_STEP_DEGREES;
        }
        coords.push(polar(to, radius));
    }
    coords
}

pub fn render(
    frame: &mut Frame,
    area: Rect,
    props: &GaugeProps,
    value: Option<f64>,
    styles: &WidgetStyles,
    theme: &Theme,
) {
    let [dial_area, text_area] =
        Layout::vertical([Constraint::Min(3), Constraint::Length(2)]).areas(area);

    let geometry = props.geometry;
    let inner = props.inner_radius();
    let arcs = props.arcs();
    let track = band(geometry.start_angle, geometry.end_angle, inner, 1.0);
    let zone_bands: Vec<(Vec<(f64, f64)>, Color)> = arcs
        .iter()
        .map(|arc| (band(arc.start_angle, arc.end_angle, inner, 1.0), arc.color))
        .collect();
    let value_band = value.map(|v| {
        band(
            geometry.start_angle,
            geometry.angle_for(v),
            inner * 0.85,
            inner * 0.92,
        )
    });
    let needle = value
        .filter(|_| props.show_needle)
        .map(|v| polar(geometry.angle_for(v), NEEDLE_LENGTH));

    // Cells are roughly twice as tall as wide.
    let aspect = (dial_area.width as f64) / (dial_area.height.max(1) as f64 * 2.0);
    let (x_extent, y_extent) = if aspect >= 1.0 {
        (1.1 * aspect, 1.1)
    } else {
        (1.1, 1.1 / aspect.max(0.1))
    };
    let needle_color = styles.value.fg.unwrap_or(theme.highlight);
    let muted = theme.muted;

    let canvas = Canvas::default()
        .marker(Marker::Braille)
        .x_bounds([-x_extent, x_extent])
        .y_bounds([-y_extent, y_extent])
        .paint(move |ctx| {
            ctx.draw(&Points {
                coords: &track,
                color: muted,
            });
            for (coords, color) in &zone_bands {
                ctx.draw(&Points {
                    coords,
                    color: *color,
                });
            }
            if let Some(ref coords) = value_band {
                ctx.draw(&Points {
                    coords,
                    color: needle_color,
                });
            }
            if let Some((x, y)) = needle {
                ctx.draw(&CanvasLine::new(0.0, 0.0, x, y, needle_color));
            }
        });
    frame.render_widget(canvas, dial_area);

    let lines = match value {
        Some(v) => {
            let text = props.display_text(v);
            text_lines(&text, styles.value, text.unit_style.unwrap_or(styles.unit))
        }
        None => text_lines(
            &DisplayText {
                text: PLACEHOLDER.to_string(),
                ..DisplayText::default()
            },
            Style::default().fg(theme.muted),
            styles.unit,
        ),
    };
    frame.render_widget(Paragraph::new(lines).alignment(Alignment::Center), text_area);
}
