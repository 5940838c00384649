//! Theme configuration for the TUI.
//!
//! Supports light and dark themes with automatic terminal detection.

use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::block::BorderType;

use crate::app::WidgetHealth;
use crate::style::WidgetStyles;

/// Color and style theme for the TUI.
///
/// Use [`Theme::auto_detect()`] for automatic theme selection based on
/// terminal background, or [`Theme::dark()`]/[`Theme::light()`] explicitly.
#[derive(Debug, Clone)]
pub struct Theme {
    /// Accent color for highlights and active elements.
    pub highlight: Color,
    /// Color for widgets whose last fetch failed.
    pub warning: Color,
    /// Color for widgets whose circuit is open.
    pub critical: Color,
    /// Color for widgets showing fresh data.
    pub healthy: Color,
    /// Color for borders and separators.
    pub border: Color,
    /// Color for placeholders and secondary text.
    pub muted: Color,
    /// Style for the header bar.
    pub header: Style,
    /// Border style of the selected widget.
    pub selected: Style,
    /// Border style (rounded, plain, etc.).
    pub border_type: BorderType,
}

impl Theme {
    /// Create a dark theme suitable for dark terminal backgrounds.
    pub fn dark() -> Self {
        Self {
            highlight: Color::Cyan,
            warning: Color::Yellow,
            critical: Color::Red,
            healthy: Color::Green,
            border: Color::Gray,
            muted: Color::DarkGray,
            header: Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            selected: Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            border_type: BorderType::Rounded,
        }
    }

    /// Create a light theme suitable for light terminal backgrounds.
    pub fn light() -> Self {
        Self {
            highlight: Color::Blue,
            warning: Color::Yellow,
            critical: Color::Red,
            healthy: Color::Green,
            border: Color::DarkGray,
            muted: Color::Gray,
            header: Style::default().fg(Color::Blue).add_modifier(Modifier::BOLD),
            selected: Style::default().fg(Color::Blue).add_modifier(Modifier::BOLD),
            border_type: BorderType::Rounded,
        }
    }

    /// Auto-detect based on terminal background
    pub fn auto_detect() -> Self {
        match terminal_light::luma() {
            Ok(luma) if luma > 0.5 => Self::light(),
            _ => Self::dark(),
        }
    }

    /// Get style for a widget's health
    pub fn status_style(&self, health: WidgetHealth) -> Style {
        match health {
            WidgetHealth::Healthy => Style::default().fg(self.healthy),
            WidgetHealth::Pending => Style::default().fg(self.muted),
            WidgetHealth::Failing => Style::default().fg(self.warning),
            WidgetHealth::Tripped => Style::default()
                .fg(self.critical)
                .add_modifier(Modifier::BOLD),
        }
    }

    /// Base styles of a widget before per-render overrides.
    pub fn widget_styles(&self, selected: bool) -> WidgetStyles {
        WidgetStyles {
            title: Style::default().add_modifier(Modifier::BOLD),
            value: Style::default().add_modifier(Modifier::BOLD),
            unit: Style::default().fg(self.muted),
            border: if selected {
                self.selected
            } else {
                Style::default().fg(self.border)
            },
        }
    }
}
