//! Number, date and display-text formatting.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Datelike, Local, TimeZone, Timelike};
use ratatui::style::Style;

/// Default pattern for axis labels, e.g. `"Mar 04 09:15 PM"`.
pub const DEFAULT_DATE_FORMAT: &str = "%b %d %I:%M %p";

/// Format `value` according to a display pattern.
///
/// - `"0.00"` style patterns fix the number of decimals to the number of
///   characters after the dot.
/// - Patterns containing both `value` and `unit` substitute the value and
///   drop the `unit` placeholder (the unit is rendered separately).
/// - Anything else prints the value as is.
pub fn format_number(value: f64, pattern: &str) -> String {
    if pattern.contains("0.0") {
        let decimals = pattern.split('.').nth(1).map(str::len).unwrap_or(0);
        return format!("{:.*}", decimals, value);
    }

    if pattern.contains("value") && pattern.contains("unit") {
        return pattern
            .replacen("value", &value.to_string(), 1)
            .replacen("unit", "", 1);
    }

    value.to_string()
}

/// Format a timestamp with `YYYY MM DD HH hh mm ss` tokens.
///
/// Each token is replaced once, in that order. `HH` is the 24-hour clock,
/// `hh` the 12-hour clock.
pub fn format_date<Tz: TimeZone>(date: &DateTime<Tz>, pattern: &str) -> String {
    let hour12 = match date.hour() % 12 {
        0 => 12,
        h => h,
    };
    pattern
        .replacen("YYYY", &date.year().to_string(), 1)
        .replacen("MM", &format!("{:02}", date.month()), 1)
        .replacen("DD", &format!("{:02}", date.day()), 1)
        .replacen("HH", &format!("{:02}", date.hour()), 1)
        .replacen("hh", &format!("{:02}", hour12), 1)
        .replacen("mm", &format!("{:02}", date.minute()), 1)
        .replacen("ss", &format!("{:02}", date.second()), 1)
}

/// Format a millisecond timestamp in local time.
///
/// `pattern` uses the token syntax of [`format_date`]; `None` uses
/// [`DEFAULT_DATE_FORMAT`].
pub fn format_timestamp(timestamp_ms: i64, pattern: Option<&str>) -> String {
    let Some(date) = Local.timestamp_millis_opt(timestamp_ms).single() else {
        return timestamp_ms.to_string();
    };
    match pattern {
        Some(pattern) => format_date(&date, pattern),
        None => date.format(DEFAULT_DATE_FORMAT).to_string(),
    }
}

/// Where the unit goes relative to the value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnitPosition {
    Before,
    #[default]
    After,
    Below,
}

/// Text shown for a scalar value.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DisplayText {
    pub text: String,
    pub unit_text: Option<String>,
    pub position: UnitPosition,
    /// Style for the unit; the widget's unit style when `None`.
    pub unit_style: Option<Style>,
}

impl DisplayText {
    /// Text and unit in reading order, separated by a space.
    pub fn inline(&self) -> String {
        match (&self.unit_text, self.position) {
            (Some(unit), UnitPosition::Before) => format!("{} {}", unit, self.text),
            (Some(unit), UnitPosition::After) => format!("{} {}", self.text, unit),
            _ => self.text.clone(),
        }
    }
}

impl fmt::Display for DisplayText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.inline())
    }
}

/// Custom formatter from a value (and the configured unit) to display text.
pub type DisplayFormatter = Arc<dyn Fn(f64, Option<&str>) -> DisplayText + Send + Sync>;

/// Custom formatter for chart axis labels, from milliseconds since the epoch.
pub type TickFormatter = Arc<dyn Fn(i64) -> String + Send + Sync>;

/// Display text produced when no custom formatter is configured.
pub fn default_display_text(value: f64, pattern: Option<&str>, unit: Option<&str>) -> DisplayText {
    DisplayText {
        text: pattern
            .map(|p| format_number(value, p))
            .unwrap_or_else(|| value.to_string()),
        unit_text: unit.filter(|u| !u.is_empty()).map(str::to_string),
        position: UnitPosition::After,
        unit_style: None,
    }
}
