//! Dashboard configuration.
//!
//! Loaded from an optional TOML file with `NODEWATCH_*` environment
//! overrides, then patched with command-line flags by the binary.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use config::{Config, Environment, File, FileFormat};
use ratatui::style::Color;
use serde::{Deserialize, Serialize};
use tracing::warn;

use nodewatch_sdk::{RangeProps, WidgetKind, DEFAULT_RATE_LIMIT};

use crate::style::{default_color_ranges, default_zones, parse_color, ColorRange, Zone};
use crate::ui::chart::{ChartProps, DEFAULT_TICK_COUNT};
use crate::ui::gauge::{GaugeGeometry, GaugeProps, DEFAULT_THICKNESS};
use crate::ui::readout::ReadoutProps;
use crate::ui::Presentation;

/// Chart window used when neither `from` nor `to` is configured.
pub const DEFAULT_WINDOW: Duration = Duration::from_secs(3600);

/// Top-level dashboard settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardConfig {
    /// Platform API endpoint; the HTTP backend default when unset.
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub token_id: Option<String>,
    #[serde(default)]
    pub token: Option<String>,
    /// Minimum interval between calls to the same node.
    #[serde(default = "default_rate_limit_ms")]
    pub rate_limit_ms: u64,
    /// Seconds between automatic refreshes.
    #[serde(default = "default_refresh_secs")]
    pub refresh_secs: u64,
    #[serde(default)]
    pub widgets: Vec<WidgetConfig>,
}

fn default_rate_limit_ms() -> u64 {
    DEFAULT_RATE_LIMIT.as_millis() as u64
}

fn default_refresh_secs() -> u64 {
    10
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            token_id: None,
            token: None,
            rate_limit_ms: default_rate_limit_ms(),
            refresh_secs: default_refresh_secs(),
            widgets: Vec::new(),
        }
    }
}

impl DashboardConfig {
    /// Load from `path` (if any) and the environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path).format(FileFormat::Toml).required(true));
        }
        builder = builder.add_source(Environment::with_prefix("NODEWATCH").try_parsing(true));

        let settings = builder
            .build()
            .with_context(|| match path {
                Some(path) => format!("Failed to read config {}", path.display()),
                None => "Failed to read config from environment".to_string(),
            })?;
        settings
            .try_deserialize()
            .context("Invalid dashboard config")
    }

    /// Parse a TOML document.
    pub fn from_toml(source: &str) -> Result<Self> {
        Config::builder()
            .add_source(File::from_str(source, FileFormat::Toml))
            .build()
            .context("Failed to parse config")?
            .try_deserialize()
            .context("Invalid dashboard config")
    }

    /// Widgets bound to one simulated greenhouse node.
    pub fn demo() -> Self {
        let widget = |kind, variable: &str, title: &str, unit: &str| WidgetConfig {
            kind,
            node_id: "greenhouse-1".to_string(),
            variable: variable.to_string(),
            title: Some(title.to_string()),
            unit: Some(unit.to_string()),
            ..WidgetConfig::default()
        };

        Self {
            widgets: vec![
                WidgetConfig {
                    number_format: Some("0.0".to_string()),
                    ..widget(KindConfig::Readout, "temperature", "Temperature", "°C")
                },
                WidgetConfig {
                    show_needle: true,
                    ..widget(KindConfig::Gauge, "humidity", "Humidity", "%")
                },
                WidgetConfig {
                    limit: Some(60),
                    window_secs: Some(3600),
                    ..widget(KindConfig::Chart, "temperature", "Temperature (1h)", "°C")
                },
                widget(KindConfig::Readout, "soil_moisture", "Soil moisture", "%"),
            ],
            ..Self::default()
        }
    }

    pub fn rate_limit(&self) -> Duration {
        Duration::from_millis(self.rate_limit_ms)
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_secs.max(1))
    }
}

/// Widget kind as written in config files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KindConfig {
    #[default]
    Readout,
    Chart,
    Gauge,
}

impl From<KindConfig> for WidgetKind {
    fn from(kind: KindConfig) -> Self {
        match kind {
            KindConfig::Readout => WidgetKind::Readout,
            KindConfig::Chart => WidgetKind::Chart,
            KindConfig::Gauge => WidgetKind::Gauge,
        }
    }
}

/// Color for values up to `max` (unbounded when omitted).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColorRangeConfig {
    #[serde(default = "unbounded")]
    pub max: f64,
    pub color: String,
}

fn unbounded() -> f64 {
    f64::INFINITY
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneConfig {
    pub from: f64,
    pub to: f64,
    pub color: String,
}

/// One widget on the dashboard.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WidgetConfig {
    pub kind: KindConfig,
    #[serde(default)]
    pub node_id: String,
    #[serde(default)]
    pub variable: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub unit: Option<String>,
    /// Number pattern such as `"0.00"`.
    #[serde(default)]
    pub number_format: Option<String>,

    // chart
    /// Fixed range start, in milliseconds.
    #[serde(default)]
    pub from: Option<i64>,
    /// Fixed range end, in milliseconds.
    #[serde(default)]
    pub to: Option<i64>,
    /// Sliding window ending now; used when `from` and `to` are unset.
    #[serde(default)]
    pub window_secs: Option<u64>,
    #[serde(default)]
    pub limit: Option<usize>,
    #[serde(default)]
    pub tick_count: Option<usize>,
    #[serde(default)]
    pub date_format: Option<String>,
    #[serde(default)]
    pub color: Option<String>,

    // readout
    #[serde(default)]
    pub color_ranges: Vec<ColorRangeConfig>,

    // gauge
    #[serde(default)]
    pub min: Option<f64>,
    #[serde(default)]
    pub max: Option<f64>,
    #[serde(default)]
    pub start_angle: Option<f64>,
    #[serde(default)]
    pub end_angle: Option<f64>,
    #[serde(default)]
    pub show_needle: bool,
    #[serde(default)]
    pub thickness: Option<f64>,
    #[serde(default)]
    pub zones: Vec<ZoneConfig>,
}

impl WidgetConfig {
    /// Title shown on the widget border.
    pub fn title(&self) -> String {
        match (&self.title, self.kind) {
            (Some(title), _) => title.clone(),
            (None, KindConfig::Gauge) => "Latest Data".to_string(),
            (None, _) => self.variable.clone(),
        }
    }

    /// Sliding window of a chart, if its range is relative.
    pub fn window(&self) -> Option<Duration> {
        if self.kind != KindConfig::Chart || self.from.is_some() || self.to.is_some() {
            return None;
        }
        Some(
            self.window_secs
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_WINDOW),
        )
    }

    /// Chart range for a refresh at `now_ms`.
    pub fn range_at(&self, now_ms: i64) -> RangeProps {
        match self.window() {
            Some(window) => RangeProps {
                from: Some(now_ms - window.as_millis() as i64),
                to: Some(now_ms),
                limit: self.limit,
            },
            None => RangeProps {
                from: self.from,
                to: self.to,
                limit: self.limit,
            },
        }
    }

    /// Presentation props for this widget.
    pub fn presentation(&self) -> Presentation {
        match self.kind {
            KindConfig::Readout => Presentation::Readout(ReadoutProps {
                unit: self.unit.clone(),
                number_format: self.number_format.clone(),
                color_ranges: if self.color_ranges.is_empty() {
                    default_color_ranges()
                } else {
                    self.parsed_color_ranges()
                },
                formatter: None,
            }),
            KindConfig::Chart => Presentation::Chart(ChartProps {
                unit: self.unit.clone(),
                tick_count: self.tick_count.unwrap_or(DEFAULT_TICK_COUNT),
                date_format: self.date_format.clone(),
                tick_formatter: None,
                color: self.color.as_deref().and_then(|c| self.color_or_warn(c)),
            }),
            KindConfig::Gauge => {
                let defaults = GaugeGeometry::default();
                Presentation::Gauge(GaugeProps {
                    geometry: GaugeGeometry {
                        min: self.min.unwrap_or(defaults.min),
                        max: self.max.unwrap_or(defaults.max),
                        start_angle: self.start_angle.unwrap_or(defaults.start_angle),
                        end_angle: self.end_angle.unwrap_or(defaults.end_angle),
                    },
                    zones: if self.zones.is_empty() {
                        default_zones()
                    } else {
                        self.parsed_zones()
                    },
                    show_needle: self.show_needle,
                    thickness: self.thickness.unwrap_or(DEFAULT_THICKNESS),
                    unit: self.unit.clone(),
                    number_format: self.number_format.clone(),
                    value_text: None,
                })
            }
        }
    }

    fn parsed_color_ranges(&self) -> Vec<ColorRange> {
        self.color_ranges
            .iter()
            .filter_map(|r| {
                self.color_or_warn(&r.color)
                    .map(|color| ColorRange { max: r.max, color })
            })
            .collect()
    }

    fn parsed_zones(&self) -> Vec<Zone> {
        self.zones
            .iter()
            .filter_map(|z| {
                self.color_or_warn(&z.color).map(|color| Zone {
                    from: z.from,
                    to: z.to,
                    color,
                })
            })
            .collect()
    }

    fn color_or_warn(&self, value: &str) -> Option<Color> {
        let color = parse_color(value);
        if color.is_none() {
            warn!(widget = %self.title(), color = value, "Ignoring unknown color");
        }
        color
    }
}
