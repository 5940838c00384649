//! Application state: mounted widgets, selection and overlays.

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use tokio::runtime::Handle;
use tracing::debug;

use nodewatch_sdk::{Client, FetchPhase, FetchTask, WidgetBinding};

use crate::config::WidgetConfig;
use crate::style::{error_border, StyleFn};
use crate::ui::{Presentation, Theme};

/// How long a status message stays visible.
const STATUS_MESSAGE_TTL: Duration = Duration::from_secs(3);

/// Coarse health of a widget, derived from its fetch phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WidgetHealth {
    /// Showing data from the last fetch.
    Healthy,
    /// Not fetched yet, or fetching.
    Pending,
    /// The last fetch failed or returned nothing.
    Failing,
    /// The breaker is open; the widget will not fetch again until remounted.
    Tripped,
}

impl WidgetHealth {
    pub fn from_phase(phase: FetchPhase) -> Self {
        match phase {
            FetchPhase::Idle | FetchPhase::Fetching => WidgetHealth::Pending,
            FetchPhase::Success => WidgetHealth::Healthy,
            FetchPhase::Failed { tripped: false } => WidgetHealth::Failing,
            FetchPhase::Failed { tripped: true } => WidgetHealth::Tripped,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            WidgetHealth::Healthy => "ok",
            WidgetHealth::Pending => "pending",
            WidgetHealth::Failing => "failing",
            WidgetHealth::Tripped => "tripped",
        }
    }
}

/// A mounted widget.
pub struct Widget {
    pub config: WidgetConfig,
    pub binding: WidgetBinding,
    pub presentation: Presentation,
    /// Evaluated on every render.
    pub style_fn: Option<StyleFn>,
}

impl Widget {
    pub fn new(config: WidgetConfig, binding: WidgetBinding) -> Self {
        Self {
            presentation: config.presentation(),
            config,
            binding,
            style_fn: None,
        }
    }

    pub fn title(&self) -> String {
        self.config.title()
    }

    pub fn health(&self) -> WidgetHealth {
        WidgetHealth::from_phase(self.binding.controller().phase())
    }
}

/// Widget counts by health.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HealthCounts {
    pub healthy: usize,
    pub pending: usize,
    pub failing: usize,
    pub tripped: usize,
}

/// Main application state.
pub struct App {
    pub running: bool,
    pub show_help: bool,
    pub show_detail_overlay: bool,
    pub selected: usize,
    /// Frame counter, drives the loading spinner.
    pub tick: u64,

    pub widgets: Vec<Widget>,
    pub last_refresh: Instant,

    // UI
    pub theme: Theme,

    // Status message (temporary feedback)
    pub status_message: Option<(String, Instant)>,

    client: Arc<Client>,
    configs: Vec<WidgetConfig>,
    runtime: Handle,
}

impl App {
    /// Mount one widget per config, spawning their first fetches on
    /// `runtime`.
    pub fn new(client: Arc<Client>, configs: Vec<WidgetConfig>, theme: Theme, runtime: Handle) -> Self {
        let mut app = Self {
            running: true,
            show_help: false,
            show_detail_overlay: false,
            selected: 0,
            tick: 0,
            widgets: Vec::new(),
            last_refresh: Instant::now(),
            theme,
            status_message: None,
            client,
            configs,
            runtime,
        };
        app.mount();
        app
    }

    pub fn client(&self) -> &Arc<Client> {
        &self.client
    }

    /// Returns a description of the backend.
    pub fn source_description(&self) -> &str {
        self.client.backend().description()
    }

    fn mount(&mut self) {
        let now = now_ms();
        self.widgets = self
            .configs
            .iter()
            .map(|config| {
                let mut binding = WidgetBinding::new(config.kind.into(), config.title());
                binding.set_range(config.range_at(now));

                let tasks = [
                    binding.set_variable(&config.variable),
                    binding.set_source(Some(self.client.clone()), &config.node_id),
                ];
                for task in tasks.into_iter().flatten() {
                    self.spawn(task);
                }

                let mut widget = Widget::new(config.clone(), binding);
                widget.style_fn = Some(error_border(self.theme.critical));
                widget
            })
            .collect();
        self.last_refresh = Instant::now();
    }

    fn spawn(&self, task: FetchTask) {
        let node_id = task.node().node_id().to_string();
        self.runtime.spawn(async move {
            let outcome = task.run().await;
            debug!(%node_id, ?outcome, "Fetch finished");
        });
    }

    /// Re-fetch every widget. Sliding chart windows move to end now.
    pub fn refresh(&mut self) {
        let now = now_ms();
        let tasks: Vec<FetchTask> = self
            .widgets
            .iter_mut()
            .filter_map(|widget| {
                if widget.config.window().is_some() {
                    widget.binding.set_range(widget.config.range_at(now));
                }
                widget.binding.refresh()
            })
            .collect();
        for task in tasks {
            self.spawn(task);
        }
        self.last_refresh = Instant::now();
    }

    /// Unmount every widget and mount fresh ones, which closes tripped
    /// breakers.
    pub fn remount(&mut self) {
        self.widgets.clear();
        self.mount();
        self.selected = self.selected.min(self.widgets.len().saturating_sub(1));
        self.set_status_message("Widgets remounted".to_string());
    }

    /// Set a temporary status message that will be shown for a few seconds.
    pub fn set_status_message(&mut self, message: String) {
        self.status_message = Some((message, Instant::now()));
    }

    /// Get the current status message if it hasn't expired.
    pub fn get_status_message(&self) -> Option<&str> {
        match &self.status_message {
            Some((msg, time)) if time.elapsed() < STATUS_MESSAGE_TTL => Some(msg),
            _ => None,
        }
    }

    pub fn selected_widget(&self) -> Option<&Widget> {
        self.widgets.get(self.selected)
    }

    /// Move selection to the next widget, wrapping around.
    pub fn select_next(&mut self) {
        if !self.widgets.is_empty() {
            self.selected = (self.selected + 1) % self.widgets.len();
        }
    }

    /// Move selection to the previous widget, wrapping around.
    pub fn select_prev(&mut self) {
        if !self.widgets.is_empty() {
            self.selected = (self.selected + self.widgets.len() - 1) % self.widgets.len();
        }
    }

    pub fn health_counts(&self) -> HealthCounts {
        let mut counts = HealthCounts::default();
        for widget in &self.widgets {
            match widget.health() {
                WidgetHealth::Healthy => counts.healthy += 1,
                WidgetHealth::Pending => counts.pending += 1,
                WidgetHealth::Failing => counts.failing += 1,
                WidgetHealth::Tripped => counts.tripped += 1,
            }
        }
        counts
    }

    /// Open the detail overlay for the selected widget.
    pub fn enter_detail(&mut self) {
        if self.selected_widget().is_some() {
            self.show_detail_overlay = true;
        }
    }

    pub fn close_overlay(&mut self) {
        self.show_detail_overlay = false;
    }

    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
    }

    pub fn quit(&mut self) {
        self.running = false;
    }

    /// Export every widget's state to a JSON file.
    pub fn export_state(&self, path: &Path) -> Result<()> {
        let counts = self.health_counts();
        let widgets: Vec<serde_json::Value> = self
            .widgets
            .iter()
            .map(|widget| {
                let circuit = widget.binding.controller().circuit();
                Ok(serde_json::json!({
                    "title": widget.title(),
                    "kind": widget.binding.kind().name(),
                    "node_id": widget.config.node_id,
                    "variable": widget.config.variable,
                    "health": widget.health().label(),
                    "consecutive_failures": circuit.consecutive_failures,
                    "tripped": circuit.tripped,
                    "state": serde_json::to_value(widget.binding.snapshot())?,
                }))
            })
            .collect::<Result<_, serde_json::Error>>()?;

        let export = serde_json::json!({
            "backend": self.source_description(),
            "summary": {
                "total": self.widgets.len(),
                "healthy": counts.healthy,
                "pending": counts.pending,
                "failing": counts.failing,
                "tripped": counts.tripped,
            },
            "widgets": widgets,
        });

        std::fs::write(path, serde_json::to_string_pretty(&export)?)?;
        Ok(())
    }
}

/// Current wall-clock time in milliseconds.
pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
