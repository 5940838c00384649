//! # nodewatch
//!
//! A terminal dashboard of data-bound telemetry widgets.
//!
//! Each widget shows one variable of one IoT node as a numeric readout, a
//! time-series chart or a radial gauge. Fetching, rate limiting and the
//! circuit breaker live in `nodewatch-sdk`; this crate turns the resulting
//! [`RenderState`](nodewatch_sdk::RenderState) into terminal output.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌──────────────────┐   ┌──────────┐   ┌──────────┐
//! │  config  │──▶│       app        │──▶│    ui    │──▶│ Terminal │
//! │  (TOML)  │   │ (WidgetBindings) │   │(ratatui) │   │          │
//! └──────────┘   └────────┬─────────┘   └──────────┘   └──────────┘
//!                         │ FetchTasks
//!                         ▼
//!                 ┌──────────────────┐
//!                 │  nodewatch-sdk   │◀── HttpBackend | SimulatedBackend
//!                 └──────────────────┘
//! ```
//!
//! - **[`config`]**: dashboard file and environment overrides
//! - **[`app`]**: mounted widgets, refresh and remount, JSON export
//! - **[`format`]**: number, date and display-text formatting
//! - **[`style`]**: color ranges, gauge zones and style callbacks
//! - **[`ui`]**: readout, chart and gauge rendering, overlays and theme
//!
//! ## Usage
//!
//! ```bash
//! # Simulated greenhouse node, no credentials needed
//! nodewatch --demo
//!
//! # Real platform
//! NODEWATCH_TOKEN=... nodewatch --config dashboard.toml --token-id my-id
//! ```

pub mod app;
pub mod config;
pub mod events;
pub mod format;
pub mod style;
pub mod ui;

pub use app::{App, Widget, WidgetHealth};
pub use config::{DashboardConfig, WidgetConfig};
