//! # nodewatch-sdk
//!
//! Fetch controller for data-bound telemetry widgets.
//!
//! A widget shows one variable of one node. This crate owns everything
//! between the widget's props and the state it renders:
//!
//! - **Client**: a backend plus the per-node rate limiters shared by all
//!   node handles it creates. Optionally stored process-wide.
//! - **Node resolution**: `(client, node_id)` to a rate-limited [`NodeHandle`].
//! - **Rate limiting**: a minimum interval between calls to the same node,
//!   enforced by reserving dispatch slots in a [`RateLimiterRegistry`].
//! - **Fetch control**: single-flight guard, consecutive-failure circuit
//!   breaker and unmount liveness, published as a [`RenderState`].
//! - **Bindings**: which prop changes re-resolve the node and which
//!   re-fetch.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use nodewatch_adapters::sim::SimulatedBackend;
//! use nodewatch_sdk::{init_client_with, InitOptions, WidgetBinding, WidgetKind};
//!
//! #[tokio::main]
//! async fn main() {
//!     let client = init_client_with(
//!         Arc::new(SimulatedBackend::builder().build()),
//!         InitOptions {
//!             rate_limit: Duration::from_millis(200),
//!             ..InitOptions::default()
//!         },
//!     );
//!
//!     let mut gauge = WidgetBinding::new(WidgetKind::Gauge, "humidity");
//!     gauge.set_variable("humidity");
//!     if let Some(task) = gauge.set_source(Some(client), "greenhouse-1") {
//!         tokio::spawn(task.run());
//!     }
//!
//!     let mut updates = gauge.subscribe();
//!     while updates.changed().await.is_ok() {
//!         println!("{:?}", *updates.borrow());
//!     }
//! }
//! ```

mod binding;
mod breaker;
mod client;
mod controller;
mod error;
mod node;
mod rate_limit;
mod validate;

#[cfg(test)]
mod testing;

pub use binding::{FetchTask, RangeProps, WidgetBinding, WidgetKind, DEFAULT_CHART_LIMIT};
pub use breaker::{CircuitState, DEFAULT_MAX_FAILURES};
#[cfg(feature = "http")]
pub use client::init_client;
pub use client::{
    get_client, init_client_with, reset_client, Client, ClientBuilder, InitOptions,
};
pub use controller::{DropReason, FetchController, FetchPhase, Query, TriggerOutcome};
pub use error::SdkError;
pub use node::{resolve, NodeHandle};
pub use rate_limit::{RateLimiterEntry, RateLimiterRegistry, DEFAULT_CAPACITY, DEFAULT_RATE_LIMIT};
pub use validate::validate_required;

// Re-export types for convenience
pub use nodewatch_types::{
    DataPoint, FetchRequest, FetchResult, NodeResponse, Order, Payload, RenderState, WidgetValue,
    NO_DATA_MESSAGE,
};
