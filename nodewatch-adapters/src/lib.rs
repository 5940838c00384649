//! # nodewatch-adapters
//!
//! Backends that answer telemetry queries for nodewatch widgets.
//!
//! A [`Backend`] hands out [`TelemetryNode`]s, one per node identifier. A
//! node answers two questions: "what is the latest value of this variable"
//! and "what values did this variable take over a range". Everything above
//! this crate (rate limiting, circuit breaking, render state) is backend
//! agnostic.
//!
//! ## Supported Backends
//!
//! - **HTTP** (`http` feature) - Queries a telemetry platform's REST API
//! - **Simulated** (`sim` feature) - Deterministic waveforms for demos and tests
//!
//! ## Quick Start (HTTP)
//!
//! ```rust,no_run
//! # #[cfg(feature = "http")]
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! use nodewatch_adapters::http::HttpBackend;
//! use nodewatch_adapters::Backend;
//!
//! let backend = HttpBackend::builder()
//!     .endpoint("https://api.example.io/v1")
//!     .credentials("token-id", "token")
//!     .build()?;
//!
//! let node = backend.new_node("b5e6c1a2-node");
//! let response = node.get_latest_data("temperature").await?;
//! println!("available: {}", response.is_data_available);
//! # Ok(())
//! # }
//! ```

use std::fmt::Debug;
use std::sync::Arc;

use async_trait::async_trait;

pub mod error;

#[cfg(feature = "http")]
pub mod http;

#[cfg(feature = "sim")]
pub mod sim;

pub use error::AdapterError;

// Re-export types for convenience
pub use nodewatch_types::{DataPoint, FetchRequest, NodeResponse, Order, Payload};

/// A data-access handle scoped to one node.
///
/// Implementations only translate requests; they do not rate limit, retry
/// or cache. A returned `Err` means the call itself failed (transport,
/// timeout, undecodable body). A backend-reported failure is an `Ok`
/// response with `is_success == false`.
#[async_trait]
pub trait TelemetryNode: Send + Sync + Debug {
    /// Identifier of the node this handle is bound to.
    fn node_id(&self) -> &str;

    /// Fetch a range of samples.
    async fn get_data(&self, request: &FetchRequest) -> Result<NodeResponse, AdapterError>;

    /// Fetch the latest sample of a variable.
    async fn get_latest_data(&self, variable: &str) -> Result<NodeResponse, AdapterError>;
}

/// A source of node handles.
pub trait Backend: Send + Sync + Debug {
    /// Create a handle for `node_id`.
    fn new_node(&self, node_id: &str) -> Arc<dyn TelemetryNode>;

    /// Human-readable description, shown in the dashboard status bar.
    fn description(&self) -> &str;
}
