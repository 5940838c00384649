//! Simulated backend producing deterministic waveforms.
//!
//! Every `(node, variable)` pair gets its own sine wave, so a dashboard can
//! be exercised without credentials or network access. Latency, forced
//! failures and variables without data can be configured to reproduce the
//! error paths of a real backend.
//!
//! ## Example
//!
//! ```rust
//! use nodewatch_adapters::sim::SimulatedBackend;
//! use nodewatch_adapters::Backend;
//!
//! let backend = SimulatedBackend::builder()
//!     .fail_every(5)
//!     .empty_variable("pressure")
//!     .build();
//! let node = backend.new_node("greenhouse-1");
//! assert_eq!(node.node_id(), "greenhouse-1");
//! ```

use std::collections::BTreeSet;
use std::f64::consts::TAU;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;

use nodewatch_types::{DataPoint, FetchRequest, NodeResponse, Order, Payload};

use crate::{AdapterError, Backend, TelemetryNode};

/// Period of the generated waveform.
const WAVE_PERIOD_MS: f64 = 10.0 * 60.0 * 1000.0;

/// Default window for range queries without a lower bound.
const DEFAULT_WINDOW_MS: i64 = 60 * 60 * 1000;

/// Default number of samples for range queries without a limit.
const DEFAULT_SAMPLES: usize = 60;

/// Backend that synthesises data instead of calling a remote service.
#[derive(Clone)]
pub struct SimulatedBackend {
    inner: Arc<SimInner>,
}

struct SimInner {
    latency: Duration,
    fail_every: Option<u64>,
    empty_variables: BTreeSet<String>,
    calls: AtomicU64,
}

impl SimulatedBackend {
    /// Create a new builder for configuring the backend.
    pub fn builder() -> SimulatedBackendBuilder {
        SimulatedBackendBuilder::default()
    }

    /// Total node calls served so far, including failed ones.
    pub fn calls(&self) -> u64 {
        self.inner.calls.load(Ordering::Relaxed)
    }
}

impl fmt::Debug for SimulatedBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimulatedBackend")
            .field("latency", &self.inner.latency)
            .field("fail_every", &self.inner.fail_every)
            .field("calls", &self.calls())
            .finish()
    }
}

impl Backend for SimulatedBackend {
    fn new_node(&self, node_id: &str) -> Arc<dyn TelemetryNode> {
        Arc::new(SimulatedNode {
            inner: self.inner.clone(),
            node_id: node_id.to_string(),
        })
    }

    fn description(&self) -> &str {
        "simulated"
    }
}

/// Builder for [`SimulatedBackend`].
#[derive(Debug, Default)]
pub struct SimulatedBackendBuilder {
    latency: Option<Duration>,
    fail_every: Option<u64>,
    empty_variables: BTreeSet<String>,
}

impl SimulatedBackendBuilder {
    /// Delay every call by `latency` (default: none).
    pub fn latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Fail every `n`th call with a timeout. `0` disables failures.
    pub fn fail_every(mut self, n: u64) -> Self {
        self.fail_every = (n > 0).then_some(n);
        self
    }

    /// Answer queries for `variable` with "no data".
    pub fn empty_variable(mut self, variable: impl Into<String>) -> Self {
        self.empty_variables.insert(variable.into());
        self
    }

    /// Build the backend.
    pub fn build(self) -> SimulatedBackend {
        SimulatedBackend {
            inner: Arc::new(SimInner {
                latency: self.latency.unwrap_or_default(),
                fail_every: self.fail_every,
                empty_variables: self.empty_variables,
                calls: AtomicU64::new(0),
            }),
        }
    }
}

/// Node handle backed by [`SimulatedBackend`].
pub struct SimulatedNode {
    inner: Arc<SimInner>,
    node_id: String,
}

impl fmt::Debug for SimulatedNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimulatedNode")
            .field("node_id", &self.node_id)
            .finish()
    }
}

impl SimulatedNode {
    /// Count the call, apply latency, and decide whether it fails.
    async fn begin_call(&self) -> Result<(), AdapterError> {
        let call = self.inner.calls.fetch_add(1, Ordering::Relaxed) + 1;

        if !self.inner.latency.is_zero() {
            tokio::time::sleep(self.inner.latency).await;
        }

        match self.inner.fail_every {
            Some(n) if call % n == 0 => Err(AdapterError::Timeout),
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl TelemetryNode for SimulatedNode {
    fn node_id(&self) -> &str {
        &self.node_id
    }

    async fn get_data(&self, request: &FetchRequest) -> Result<NodeResponse, AdapterError> {
        request.validate()?;
        self.begin_call().await?;

        if self.inner.empty_variables.contains(&request.variable) {
            return Ok(NodeResponse::empty());
        }

        let points = sample_range(&self.node_id, request, now_ms());
        if points.is_empty() {
            return Ok(NodeResponse::empty());
        }
        Ok(NodeResponse::success(Payload::Series(points)))
    }

    async fn get_latest_data(&self, variable: &str) -> Result<NodeResponse, AdapterError> {
        self.begin_call().await?;

        if self.inner.empty_variables.contains(variable) {
            return Ok(NodeResponse::empty());
        }

        let ts = now_ms();
        Ok(NodeResponse::success(Payload::Point(DataPoint::new(
            ts,
            value_at(&self.node_id, variable, ts),
        ))))
    }
}

/// Value of the waveform for `(node_id, variable)` at `timestamp_ms`.
///
/// Each pair gets a phase and amplitude derived from its name so that
/// different widgets show visibly different curves. Values stay in `[10, 90]`.
pub fn value_at(node_id: &str, variable: &str, timestamp_ms: i64) -> f64 {
    let seed = fnv1a(node_id.as_bytes(), fnv1a(variable.as_bytes(), FNV_OFFSET));
    let phase = (seed % 360) as f64 / 360.0 * TAU;
    let amplitude = 20.0 + (seed % 21) as f64;
    let angle = (timestamp_ms as f64 / WAVE_PERIOD_MS) * TAU + phase;
    let value = 50.0 + amplitude * angle.sin();
    (value * 100.0).round() / 100.0
}

/// Evenly spaced samples covering the request's range.
fn sample_range(node_id: &str, request: &FetchRequest, now: i64) -> Vec<DataPoint> {
    let to = request.to.map(to_ms).unwrap_or(now);
    let from = request
        .from
        .map(to_ms)
        .unwrap_or(to - DEFAULT_WINDOW_MS);
    let count = request.limit.unwrap_or(DEFAULT_SAMPLES);

    if count == 0 || from > to {
        return Vec::new();
    }

    let mut points: Vec<DataPoint> = if count == 1 || from == to {
        vec![DataPoint::new(to, value_at(node_id, &request.variable, to))]
    } else {
        let step = (to - from) as f64 / (count - 1) as f64;
        (0..count)
            .map(|i| {
                let ts = from + (step * i as f64).round() as i64;
                DataPoint::new(ts, value_at(node_id, &request.variable, ts))
            })
            .collect()
    };

    if request.order == Some(Order::Desc) {
        points.reverse();
    }
    points
}

fn to_ms(ts: i64) -> i64 {
    DataPoint::new(ts, 0.0).timestamp_ms()
}

fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;

fn fnv1a(bytes: &[u8], mut hash: u64) -> u64 {
    for b in bytes {
        hash ^= u64::from(*b);
        hash = hash.wrapping_mul(0x0100_0000_01b3);
    }
    hash
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_is_deterministic_and_bounded() {
        let a = value_at("n1", "temperature", 1_700_000_000_000);
        let b = value_at("n1", "temperature", 1_700_000_000_000);
        assert_eq!(a, b);
        assert!((10.0..=90.0).contains(&a));
    }

    #[test]
    fn test_variables_differ() {
        let t = 1_700_000_000_000;
        let a = value_at("n1", "temperature", t);
        let b = value_at("n1", "humidity", t);
        assert_ne!(a, b);
    }

    #[test]
    fn test_sample_range_respects_limit_and_bounds() {
        let req = FetchRequest::builder("t")
            .range(1_000_000_000_000, 1_000_000_060_000)
            .limit(7)
            .build()
            .unwrap();
        let points = sample_range("n1", &req, 0);
        assert_eq!(points.len(), 7);
        assert_eq!(points[0].timestamp, 1_000_000_000_000);
        assert_eq!(points[6].timestamp, 1_000_000_060_000);
    }

    #[test]
    fn test_sample_range_single_point() {
        let req = FetchRequest::builder("t")
            .range(1_000_000_000_000, 1_000_000_060_000)
            .limit(1)
            .build()
            .unwrap();
        let points = sample_range("n1", &req, 0);
        assert_eq!(points.len(), 1);
    }

    #[test]
    fn test_sample_range_desc() {
        let req = FetchRequest::builder("t")
            .range(1_000_000_000_000, 1_000_000_060_000)
            .limit(3)
            .order(Order::Desc)
            .build()
            .unwrap();
        let points = sample_range("n1", &req, 0);
        assert!(points[0].timestamp > points[2].timestamp);
    }

    #[test]
    fn test_second_bounds_are_scaled() {
        let req = FetchRequest::builder("t")
            .range(1_000_000_000, 1_000_000_060)
            .limit(2)
            .build()
            .unwrap();
        let points = sample_range("n1", &req, 0);
        assert_eq!(points[1].timestamp, 1_000_000_060_000);
    }

    #[tokio::test]
    async fn test_latest_data_success() {
        let backend = SimulatedBackend::builder().build();
        let node = backend.new_node("n1");
        let resp = node.get_latest_data("temperature").await.unwrap();
        assert!(resp.is_success);
        assert!(resp.is_data_available);
        assert!(matches!(resp.data, Some(Payload::Point(_))));
        assert_eq!(backend.calls(), 1);
    }

    #[tokio::test]
    async fn test_empty_variable() {
        let backend = SimulatedBackend::builder().empty_variable("ghost").build();
        let node = backend.new_node("n1");
        let resp = node.get_latest_data("ghost").await.unwrap();
        assert!(resp.is_success);
        assert!(!resp.is_data_available);
    }

    #[tokio::test]
    async fn test_fail_every() {
        let backend = SimulatedBackend::builder().fail_every(2).build();
        let node = backend.new_node("n1");
        assert!(node.get_latest_data("t").await.is_ok());
        assert!(matches!(
            node.get_latest_data("t").await,
            Err(AdapterError::Timeout)
        ));
        assert!(node.get_latest_data("t").await.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_latency_applied() {
        let backend = SimulatedBackend::builder()
            .latency(Duration::from_millis(250))
            .build();
        let node = backend.new_node("n1");
        let start = tokio::time::Instant::now();
        node.get_latest_data("t").await.unwrap();
        assert!(start.elapsed() >= Duration::from_millis(250));
    }

    #[tokio::test]
    async fn test_invalid_request_rejected_before_call() {
        let backend = SimulatedBackend::builder().build();
        let node = backend.new_node("n1");
        let req = FetchRequest {
            variable: "t".to_string(),
            from: Some(10),
            to: Some(5),
            limit: None,
            order: None,
        };
        assert!(matches!(
            node.get_data(&req).await,
            Err(AdapterError::InvalidRequest(_))
        ));
        assert_eq!(backend.calls(), 0);
    }
}
