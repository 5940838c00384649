//! Request lifecycle for one widget instance.
//!
//! A [`FetchController`] owns a widget's [`RenderState`] and is the only
//! thing that mutates it. Each trigger goes through the same gate:
//!
//! 1. Under the controller lock: drop the trigger if the widget is
//!    unmounted, a fetch is already in flight, or the breaker has tripped.
//!    Otherwise enter [`FetchPhase::Fetching`] before anything is awaited.
//! 2. Wait for the node's rate-limit slot, then dispatch the call.
//! 3. Under the lock again: discard the result if the widget unmounted in
//!    the meantime, otherwise classify it and publish the new state.
//!
//! ```text
//!            trigger                       Ok + data
//!   Idle ───────────────▶ Fetching ──────────────────▶ Success
//!    ▲                      │  ▲                          │
//!    │                      │  └──────── trigger ─────────┘
//!    │         empty / error│  ┌──────── trigger ─────────┐
//!    │                      ▼  │                          │
//!    │                    Failed { tripped } ◀────────────┘
//! ```

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::watch;
use tracing::{debug, warn};

use nodewatch_adapters::AdapterError;
use nodewatch_types::{
    FetchRequest, FetchResult, NodeResponse, Payload, RenderState, WidgetValue, NO_DATA_MESSAGE,
};

use crate::breaker::{CircuitState, DEFAULT_MAX_FAILURES};
use crate::node::NodeHandle;

/// Where a controller is in its request lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FetchPhase {
    #[default]
    Idle,
    Fetching,
    Success,
    /// The last attempt failed or returned no data. `tripped` is set once
    /// the breaker has opened; no further attempt will be made.
    Failed { tripped: bool },
}

/// Why a trigger did not start a fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    /// A fetch is already in flight.
    InFlight,
    /// The circuit breaker has tripped.
    Tripped,
    /// The widget has been unmounted.
    Unmounted,
}

/// Result of a trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerOutcome {
    /// The fetch ran and its result was applied; holds the new phase.
    Applied(FetchPhase),
    /// The trigger was a no-op.
    Dropped(DropReason),
    /// The fetch ran but the widget unmounted before it finished.
    Discarded,
}

/// What a widget asks its node for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Query {
    /// Latest sample of a variable, shown as a scalar.
    Latest(String),
    /// Range of samples, shown as a series.
    Range(FetchRequest),
}

impl Query {
    /// The variable being queried.
    pub fn variable(&self) -> &str {
        match self {
            Query::Latest(variable) => variable,
            Query::Range(request) => &request.variable,
        }
    }

    fn value_from(&self, payload: Payload) -> Option<WidgetValue> {
        match self {
            Query::Latest(_) => payload.latest().map(|p| WidgetValue::Scalar(p.value)),
            Query::Range(_) => {
                let points = payload.into_series();
                (!points.is_empty()).then_some(WidgetValue::Series(points))
            }
        }
    }
}

#[derive(Debug)]
struct Machine {
    phase: FetchPhase,
    circuit: CircuitState,
    mounted: bool,
}

struct Inner {
    label: String,
    machine: Mutex<Machine>,
    state: watch::Sender<RenderState>,
}

/// Fetch lifecycle, circuit breaker and render state for one widget.
///
/// Clones share the same state; the binding keeps one and hands clones to
/// the fetch tasks it produces.
///
/// # Example
///
/// ```rust
/// use nodewatch_adapters::sim::SimulatedBackend;
/// use nodewatch_sdk::{resolve, Client, FetchController, Query, TriggerOutcome};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let client = Client::builder()
///     .backend(SimulatedBackend::builder().build())
///     .build()
///     .unwrap();
/// let node = resolve(Some(&client), "greenhouse-1").unwrap();
///
/// let controller = FetchController::new("temperature readout");
/// let outcome = controller
///     .trigger(&node, &Query::Latest("temperature".into()))
///     .await;
/// assert!(matches!(outcome, TriggerOutcome::Applied(_)));
/// assert!(controller.snapshot().scalar().is_some());
/// # }
/// ```
#[derive(Clone)]
pub struct FetchController {
    inner: Arc<Inner>,
}

impl FetchController {
    /// Create a mounted controller with the default breaker threshold.
    pub fn new(label: impl Into<String>) -> Self {
        Self::with_max_failures(label, DEFAULT_MAX_FAILURES)
    }

    /// Create a mounted controller that trips after `max_failures`
    /// consecutive failures.
    pub fn with_max_failures(label: impl Into<String>, max_failures: u32) -> Self {
        let (state, _) = watch::channel(RenderState::idle());
        Self {
            inner: Arc::new(Inner {
                label: label.into(),
                machine: Mutex::new(Machine {
                    phase: FetchPhase::Idle,
                    circuit: CircuitState::new(max_failures),
                    mounted: true,
                }),
                state,
            }),
        }
    }

    /// Label used in log events.
    pub fn label(&self) -> &str {
        &self.inner.label
    }

    /// Receive every published render state.
    pub fn subscribe(&self) -> watch::Receiver<RenderState> {
        self.inner.state.subscribe()
    }

    /// The current render state.
    pub fn snapshot(&self) -> RenderState {
        self.inner.state.borrow().clone()
    }

    pub fn phase(&self) -> FetchPhase {
        self.inner.machine.lock().phase
    }

    pub fn circuit(&self) -> CircuitState {
        self.inner.machine.lock().circuit
    }

    pub fn is_mounted(&self) -> bool {
        self.inner.machine.lock().mounted
    }

    /// Mark the widget as gone. In-flight calls keep running but their
    /// results are discarded, and later triggers are dropped.
    pub fn unmount(&self) {
        let mut machine = self.inner.machine.lock();
        if machine.mounted {
            machine.mounted = false;
            debug!(widget = %self.inner.label, "Unmounted");
        }
    }

    /// Run one guarded fetch of `query` against `node`.
    ///
    /// Dropping the returned future before it finishes ends the attempt:
    /// the previous phase is restored and `loading` is cleared, so the
    /// next trigger can run.
    pub async fn trigger(&self, node: &NodeHandle, query: &Query) -> TriggerOutcome {
        let in_flight = match self.begin() {
            Ok(in_flight) => in_flight,
            Err(reason) => {
                debug!(widget = %self.inner.label, ?reason, "Trigger dropped");
                return TriggerOutcome::Dropped(reason);
            }
        };

        if let Query::Range(request) = query {
            if let Err(err) = request.validate() {
                warn!(widget = %self.inner.label, error = %err, "Invalid range request");
                return self.complete(in_flight, query, Err(err.into()));
            }
        }

        node.throttle().await;
        if !self.is_mounted() {
            debug!(widget = %self.inner.label, "Unmounted while rate limited, not dispatching");
            return TriggerOutcome::Discarded;
        }

        let result = match query {
            Query::Latest(variable) => node.dispatch_latest(variable).await,
            Query::Range(request) => node.dispatch_data(request).await,
        };
        self.complete(in_flight, query, result)
    }

    fn begin(&self) -> Result<InFlight<'_>, DropReason> {
        let mut machine = self.inner.machine.lock();
        if !machine.mounted {
            return Err(DropReason::Unmounted);
        }
        if machine.phase == FetchPhase::Fetching {
            return Err(DropReason::InFlight);
        }
        if machine.circuit.is_tripped() {
            return Err(DropReason::Tripped);
        }

        let previous = machine.phase;
        machine.phase = FetchPhase::Fetching;
        self.inner.state.send_modify(|state| {
            state.loading = true;
            state.error = None;
        });
        debug!(widget = %self.inner.label, "Fetching");
        Ok(InFlight {
            controller: self,
            previous,
            armed: true,
        })
    }

    fn complete(
        &self,
        mut in_flight: InFlight<'_>,
        query: &Query,
        result: Result<NodeResponse, AdapterError>,
    ) -> TriggerOutcome {
        let mut machine = self.inner.machine.lock();
        if !machine.mounted {
            debug!(widget = %self.inner.label, "Unmounted during fetch, discarding result");
            drop(machine);
            drop(in_flight);
            return TriggerOutcome::Discarded;
        }
        in_flight.armed = false;

        let classified = match result {
            Ok(response) => FetchResult::from_response(response),
            Err(err) => FetchResult::Error(err.to_string()),
        };

        let next = match classified {
            FetchResult::Success(payload) => match query.value_from(payload) {
                Some(value) => {
                    machine.circuit.record_success();
                    machine.phase = FetchPhase::Success;
                    RenderState {
                        value: Some(value),
                        loading: false,
                        error: None,
                    }
                }
                None => self.no_data(&mut machine),
            },
            FetchResult::Empty => self.no_data(&mut machine),
            FetchResult::Error(message) => {
                if machine.circuit.record_failure() {
                    warn!(
                        widget = %self.inner.label,
                        failures = machine.circuit.consecutive_failures,
                        "Circuit breaker tripped, no further fetches"
                    );
                }
                machine.phase = FetchPhase::Failed {
                    tripped: machine.circuit.is_tripped(),
                };
                RenderState {
                    value: None,
                    loading: false,
                    error: Some(message),
                }
            }
        };

        debug!(widget = %self.inner.label, phase = ?machine.phase, "Fetch settled");
        self.inner.state.send_replace(next);
        TriggerOutcome::Applied(machine.phase)
    }

    /// Undo `begin` for an attempt that will never complete.
    fn abandon(&self, previous: FetchPhase) {
        let mut machine = self.inner.machine.lock();
        if machine.phase != FetchPhase::Fetching {
            return;
        }
        machine.phase = previous;
        self.inner.state.send_modify(|state| state.loading = false);
        debug!(widget = %self.inner.label, phase = ?previous, "Fetch cancelled");
    }

    /// The backend answered but had nothing; it is reachable, so the
    /// failure count resets.
    fn no_data(&self, machine: &mut Machine) -> RenderState {
        machine.circuit.record_success();
        machine.phase = FetchPhase::Failed {
            tripped: machine.circuit.is_tripped(),
        };
        RenderState {
            value: None,
            loading: false,
            error: Some(NO_DATA_MESSAGE.to_string()),
        }
    }
}

/// Marks an attempt as in flight; dropped while armed, it releases the
/// single-flight slot.
struct InFlight<'a> {
    controller: &'a FetchController,
    previous: FetchPhase,
    armed: bool,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.controller.abandon(self.previous);
        }
    }
}

impl fmt::Debug for FetchController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let machine = self.inner.machine.lock();
        f.debug_struct("FetchController")
            .field("label", &self.inner.label)
            .field("phase", &machine.phase)
            .field("circuit", &machine.circuit)
            .field("mounted", &machine.mounted)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use nodewatch_types::DataPoint;

    use crate::node::resolve;
    use crate::testing::{Reply, ScriptedBackend};

    fn setup(backend: &ScriptedBackend) -> (FetchController, NodeHandle) {
        let client = backend.client();
        let node = resolve(Some(&client), "n1").unwrap();
        (FetchController::new("test"), node)
    }

    fn latest() -> Query {
        Query::Latest("temperature".to_string())
    }

    #[tokio::test]
    async fn test_success_sets_value() {
        let backend = ScriptedBackend::new();
        backend.push(Reply::point(42.0));
        let (controller, node) = setup(&backend);

        let outcome = controller.trigger(&node, &latest()).await;

        assert_eq!(outcome, TriggerOutcome::Applied(FetchPhase::Success));
        assert_eq!(
            controller.snapshot(),
            RenderState {
                value: Some(WidgetValue::Scalar(42.0)),
                loading: false,
                error: None,
            }
        );
    }

    #[tokio::test]
    async fn test_no_data_available() {
        let backend = ScriptedBackend::new();
        backend.push(Reply::Respond(NodeResponse::empty()));
        let (controller, node) = setup(&backend);

        controller.trigger(&node, &latest()).await;

        assert_eq!(
            controller.snapshot(),
            RenderState {
                value: None,
                loading: false,
                error: Some("No data available".to_string()),
            }
        );
        assert_eq!(controller.phase(), FetchPhase::Failed { tripped: false });
        assert_eq!(controller.circuit().consecutive_failures, 0);
    }

    #[tokio::test]
    async fn test_three_timeouts_trip_breaker() {
        let backend = ScriptedBackend::new();
        backend.always(Reply::Timeout);
        let (controller, node) = setup(&backend);

        for _ in 0..2 {
            assert_eq!(
                controller.trigger(&node, &latest()).await,
                TriggerOutcome::Applied(FetchPhase::Failed { tripped: false })
            );
        }
        assert_eq!(
            controller.trigger(&node, &latest()).await,
            TriggerOutcome::Applied(FetchPhase::Failed { tripped: true })
        );

        let fourth = controller.trigger(&node, &latest()).await;
        assert_eq!(fourth, TriggerOutcome::Dropped(DropReason::Tripped));
        assert_eq!(backend.calls(), 3);

        let state = controller.snapshot();
        assert_eq!(state.error.as_deref(), Some("timeout"));
        assert!(!state.loading);
        assert!(state.value.is_none());
    }

    #[tokio::test]
    async fn test_tripped_breaker_ignores_new_node() {
        let backend = ScriptedBackend::new();
        backend.always(Reply::Timeout);
        let (controller, node) = setup(&backend);
        for _ in 0..3 {
            controller.trigger(&node, &latest()).await;
        }

        backend.always(Reply::point(1.0));
        let other = resolve(Some(&backend.client()), "n2").unwrap();
        assert_eq!(
            controller.trigger(&other, &latest()).await,
            TriggerOutcome::Dropped(DropReason::Tripped)
        );

        // A fresh controller starts closed.
        let fresh = FetchController::new("fresh");
        assert_eq!(
            fresh.trigger(&other, &latest()).await,
            TriggerOutcome::Applied(FetchPhase::Success)
        );
    }

    #[tokio::test]
    async fn test_success_resets_failures() {
        let backend = ScriptedBackend::new();
        backend.push(Reply::Timeout);
        backend.push(Reply::Timeout);
        backend.push(Reply::point(5.0));
        backend.push(Reply::Timeout);
        backend.push(Reply::Timeout);
        let (controller, node) = setup(&backend);

        for _ in 0..3 {
            controller.trigger(&node, &latest()).await;
        }
        assert_eq!(controller.circuit().consecutive_failures, 0);

        for _ in 0..2 {
            controller.trigger(&node, &latest()).await;
        }
        assert_eq!(controller.circuit().consecutive_failures, 2);
        assert!(!controller.circuit().is_tripped());
    }

    #[tokio::test]
    async fn test_error_payload_counts_as_failure() {
        let backend = ScriptedBackend::new();
        backend.push(Reply::Respond(NodeResponse::failure("unknown variable")));
        let (controller, node) = setup(&backend);

        controller.trigger(&node, &latest()).await;

        let state = controller.snapshot();
        assert_eq!(state.error.as_deref(), Some("unknown variable"));
        assert!(state.value.is_none());
        assert_eq!(controller.circuit().consecutive_failures, 1);
    }

    #[tokio::test]
    async fn test_failure_clears_previous_value() {
        let backend = ScriptedBackend::new();
        backend.push(Reply::point(3.0));
        backend.push(Reply::Timeout);
        let (controller, node) = setup(&backend);

        controller.trigger(&node, &latest()).await;
        assert_eq!(controller.snapshot().scalar(), Some(3.0));

        controller.trigger(&node, &latest()).await;
        assert_eq!(controller.snapshot().scalar(), None);
    }

    #[tokio::test]
    async fn test_second_trigger_while_in_flight_is_dropped() {
        let backend = ScriptedBackend::gated();
        backend.push(Reply::point(7.0));
        let (controller, node) = setup(&backend);
        let mut rx = controller.subscribe();

        let first = tokio::spawn({
            let controller = controller.clone();
            let node = node.clone();
            async move { controller.trigger(&node, &latest()).await }
        });
        rx.wait_for(|state| state.loading).await.unwrap();
        assert_eq!(controller.phase(), FetchPhase::Fetching);

        assert_eq!(
            controller.trigger(&node, &latest()).await,
            TriggerOutcome::Dropped(DropReason::InFlight)
        );

        backend.release(1);
        assert_eq!(
            first.await.unwrap(),
            TriggerOutcome::Applied(FetchPhase::Success)
        );
        assert_eq!(backend.calls(), 1);
        assert_eq!(controller.snapshot().scalar(), Some(7.0));
    }

    #[tokio::test]
    async fn test_timed_out_trigger_releases_in_flight() {
        let backend = ScriptedBackend::gated();
        backend.push(Reply::point(1.0));
        let (controller, node) = setup(&backend);

        let timed_out = tokio::time::timeout(
            Duration::from_millis(20),
            controller.trigger(&node, &latest()),
        )
        .await;
        assert!(timed_out.is_err());

        assert_eq!(controller.phase(), FetchPhase::Idle);
        assert!(!controller.snapshot().loading);

        backend.release(1);
        assert_eq!(
            controller.trigger(&node, &latest()).await,
            TriggerOutcome::Applied(FetchPhase::Success)
        );
        assert_eq!(controller.snapshot().scalar(), Some(1.0));
    }

    #[tokio::test]
    async fn test_aborted_trigger_restores_previous_phase() {
        let backend = ScriptedBackend::gated();
        backend.push(Reply::point(4.0));
        let (controller, node) = setup(&backend);
        backend.release(1);
        controller.trigger(&node, &latest()).await;

        let mut rx = controller.subscribe();
        let pending = tokio::spawn({
            let controller = controller.clone();
            let node = node.clone();
            async move { controller.trigger(&node, &latest()).await }
        });
        rx.wait_for(|state| state.loading).await.unwrap();

        pending.abort();
        assert!(pending.await.unwrap_err().is_cancelled());

        assert_eq!(controller.phase(), FetchPhase::Success);
        let state = controller.snapshot();
        assert!(!state.loading);
        assert_eq!(state.scalar(), Some(4.0));
    }

    #[tokio::test]
    async fn test_unmount_mid_fetch_discards_result() {
        let backend = ScriptedBackend::gated();
        backend.push(Reply::point(9.0));
        let (controller, node) = setup(&backend);
        let mut rx = controller.subscribe();

        let pending = tokio::spawn({
            let controller = controller.clone();
            let node = node.clone();
            async move { controller.trigger(&node, &latest()).await }
        });
        rx.wait_for(|state| state.loading).await.unwrap();

        controller.unmount();
        backend.release(1);

        assert_eq!(pending.await.unwrap(), TriggerOutcome::Discarded);
        assert_eq!(backend.calls(), 1);
        assert!(controller.snapshot().value.is_none());
        assert_eq!(
            controller.trigger(&node, &latest()).await,
            TriggerOutcome::Dropped(DropReason::Unmounted)
        );
    }

    #[tokio::test]
    async fn test_entering_fetch_keeps_value_and_clears_error() {
        let backend = ScriptedBackend::gated();
        backend.push(Reply::point(4.0));
        backend.push(Reply::point(5.0));
        let (controller, node) = setup(&backend);

        backend.release(1);
        controller.trigger(&node, &latest()).await;

        let mut rx = controller.subscribe();
        let pending = tokio::spawn({
            let controller = controller.clone();
            let node = node.clone();
            async move { controller.trigger(&node, &latest()).await }
        });
        let loading = rx.wait_for(|state| state.loading).await.unwrap().clone();
        assert_eq!(loading.scalar(), Some(4.0));
        assert!(loading.error.is_none());

        backend.release(1);
        pending.await.unwrap();
        assert_eq!(controller.snapshot().scalar(), Some(5.0));
    }

    #[tokio::test]
    async fn test_chart_limit_one() {
        let backend = ScriptedBackend::new();
        backend.push(Reply::Respond(NodeResponse::success(Payload::Series(vec![
            DataPoint::new(1_700_000_000_000, 42.0),
        ]))));
        let (controller, node) = setup(&backend);

        let request = FetchRequest::builder("temperature")
            .range(1_699_999_000_000, 1_700_000_000_000)
            .limit(1)
            .build()
            .unwrap();
        controller.trigger(&node, &Query::Range(request)).await;

        let state = controller.snapshot();
        assert_eq!(state.series().len(), 1);
        assert_eq!(state.series()[0].value, 42.0);
    }

    #[tokio::test]
    async fn test_range_query_wraps_single_point() {
        let backend = ScriptedBackend::new();
        backend.push(Reply::point(8.0));
        let (controller, node) = setup(&backend);

        controller
            .trigger(&node, &Query::Range(FetchRequest::new("t")))
            .await;

        assert_eq!(controller.snapshot().series().len(), 1);
    }

    #[tokio::test]
    async fn test_latest_query_takes_newest_of_series() {
        let backend = ScriptedBackend::new();
        backend.push(Reply::Respond(NodeResponse::success(Payload::Series(vec![
            DataPoint::new(2_000_000_000_000, 2.0),
            DataPoint::new(1_000_000_000_000, 1.0),
        ]))));
        let (controller, node) = setup(&backend);

        controller.trigger(&node, &latest()).await;

        assert_eq!(controller.snapshot().scalar(), Some(2.0));
    }

    #[tokio::test]
    async fn test_invalid_range_not_dispatched() {
        let backend = ScriptedBackend::new();
        let (controller, node) = setup(&backend);
        let mut request = FetchRequest::new("t");
        request.from = Some(20);
        request.to = Some(10);

        let outcome = controller.trigger(&node, &Query::Range(request)).await;

        assert_eq!(
            outcome,
            TriggerOutcome::Applied(FetchPhase::Failed { tripped: false })
        );
        assert_eq!(backend.calls(), 0);
        assert!(controller
            .snapshot()
            .error
            .unwrap()
            .starts_with("Invalid request"));
    }
}
