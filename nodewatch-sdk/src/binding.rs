//! Widget bindings: props in, fetch tasks out.
//!
//! A widget has two reactive dependencies. The node handle depends on
//! `(client, node_id)` and is re-resolved only when one of them changes.
//! The fetch depends on `(node, variable)` and fires once per change of
//! either. [`WidgetBinding`] tracks both and hands back a [`FetchTask`]
//! whenever a fetch should run; the caller decides where to run it.

use std::fmt;
use std::sync::Arc;

use tokio::sync::watch;
use tracing::debug;

use nodewatch_types::{FetchRequest, Order, RenderState};

use crate::client::Client;
use crate::controller::{FetchController, Query, TriggerOutcome};
use crate::node::{resolve, NodeHandle};
use crate::validate::validate_required;

/// Samples requested by a chart when no limit is configured.
pub const DEFAULT_CHART_LIMIT: usize = 100;

/// The three widget flavours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WidgetKind {
    /// Latest value as text.
    Readout,
    /// Samples over a time range.
    Chart,
    /// Latest value on a radial dial.
    Gauge,
}

impl WidgetKind {
    pub fn name(&self) -> &'static str {
        match self {
            WidgetKind::Readout => "readout",
            WidgetKind::Chart => "chart",
            WidgetKind::Gauge => "gauge",
        }
    }
}

impl fmt::Display for WidgetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Time range of a chart query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RangeProps {
    pub from: Option<i64>,
    pub to: Option<i64>,
    pub limit: Option<usize>,
}

/// A guarded fetch ready to run.
///
/// Owns everything it needs, so it can be spawned onto a runtime.
#[derive(Debug)]
pub struct FetchTask {
    controller: FetchController,
    node: NodeHandle,
    query: Query,
}

impl FetchTask {
    pub fn query(&self) -> &Query {
        &self.query
    }

    pub fn node(&self) -> &NodeHandle {
        &self.node
    }

    /// Run the fetch through the widget's controller.
    pub async fn run(self) -> TriggerOutcome {
        self.controller.trigger(&self.node, &self.query).await
    }
}

/// The node and variable a fetch was last issued for.
#[derive(Debug)]
struct FetchKey {
    node: NodeHandle,
    variable: String,
}

/// Props and fetch lifecycle of one mounted widget.
///
/// Dropping the binding unmounts the widget: in-flight fetches finish but
/// their results are discarded.
///
/// # Example
///
/// ```rust
/// use nodewatch_adapters::sim::SimulatedBackend;
/// use nodewatch_sdk::{Client, WidgetBinding, WidgetKind};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let client = Client::builder()
///     .backend(SimulatedBackend::builder().build())
///     .build()
///     .unwrap();
///
/// let mut binding = WidgetBinding::new(WidgetKind::Gauge, "humidity");
/// assert!(binding.set_variable("humidity").is_none()); // no node yet
///
/// if let Some(task) = binding.set_source(Some(client), "greenhouse-1") {
///     task.run().await;
/// }
/// assert!(binding.snapshot().scalar().is_some());
/// # }
/// ```
pub struct WidgetBinding {
    kind: WidgetKind,
    client: Option<Arc<Client>>,
    node_id: String,
    variable: String,
    range: RangeProps,
    node: Option<NodeHandle>,
    fetched: Option<FetchKey>,
    controller: FetchController,
}

impl WidgetBinding {
    /// Create an unbound widget. `label` names it in log events.
    pub fn new(kind: WidgetKind, label: impl Into<String>) -> Self {
        Self::with_controller(kind, FetchController::new(label))
    }

    /// Create an unbound widget around an existing controller.
    pub fn with_controller(kind: WidgetKind, controller: FetchController) -> Self {
        Self {
            kind,
            client: None,
            node_id: String::new(),
            variable: String::new(),
            range: RangeProps::default(),
            node: None,
            fetched: None,
            controller,
        }
    }

    pub fn kind(&self) -> WidgetKind {
        self.kind
    }

    /// The resolved node, if any.
    pub fn node(&self) -> Option<&NodeHandle> {
        self.node.as_ref()
    }

    pub fn variable(&self) -> &str {
        &self.variable
    }

    pub fn range(&self) -> RangeProps {
        self.range
    }

    pub fn controller(&self) -> &FetchController {
        &self.controller
    }

    pub fn subscribe(&self) -> watch::Receiver<RenderState> {
        self.controller.subscribe()
    }

    pub fn snapshot(&self) -> RenderState {
        self.controller.snapshot()
    }

    /// Set the client and node id.
    ///
    /// The node is re-resolved only when the client (by identity) or the
    /// node id changed. Returns a task when the resolved node differs from
    /// the one last fetched.
    pub fn set_source(&mut self, client: Option<Arc<Client>>, node_id: &str) -> Option<FetchTask> {
        let same_client = match (&self.client, &client) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        };
        let changed = !same_client || self.node_id != node_id;

        self.client = client;
        self.node_id = node_id.to_string();
        self.validate();

        if changed {
            self.node = resolve(self.client.as_ref(), &self.node_id);
            debug!(
                widget = %self.controller.label(),
                node_id = %self.node_id,
                resolved = self.node.is_some(),
                "Node source changed"
            );
            if self.node.is_none() {
                self.fetched = None;
            }
        }
        self.effect()
    }

    /// Set the variable. Returns a task when it differs from the one last
    /// fetched.
    pub fn set_variable(&mut self, variable: &str) -> Option<FetchTask> {
        self.variable = variable.to_string();
        self.validate();
        self.effect()
    }

    /// Set the chart range. Takes effect on the next fetch; a range change
    /// alone does not trigger one.
    pub fn set_range(&mut self, range: RangeProps) {
        self.range = range;
        self.validate();
    }

    /// Re-run the fetch with unchanged props.
    ///
    /// Returns `None` when no node is resolved or no variable is set.
    pub fn refresh(&mut self) -> Option<FetchTask> {
        let node = self.node.clone()?;
        if self.variable.trim().is_empty() {
            return None;
        }
        self.fetched = Some(FetchKey {
            node: node.clone(),
            variable: self.variable.clone(),
        });
        Some(self.task(node))
    }

    /// Unmount the widget. Equivalent to dropping the binding.
    pub fn unmount(&self) {
        self.controller.unmount();
    }

    /// Query issued for the current props.
    pub fn query(&self) -> Query {
        match self.kind {
            WidgetKind::Readout | WidgetKind::Gauge => Query::Latest(self.variable.clone()),
            WidgetKind::Chart => Query::Range(FetchRequest {
                variable: self.variable.clone(),
                from: self.range.from,
                to: self.range.to,
                limit: Some(self.range.limit.unwrap_or(DEFAULT_CHART_LIMIT)),
                order: Some(Order::Asc),
            }),
        }
    }

    fn effect(&mut self) -> Option<FetchTask> {
        let node = self.node.clone()?;
        if self.variable.trim().is_empty() {
            return None;
        }

        let unchanged = self
            .fetched
            .as_ref()
            .is_some_and(|last| last.node.same_node(&node) && last.variable == self.variable);
        if unchanged {
            return None;
        }

        self.fetched = Some(FetchKey {
            node: node.clone(),
            variable: self.variable.clone(),
        });
        Some(self.task(node))
    }

    fn task(&self, node: NodeHandle) -> FetchTask {
        FetchTask {
            controller: self.controller.clone(),
            node,
            query: self.query(),
        }
    }

    fn validate(&self) {
        let mut props = vec![
            ("client", self.client.is_some()),
            ("node_id", !self.node_id.trim().is_empty()),
            ("variable", !self.variable.trim().is_empty()),
        ];
        if self.kind == WidgetKind::Chart {
            props.push(("from", self.range.from.is_some()));
            props.push(("to", self.range.to.is_some()));
        }
        validate_required(self.kind.name(), &props);
    }
}

impl Drop for WidgetBinding {
    fn drop(&mut self) {
        self.controller.unmount();
    }
}

impl fmt::Debug for WidgetBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WidgetBinding")
            .field("kind", &self.kind)
            .field("node_id", &self.node_id)
            .field("variable", &self.variable)
            .field("resolved", &self.node.is_some())
            .field("controller", &self.controller)
            .finish()
    }
}
