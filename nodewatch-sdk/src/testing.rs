//! Scripted backend shared by the controller and binding tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::Semaphore;

use nodewatch_adapters::{AdapterError, Backend, TelemetryNode};
use nodewatch_types::{DataPoint, FetchRequest, NodeResponse, Payload};

use crate::client::Client;

#[derive(Debug, Clone)]
pub enum Reply {
    Respond(NodeResponse),
    Timeout,
}

impl Reply {
    pub fn point(value: f64) -> Self {
        Reply::Respond(NodeResponse::success(Payload::Point(DataPoint::new(
            1_700_000_000_000,
            value,
        ))))
    }

    fn into_result(self) -> Result<NodeResponse, AdapterError> {
        match self {
            Reply::Respond(response) => Ok(response),
            Reply::Timeout => Err(AdapterError::Timeout),
        }
    }
}

#[derive(Debug)]
struct Script {
    replies: Mutex<VecDeque<Reply>>,
    fallback: Mutex<Reply>,
    gate: Option<Semaphore>,
    calls: AtomicUsize,
    nodes: Mutex<Vec<String>>,
    variables: Mutex<Vec<String>>,
}

/// Backend whose replies are queued by the test. When gated, every call
/// blocks until [`ScriptedBackend::release`] hands out a permit.
#[derive(Debug, Clone)]
pub struct ScriptedBackend {
    script: Arc<Script>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::build(None)
    }

    pub fn gated() -> Self {
        Self::build(Some(Semaphore::new(0)))
    }

    fn build(gate: Option<Semaphore>) -> Self {
        Self {
            script: Arc::new(Script {
                replies: Mutex::new(VecDeque::new()),
                fallback: Mutex::new(Reply::point(1.0)),
                gate,
                calls: AtomicUsize::new(0),
                nodes: Mutex::new(Vec::new()),
                variables: Mutex::new(Vec::new()),
            }),
        }
    }

    pub fn push(&self, reply: Reply) {
        self.script.replies.lock().push_back(reply);
    }

    /// Reply used once the queue is empty.
    pub fn always(&self, reply: Reply) {
        *self.script.fallback.lock() = reply;
    }

    pub fn release(&self, calls: usize) {
        if let Some(gate) = &self.script.gate {
            gate.add_permits(calls);
        }
    }

    pub fn calls(&self) -> usize {
        self.script.calls.load(Ordering::SeqCst)
    }

    /// Node ids handed out by `new_node`, in order.
    pub fn created_nodes(&self) -> Vec<String> {
        self.script.nodes.lock().clone()
    }

    /// Variables queried, in call order.
    pub fn queried(&self) -> Vec<String> {
        self.script.variables.lock().clone()
    }

    /// Client over this backend with rate limiting disabled.
    pub fn client(&self) -> Arc<Client> {
        Client::builder()
            .backend(self.clone())
            .rate_limit(Duration::ZERO)
            .build()
            .unwrap()
    }
}

impl Backend for ScriptedBackend {
    fn new_node(&self, node_id: &str) -> Arc<dyn TelemetryNode> {
        self.script.nodes.lock().push(node_id.to_string());
        Arc::new(ScriptedNode {
            script: self.script.clone(),
            node_id: node_id.to_string(),
        })
    }

    fn description(&self) -> &str {
        "scripted"
    }
}

#[derive(Debug)]
struct ScriptedNode {
    script: Arc<Script>,
    node_id: String,
}

impl ScriptedNode {
    async fn next(&self, variable: &str) -> Result<NodeResponse, AdapterError> {
        self.script.calls.fetch_add(1, Ordering::SeqCst);
        self.script.variables.lock().push(variable.to_string());
        if let Some(gate) = &self.script.gate {
            gate.acquire().await.unwrap().forget();
        }
        let queued = self.script.replies.lock().pop_front();
        queued
            .unwrap_or_else(|| self.script.fallback.lock().clone())
            .into_result()
    }
}

#[async_trait]
impl TelemetryNode for ScriptedNode {
    fn node_id(&self) -> &str {
        &self.node_id
    }

    async fn get_data(&self, request: &FetchRequest) -> Result<NodeResponse, AdapterError> {
        self.next(&request.variable).await
    }

    async fn get_latest_data(&self, variable: &str) -> Result<NodeResponse, AdapterError> {
        self.next(variable).await
    }
}
