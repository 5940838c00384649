//! Node handles and node resolution.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, error};

use nodewatch_adapters::{AdapterError, TelemetryNode};
use nodewatch_types::{FetchRequest, NodeResponse};

use crate::client::Client;

/// A rate-limited data-access handle bound to one `(client, node_id)` pair.
///
/// Cloning is cheap. Two handles refer to the same node when they were
/// created by the same client for the same id (see [`NodeHandle::same_node`]).
#[derive(Clone)]
pub struct NodeHandle {
    client: Arc<Client>,
    node: Arc<dyn TelemetryNode>,
    node_id: Arc<str>,
}

impl NodeHandle {
    pub(crate) fn new(client: Arc<Client>, node: Arc<dyn TelemetryNode>, node_id: &str) -> Self {
        Self {
            client,
            node,
            node_id: Arc::from(node_id),
        }
    }

    /// The node identifier.
    pub fn node_id(&self) -> &str {
        &self.node_id
    }

    /// The client that created this handle.
    pub fn client(&self) -> &Arc<Client> {
        &self.client
    }

    /// Whether both handles refer to the same node of the same client.
    pub fn same_node(&self, other: &NodeHandle) -> bool {
        Arc::ptr_eq(&self.client, &other.client) && self.node_id == other.node_id
    }

    /// Fetch a range of samples, waiting for the node's rate limit first.
    pub async fn get_data(&self, request: &FetchRequest) -> Result<NodeResponse, AdapterError> {
        request.validate()?;
        self.throttle().await;
        self.dispatch_data(request).await
    }

    /// Fetch the latest sample of `variable`, waiting for the node's rate
    /// limit first.
    pub async fn get_latest_data(&self, variable: &str) -> Result<NodeResponse, AdapterError> {
        self.throttle().await;
        self.dispatch_latest(variable).await
    }

    /// Wait for this node's next dispatch slot.
    pub(crate) async fn throttle(&self) {
        self.client.limiter().wait(&self.node_id).await;
    }

    /// Call the backend without consulting the rate limiter.
    pub(crate) async fn dispatch_data(
        &self,
        request: &FetchRequest,
    ) -> Result<NodeResponse, AdapterError> {
        self.node.get_data(request).await.inspect_err(|err| {
            error!(node_id = %self.node_id, error = %err, "API call failed");
        })
    }

    pub(crate) async fn dispatch_latest(&self, variable: &str) -> Result<NodeResponse, AdapterError> {
        self.node.get_latest_data(variable).await.inspect_err(|err| {
            error!(node_id = %self.node_id, error = %err, "API call failed");
        })
    }
}

impl fmt::Debug for NodeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeHandle")
            .field("node_id", &self.node_id)
            .field("backend", &self.client.backend().description())
            .finish()
    }
}

/// Resolve a node handle from a client and a node id.
///
/// Returns `None` when the client is absent or the id is empty. There is
/// no retry and no cache: callers keep the handle they were given.
pub fn resolve(client: Option<&Arc<Client>>, node_id: &str) -> Option<NodeHandle> {
    let client = client?;
    if node_id.trim().is_empty() {
        debug!("Empty node id, not resolving");
        return None;
    }
    Some(client.new_node(node_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use nodewatch_adapters::sim::SimulatedBackend;
    use tokio::time::Instant;

    fn client(rate_limit_ms: u64) -> Arc<Client> {
        Client::builder()
            .backend(SimulatedBackend::builder().build())
            .rate_limit(Duration::from_millis(rate_limit_ms))
            .build()
            .unwrap()
    }

    #[test]
    fn test_resolve_requires_client_and_id() {
        let c = client(100);
        assert!(resolve(None, "n1").is_none());
        assert!(resolve(Some(&c), "").is_none());
        assert!(resolve(Some(&c), "   ").is_none());
        assert_eq!(resolve(Some(&c), "n1").unwrap().node_id(), "n1");
    }

    #[test]
    fn test_same_node_identity() {
        let a = client(100);
        let b = client(100);
        let n1 = resolve(Some(&a), "n1").unwrap();

        assert!(n1.same_node(&resolve(Some(&a), "n1").unwrap()));
        assert!(!n1.same_node(&resolve(Some(&a), "n2").unwrap()));
        assert!(!n1.same_node(&resolve(Some(&b), "n1").unwrap()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_latest_calls_are_spaced() {
        let c = client(100);
        let node = resolve(Some(&c), "n1").unwrap();

        let mut dispatched = Vec::new();
        for _ in 0..5 {
            node.get_latest_data("temperature").await.unwrap();
            dispatched.push(Instant::now());
        }

        for pair in dispatched.windows(2) {
            assert!(pair[1] - pair[0] >= Duration::from_millis(100));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_range_and_latest_share_a_limiter() {
        let c = client(100);
        let node = resolve(Some(&c), "n1").unwrap();
        let start = Instant::now();

        node.get_latest_data("t").await.unwrap();
        node.get_data(&FetchRequest::new("t")).await.unwrap();

        assert!(start.elapsed() >= Duration::from_millis(100));
    }

    #[tokio::test]
    async fn test_invalid_request_skips_limiter() {
        let c = client(100);
        let node = resolve(Some(&c), "n1").unwrap();
        let mut request = FetchRequest::new("t");
        request.limit = Some(0);

        assert!(node.get_data(&request).await.is_err());
        assert!(c.limiter().entry("n1").is_none());
    }
}
