//! Client initialisation and the optional process-global client.

use std::convert::Infallible;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tracing::{debug, info};

use nodewatch_adapters::Backend;

use crate::error::SdkError;
use crate::node::NodeHandle;
use crate::rate_limit::{RateLimiterRegistry, DEFAULT_RATE_LIMIT};

static GLOBAL_CLIENT: Mutex<Option<Arc<Client>>> = parking_lot::const_mutex(None);

/// Options for [`init_client`] and [`init_client_with`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InitOptions {
    /// Store the client in the process-global slot. If a global client
    /// already exists it is returned instead of building a new one.
    pub use_global: bool,
    /// Build a new client even when a global one exists.
    pub force_reinit: bool,
    /// Minimum interval between calls to the same node.
    pub rate_limit: Duration,
}

impl Default for InitOptions {
    fn default() -> Self {
        Self {
            use_global: false,
            force_reinit: false,
            rate_limit: DEFAULT_RATE_LIMIT,
        }
    }
}

/// A configured backend plus the per-node rate limiters shared by every
/// node handle it creates.
///
/// # Example
///
/// ```rust
/// use std::time::Duration;
/// use nodewatch_adapters::sim::SimulatedBackend;
/// use nodewatch_sdk::Client;
///
/// let client = Client::builder()
///     .backend(SimulatedBackend::builder().build())
///     .rate_limit(Duration::from_millis(250))
///     .build()
///     .unwrap();
/// let node = client.new_node("greenhouse-1");
/// assert_eq!(node.node_id(), "greenhouse-1");
/// ```
pub struct Client {
    backend: Arc<dyn Backend>,
    limiter: Arc<RateLimiterRegistry>,
}

impl Client {
    /// Create a builder for configuring the client.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::default()
    }

    /// The backend serving this client's nodes.
    pub fn backend(&self) -> &Arc<dyn Backend> {
        &self.backend
    }

    /// The rate limiter registry used by this client's nodes.
    pub fn limiter(&self) -> &Arc<RateLimiterRegistry> {
        &self.limiter
    }

    /// Create a rate-limited handle for `node_id`.
    pub fn new_node(self: &Arc<Self>, node_id: &str) -> NodeHandle {
        NodeHandle::new(self.clone(), self.backend.new_node(node_id), node_id)
    }
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("backend", &self.backend.description())
            .field("rate_limit", &self.limiter.default_interval())
            .field("tracked_nodes", &self.limiter.len())
            .finish()
    }
}

/// Builder for [`Client`].
#[derive(Default)]
pub struct ClientBuilder {
    backend: Option<Arc<dyn Backend>>,
    rate_limit: Option<Duration>,
    limiter: Option<Arc<RateLimiterRegistry>>,
}

impl ClientBuilder {
    /// Set the backend.
    pub fn backend(self, backend: impl Backend + 'static) -> Self {
        self.shared_backend(Arc::new(backend))
    }

    /// Set an already shared backend.
    pub fn shared_backend(mut self, backend: Arc<dyn Backend>) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Set the default per-node interval (default: 100ms).
    ///
    /// Ignored when a shared limiter is supplied.
    pub fn rate_limit(mut self, rate_limit: Duration) -> Self {
        self.rate_limit = Some(rate_limit);
        self
    }

    /// Share a limiter registry with other clients.
    pub fn limiter(mut self, limiter: Arc<RateLimiterRegistry>) -> Self {
        self.limiter = Some(limiter);
        self
    }

    /// Build the client.
    pub fn build(self) -> Result<Arc<Client>, SdkError> {
        let backend = self.backend.ok_or(SdkError::MissingBackend)?;
        let limiter = self.limiter.unwrap_or_else(|| {
            Arc::new(RateLimiterRegistry::new(
                self.rate_limit.unwrap_or(DEFAULT_RATE_LIMIT),
            ))
        });
        Ok(Arc::new(Client { backend, limiter }))
    }
}

/// Initialise a client over `backend`, honouring the global-slot options.
pub fn init_client_with(backend: Arc<dyn Backend>, options: InitOptions) -> Arc<Client> {
    let built = init(options, || {
        Ok::<_, Infallible>(Arc::new(Client {
            backend,
            limiter: Arc::new(RateLimiterRegistry::new(options.rate_limit)),
        }))
    });
    match built {
        Ok(client) => client,
        Err(never) => match never {},
    }
}

/// Initialise a client for the telemetry platform's HTTP API.
///
/// When `options.use_global` is set and a global client exists, it is
/// returned without checking the credentials.
#[cfg(feature = "http")]
pub fn init_client(
    token_id: &str,
    token: &str,
    options: InitOptions,
) -> Result<Arc<Client>, SdkError> {
    use nodewatch_adapters::http::HttpBackend;

    init(options, || {
        if token_id.trim().is_empty() {
            return Err(SdkError::MissingCredentials("token_id"));
        }
        if token.trim().is_empty() {
            return Err(SdkError::MissingCredentials("token"));
        }
        let backend = HttpBackend::builder()
            .credentials(token_id, token)
            .build()?;
        Client::builder()
            .backend(backend)
            .rate_limit(options.rate_limit)
            .build()
    })
}

fn init<E>(
    options: InitOptions,
    build: impl FnOnce() -> Result<Arc<Client>, E>,
) -> Result<Arc<Client>, E> {
    let mut global = GLOBAL_CLIENT.lock();

    if options.use_global && !options.force_reinit {
        if let Some(client) = global.as_ref() {
            debug!("Reusing global client");
            return Ok(client.clone());
        }
    }

    let client = build()?;
    info!(
        backend = client.backend.description(),
        rate_limit_ms = options.rate_limit.as_millis() as u64,
        global = options.use_global,
        "Client initialised"
    );

    if options.use_global {
        *global = Some(client.clone());
    }
    Ok(client)
}

/// The global client stored by an `init_*` call with `use_global`.
pub fn get_client() -> Result<Arc<Client>, SdkError> {
    GLOBAL_CLIENT.lock().clone().ok_or(SdkError::NotInitialized)
}

/// Clear the global client (logout, credential change).
pub fn reset_client() {
    if GLOBAL_CLIENT.lock().take().is_some() {
        info!("Global client reset");
    }
}
