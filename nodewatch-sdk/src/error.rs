//! Error types for the SDK.

use thiserror::Error;

use nodewatch_adapters::AdapterError;

/// Errors surfaced by client setup.
///
/// Fetch failures never appear here: they are folded into the widget's
/// [`RenderState`](nodewatch_types::RenderState) by the controller.
#[derive(Debug, Error)]
pub enum SdkError {
    /// `get_client` was called before a global client was stored.
    #[error("client not initialized; call init_client first")]
    NotInitialized,

    /// The client builder was not given a backend.
    #[error("no backend configured")]
    MissingBackend,

    /// Credentials were empty.
    #[error("missing credentials: {0}")]
    MissingCredentials(&'static str),

    /// Constructing the backend failed.
    #[error(transparent)]
    Adapter(#[from] AdapterError),
}
