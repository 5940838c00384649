//! Error types for adapters.

use thiserror::Error;

/// Errors that can occur when a node call fails outright.
#[derive(Debug, Error)]
pub enum AdapterError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(String),

    /// Failed to parse response.
    #[error("Failed to parse response: {0}")]
    Parse(String),

    /// Authentication failed.
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Connection failed.
    #[error("Connection failed: {0}")]
    Connection(String),

    /// Timeout waiting for response.
    #[error("timeout")]
    Timeout,

    /// The request was rejected before being sent.
    #[error("Invalid request: {0}")]
    InvalidRequest(#[from] nodewatch_types::RequestError),
}

#[cfg(feature = "http")]
impl From<reqwest::Error> for AdapterError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            AdapterError::Timeout
        } else if err.is_connect() {
            AdapterError::Connection(err.to_string())
        } else if err.is_decode() {
            AdapterError::Parse(err.to_string())
        } else {
            AdapterError::Http(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nodewatch_types::RequestError;

    #[test]
    fn test_timeout_message() {
        assert_eq!(AdapterError::Timeout.to_string(), "timeout");
    }

    #[test]
    fn test_request_error_converts() {
        let err: AdapterError = RequestError::ZeroLimit.into();
        assert_eq!(
            err.to_string(),
            "Invalid request: limit must be greater than zero"
        );
    }
}
