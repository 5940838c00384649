//! Backend responses and their classification.

use alloc::string::{String, ToString};
use alloc::vec::Vec;

use crate::DataPoint;

/// Data carried by a successful response.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum Payload {
    /// A single sample, as returned by a "latest value" query.
    Point(DataPoint),
    /// A series of samples, as returned by a range query.
    Series(Vec<DataPoint>),
}

impl Payload {
    /// The most recent sample in the payload, if any.
    ///
    /// For a series this is the sample with the highest timestamp, so it
    /// does not depend on the requested order.
    pub fn latest(&self) -> Option<DataPoint> {
        match self {
            Payload::Point(p) => Some(*p),
            Payload::Series(points) => points.iter().copied().max_by_key(|p| p.timestamp_ms()),
        }
    }

    /// The payload as a series (a single point becomes a one-element series).
    pub fn into_series(self) -> Vec<DataPoint> {
        match self {
            Payload::Point(p) => alloc::vec![p],
            Payload::Series(points) => points,
        }
    }
}

/// Error details attached to an unsuccessful response.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct ApiError {
    /// Human-readable reason reported by the backend.
    pub error_message: String,
}

/// A response from a telemetry node.
///
/// This is the backend-neutral shape every adapter produces:
/// `{ isSuccess, isDataAvailable, data?, error?: { errorMessage } }`.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct NodeResponse {
    /// Whether the backend processed the request.
    pub is_success: bool,

    /// Whether any data matched the request.
    #[cfg_attr(feature = "serde", serde(default))]
    pub is_data_available: bool,

    /// Returned samples.
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub data: Option<Payload>,

    /// Error details when `is_success` is false.
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub error: Option<ApiError>,
}

impl NodeResponse {
    /// A successful response carrying data.
    pub fn success(data: Payload) -> Self {
        Self {
            is_success: true,
            is_data_available: true,
            data: Some(data),
            error: None,
        }
    }

    /// A successful response with no matching data.
    pub fn empty() -> Self {
        Self {
            is_success: true,
            is_data_available: false,
            data: None,
            error: None,
        }
    }

    /// An unsuccessful response with an error message.
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            is_success: false,
            is_data_available: false,
            data: None,
            error: Some(ApiError {
                error_message: message.into(),
            }),
        }
    }
}

/// Outcome of one fetch, as seen by a widget.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchResult {
    /// Data was returned.
    Success(Payload),
    /// The backend was reachable but had no data.
    Empty,
    /// The backend explicitly reported an error.
    Error(String),
}

impl FetchResult {
    /// Classify a backend response.
    ///
    /// A response flagged successful but lacking either the availability
    /// flag or a payload is `Empty`. An unsuccessful response becomes
    /// `Error` with the backend's message, falling back to a generic one.
    pub fn from_response(response: NodeResponse) -> Self {
        if !response.is_success {
            let message = response
                .error
                .map(|e| e.error_message)
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| "Request failed".to_string());
            return FetchResult::Error(message);
        }

        match response.data {
            Some(data) if response.is_data_available && !is_empty_series(&data) => {
                FetchResult::Success(data)
            }
            _ => FetchResult::Empty,
        }
    }
}

impl From<NodeResponse> for FetchResult {
    fn from(response: NodeResponse) -> Self {
        Self::from_response(response)
    }
}

fn is_empty_series(payload: &Payload) -> bool {
    matches!(payload, Payload::Series(points) if points.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_with_data() {
        let resp = NodeResponse::success(Payload::Point(DataPoint::new(1, 42.0)));
        assert_eq!(
            FetchResult::from_response(resp),
            FetchResult::Success(Payload::Point(DataPoint::new(1, 42.0)))
        );
    }

    #[test]
    fn test_success_without_availability_is_empty() {
        let resp = NodeResponse {
            is_success: true,
            is_data_available: false,
            data: Some(Payload::Point(DataPoint::new(1, 1.0))),
            error: None,
        };
        assert_eq!(FetchResult::from_response(resp), FetchResult::Empty);
    }

    #[test]
    fn test_empty_series_is_empty() {
        let resp = NodeResponse::success(Payload::Series(Vec::new()));
        assert_eq!(FetchResult::from_response(resp), FetchResult::Empty);
    }

    #[test]
    fn test_failure_keeps_message() {
        let resp = NodeResponse::failure("variable not found");
        assert_eq!(
            FetchResult::from_response(resp),
            FetchResult::Error("variable not found".to_string())
        );
    }

    #[test]
    fn test_failure_without_message_gets_default() {
        let resp = NodeResponse {
            is_success: false,
            ..Default::default()
        };
        assert_eq!(
            FetchResult::from_response(resp),
            FetchResult::Error("Request failed".to_string())
        );
    }

    #[test]
    fn test_latest_picks_newest_regardless_of_order() {
        let payload = Payload::Series(alloc::vec![
            DataPoint::new(3_000, 3.0),
            DataPoint::new(1_000, 1.0),
        ]);
        assert_eq!(payload.latest(), Some(DataPoint::new(3_000, 3.0)));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_deserialize_wire_names() {
        let json = r#"{
            "isSuccess": true,
            "isDataAvailable": true,
            "data": [{"timestamp": 1700000000000, "value": 42}]
        }"#;
        let resp: NodeResponse = serde_json::from_str(json).unwrap();
        assert!(resp.is_success);
        assert_eq!(
            resp.data,
            Some(Payload::Series(alloc::vec![DataPoint::new(1_700_000_000_000, 42.0)]))
        );
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_deserialize_error_payload() {
        let json = r#"{"isSuccess": false, "error": {"errorMessage": "bad token"}}"#;
        let resp: NodeResponse = serde_json::from_str(json).unwrap();
        assert_eq!(
            FetchResult::from_response(resp),
            FetchResult::Error("bad token".to_string())
        );
    }
}
