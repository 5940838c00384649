//! Historical data requests.

use alloc::string::String;
use core::fmt;

/// Sort order for a range query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Order {
    /// Oldest sample first.
    #[default]
    Asc,
    /// Newest sample first.
    Desc,
}

impl Order {
    /// Wire name of the order.
    pub fn as_str(&self) -> &'static str {
        match self {
            Order::Asc => "asc",
            Order::Desc => "desc",
        }
    }
}

/// A request for a range of samples of one variable.
///
/// Invariant: `from <= to` when both bounds are present. Use
/// [`FetchRequest::builder`] or [`FetchRequest::validate`] to enforce it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FetchRequest {
    /// Variable identifier, e.g. `"humidity"`.
    pub variable: String,

    /// Inclusive lower bound (Unix timestamp).
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub from: Option<i64>,

    /// Inclusive upper bound (Unix timestamp).
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub to: Option<i64>,

    /// Maximum number of samples to return.
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub limit: Option<usize>,

    /// Sort order of the returned samples.
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub order: Option<Order>,
}

impl FetchRequest {
    /// Create an unbounded request for a variable.
    pub fn new(variable: impl Into<String>) -> Self {
        Self {
            variable: variable.into(),
            from: None,
            to: None,
            limit: None,
            order: None,
        }
    }

    /// Create a builder for a request on `variable`.
    pub fn builder(variable: impl Into<String>) -> FetchRequestBuilder {
        FetchRequestBuilder {
            request: Self::new(variable),
        }
    }

    /// Check the request invariants.
    pub fn validate(&self) -> Result<(), RequestError> {
        if self.variable.trim().is_empty() {
            return Err(RequestError::MissingVariable);
        }
        if let (Some(from), Some(to)) = (self.from, self.to) {
            if from > to {
                return Err(RequestError::InvertedRange { from, to });
            }
        }
        if self.limit == Some(0) {
            return Err(RequestError::ZeroLimit);
        }
        Ok(())
    }
}

/// Builder for [`FetchRequest`].
#[derive(Debug, Clone)]
pub struct FetchRequestBuilder {
    request: FetchRequest,
}

impl FetchRequestBuilder {
    /// Set the lower bound.
    pub fn from(mut self, from: i64) -> Self {
        self.request.from = Some(from);
        self
    }

    /// Set the upper bound.
    pub fn to(mut self, to: i64) -> Self {
        self.request.to = Some(to);
        self
    }

    /// Set both bounds.
    pub fn range(self, from: i64, to: i64) -> Self {
        self.from(from).to(to)
    }

    /// Set the maximum number of samples.
    pub fn limit(mut self, limit: usize) -> Self {
        self.request.limit = Some(limit);
        self
    }

    /// Set the sort order.
    pub fn order(mut self, order: Order) -> Self {
        self.request.order = Some(order);
        self
    }

    /// Validate and build the request.
    pub fn build(self) -> Result<FetchRequest, RequestError> {
        self.request.validate()?;
        Ok(self.request)
    }
}

/// Reasons a [`FetchRequest`] is rejected before it reaches a backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestError {
    /// The variable identifier is empty.
    MissingVariable,
    /// `from` is later than `to`.
    InvertedRange { from: i64, to: i64 },
    /// A limit of zero can never return data.
    ZeroLimit,
}

impl fmt::Display for RequestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestError::MissingVariable => write!(f, "variable identifier is empty"),
            RequestError::InvertedRange { from, to } => {
                write!(f, "invalid range: from ({}) is after to ({})", from, to)
            }
            RequestError::ZeroLimit => write!(f, "limit must be greater than zero"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for RequestError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_sets_fields() {
        let req = FetchRequest::builder("temperature")
            .range(10, 20)
            .limit(5)
            .order(Order::Desc)
            .build()
            .unwrap();

        assert_eq!(req.variable, "temperature");
        assert_eq!(req.from, Some(10));
        assert_eq!(req.to, Some(20));
        assert_eq!(req.limit, Some(5));
        assert_eq!(req.order, Some(Order::Desc));
    }

    #[test]
    fn test_inverted_range_rejected() {
        let err = FetchRequest::builder("t").range(20, 10).build().unwrap_err();
        assert_eq!(err, RequestError::InvertedRange { from: 20, to: 10 });
    }

    #[test]
    fn test_equal_bounds_allowed() {
        assert!(FetchRequest::builder("t").range(10, 10).build().is_ok());
    }

    #[test]
    fn test_single_bound_allowed() {
        assert!(FetchRequest::builder("t").from(10).build().is_ok());
        assert!(FetchRequest::builder("t").to(10).build().is_ok());
    }

    #[test]
    fn test_empty_variable_rejected() {
        assert_eq!(
            FetchRequest::new("  ").validate(),
            Err(RequestError::MissingVariable)
        );
    }

    #[test]
    fn test_zero_limit_rejected() {
        let err = FetchRequest::builder("t").limit(0).build().unwrap_err();
        assert_eq!(err, RequestError::ZeroLimit);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_serde_wire_shape() {
        let req = FetchRequest::builder("humidity")
            .range(1, 2)
            .order(Order::Asc)
            .build()
            .unwrap();
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["order"], "asc");
        assert!(json.get("limit").is_none());
    }
}
