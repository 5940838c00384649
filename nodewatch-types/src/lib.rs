//! # nodewatch-types
//!
//! Core types shared by the nodewatch crates. This crate defines the data
//! model that flows from a telemetry backend, through a widget's fetch
//! controller, to whatever presentation layer renders it.
//!
//! ## Design Goals
//!
//! - **Zero required dependencies**: Core types work without any serialization framework
//! - **Optional serialization**: Enable the `serde` feature to (de)serialize backend
//!   responses using the wire names (`isSuccess`, `isDataAvailable`, ...)
//! - **Backend agnostic**: Any backend that can answer "give me the latest value"
//!   and "give me a range of values" fits the model
//!
//! ## Features
//!
//! - `std` (default): Standard library support
//! - `serde`: JSON serialization via serde
//!
//! ## Example
//!
//! ```rust
//! use nodewatch_types::{DataPoint, FetchRequest, FetchResult, NodeResponse, Order, Payload};
//!
//! let request = FetchRequest::builder("humidity")
//!     .range(1_700_000_000_000, 1_700_000_600_000)
//!     .limit(100)
//!     .order(Order::Asc)
//!     .build()
//!     .unwrap();
//! assert_eq!(request.limit, Some(100));
//!
//! let response = NodeResponse::success(Payload::Series(vec![
//!     DataPoint::new(1_700_000_000_000, 42.0),
//! ]));
//! assert!(matches!(FetchResult::from_response(response), FetchResult::Success(_)));
//! ```

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

mod point;
mod request;
mod response;
mod state;

pub use point::*;
pub use request::*;
pub use response::*;
pub use state::*;

/// Message stored in [`RenderState::error`] when the backend was reachable
/// but had nothing to return.
pub const NO_DATA_MESSAGE: &str = "No data available";
