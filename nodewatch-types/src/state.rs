//! The observable state of one widget.

use alloc::string::String;
use alloc::vec::Vec;

use crate::DataPoint;

/// The value a widget displays.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum WidgetValue {
    /// A single number (readout, gauge).
    Scalar(f64),
    /// A time series (chart).
    Series(Vec<DataPoint>),
}

impl WidgetValue {
    /// The scalar value, if this is a scalar.
    pub fn as_scalar(&self) -> Option<f64> {
        match self {
            WidgetValue::Scalar(v) => Some(*v),
            WidgetValue::Series(_) => None,
        }
    }

    /// The series, if this is a series.
    pub fn as_series(&self) -> Option<&[DataPoint]> {
        match self {
            WidgetValue::Scalar(_) => None,
            WidgetValue::Series(points) => Some(points),
        }
    }
}

/// Snapshot of a widget's data state, consumed by presentation code.
///
/// `loading` is true only while a fetch is in flight. `error` holds the
/// message of the last failed attempt and is cleared when a new attempt
/// starts.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RenderState {
    /// Current value, if any.
    pub value: Option<WidgetValue>,
    /// Whether a fetch is in flight.
    pub loading: bool,
    /// Message of the last failure.
    pub error: Option<String>,
}

impl RenderState {
    /// Initial state: nothing loaded, nothing failed.
    pub fn idle() -> Self {
        Self::default()
    }

    /// Whether the widget should show its placeholder.
    pub fn is_placeholder(&self) -> bool {
        !self.loading && self.error.is_none() && self.value.is_none()
    }

    /// Scalar value shortcut.
    pub fn scalar(&self) -> Option<f64> {
        self.value.as_ref().and_then(WidgetValue::as_scalar)
    }

    /// Series shortcut; empty when there is no series.
    pub fn series(&self) -> &[DataPoint] {
        self.value
            .as_ref()
            .and_then(WidgetValue::as_series)
            .unwrap_or(&[])
    }
}
