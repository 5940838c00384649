//! A single telemetry sample.

/// Timestamps below this value are treated as seconds rather than milliseconds.
pub const SECONDS_THRESHOLD: i64 = 1_000_000_000_000;

/// One sample of a variable: a timestamp and a numeric value.
///
/// Backends are inconsistent about timestamp units, so the raw value is kept
/// as received and [`DataPoint::timestamp_ms`] normalises it.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DataPoint {
    /// Unix timestamp, in seconds or milliseconds.
    pub timestamp: i64,
    /// Sampled value.
    pub value: f64,
}

impl DataPoint {
    /// Create a new data point.
    pub const fn new(timestamp: i64, value: f64) -> Self {
        Self { timestamp, value }
    }

    /// Timestamp in milliseconds since the Unix epoch.
    ///
    /// Values below [`SECONDS_THRESHOLD`] are assumed to be seconds.
    pub fn timestamp_ms(&self) -> i64 {
        if self.timestamp < SECONDS_THRESHOLD {
            self.timestamp.saturating_mul(1000)
        } else {
            self.timestamp
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_millisecond_timestamp_kept() {
        let p = DataPoint::new(1_700_000_000_000, 1.0);
        assert_eq!(p.timestamp_ms(), 1_700_000_000_000);
    }

    #[test]
    fn test_second_timestamp_scaled() {
        let p = DataPoint::new(1_700_000_000, 1.0);
        assert_eq!(p.timestamp_ms(), 1_700_000_000_000);
    }
}
