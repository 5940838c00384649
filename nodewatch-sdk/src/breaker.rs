//! Consecutive-failure circuit breaker.
//!
//! Unlike a service-level breaker there is no half-open probe: once tripped
//! the breaker stays open for the lifetime of the controller that owns it.
//! A new controller (a remounted widget) starts with a closed breaker.

/// Failures tolerated before the breaker trips.
pub const DEFAULT_MAX_FAILURES: u32 = 3;

/// Failure accounting for one widget instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CircuitState {
    pub consecutive_failures: u32,
    pub max_failures: u32,
    pub tripped: bool,
}

impl CircuitState {
    /// Create a closed breaker that trips after `max_failures` failures.
    ///
    /// A threshold of zero is treated as one.
    pub fn new(max_failures: u32) -> Self {
        Self {
            consecutive_failures: 0,
            max_failures: max_failures.max(1),
            tripped: false,
        }
    }

    /// Whether new attempts are blocked.
    pub fn is_tripped(&self) -> bool {
        self.tripped
    }

    /// Reset the failure count. Has no effect on a tripped breaker.
    pub fn record_success(&mut self) {
        self.consecutive_failures = 0;
    }

    /// Count a failure. Returns `true` if this failure tripped the breaker.
    pub fn record_failure(&mut self) -> bool {
        if self.tripped {
            return false;
        }
        self.consecutive_failures += 1;
        if self.consecutive_failures >= self.max_failures {
            self.tripped = true;
            return true;
        }
        false
    }
}

impl Default for CircuitState {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_FAILURES)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trips_at_threshold() {
        let mut circuit = CircuitState::default();
        assert!(!circuit.record_failure());
        assert!(!circuit.record_failure());
        assert!(circuit.record_failure());
        assert!(circuit.is_tripped());
        assert_eq!(circuit.consecutive_failures, 3);
    }

    #[test]
    fn test_success_resets_count() {
        let mut circuit = CircuitState::default();
        circuit.record_failure();
        circuit.record_failure();
        circuit.record_success();
        assert_eq!(circuit.consecutive_failures, 0);
        assert!(!circuit.record_failure());
        assert!(!circuit.is_tripped());
    }

    #[test]
    fn test_tripped_is_permanent() {
        let mut circuit = CircuitState::new(1);
        assert!(circuit.record_failure());
        circuit.record_success();
        assert!(circuit.is_tripped());
        assert!(!circuit.record_failure());
    }

    #[test]
    fn test_zero_threshold() {
        let circuit = CircuitState::new(0);
        assert_eq!(circuit.max_failures, 1);
    }
}
