//! Consecutive-failure circuit breaker
//!
//! Counts terminal (post-retry) date failures across a run. Any date success
//! resets the streak; reaching the threshold trips the breaker and the run
//! stops. The breaker never inspects why a date failed - its premise is
//! sustained systemic unavailability, not isolated bad dates - so it only
//! counts.
//!
//! The breaker is an explicit state object owned by the pipeline's run
//! context, never a module-level singleton.

/// Consecutive date-level failure counter with a fixed trip threshold.
#[derive(Debug, Clone)]
pub struct CircuitBreaker {
    threshold: u32,
    consecutive_failures: u32,
}

impl CircuitBreaker {
    /// Create a breaker that trips at `threshold` consecutive failures.
    pub fn new(threshold: u32) -> Self {
        Self {
            threshold,
            consecutive_failures: 0,
        }
    }

    /// Record one terminal date outcome. Success resets the streak to zero;
    /// failure extends it by one.
    pub fn record_outcome(&mut self, success: bool) {
        if success {
            self.consecutive_failures = 0;
        } else {
            self.consecutive_failures += 1;
        }
    }

    /// Whether the failure streak has reached the trip threshold.
    pub fn is_tripped(&self) -> bool {
        self.consecutive_failures >= self.threshold
    }

    /// Current consecutive-failure count.
    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    /// The configured trip threshold.
    pub fn threshold(&self) -> u32 {
        self.threshold
    }
}
