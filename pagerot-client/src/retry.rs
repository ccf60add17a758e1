use crate::error::ErrorKind;
use std::time::Duration;

/// Bounded exponential backoff. Pure decision logic; the fetcher performs
/// the actual sleep, so this stays unit-testable without real time passing.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    /// Decide whether to retry after the given failed attempt (1-based).
    /// Returns the delay to wait before the next attempt, or `None` to
    /// give up. Delay doubles per attempt and caps at `max_delay`.
    pub fn decide(&self, attempt: u32, kind: ErrorKind) -> Option<Duration> {
        if !kind.is_transient() || attempt >= self.max_attempts {
            return None;
        }
        let exponent = attempt.saturating_sub(1).min(16);
        let delay = self.base_delay.saturating_mul(1u32 << exponent);
        Some(delay.min(self.max_delay))
    }
}
