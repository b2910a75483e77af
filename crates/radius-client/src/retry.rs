//! Retransmission strategies
//!
//! A strategy drives the attempt schedule of the retransmission controller:
//! how many times a request goes onto the wire and how long each attempt
//! waits for a reply. Schedules need not be monotonic; both constant and
//! exponential spacing work.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Fixed wall-clock slack added to the sum of per-attempt timeouts, covering
/// connection establishment and reconnect delays
const TOTAL_TIMEOUT_OVERHEAD: Duration = Duration::from_secs(5);

/// Attempt schedule for one logical request
pub trait RetransmissionStrategy: Send + Sync {
    /// Number of transmission attempts; must be positive
    fn max_attempts(&self) -> usize;

    /// Per-attempt response timeout, zero-based attempt index
    fn timeout_for_attempt(&self, attempt: usize) -> Duration;

    /// Total wall-clock budget for one logical request: the sum of all
    /// per-attempt timeouts plus a fixed overhead allowance
    fn total_timeout(&self) -> Duration {
        let mut total = TOTAL_TIMEOUT_OVERHEAD;
        for attempt in 0..self.max_attempts() {
            total += self.timeout_for_attempt(attempt);
        }
        total
    }
}

/// Constant schedule: the same timeout for every attempt
#[derive(Debug, Clone)]
pub struct IntervalRetransmissionStrategy {
    max_attempts: usize,
    timeout: Duration,
}

impl IntervalRetransmissionStrategy {
    pub fn new(max_attempts: usize, timeout: Duration) -> Self {
        assert!(max_attempts > 0, "max_attempts must be positive");
        IntervalRetransmissionStrategy {
            max_attempts,
            timeout,
        }
    }
}

impl Default for IntervalRetransmissionStrategy {
    /// 3 attempts, 5 seconds each
    fn default() -> Self {
        IntervalRetransmissionStrategy::new(3, Duration::from_secs(5))
    }
}

impl RetransmissionStrategy for IntervalRetransmissionStrategy {
    fn max_attempts(&self) -> usize {
        self.max_attempts
    }

    fn timeout_for_attempt(&self, _attempt: usize) -> Duration {
        self.timeout
    }
}

/// Doubling schedule: each attempt waits twice as long as the previous one
#[derive(Debug, Clone)]
pub struct ExponentialBackoffStrategy {
    max_attempts: usize,
    initial_timeout: Duration,
}

impl ExponentialBackoffStrategy {
    pub fn new(max_attempts: usize, initial_timeout: Duration) -> Self {
        assert!(max_attempts > 0, "max_attempts must be positive");
        ExponentialBackoffStrategy {
            max_attempts,
            initial_timeout,
        }
    }
}

impl RetransmissionStrategy for ExponentialBackoffStrategy {
    fn max_attempts(&self) -> usize {
        self.max_attempts
    }

    fn timeout_for_attempt(&self, attempt: usize) -> Duration {
        self.initial_timeout * 2u32.saturating_pow(attempt as u32)
    }
}

/// Serializable retry settings, resolved into an
/// [`IntervalRetransmissionStrategy`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Number of transmission attempts
    #[serde(default = "default_max_attempts")]
    pub max_attempts: usize,
    /// Per-attempt timeout in seconds
    #[serde(default = "default_attempt_timeout")]
    pub attempt_timeout: u64,
}

fn default_max_attempts() -> usize {
    3
}

fn default_attempt_timeout() -> u64 {
    5
}

impl Default for RetryConfig {
    fn default() -> Self {
        RetryConfig {
            max_attempts: default_max_attempts(),
            attempt_timeout: default_attempt_timeout(),
        }
    }
}

impl RetryConfig {
    pub fn into_strategy(self) -> IntervalRetransmissionStrategy {
        IntervalRetransmissionStrategy::new(
            self.max_attempts.max(1),
            Duration::from_secs(self.attempt_timeout),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interval_strategy() {
        let strategy = IntervalRetransmissionStrategy::new(3, Duration::from_secs(2));
        assert_eq!(strategy.max_attempts(), 3);
        assert_eq!(strategy.timeout_for_attempt(0), Duration::from_secs(2));
        assert_eq!(strategy.timeout_for_attempt(2), Duration::from_secs(2));
        // 3 * 2s + 5s overhead
        assert_eq!(strategy.total_timeout(), Duration::from_secs(11));
    }

    #[test]
    fn test_default_strategy() {
        let strategy = IntervalRetransmissionStrategy::default();
        assert_eq!(strategy.max_attempts(), 3);
        assert_eq!(strategy.timeout_for_attempt(0), Duration::from_secs(5));
        assert_eq!(strategy.total_timeout(), Duration::from_secs(20));
    }

    #[test]
    fn test_exponential_strategy() {
        let strategy = ExponentialBackoffStrategy::new(4, Duration::from_secs(1));
        assert_eq!(strategy.timeout_for_attempt(0), Duration::from_secs(1));
        assert_eq!(strategy.timeout_for_attempt(1), Duration::from_secs(2));
        assert_eq!(strategy.timeout_for_attempt(2), Duration::from_secs(4));
        assert_eq!(strategy.timeout_for_attempt(3), Duration::from_secs(8));
        // 15s of attempts + 5s overhead
        assert_eq!(strategy.total_timeout(), Duration::from_secs(20));
    }

    #[test]
    fn test_retry_config_defaults() {
        let config = RetryConfig::default();
        let strategy = config.into_strategy();
        assert_eq!(strategy.max_attempts(), 3);
        assert_eq!(strategy.timeout_for_attempt(0), Duration::from_secs(5));
    }

    #[test]
    #[should_panic(expected = "max_attempts must be positive")]
    fn test_zero_attempts_rejected() {
        IntervalRetransmissionStrategy::new(0, Duration::from_secs(1));
    }
}
