//! Backoff strategies for retryable failures
//!
//! A strategy is a pure function from retry-attempt-number to wait
//! duration: monotonically non-decreasing and capped at a configured
//! maximum. Two are provided: the default for transport errors and 5xx
//! responses, and a more aggressive variant for HTTP 429.

use std::time::Duration;

/// Computes the delay to wait before a given retry attempt.
pub trait BackoffStrategy: Send + Sync {
    /// Delay before retry number `retry_count` (1-based).
    fn delay(&self, retry_count: u32) -> Duration;
}

/// Exponential backoff starting at 600ms, doubling per retry, capped.
#[derive(Debug, Clone)]
pub struct DefaultBackoffStrategy {
    base_ms: u64,
    max_ms: u64,
}

impl DefaultBackoffStrategy {
    pub const DEFAULT_BASE_MS: u64 = 600;
    pub const DEFAULT_MAX_MS: u64 = 20_000;

    /// Create a strategy with the given cap and the default 600ms base.
    #[must_use]
    pub fn new(max_ms: u64) -> Self {
        Self {
            base_ms: Self::DEFAULT_BASE_MS,
            max_ms,
        }
    }

    /// Create a strategy with an explicit base and cap.
    #[must_use]
    pub fn with_base(base_ms: u64, max_ms: u64) -> Self {
        Self { base_ms, max_ms }
    }
}

impl Default for DefaultBackoffStrategy {
    fn default() -> Self {
        Self::new(Self::DEFAULT_MAX_MS)
    }
}

impl BackoffStrategy for DefaultBackoffStrategy {
    fn delay(&self, retry_count: u32) -> Duration {
        Duration::from_millis(exponential_delay(self.base_ms, self.max_ms, retry_count))
    }
}

/// Exponential backoff starting at 1000ms, for throttled (429) responses.
///
/// Produces delays greater than or equal to the default strategy's at
/// every retry count.
#[derive(Debug, Clone)]
pub struct ThrottlingBackoffStrategy {
    base_ms: u64,
    max_ms: u64,
}

impl ThrottlingBackoffStrategy {
    pub const DEFAULT_BASE_MS: u64 = 1_000;

    /// Create a strategy with the given cap and the default 1000ms base.
    #[must_use]
    pub fn new(max_ms: u64) -> Self {
        Self {
            base_ms: Self::DEFAULT_BASE_MS,
            max_ms,
        }
    }

    /// Create a strategy with an explicit base and cap.
    #[must_use]
    pub fn with_base(base_ms: u64, max_ms: u64) -> Self {
        Self { base_ms, max_ms }
    }
}

impl Default for ThrottlingBackoffStrategy {
    fn default() -> Self {
        Self::new(DefaultBackoffStrategy::DEFAULT_MAX_MS)
    }
}

impl BackoffStrategy for ThrottlingBackoffStrategy {
    fn delay(&self, retry_count: u32) -> Duration {
        Duration::from_millis(exponential_delay(self.base_ms, self.max_ms, retry_count))
    }
}

/// `min(base * 2^(n-1), max)` with saturating arithmetic.
fn exponential_delay(base_ms: u64, max_ms: u64, retry_count: u32) -> u64 {
    let exponent = retry_count.saturating_sub(1);
    base_ms
        .saturating_mul(2u64.saturating_pow(exponent))
        .min(max_ms)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_strategy_table() {
        let strategy = DefaultBackoffStrategy::new(20_000);
        let observed: Vec<u64> = (1..=8)
            .map(|n| strategy.delay(n).as_millis() as u64)
            .collect();
        assert_eq!(
            observed,
            vec![600, 1200, 2400, 4800, 9600, 19200, 20000, 20000]
        );
    }

    #[test]
    fn test_throttling_strategy_table() {
        let strategy = ThrottlingBackoffStrategy::new(20_000);
        let observed: Vec<u64> = (1..=6)
            .map(|n| strategy.delay(n).as_millis() as u64)
            .collect();
        assert_eq!(observed, vec![1000, 2000, 4000, 8000, 16000, 20000]);
    }

    #[test]
    fn test_throttling_dominates_default() {
        let default = DefaultBackoffStrategy::default();
        let throttling = ThrottlingBackoffStrategy::default();
        for n in 1..=16 {
            assert!(throttling.delay(n) >= default.delay(n), "n={n}");
        }
    }

    #[test]
    fn test_monotone_non_decreasing() {
        let strategy = DefaultBackoffStrategy::default();
        for n in 1..=32 {
            assert!(strategy.delay(n + 1) >= strategy.delay(n));
        }
    }

    #[test]
    fn test_no_overflow_at_high_counts() {
        let strategy = DefaultBackoffStrategy::default();
        assert_eq!(strategy.delay(u32::MAX).as_millis() as u64, 20_000);
    }
}
