//! Reconnect backoff policy.

use rand::Rng;
use std::time::Duration;

/// Exponential backoff with a hard attempt budget and proportional jitter.
///
/// The deterministic part of each delay is `base * 2^(attempt - 1)` capped at
/// `max_delay`; the jittered delay adds a uniform draw in 10-30% of that
/// value on top. `reset` is called after a successful subscribe so that a
/// long-lived connection dropping later starts from the base delay again.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    base_delay: Duration,
    max_delay: Duration,
    max_retries: u32,
    attempt: u32,
}

impl RetryPolicy {
    pub fn new(base_delay: Duration, max_delay: Duration, max_retries: u32) -> Self {
        Self {
            base_delay,
            max_delay,
            max_retries,
            attempt: 0,
        }
    }

    /// Consecutive failures recorded since the last reset.
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    /// Clear the failure streak after a successful connect + subscribe.
    pub fn reset(&mut self) {
        self.attempt = 0;
    }

    /// Deterministic delay for a given 1-based attempt, before jitter.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let exp = attempt.saturating_sub(1).min(32);
        let unclamped = self
            .base_delay
            .checked_mul(1u32 << exp.min(31))
            .unwrap_or(self.max_delay);
        unclamped.min(self.max_delay)
    }

    /// Record a failure and return how long to wait before the next attempt,
    /// or `None` once the attempt budget is spent.
    pub fn next_delay(&mut self) -> Option<Duration> {
        self.attempt += 1;
        if self.attempt >= self.max_retries {
            return None;
        }
        let delay = self.delay_for_attempt(self.attempt);
        let jitter = delay.mul_f64(rand::rng().random_range(0.10..0.30));
        Some(delay + jitter)
    }
}
