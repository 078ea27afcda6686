//! Bounded retries with linear backoff that fail open to a fallback value.

use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tracing::{error, warn};

use crate::core::resolution::Resolution;

/// Retry budget for network-backed classification queries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Total attempts, including the first.
    pub max_attempts: u32,
    /// Wait after failed attempt `i` is `base_delay_ms * i`.
    pub base_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 1500,
        }
    }
}

impl RetryConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts;
        self
    }

    pub fn base_delay(mut self, delay: Duration) -> Self {
        self.base_delay_ms = delay.as_millis() as u64;
        self
    }
}

/// Executes an operation up to `max_attempts` times.
#[derive(Debug, Clone, Default)]
pub struct RetryPolicy {
    config: RetryConfig,
}

impl RetryPolicy {
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }

    /// Delay after failed attempt `attempt` (1-based): linear in the attempt number.
    pub fn delay_after(&self, attempt: u32) -> Duration {
        Duration::from_millis(self.config.base_delay_ms.saturating_mul(attempt as u64))
    }

    /// Run `operation`, retrying on error. After the last failed attempt
    /// the error is logged and `fallback` is returned as a recovery; it is
    /// never re-raised.
    pub async fn run_or<F, Fut, T, E>(&self, fallback: T, mut operation: F) -> Resolution<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        let max_attempts = self.config.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            let e = match operation().await {
                Ok(value) => return Resolution::Direct(value),
                Err(e) => e,
            };
            if attempt >= max_attempts {
                error!(attempts = max_attempts, error = %e, "All attempts failed, using fallback");
                return Resolution::recovered(
                    fallback,
                    format!("failed after {} attempts: {}", max_attempts, e),
                );
            }

            let delay = self.delay_after(attempt);
            warn!(
                attempt,
                delay_ms = delay.as_millis() as u64,
                error = %e,
                "Attempt failed, backing off"
            );
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }
}
