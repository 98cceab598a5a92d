//! Per-file retry with bounded exponential backoff
//!
//! Transient failures (rate limits, network faults, 5xx, stale revision
//! tokens) are retried; everything else fails on the first attempt. A
//! platform-suggested delay lengthens the wait, within the configured cap.
//! Once cancellation is observed no further attempt is started.

use std::future::Future;
use std::time::Duration;

use reposync_core::config::RetryConfig;
use reposync_core::domain::UploadError;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Default maximum attempts per file, including the first
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Retry schedule for one operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay: Duration,
    max_delay: Duration,
}

/// Final result of a retried operation and how many attempts it took
#[derive(Debug)]
pub struct Retried<T> {
    pub result: Result<T, UploadError>,
    pub attempts: u32,
}

impl RetryPolicy {
    /// Creates a policy
    ///
    /// `max_attempts` is raised to 1 and `max_delay` to `base_delay` if lower.
    pub fn new(max_attempts: u32, base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
            max_delay: max_delay.max(base_delay),
        }
    }

    /// A policy that never retries
    pub fn no_retry() -> Self {
        Self::new(1, Duration::ZERO, Duration::ZERO)
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Delay before attempt `attempt + 1`, given that `attempt` (1-based) failed
    ///
    /// `base * 2^(attempt-1)`, raised to `hint` when the platform asked for
    /// longer, and capped at the maximum delay.
    pub fn delay_for(&self, attempt: u32, hint: Option<Duration>) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        let backoff = self.base_delay.saturating_mul(factor);
        let wanted = hint.map_or(backoff, |h| backoff.max(h));
        wanted.min(self.max_delay)
    }

    /// Runs `op` until it succeeds, fails permanently, runs out of attempts,
    /// or cancellation is observed
    ///
    /// `op` receives the 1-based attempt number. Cancellation never
    /// interrupts an attempt in flight; it only stops further attempts and
    /// cuts a backoff wait short. The last error is returned in that case.
    pub async fn run<T, F, Fut>(
        &self,
        operation: &str,
        cancel: &CancellationToken,
        mut op: F,
    ) -> Retried<T>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, UploadError>>,
    {
        let mut attempt = 0;
        loop {
            attempt += 1;
            let err = match op(attempt).await {
                Ok(value) => {
                    if attempt > 1 {
                        info!(operation, attempt, "Operation succeeded after retry");
                    }
                    return Retried {
                        result: Ok(value),
                        attempts: attempt,
                    };
                }
                Err(err) => err,
            };

            if !err.is_retryable() || attempt >= self.max_attempts || cancel.is_cancelled() {
                return Retried {
                    result: Err(err),
                    attempts: attempt,
                };
            }

            let delay = self.delay_for(attempt, err.retry_after());
            warn!(
                operation,
                attempt,
                delay_ms = delay.as_millis() as u64,
                error = %err,
                "Transient error, retrying"
            );

            tokio::select! {
                () = tokio::time::sleep(delay) => {}
                () = cancel.cancelled() => {
                    info!(operation, attempt, "Cancelled during backoff, not retrying");
                    return Retried {
                        result: Err(err),
                        attempts: attempt,
                    };
                }
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&RetryConfig::default())
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self::new(
            config.max_attempts,
            Duration::from_millis(config.base_delay_ms),
            Duration::from_millis(config.max_delay_ms),
        )
    }
}
