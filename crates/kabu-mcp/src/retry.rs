//! Bounded retries with exponential backoff.

use std::future::Future;
use std::time::Duration;

use serde_json::Value;
use tokio::time::Instant;

use crate::config::{DEFAULT_BACKOFF_BASE, DEFAULT_BACKOFF_MAX, WorkerConfig};
use crate::error::Result;
use crate::outcome::InvocationOutcome;

/// One attempt of an invocation, kept only for logging.
#[derive(Debug, Clone)]
pub struct AttemptRecord {
    /// 1-based attempt number.
    pub attempt_number: u32,
    /// When the attempt started.
    pub started_at: Instant,
    /// Failure message, if the attempt failed.
    pub error: Option<String>,
}

/// Retry policy applied to every invocation.
///
/// Every error kind is retried the same way, including spawn failures that
/// are unlikely to be transient.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay: Duration,
    max_delay: Duration,
}

impl RetryPolicy {
    /// Policy with `max_attempts` and the default 1s base / 5s cap backoff.
    ///
    /// Zero attempts is treated as one.
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay: DEFAULT_BACKOFF_BASE,
            max_delay: DEFAULT_BACKOFF_MAX,
        }
    }

    /// Policy described by a worker config.
    pub fn from_config(config: &WorkerConfig) -> Self {
        Self::new(config.max_attempts).with_backoff(config.backoff_base, config.backoff_max)
    }

    /// Override the backoff base delay and cap.
    pub fn with_backoff(mut self, base: Duration, max: Duration) -> Self {
        self.base_delay = base;
        self.max_delay = max;
        self
    }

    /// Attempts per invocation.
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Delay after failed attempt `attempt` (1-based): `min(base * 2^(attempt-1), cap)`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt.saturating_sub(1)).unwrap_or(u32::MAX);
        self.base_delay
            .checked_mul(factor)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }

    /// Run `attempt` until it succeeds or attempts run out.
    ///
    /// The closure receives the 1-based attempt number. Never fails: the last
    /// error becomes the outcome's `error`.
    pub async fn execute<F, Fut>(&self, tool: &str, mut attempt: F) -> InvocationOutcome
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<Value>>,
    {
        let mut records: Vec<AttemptRecord> = Vec::with_capacity(self.max_attempts as usize);

        for attempt_number in 1..=self.max_attempts {
            let started_at = Instant::now();
            tracing::info!(
                tool,
                attempt = attempt_number,
                max_attempts = self.max_attempts,
                "calling worker tool"
            );

            match attempt(attempt_number).await {
                Ok(data) => {
                    tracing::info!(
                        tool,
                        attempt = attempt_number,
                        duration_ms = started_at.elapsed().as_millis() as u64,
                        "worker tool call succeeded"
                    );
                    return InvocationOutcome::success(data);
                }
                Err(e) => {
                    tracing::warn!(
                        tool,
                        attempt = attempt_number,
                        max_attempts = self.max_attempts,
                        kind = e.kind(),
                        error = %e,
                        "worker tool call failed"
                    );
                    records.push(AttemptRecord {
                        attempt_number,
                        started_at,
                        error: Some(e.to_string()),
                    });

                    if attempt_number < self.max_attempts {
                        let delay = self.delay_for(attempt_number);
                        tracing::debug!(tool, backoff_ms = delay.as_millis() as u64, "backing off");
                        tokio::time::sleep(delay).await;
                    }
                }
            }
        }

        let last_error = records
            .last()
            .and_then(|r| r.error.clone())
            .unwrap_or_else(|| "unknown error".to_string());
        tracing::error!(
            tool,
            attempts = records.len(),
            error = %last_error,
            "worker tool call failed after all attempts"
        );
        InvocationOutcome::failure(last_error)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_MAX_ATTEMPTS)
    }
}
