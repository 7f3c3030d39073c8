//! Retry logic.
//!
//! # Responsibilities
//! - Execute an async operation up to `max_attempts` times
//! - Wait between attempts using a fixed or exponential (jittered) delay
//!
//! The probe retries with exponential backoff; status persistence retries
//! with a fixed delay.

use std::future::Future;
use std::time::Duration;

use crate::resilience::backoff::calculate_backoff;

/// Delay strategy between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDelay {
    Fixed(Duration),
    Exponential { base: Duration, max: Duration },
}

/// How many times to try and how long to wait in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first one.
    pub max_attempts: u32,
    pub delay: RetryDelay,
}

impl RetryPolicy {
    pub fn fixed(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            delay: RetryDelay::Fixed(delay),
        }
    }

    pub fn exponential(max_attempts: u32, base: Duration, max: Duration) -> Self {
        Self {
            max_attempts,
            delay: RetryDelay::Exponential { base, max },
        }
    }

    /// Delay before retry number `retry` (1-based).
    pub fn delay_for(&self, retry: u32) -> Duration {
        match self.delay {
            RetryDelay::Fixed(d) => d,
            RetryDelay::Exponential { base, max } => calculate_backoff(retry, base, max),
        }
    }
}

/// Run `op` until it succeeds or the policy is exhausted.
///
/// `label` only feeds the log lines. Returns the last error on exhaustion.
pub async fn retry<F, Fut, T, E>(policy: RetryPolicy, label: &str, op: F) -> Result<T, E>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    retry_if(policy, label, op, |_| true).await
}

/// Like [`retry`], but gives up at once when `retryable` rejects the error.
pub async fn retry_if<F, Fut, T, E, P>(
    policy: RetryPolicy,
    label: &str,
    mut op: F,
    retryable: P,
) -> Result<T, E>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
    P: Fn(&E) -> bool,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 0;

    loop {
        attempt += 1;
        match op(attempt).await {
            Ok(value) => return Ok(value),
            Err(e) if attempt < max_attempts && retryable(&e) => {
                let delay = policy.delay_for(attempt);
                tracing::debug!(
                    operation = label,
                    attempt,
                    delay = ?delay,
                    error = %e,
                    "Attempt failed, retrying"
                );
                tokio::time::sleep(delay).await;
            }
            Err(e) => {
                tracing::debug!(operation = label, attempts = attempt, error = %e, "Retries exhausted");
                return Err(e);
            }
        }
    }
}
