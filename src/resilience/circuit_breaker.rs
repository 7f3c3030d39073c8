//! Circuit breaker guarding the probe queue.
//!
//! # States
//! - Closed: normal operation, tasks are dispatched
//! - Open: too many consecutive failures, tasks are dropped
//!
//! # State Transitions
//! ```text
//! Closed → Open: consecutive_failures >= failure_threshold
//! Open → Closed: evaluated lazily on the next dispatch attempt, once
//!                cooldown has elapsed since the last failure
//! ```
//!
//! # Design Decisions
//! - One breaker per queue (not per target)
//! - No half-open probe state: after the cooldown the breaker closes with
//!   a zeroed counter and the next task simply goes through
//! - Uses tokio's clock so paused-time tests can drive the cooldown

use parking_lot::Mutex;
use serde::Serialize;
use std::time::Duration;
use tokio::time::Instant;

use crate::observability::metrics;

/// Observable breaker state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CircuitState {
    Closed,
    Open,
}

#[derive(Debug, Default)]
struct Inner {
    consecutive_failures: u32,
    last_failure: Option<Instant>,
    open: bool,
}

/// Point-in-time view of the breaker.
#[derive(Debug, Clone, Serialize)]
pub struct CircuitSnapshot {
    pub state: CircuitState,
    pub consecutive_failures: u32,
    /// Seconds since the last recorded failure, if any.
    pub secs_since_last_failure: Option<u64>,
}

#[derive(Debug)]
pub struct CircuitBreaker {
    failure_threshold: u32,
    cooldown: Duration,
    inner: Mutex<Inner>,
}

impl CircuitBreaker {
    pub fn new(failure_threshold: u32, cooldown: Duration) -> Self {
        Self {
            failure_threshold: failure_threshold.max(1),
            cooldown,
            inner: Mutex::new(Inner::default()),
        }
    }

    /// Decide whether a task may be dispatched right now.
    ///
    /// An open breaker whose cooldown has elapsed is closed (counter reset)
    /// before answering.
    pub fn allow(&self) -> bool {
        let mut inner = self.inner.lock();
        if !inner.open {
            return true;
        }

        let cooled_down = inner
            .last_failure
            .map(|at| at.elapsed() >= self.cooldown)
            .unwrap_or(true);

        if cooled_down {
            inner.open = false;
            inner.consecutive_failures = 0;
            metrics::record_circuit_open(false);
            tracing::info!(cooldown = ?self.cooldown, "Circuit closed after cooldown");
            true
        } else {
            false
        }
    }

    pub fn record_success(&self) {
        let mut inner = self.inner.lock();
        inner.consecutive_failures = 0;
    }

    /// Count a failure; returns true if this failure tripped the breaker.
    pub fn record_failure(&self) -> bool {
        let mut inner = self.inner.lock();
        inner.consecutive_failures = inner.consecutive_failures.saturating_add(1);
        inner.last_failure = Some(Instant::now());

        if !inner.open && inner.consecutive_failures >= self.failure_threshold {
            inner.open = true;
            metrics::record_circuit_open(true);
            tracing::warn!(
                failures = inner.consecutive_failures,
                cooldown = ?self.cooldown,
                "Circuit opened"
            );
            return true;
        }
        false
    }

    /// Current state without triggering the lazy close.
    pub fn state(&self) -> CircuitState {
        if self.inner.lock().open {
            CircuitState::Open
        } else {
            CircuitState::Closed
        }
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.inner.lock().consecutive_failures
    }

    pub fn snapshot(&self) -> CircuitSnapshot {
        let inner = self.inner.lock();
        CircuitSnapshot {
            state: if inner.open { CircuitState::Open } else { CircuitState::Closed },
            consecutive_failures: inner.consecutive_failures,
            secs_since_last_failure: inner.last_failure.map(|at| at.elapsed().as_secs()),
        }
    }
}
