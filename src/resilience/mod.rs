//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Probe attempt:
//!     → timeouts.rs (15s deadline per attempt)
//!     → On failure: retries.rs (one more attempt after backoff.rs delay)
//!     → circuit_breaker.rs (queue tracks consecutive task failures)
//! ```
//!
//! # Design Decisions
//! - Every outbound probe has a deadline
//! - Retries happen inside the task; the queue never retries a task
//! - The breaker drops work instead of buffering it while open

pub mod backoff;
pub mod circuit_breaker;
pub mod retries;
pub mod timeouts;

pub use circuit_breaker::{CircuitBreaker, CircuitSnapshot, CircuitState};
pub use retries::{retry, retry_if, RetryPolicy};
