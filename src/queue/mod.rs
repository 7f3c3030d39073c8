//! Bounded probe queue guarded by a circuit breaker.
//!
//! # Data Flow
//! ```text
//! enqueue(task)
//!     → circuit open? reject (CircuitOpen), task never runs
//!     → FIFO channel
//!     → dispatcher: wait for a concurrency permit
//!     → circuit open? drop the task, its handle resolves to None
//!     → run task in its own tokio task
//!     → Ok resets the failure counter, Err/panic counts as a failure
//!     → permit released, next task dispatched
//! ```
//!
//! # Design Decisions
//! - Default cap of 1 executing task; tasks never overlap at that cap
//! - The queue never retries; retrying is the task's own business
//! - Dropped work is not buffered for later, callers re-enqueue next cycle

pub mod request_queue;

pub use request_queue::{ProbeQueue, QueueError, QueueStats, TaskHandle};
