//! Poll scheduler.
//!
//! # Data Flow
//! ```text
//! every interval (first run immediately, bypassing the cache):
//!     store.list_targets(tenant)          fresh snapshot, deleted targets vanish
//!     → queue.enqueue(prober.check(url))  one task per target
//!     → on completion: compare status kind with the stored one
//!         unchanged → nothing
//!         changed   → persist (retry once after a fixed delay)
//!                   → notify (fire-and-forget) if the target asks for it
//! ```
//!
//! # Design Decisions
//! - Interval is the smallest target check frequency, floored
//! - A dropped persistence marks the target stale; the next cycle sees the
//!   old stored status again and retries on its own
//! - Leaving `Unknown` is notified unless `notify_from_pending` is off

pub mod poller;

pub use poller::{CompletionOutcome, CycleReport, PollScheduler};
