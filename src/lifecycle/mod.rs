//! Process lifecycle.
//!
//! # Data Flow
//! ```text
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → wait_for_signal() returns
//!
//! Shutdown (shutdown.rs):
//!     trigger() → every subscribed loop (scheduler, admin server) exits
//! ```
//!
//! # Design Decisions
//! - Shutdown is a broadcast, not a flag: loops wake immediately
//! - Running probes are not awaited, the queue only stops dispatching

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
pub use signals::wait_for_signal;
