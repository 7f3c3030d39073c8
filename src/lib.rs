//! Uptime monitor library.
//!
//! Polls a tenant's website targets through a single-lane probe queue,
//! caches results, trips a circuit breaker on repeated failures and
//! persists status changes with fire-and-forget notifications.
//!
//! # Architecture Overview
//!
//! ```text
//!   MonitorSession (one per tenant)
//!   ┌──────────────────────────────────────────────────────────────┐
//!   │                                                              │
//!   │  PollScheduler ──enqueue──▶ ProbeQueue ──dispatch──▶ StatusProber
//!   │       │                     (FIFO, cap 1,             │       │
//!   │       │                      circuit breaker)         ▼       │
//!   │       │                                         ResultCache   │
//!   │       │                                          (5 min TTL)  │
//!   │       ├──▶ TargetStore  (list, persist status changes)        │
//!   │       └──▶ Notifier     (fire-and-forget)                     │
//!   └──────────────────────────────────────────────────────────────┘
//!
//!   Cross-cutting: config, observability, lifecycle, admin API
//! ```

// Core subsystems
pub mod probe;
pub mod queue;
pub mod scheduler;
pub mod session;
pub mod target;

// Collaborators
pub mod notifications;
pub mod store;

// Cross-cutting concerns
pub mod admin;
pub mod config;
pub mod lifecycle;
pub mod observability;
pub mod resilience;

pub use config::MonitorConfig;
pub use lifecycle::Shutdown;
pub use session::MonitorSession;
