//! Reachability probing.
//!
//! # Data Flow
//! ```text
//! StatusProber::check(url, force_refresh)
//!     → cache.rs (fresh entry? return it, no network)
//!     → transport.rs (GET probe path with per-attempt timeout)
//!     → On failure: one retry after jittered backoff
//!     → cache.rs (remember the classification)
//! ```
//!
//! # Design Decisions
//! - Transport is a trait so tests and other transports can be swapped in
//! - Cache hits are successes, even when the cached status is unreachable
//! - Errors are typed here and folded into a status by the scheduler

pub mod cache;
pub mod prober;
pub mod transport;

use std::time::Duration;
use thiserror::Error;

pub use cache::ResultCache;
pub use prober::StatusProber;
pub use transport::{HttpProbeTransport, ProbeTransport};

/// Why a single reachability check failed.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProbeError {
    #[error("probe timed out after {0:?}")]
    Timeout(Duration),
    #[error("network error: {0}")]
    Network(String),
    #[error("unexpected response status {0}")]
    UnexpectedResponse(u16),
    #[error("invalid url: {0}")]
    InvalidUrl(String),
}

impl ProbeError {
    /// Whether another attempt could succeed. A malformed URL never will.
    pub fn is_transient(&self) -> bool {
        !matches!(self, ProbeError::InvalidUrl(_))
    }
}
