//! Tracked targets and their reachability status.
//!
//! # Data Flow
//! ```text
//! config [[targets]] / store API
//!     → Target (owned by one tenant)
//!     → scheduler reads a fresh snapshot every poll cycle
//!     → prober classifies the URL into a ProbeStatus
//!     → store persists the new status on change
//! ```
//!
//! # Design Decisions
//! - Status is a tagged variant; "never checked" is distinct from "offline"
//! - Change detection compares the coarse StatusKind, not the failure reason
//! - Targets never cross tenants

pub mod types;

pub use types::{ProbeStatus, StatusKind, Target, TargetId, TenantId, UnreachableReason};
