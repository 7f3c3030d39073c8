//! Durable storage of targets.
//!
//! The scheduler only needs two operations: list a tenant's targets and
//! write a status change. Everything else (CRUD, history, snapshots) lives
//! on the concrete store.

pub mod memory;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::target::{ProbeStatus, Target, TargetId, TenantId};

pub use memory::{InMemoryTargetStore, StatusChange, StatusSummary, SyncReport};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("target {0} not found")]
    NotFound(TargetId),
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[async_trait]
pub trait TargetStore: Send + Sync {
    /// Current targets owned by `tenant`.
    async fn list_targets(&self, tenant: &TenantId) -> Result<Vec<Target>, StoreError>;

    /// Persist a new status and the time it was observed.
    async fn update_target_status(
        &self,
        target: &TargetId,
        status: &ProbeStatus,
        checked_at: DateTime<Utc>,
    ) -> Result<(), StoreError>;
}
