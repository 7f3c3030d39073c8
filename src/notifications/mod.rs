//! Status change notifications.
//!
//! The scheduler fires `notify` without waiting on it; delivery failures
//! are logged and counted, never retried.

pub mod logger;
pub mod webhook;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::target::{StatusKind, TargetId, TenantId};

pub use self::logger::LogNotifier;
pub use self::webhook::WebhookNotifier;

#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("Failed to send notification: {0}")]
    SendFailed(String),
    #[error("Invalid configuration for notifier: {0}")]
    InvalidConfiguration(String),
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),
}

/// Payload describing one status transition.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusChangeEvent {
    pub tenant: TenantId,
    pub target: TargetId,
    pub target_name: String,
    pub url: String,
    pub old_status: StatusKind,
    pub new_status: StatusKind,
    /// Failure reason when the new status is offline.
    pub reason: Option<String>,
    pub checked_at: DateTime<Utc>,
}

/// Delivers status change notifications to the tenant.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, event: &StatusChangeEvent) -> Result<(), NotifyError>;
}
