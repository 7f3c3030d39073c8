use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::AdminState;
use crate::queue::QueueStats;
use crate::resilience::CircuitState;
use crate::store::{StatusChange, StatusSummary, TargetStore};
use crate::target::{ProbeStatus, StatusKind, TargetId, TenantId};

#[derive(Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub status: &'static str,
    pub tenant: TenantId,
    pub targets: usize,
    pub stale_targets: usize,
    pub cache_entries: usize,
    pub circuit: CircuitState,
}

#[derive(Serialize)]
pub struct TargetView {
    pub id: TargetId,
    pub name: String,
    pub url: String,
    pub kind: StatusKind,
    pub status: ProbeStatus,
    pub last_checked: Option<DateTime<Utc>>,
    pub check_frequency_secs: u64,
    pub notify_on_change: bool,
    /// Set when the latest observed change could not be persisted.
    pub stale_since: Option<DateTime<Utc>>,
}

#[derive(Serialize)]
pub struct TargetHistory {
    pub summary: StatusSummary,
    pub history: Vec<StatusChange>,
}

pub async fn get_status(State(state): State<AdminState>) -> Json<SystemStatus> {
    let tenant = state.scheduler.tenant().clone();
    let targets = state
        .store
        .list_targets(&tenant)
        .await
        .map(|t| t.len())
        .unwrap_or_default();

    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: "operational",
        tenant,
        targets,
        stale_targets: state.scheduler.stale_targets().len(),
        cache_entries: state.cache.len(),
        circuit: state.queue.circuit().state(),
    })
}

pub async fn get_targets(
    State(state): State<AdminState>,
) -> Result<Json<Vec<TargetView>>, StatusCode> {
    let targets = state
        .store
        .list_targets(state.scheduler.tenant())
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to list targets");
            StatusCode::INTERNAL_SERVER_ERROR
        })?;
    let stale = state.scheduler.stale_targets();

    let views = targets
        .into_iter()
        .map(|t| TargetView {
            id: t.id,
            name: t.name,
            url: t.url.to_string(),
            kind: t.status.kind(),
            status: t.status,
            last_checked: t.last_checked,
            check_frequency_secs: t.check_frequency_secs,
            notify_on_change: t.notify_on_change,
            stale_since: stale.get(&t.id).copied(),
        })
        .collect();

    Ok(Json(views))
}

pub async fn get_history(
    State(state): State<AdminState>,
    Path(id): Path<Uuid>,
) -> Result<Json<TargetHistory>, StatusCode> {
    let id = TargetId(id);
    match state.store.get(&id) {
        Some(target) if &target.tenant == state.scheduler.tenant() => {}
        _ => return Err(StatusCode::NOT_FOUND),
    }
    let summary = state.store.summary(&id).ok_or(StatusCode::NOT_FOUND)?;

    Ok(Json(TargetHistory {
        summary,
        history: state.store.history(&id),
    }))
}

pub async fn get_queue(State(state): State<AdminState>) -> Json<QueueStats> {
    Json(state.queue.stats())
}
