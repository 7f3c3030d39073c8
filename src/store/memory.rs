//! In-memory target store with JSON snapshots.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use crate::config::TargetConfig;
use crate::store::{StoreError, TargetStore};
use crate::target::{ProbeStatus, StatusKind, Target, TargetId, TenantId};

/// History entries kept per target; oldest are discarded first.
const MAX_HISTORY: usize = 500;

/// One persisted status update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusChange {
    pub status: ProbeStatus,
    pub checked_at: DateTime<Utc>,
}

/// Aggregate view of a target's status history.
#[derive(Debug, Clone, Serialize)]
pub struct StatusSummary {
    pub target: TargetId,
    pub current_status: StatusKind,
    pub last_checked: Option<DateTime<Utc>>,
    /// Number of recorded transitions between online and offline.
    pub status_changes: usize,
    pub recorded_updates: usize,
}

/// Outcome of syncing a tenant's targets against config.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub added: usize,
    pub updated: usize,
    pub removed: usize,
}

#[derive(Serialize, Deserialize)]
struct Snapshot {
    targets: Vec<Target>,
    history: HashMap<TargetId, Vec<StatusChange>>,
}

/// A thread-safe in-memory store.
#[derive(Debug, Default)]
pub struct InMemoryTargetStore {
    targets: DashMap<TargetId, Target>,
    history: DashMap<TargetId, VecDeque<StatusChange>>,
}

impl InMemoryTargetStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restore from a snapshot file, or start empty if it does not exist.
    pub fn load_from_file(path: &Path) -> Result<Self, StoreError> {
        let store = Self::new();
        if path.exists() {
            let reader = BufReader::new(File::open(path)?);
            let snapshot: Snapshot = serde_json::from_reader(reader)?;

            for target in snapshot.targets {
                store.targets.insert(target.id, target);
            }
            for (id, entries) in snapshot.history {
                store.history.insert(id, entries.into_iter().collect());
            }
            tracing::info!(targets = store.targets.len(), path = ?path, "Loaded target snapshot");
        }
        Ok(store)
    }

    pub fn save_to_file(&self, path: &Path) -> Result<(), StoreError> {
        let snapshot = Snapshot {
            targets: self.targets.iter().map(|r| r.value().clone()).collect(),
            history: self
                .history
                .iter()
                .map(|r| (*r.key(), r.value().iter().cloned().collect()))
                .collect(),
        };

        let writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer(writer, &snapshot)?;
        tracing::info!(targets = snapshot.targets.len(), path = ?path, "Saved target snapshot");
        Ok(())
    }

    pub fn insert(&self, target: Target) -> TargetId {
        let id = target.id;
        self.targets.insert(id, target);
        id
    }

    pub fn remove(&self, id: &TargetId) -> Option<Target> {
        self.history.remove(id);
        self.targets.remove(id).map(|(_, t)| t)
    }

    pub fn get(&self, id: &TargetId) -> Option<Target> {
        self.targets.get(id).map(|r| r.value().clone())
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Persisted status updates for a target, oldest first.
    pub fn history(&self, id: &TargetId) -> Vec<StatusChange> {
        self.history
            .get(id)
            .map(|r| r.value().iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn summary(&self, id: &TargetId) -> Option<StatusSummary> {
        let target = self.get(id)?;
        let history = self.history(id);

        let status_changes = history
            .windows(2)
            .filter(|pair| pair[0].status.kind() != pair[1].status.kind())
            .count();

        Some(StatusSummary {
            target: *id,
            current_status: target.status.kind(),
            last_checked: target.last_checked,
            status_changes,
            recorded_updates: history.len(),
        })
    }

    /// Make the tenant's targets match `configs`, keyed by name.
    ///
    /// A target whose URL changes goes back to `Unknown`.
    pub fn sync_tenant(&self, tenant: &TenantId, configs: &[TargetConfig]) -> SyncReport {
        let mut report = SyncReport::default();
        let existing: HashMap<String, TargetId> = self
            .targets
            .iter()
            .filter(|r| &r.value().tenant == tenant)
            .map(|r| (r.value().name.clone(), *r.key()))
            .collect();

        for config in configs {
            match existing.get(&config.name) {
                Some(id) => {
                    if let Some(mut target) = self.targets.get_mut(id) {
                        let changed = apply_config(&mut target, config);
                        if changed {
                            report.updated += 1;
                        }
                    }
                }
                None => match Target::new(
                    tenant.clone(),
                    config.name.clone(),
                    &config.url,
                    config.check_frequency_secs,
                    config.notify_on_change,
                ) {
                    Ok(target) => {
                        self.insert(target);
                        report.added += 1;
                    }
                    Err(e) => {
                        tracing::warn!(name = %config.name, error = %e, "Skipping invalid target");
                    }
                },
            }
        }

        for (name, id) in &existing {
            if !configs.iter().any(|c| &c.name == name) {
                self.remove(id);
                report.removed += 1;
            }
        }

        if report != SyncReport::default() {
            tracing::info!(
                tenant = %tenant,
                added = report.added,
                updated = report.updated,
                removed = report.removed,
                "Targets synced"
            );
        }
        report
    }
}

fn apply_config(target: &mut Target, config: &TargetConfig) -> bool {
    let mut changed = false;

    // Compare parsed URLs so spelling differences the parser normalizes
    // (host case, default port) do not count as a change.
    match crate::target::types::parse_target_url(&config.url) {
        Ok(url) if url != target.url => {
            target.url = url;
            target.status = ProbeStatus::Unknown;
            target.last_checked = None;
            changed = true;
        }
        Ok(_) => {}
        Err(e) => {
            tracing::warn!(name = %config.name, error = %e, "Ignoring invalid target url");
        }
    }
    if target.check_frequency_secs != config.check_frequency_secs {
        target.check_frequency_secs = config.check_frequency_secs;
        changed = true;
    }
    if target.notify_on_change != config.notify_on_change {
        target.notify_on_change = config.notify_on_change;
        changed = true;
    }
    changed
}

#[async_trait]
impl TargetStore for InMemoryTargetStore {
    async fn list_targets(&self, tenant: &TenantId) -> Result<Vec<Target>, StoreError> {
        let mut targets: Vec<Target> = self
            .targets
            .iter()
            .filter(|r| &r.value().tenant == tenant)
            .map(|r| r.value().clone())
            .collect();
        targets.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(targets)
    }

    async fn update_target_status(
        &self,
        target: &TargetId,
        status: &ProbeStatus,
        checked_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        {
            let mut entry = self.targets.get_mut(target).ok_or(StoreError::NotFound(*target))?;
            entry.status = status.clone();
            entry.last_checked = Some(checked_at);
        }

        let mut history = self.history.entry(*target).or_default();
        history.push_back(StatusChange {
            status: status.clone(),
            checked_at,
        });
        while history.len() > MAX_HISTORY {
            history.pop_front();
        }
        Ok(())
    }
}
