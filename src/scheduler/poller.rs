use chrono::{DateTime, Utc};
use dashmap::DashMap;
use futures_util::future::join_all;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time::{self, Instant};

use crate::config::SchedulerConfig;
use crate::notifications::{Notifier, StatusChangeEvent};
use crate::observability::metrics;
use crate::probe::{ProbeError, StatusProber};
use crate::queue::{ProbeQueue, QueueError};
use crate::resilience::retries::{retry, RetryPolicy};
use crate::store::TargetStore;
use crate::target::{ProbeStatus, Target, TargetId, TenantId};

/// What happened to one target's probe result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompletionOutcome {
    Unchanged,
    Persisted { notified: bool },
    /// Every persistence attempt failed; the change was discarded.
    PersistDropped,
    /// The task never completed (dropped by the circuit or queue closed).
    Skipped,
}

/// Summary of one poll cycle.
#[derive(Debug, Clone, Default)]
pub struct CycleReport {
    pub targets: usize,
    pub enqueued: usize,
    /// Refused by the queue at enqueue time.
    pub rejected: usize,
    pub skipped: usize,
    pub unchanged: usize,
    pub persisted: usize,
    pub notified: usize,
    pub persist_dropped: usize,
    /// Delay before the next cycle.
    pub next_interval: Duration,
}

pub struct PollScheduler {
    tenant: TenantId,
    store: Arc<dyn TargetStore>,
    notifier: Option<Arc<dyn Notifier>>,
    queue: Arc<ProbeQueue>,
    prober: Arc<StatusProber>,
    config: SchedulerConfig,
    stale: DashMap<TargetId, DateTime<Utc>>,
}

impl PollScheduler {
    pub fn new(
        tenant: TenantId,
        store: Arc<dyn TargetStore>,
        notifier: Option<Arc<dyn Notifier>>,
        queue: Arc<ProbeQueue>,
        prober: Arc<StatusProber>,
        config: SchedulerConfig,
    ) -> Self {
        Self {
            tenant,
            store,
            notifier,
            queue,
            prober,
            config,
            stale: DashMap::new(),
        }
    }

    pub fn tenant(&self) -> &TenantId {
        &self.tenant
    }

    /// Targets whose last status change could not be persisted, with the
    /// time the change was observed.
    pub fn stale_targets(&self) -> HashMap<TargetId, DateTime<Utc>> {
        self.stale.iter().map(|r| (*r.key(), *r.value())).collect()
    }

    pub fn is_stale(&self, id: &TargetId) -> bool {
        self.stale.contains_key(id)
    }

    /// Poll until shutdown. The first cycle bypasses the cache.
    ///
    /// Cycles start on a fixed cadence: the interval is measured from the
    /// start of the previous cycle, and a cycle that overruns it is followed
    /// by the next one immediately.
    pub async fn run(&self, mut shutdown: broadcast::Receiver<()>) {
        tracing::info!(tenant = %self.tenant, "Poll scheduler starting");
        let mut force_refresh = true;

        loop {
            let started = Instant::now();
            let report = tokio::select! {
                report = self.run_cycle(force_refresh) => report,
                _ = shutdown.recv() => break,
            };
            force_refresh = false;

            tracing::debug!(
                tenant = %self.tenant,
                targets = report.targets,
                enqueued = report.enqueued,
                rejected = report.rejected,
                persisted = report.persisted,
                next_in = ?report.next_interval,
                "Poll cycle finished"
            );

            let next_start = started
                .checked_add(report.next_interval)
                .unwrap_or_else(|| {
                    Instant::now() + Duration::from_secs(self.config.idle_interval_secs)
                });
            tokio::select! {
                _ = time::sleep_until(next_start) => {}
                _ = shutdown.recv() => break,
            }
        }

        tracing::info!(tenant = %self.tenant, "Poll scheduler stopped");
    }

    /// Enqueue a probe for every current target and process the results.
    pub async fn run_cycle(&self, force_refresh: bool) -> CycleReport {
        let mut report = CycleReport::default();

        let targets = match self.store.list_targets(&self.tenant).await {
            Ok(targets) => targets,
            Err(e) => {
                tracing::warn!(tenant = %self.tenant, error = %e, "Failed to list targets, skipping cycle");
                report.next_interval = self.poll_interval(&[]);
                return report;
            }
        };
        report.targets = targets.len();

        // Stale flags of deleted targets can never be cleared by a persist.
        if !self.stale.is_empty() {
            let current: HashSet<TargetId> = targets.iter().map(|t| t.id).collect();
            self.stale.retain(|id, _| current.contains(id));
        }
        report.next_interval = self.poll_interval(&targets);

        let mut pending = Vec::with_capacity(targets.len());
        for target in targets {
            let prober = self.prober.clone();
            let url = target.url.clone();
            match self.queue.enqueue(async move { prober.check(&url, force_refresh).await }) {
                Ok(handle) => {
                    report.enqueued += 1;
                    pending.push((target, handle));
                }
                Err(QueueError::CircuitOpen) => {
                    report.rejected += 1;
                }
                Err(QueueError::Closed) => {
                    report.rejected += 1;
                    tracing::debug!("Queue closed, abandoning cycle");
                    break;
                }
            }
        }

        let outcomes = join_all(pending.into_iter().map(|(target, handle)| async move {
            match handle.outcome().await {
                Some(result) => self.handle_completion(&target, result).await,
                None => CompletionOutcome::Skipped,
            }
        }))
        .await;

        for outcome in outcomes {
            match outcome {
                CompletionOutcome::Unchanged => report.unchanged += 1,
                CompletionOutcome::Persisted { notified } => {
                    report.persisted += 1;
                    if notified {
                        report.notified += 1;
                    }
                }
                CompletionOutcome::PersistDropped => report.persist_dropped += 1,
                CompletionOutcome::Skipped => report.skipped += 1,
            }
        }

        report
    }

    /// Compare a probe result with the stored status and react to a change.
    pub async fn handle_completion(
        &self,
        target: &Target,
        result: Result<ProbeStatus, ProbeError>,
    ) -> CompletionOutcome {
        let new_status = ProbeStatus::from(result);
        let old_status = &target.status;

        if new_status.kind() == old_status.kind() {
            return CompletionOutcome::Unchanged;
        }

        let checked_at = Utc::now();
        let store = &self.store;
        let id = target.id;
        let policy = RetryPolicy::fixed(
            self.config.persist_attempts,
            Duration::from_secs(self.config.persist_retry_delay_secs),
        );

        let persisted = retry(policy, "persist_status", |_| {
            store.update_target_status(&id, &new_status, checked_at)
        })
        .await;

        if let Err(e) = persisted {
            tracing::warn!(
                target_id = %id,
                name = %target.name,
                status = %new_status.kind(),
                error = %e,
                "Dropping status update after retries"
            );
            metrics::record_persist_failure();
            self.stale.insert(id, checked_at);
            return CompletionOutcome::PersistDropped;
        }

        self.stale.remove(&id);
        metrics::record_status_change(new_status.kind());
        tracing::info!(
            target_id = %id,
            name = %target.name,
            old = %old_status.kind(),
            new = %new_status.kind(),
            "Target status changed"
        );

        let wants_notification = target.notify_on_change
            && (old_status.is_confirmed() || self.config.notify_from_pending);
        let notified = match &self.notifier {
            Some(notifier) if wants_notification => {
                let event = StatusChangeEvent {
                    tenant: self.tenant.clone(),
                    target: id,
                    target_name: target.name.clone(),
                    url: target.url.to_string(),
                    old_status: old_status.kind(),
                    new_status: new_status.kind(),
                    reason: match &new_status {
                        ProbeStatus::Unreachable { reason } => Some(reason.to_string()),
                        _ => None,
                    },
                    checked_at,
                };
                spawn_notification(notifier.clone(), event);
                true
            }
            _ => false,
        };

        CompletionOutcome::Persisted { notified }
    }

    fn poll_interval(&self, targets: &[Target]) -> Duration {
        let floor = Duration::from_secs(self.config.min_interval_secs);
        let wanted = targets
            .iter()
            .map(|t| t.check_frequency())
            .min()
            .unwrap_or(Duration::from_secs(self.config.idle_interval_secs));
        wanted.max(floor)
    }
}

fn spawn_notification(notifier: Arc<dyn Notifier>, event: StatusChangeEvent) {
    tokio::spawn(async move {
        match notifier.notify(&event).await {
            Ok(()) => metrics::record_notification("sent"),
            Err(e) => {
                metrics::record_notification("failed");
                tracing::warn!(target_id = %event.target, error = %e, "Notification failed");
            }
        }
    });
}
