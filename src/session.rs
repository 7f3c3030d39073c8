//! Per-tenant monitor session.
//!
//! A session owns exactly one queue, one cache and one scheduler. Starting a
//! session spawns the poll loop; ending it stops the loop, closes the queue
//! and forgets every cached result.

use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

use crate::config::MonitorConfig;
use crate::lifecycle::Shutdown;
use crate::notifications::Notifier;
use crate::probe::{ProbeTransport, ResultCache, StatusProber};
use crate::queue::ProbeQueue;
use crate::scheduler::PollScheduler;
use crate::store::TargetStore;
use crate::target::TenantId;

pub struct MonitorSession {
    tenant: TenantId,
    cache: Arc<ResultCache>,
    queue: Arc<ProbeQueue>,
    scheduler: Arc<PollScheduler>,
    shutdown: Shutdown,
    poller: JoinHandle<()>,
}

impl MonitorSession {
    /// Build the session state and start polling `tenant`'s targets.
    ///
    /// Must be called inside a Tokio runtime.
    pub fn start(
        tenant: TenantId,
        config: &MonitorConfig,
        store: Arc<dyn TargetStore>,
        notifier: Option<Arc<dyn Notifier>>,
        transport: Arc<dyn ProbeTransport>,
    ) -> Self {
        let cache = Arc::new(ResultCache::new(Duration::from_secs(config.cache.ttl_secs)));
        let queue = Arc::new(ProbeQueue::new(&config.queue));
        let prober = Arc::new(StatusProber::new(transport, cache.clone(), &config.probe));
        let scheduler = Arc::new(PollScheduler::new(
            tenant.clone(),
            store,
            notifier,
            queue.clone(),
            prober,
            config.scheduler.clone(),
        ));

        let shutdown = Shutdown::new();
        let rx = shutdown.subscribe();
        let poller = {
            let scheduler = scheduler.clone();
            tokio::spawn(async move { scheduler.run(rx).await })
        };

        tracing::info!(tenant = %tenant, "Monitor session started");

        Self {
            tenant,
            cache,
            queue,
            scheduler,
            shutdown,
            poller,
        }
    }

    pub fn tenant(&self) -> &TenantId {
        &self.tenant
    }

    pub fn scheduler(&self) -> &Arc<PollScheduler> {
        &self.scheduler
    }

    pub fn queue(&self) -> &Arc<ProbeQueue> {
        &self.queue
    }

    pub fn cache(&self) -> &Arc<ResultCache> {
        &self.cache
    }

    /// Tear the session down. Probes already executing run to completion
    /// in the background; nothing else is dispatched.
    pub async fn end(self) {
        self.shutdown.trigger();
        self.queue.close();

        if let Err(e) = self.poller.await {
            tracing::error!(tenant = %self.tenant, error = %e, "Poll loop ended abnormally");
        }

        self.cache.clear();
        tracing::info!(tenant = %self.tenant, "Monitor session ended");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::ProbeError;
    use crate::queue::QueueError;
    use crate::store::InMemoryTargetStore;
    use crate::target::{ProbeStatus, Target};
    use async_trait::async_trait;
    use url::Url;

    struct AlwaysUp;

    #[async_trait]
    impl ProbeTransport for AlwaysUp {
        async fn probe(&self, _url: &Url, _timeout: Duration) -> Result<(), ProbeError> {
            Ok(())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_session_polls_and_tears_down() {
        let store = Arc::new(InMemoryTargetStore::new());
        let tenant = TenantId::new("acme");
        let id = store.insert(
            Target::new(tenant.clone(), "site", "https://example.com", 60, false).unwrap(),
        );

        let session = MonitorSession::start(
            tenant,
            &MonitorConfig::default(),
            store.clone(),
            None,
            Arc::new(AlwaysUp),
        );

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(store.get(&id).unwrap().status, ProbeStatus::Reachable);
        assert_eq!(session.cache().len(), 1);

        let queue = session.queue().clone();
        let cache = session.cache().clone();
        session.end().await;

        assert!(cache.is_empty());
        assert_eq!(
            queue.enqueue(async { Ok::<_, ()>(()) }).err(),
            Some(QueueError::Closed)
        );
    }
}
