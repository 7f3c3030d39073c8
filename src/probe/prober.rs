//! Status prober.
//!
//! # Responsibilities
//! - Serve fresh cached results without touching the network
//! - Probe once, retry once after a jittered backoff, then give up
//! - Record the final classification in the cache

use std::sync::Arc;
use std::time::Duration;
use url::Url;

use crate::config::ProbeConfig;
use crate::observability::metrics;
use crate::probe::{ProbeError, ProbeTransport, ResultCache};
use crate::resilience::retries::{retry_if, RetryPolicy};
use crate::resilience::timeouts::with_timeout;
use crate::target::ProbeStatus;

pub struct StatusProber {
    transport: Arc<dyn ProbeTransport>,
    cache: Arc<ResultCache>,
    timeout: Duration,
    retry_policy: RetryPolicy,
}

impl StatusProber {
    pub fn new(transport: Arc<dyn ProbeTransport>, cache: Arc<ResultCache>, config: &ProbeConfig) -> Self {
        Self {
            transport,
            cache,
            timeout: Duration::from_secs(config.timeout_secs),
            retry_policy: RetryPolicy::exponential(
                config.max_attempts,
                Duration::from_secs(config.retry_base_delay_secs),
                Duration::from_secs(config.retry_max_delay_secs),
            ),
        }
    }

    pub fn cache(&self) -> &Arc<ResultCache> {
        &self.cache
    }

    /// Check `url`, consulting the cache unless `force_refresh` is set.
    ///
    /// Returns `Ok` for a cache hit or a reachable probe and `Err` when a
    /// fresh probe failed every attempt. Either way the outcome is cached.
    pub async fn check(&self, url: &Url, force_refresh: bool) -> Result<ProbeStatus, ProbeError> {
        let key = url.as_str();

        if force_refresh {
            self.cache.invalidate(key);
        } else if let Some(status) = self.cache.get(key) {
            tracing::trace!(url = %url, status = %status.kind(), "Probe served from cache");
            return Ok(status);
        }

        let transport = &self.transport;
        let timeout = self.timeout;
        let result = retry_if(
            self.retry_policy,
            "probe",
            |attempt| async move {
                tracing::debug!(url = %url, attempt, "Probing target");
                with_timeout(timeout, transport.probe(url, timeout)).await
            },
            ProbeError::is_transient,
        )
        .await;

        let ttl = self.cache.default_ttl();
        match result {
            Ok(()) => {
                metrics::record_probe("reachable");
                self.cache.put(key, ProbeStatus::Reachable, ttl);
                Ok(ProbeStatus::Reachable)
            }
            Err(e) => {
                tracing::info!(url = %url, error = %e, "Target not reachable");
                metrics::record_probe("unreachable");
                self.cache.put(key, ProbeStatus::unreachable(e.clone().into()), ttl);
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tokio::time::Instant;

    struct Scripted {
        outcomes: Mutex<VecDeque<Result<(), ProbeError>>>,
        calls: AtomicU32,
    }

    impl Scripted {
        fn new(outcomes: Vec<Result<(), ProbeError>>) -> Arc<Self> {
            Arc::new(Self {
                outcomes: Mutex::new(outcomes.into()),
                calls: AtomicU32::new(0),
            })
        }
    }

    #[async_trait]
    impl ProbeTransport for Scripted {
        async fn probe(&self, _url: &Url, _timeout: Duration) -> Result<(), ProbeError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.outcomes.lock().pop_front().unwrap_or(Ok(()))
        }
    }

    struct Hanging;

    #[async_trait]
    impl ProbeTransport for Hanging {
        async fn probe(&self, _url: &Url, _timeout: Duration) -> Result<(), ProbeError> {
            std::future::pending().await
        }
    }

    fn prober(transport: Arc<dyn ProbeTransport>) -> StatusProber {
        let cache = Arc::new(ResultCache::new(Duration::from_secs(300)));
        StatusProber::new(transport, cache, &ProbeConfig::default())
    }

    fn url() -> Url {
        Url::parse("https://status.example").unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_once_then_report_failure() {
        let transport = Scripted::new(vec![
            Err(ProbeError::Network("refused".into())),
            Err(ProbeError::UnexpectedResponse(503)),
        ]);
        let prober = prober(transport.clone());
        let start = Instant::now();

        let result = prober.check(&url(), false).await;

        assert_eq!(result, Err(ProbeError::UnexpectedResponse(503)));
        assert_eq!(transport.calls.load(Ordering::SeqCst), 2);
        // One backoff of 10s plus at most 10% jitter.
        assert!(start.elapsed() >= Duration::from_secs(10));
        assert!(start.elapsed() < Duration::from_secs(12));
    }

    #[tokio::test(start_paused = true)]
    async fn test_recovers_on_retry() {
        let transport = Scripted::new(vec![Err(ProbeError::Network("reset".into())), Ok(())]);
        let prober = prober(transport.clone());

        assert_eq!(prober.check(&url(), false).await, Ok(ProbeStatus::Reachable));
        assert_eq!(transport.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cache_hit_skips_network_and_is_ok() {
        let transport = Scripted::new(vec![
            Err(ProbeError::Timeout(Duration::from_secs(15))),
            Err(ProbeError::Timeout(Duration::from_secs(15))),
        ]);
        let prober = prober(transport.clone());

        let first = prober.check(&url(), false).await;
        assert!(first.is_err());
        let calls = transport.calls.load(Ordering::SeqCst);

        let second = prober.check(&url(), false).await;
        assert_eq!(
            second,
            Ok(ProbeStatus::unreachable(crate::target::UnreachableReason::Timeout))
        );
        assert_eq!(transport.calls.load(Ordering::SeqCst), calls);
    }

    #[tokio::test(start_paused = true)]
    async fn test_force_refresh_bypasses_cache() {
        let transport = Scripted::new(vec![]);
        let prober = prober(transport.clone());

        prober.check(&url(), false).await.unwrap();
        prober.check(&url(), true).await.unwrap();
        assert_eq!(transport.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalid_url_fails_without_retry() {
        let transport = Scripted::new(vec![Err(ProbeError::InvalidUrl("bad path".into()))]);
        let prober = prober(transport.clone());
        let start = Instant::now();

        let result = prober.check(&url(), false).await;

        assert_eq!(result, Err(ProbeError::InvalidUrl("bad path".into())));
        assert_eq!(transport.calls.load(Ordering::SeqCst), 1);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_hanging_transport_times_out() {
        let prober = prober(Arc::new(Hanging));
        let result = prober.check(&url(), false).await;
        assert_eq!(result, Err(ProbeError::Timeout(Duration::from_secs(15))));
    }
}
