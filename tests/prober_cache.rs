//! Result cache freshness and the HTTP transport against a live socket.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

use uptime_monitor::config::{ProbeConfig, QueueConfig};
use uptime_monitor::probe::{
    HttpProbeTransport, ProbeError, ProbeTransport, ResultCache, StatusProber,
};
use uptime_monitor::queue::ProbeQueue;
use uptime_monitor::target::ProbeStatus;

mod common;
use common::ScriptedTransport;

fn prober(transport: Arc<ScriptedTransport>, config: &ProbeConfig) -> Arc<StatusProber> {
    let cache = Arc::new(ResultCache::new(Duration::from_secs(300)));
    Arc::new(StatusProber::new(transport, cache, config))
}

fn url() -> Url {
    Url::parse("https://status.example").unwrap()
}

#[tokio::test(start_paused = true)]
async fn test_cache_window_is_five_minutes() {
    let transport = ScriptedTransport::always(Ok(()));
    let prober = prober(transport.clone(), &ProbeConfig::default());

    prober.check(&url(), false).await.unwrap();
    assert_eq!(transport.calls(), 1);

    tokio::time::advance(Duration::from_secs(299)).await;
    assert_eq!(prober.check(&url(), false).await, Ok(ProbeStatus::Reachable));
    assert_eq!(transport.calls(), 1);

    tokio::time::advance(Duration::from_secs(1)).await;
    assert_eq!(prober.check(&url(), false).await, Ok(ProbeStatus::Reachable));
    assert_eq!(transport.calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_cache_hit_never_counts_as_failure() {
    let transport = ScriptedTransport::always(Err(ProbeError::Network("refused".into())));
    let config = ProbeConfig {
        max_attempts: 1,
        ..ProbeConfig::default()
    };
    let prober = prober(transport.clone(), &config);
    let queue = ProbeQueue::new(&QueueConfig::default());

    let p = prober.clone();
    let first = queue
        .enqueue(async move { p.check(&url(), false).await })
        .unwrap()
        .outcome()
        .await
        .unwrap();
    tokio::task::yield_now().await;
    assert_eq!(queue.circuit().consecutive_failures(), 1);

    let p = prober.clone();
    let second = queue
        .enqueue(async move { p.check(&url(), false).await })
        .unwrap()
        .outcome()
        .await
        .unwrap();
    tokio::task::yield_now().await;

    assert_eq!(ProbeStatus::from(first), ProbeStatus::from(second));
    assert_eq!(transport.calls(), 1);
    assert!(queue.circuit().consecutive_failures() < 2);
}

#[tokio::test]
async fn test_http_transport_classifies_responses() {
    let hits = Arc::new(AtomicU32::new(0));
    let counter = hits.clone();
    let addr = common::start_programmable_backend(move || {
        let counter = counter.clone();
        async move {
            if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                (200, "ok".into())
            } else {
                (503, "maintenance".into())
            }
        }
    })
    .await;

    let transport = HttpProbeTransport::new("/", "uptime-monitor-test").unwrap();
    let target = Url::parse(&format!("http://{}/dashboard", addr)).unwrap();
    let timeout = Duration::from_secs(5);

    assert_eq!(transport.probe(&target, timeout).await, Ok(()));
    assert_eq!(
        transport.probe(&target, timeout).await,
        Err(ProbeError::UnexpectedResponse(503))
    );
    assert_eq!(hits.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_http_transport_reports_refused_connection() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let transport = HttpProbeTransport::new("/", "uptime-monitor-test").unwrap();
    let target = Url::parse(&format!("http://{}", addr)).unwrap();

    let result = transport.probe(&target, Duration::from_secs(5)).await;
    assert!(matches!(result, Err(ProbeError::Network(_))));
}
