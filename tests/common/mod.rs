//! Shared fixtures for integration tests.
#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use url::Url;

use uptime_monitor::notifications::{Notifier, NotifyError, StatusChangeEvent};
use uptime_monitor::probe::{ProbeError, ProbeTransport};
use uptime_monitor::store::{InMemoryTargetStore, StoreError, TargetStore};
use uptime_monitor::target::{ProbeStatus, Target, TargetId, TenantId};

/// Transport that replays scripted outcomes, then repeats a fallback.
pub struct ScriptedTransport {
    outcomes: Mutex<VecDeque<Result<(), ProbeError>>>,
    fallback: Mutex<Result<(), ProbeError>>,
    delay: Duration,
    calls: AtomicU32,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

impl ScriptedTransport {
    pub fn new(outcomes: Vec<Result<(), ProbeError>>) -> Arc<Self> {
        Self::build(outcomes, Ok(()), Duration::ZERO)
    }

    pub fn always(result: Result<(), ProbeError>) -> Arc<Self> {
        Self::build(Vec::new(), result, Duration::ZERO)
    }

    pub fn slow(delay: Duration) -> Arc<Self> {
        Self::build(Vec::new(), Ok(()), delay)
    }

    fn build(
        outcomes: Vec<Result<(), ProbeError>>,
        fallback: Result<(), ProbeError>,
        delay: Duration,
    ) -> Arc<Self> {
        Arc::new(Self {
            outcomes: Mutex::new(outcomes.into()),
            fallback: Mutex::new(fallback),
            delay,
            calls: AtomicU32::new(0),
            in_flight: AtomicUsize::new(0),
            peak_in_flight: AtomicUsize::new(0),
        })
    }

    pub fn set_fallback(&self, result: Result<(), ProbeError>) {
        *self.fallback.lock() = result;
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProbeTransport for ScriptedTransport {
    async fn probe(&self, _url: &Url, _timeout: Duration) -> Result<(), ProbeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let outcome = match self.outcomes.lock().pop_front() {
            Some(outcome) => outcome,
            None => self.fallback.lock().clone(),
        };
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        outcome
    }
}

/// Notifier that forwards every event to a channel.
///
/// When built with [`RecordingNotifier::observing`] it also snapshots the
/// stored target at the moment `notify` runs.
pub struct RecordingNotifier {
    tx: mpsc::UnboundedSender<StatusChangeEvent>,
    store: Option<Arc<FlakyStore>>,
    stored_at_notify: Mutex<Vec<Option<Target>>>,
}

impl RecordingNotifier {
    pub fn new() -> (Arc<Self>, mpsc::UnboundedReceiver<StatusChangeEvent>) {
        Self::build(None)
    }

    pub fn observing(
        store: Arc<FlakyStore>,
    ) -> (Arc<Self>, mpsc::UnboundedReceiver<StatusChangeEvent>) {
        Self::build(Some(store))
    }

    fn build(
        store: Option<Arc<FlakyStore>>,
    ) -> (Arc<Self>, mpsc::UnboundedReceiver<StatusChangeEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let notifier = Self {
            tx,
            store,
            stored_at_notify: Mutex::new(Vec::new()),
        };
        (Arc::new(notifier), rx)
    }

    pub fn stored_at_notify(&self) -> Vec<Option<Target>> {
        self.stored_at_notify.lock().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, event: &StatusChangeEvent) -> Result<(), NotifyError> {
        if let Some(store) = &self.store {
            let stored = store.inner.get(&event.target);
            self.stored_at_notify.lock().push(stored);
        }
        self.tx
            .send(event.clone())
            .map_err(|e| NotifyError::SendFailed(e.to_string()))
    }
}

/// Store whose status updates fail a configurable number of times.
pub struct FlakyStore {
    pub inner: InMemoryTargetStore,
    failures_left: AtomicU32,
    update_attempts: AtomicU32,
}

impl FlakyStore {
    pub fn new(failures: u32) -> Arc<Self> {
        Arc::new(Self {
            inner: InMemoryTargetStore::new(),
            failures_left: AtomicU32::new(failures),
            update_attempts: AtomicU32::new(0),
        })
    }

    pub fn update_attempts(&self) -> u32 {
        self.update_attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TargetStore for FlakyStore {
    async fn list_targets(&self, tenant: &TenantId) -> Result<Vec<Target>, StoreError> {
        self.inner.list_targets(tenant).await
    }

    async fn update_target_status(
        &self,
        target: &TargetId,
        status: &ProbeStatus,
        checked_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        self.update_attempts.fetch_add(1, Ordering::SeqCst);
        let failing = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(StoreError::Unavailable("injected failure".into()));
        }
        self.inner.update_target_status(target, status, checked_at).await
    }
}

pub fn tenant() -> TenantId {
    TenantId::new("acme")
}

pub fn target(name: &str, url: &str, status: ProbeStatus, notify_on_change: bool) -> Target {
    let mut target = Target::new(tenant(), name, url, 60, notify_on_change).unwrap();
    target.status = status;
    target
}

/// Start a mock HTTP server on an ephemeral port whose responses come from `f`.
pub async fn start_programmable_backend<F, Fut>(f: F) -> SocketAddr
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = (u16, String)> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let f = Arc::new(f);

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let f = f.clone();
                    tokio::spawn(async move {
                        let mut buf = [0u8; 1024];
                        let _ = socket.read(&mut buf).await;

                        let (status, body) = f().await;
                        let response = format!(
                            "HTTP/1.1 {} Mock\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            status,
                            body.len(),
                            body
                        );
                        let _ = socket.write_all(response.as_bytes()).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    addr
}
