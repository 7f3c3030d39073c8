//! FIFO request queue with a concurrency cap and a circuit breaker.

use futures_util::FutureExt;
use parking_lot::Mutex;
use serde::Serialize;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot, Semaphore};
use tokio::task::JoinHandle;

use crate::config::QueueConfig;
use crate::observability::metrics;
use crate::resilience::{CircuitBreaker, CircuitSnapshot};

/// A type-erased task; resolves to `true` on success.
type Job = Pin<Box<dyn Future<Output = bool> + Send>>;

#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum QueueError {
    #[error("circuit open, task not accepted")]
    CircuitOpen,
    #[error("queue closed")]
    Closed,
}

#[derive(Debug, Default)]
struct Counters {
    queued: AtomicUsize,
    executing: AtomicUsize,
    peak_executing: AtomicUsize,
    dispatched: AtomicU64,
    succeeded: AtomicU64,
    failed: AtomicU64,
    rejected: AtomicU64,
    dropped: AtomicU64,
}

/// Point-in-time queue counters.
#[derive(Debug, Clone, Serialize)]
pub struct QueueStats {
    pub max_concurrency: usize,
    pub queued: usize,
    pub executing: usize,
    /// Highest number of simultaneously executing tasks observed.
    pub peak_executing: usize,
    pub dispatched: u64,
    pub succeeded: u64,
    pub failed: u64,
    /// Refused at enqueue because the circuit was open.
    pub rejected: u64,
    /// Already queued, discarded at dispatch because the circuit was open.
    pub dropped: u64,
    pub circuit: CircuitSnapshot,
}

/// Resolves to the task's output, or `None` if the task never ran to
/// completion (dropped by the circuit, queue closed, or panicked).
#[derive(Debug)]
pub struct TaskHandle<T, E> {
    rx: oneshot::Receiver<Result<T, E>>,
}

impl<T, E> TaskHandle<T, E> {
    pub async fn outcome(self) -> Option<Result<T, E>> {
        self.rx.await.ok()
    }
}

/// Serializes probe tasks.
///
/// Must be created inside a Tokio runtime: the dispatcher is spawned on
/// construction and aborted by [`ProbeQueue::close`] or on drop.
pub struct ProbeQueue {
    tx: mpsc::UnboundedSender<Job>,
    circuit: Arc<CircuitBreaker>,
    counters: Arc<Counters>,
    max_concurrency: usize,
    closed: AtomicBool,
    dispatcher: Mutex<Option<JoinHandle<()>>>,
}

impl ProbeQueue {
    pub fn new(config: &QueueConfig) -> Self {
        let max_concurrency = config.max_concurrency.max(1);
        let circuit = Arc::new(CircuitBreaker::new(
            config.failure_threshold,
            Duration::from_secs(config.cooldown_secs),
        ));
        let counters = Arc::new(Counters::default());
        let (tx, rx) = mpsc::unbounded_channel();

        let dispatcher = tokio::spawn(dispatch_loop(
            rx,
            circuit.clone(),
            counters.clone(),
            Arc::new(Semaphore::new(max_concurrency)),
        ));

        tracing::debug!(
            max_concurrency,
            failure_threshold = config.failure_threshold,
            cooldown_secs = config.cooldown_secs,
            "Probe queue started"
        );

        Self {
            tx,
            circuit,
            counters,
            max_concurrency,
            closed: AtomicBool::new(false),
            dispatcher: Mutex::new(Some(dispatcher)),
        }
    }

    /// Queue `task` behind everything already enqueued.
    ///
    /// Fails with [`QueueError::CircuitOpen`] while the breaker is open and
    /// its cooldown has not elapsed; the task is then never executed.
    pub fn enqueue<F, T, E>(&self, task: F) -> Result<TaskHandle<T, E>, QueueError>
    where
        F: Future<Output = Result<T, E>> + Send + 'static,
        T: Send + 'static,
        E: Send + 'static,
    {
        if self.closed.load(Ordering::Acquire) {
            return Err(QueueError::Closed);
        }
        if !self.circuit.allow() {
            self.counters.rejected.fetch_add(1, Ordering::Relaxed);
            metrics::record_task_dropped("rejected");
            tracing::debug!("Circuit open, rejecting task");
            return Err(QueueError::CircuitOpen);
        }

        let (result_tx, result_rx) = oneshot::channel();
        let job: Job = Box::pin(async move {
            let result = task.await;
            let success = result.is_ok();
            let _ = result_tx.send(result);
            success
        });

        self.counters.queued.fetch_add(1, Ordering::Relaxed);
        if self.tx.send(job).is_err() {
            self.counters.queued.fetch_sub(1, Ordering::Relaxed);
            return Err(QueueError::Closed);
        }

        Ok(TaskHandle { rx: result_rx })
    }

    pub fn circuit(&self) -> &CircuitBreaker {
        &self.circuit
    }

    pub fn executing(&self) -> usize {
        self.counters.executing.load(Ordering::Relaxed)
    }

    pub fn stats(&self) -> QueueStats {
        let c = &self.counters;
        QueueStats {
            max_concurrency: self.max_concurrency,
            queued: c.queued.load(Ordering::Relaxed),
            executing: c.executing.load(Ordering::Relaxed),
            peak_executing: c.peak_executing.load(Ordering::Relaxed),
            dispatched: c.dispatched.load(Ordering::Relaxed),
            succeeded: c.succeeded.load(Ordering::Relaxed),
            failed: c.failed.load(Ordering::Relaxed),
            rejected: c.rejected.load(Ordering::Relaxed),
            dropped: c.dropped.load(Ordering::Relaxed),
            circuit: self.circuit.snapshot(),
        }
    }

    /// Stop dispatching. Queued tasks are discarded; running tasks finish.
    pub fn close(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        if let Some(handle) = self.dispatcher.lock().take() {
            handle.abort();
        }
        tracing::debug!("Probe queue closed");
    }
}

impl Drop for ProbeQueue {
    fn drop(&mut self) {
        self.close();
    }
}

async fn dispatch_loop(
    mut rx: mpsc::UnboundedReceiver<Job>,
    circuit: Arc<CircuitBreaker>,
    counters: Arc<Counters>,
    permits: Arc<Semaphore>,
) {
    loop {
        // Take a slot first so FIFO order is preserved while waiting.
        let permit = match permits.clone().acquire_owned().await {
            Ok(permit) => permit,
            Err(_) => break,
        };
        let Some(job) = rx.recv().await else {
            break;
        };
        counters.queued.fetch_sub(1, Ordering::Relaxed);

        if !circuit.allow() {
            counters.dropped.fetch_add(1, Ordering::Relaxed);
            metrics::record_task_dropped("circuit_open");
            tracing::debug!("Circuit open, dropping queued task");
            continue;
        }

        let executing = counters.executing.fetch_add(1, Ordering::AcqRel) + 1;
        counters.peak_executing.fetch_max(executing, Ordering::AcqRel);
        counters.dispatched.fetch_add(1, Ordering::Relaxed);
        metrics::record_queue_executing(executing);

        let circuit = circuit.clone();
        let counters = counters.clone();
        tokio::spawn(async move {
            let success = match AssertUnwindSafe(job).catch_unwind().await {
                Ok(success) => success,
                Err(_) => {
                    tracing::error!("Probe task panicked");
                    false
                }
            };

            if success {
                circuit.record_success();
                counters.succeeded.fetch_add(1, Ordering::Relaxed);
            } else {
                counters.failed.fetch_add(1, Ordering::Relaxed);
                circuit.record_failure();
            }

            let executing = counters.executing.fetch_sub(1, Ordering::AcqRel) - 1;
            metrics::record_queue_executing(executing);
            drop(permit);
        });
    }

    tracing::debug!("Probe queue dispatcher stopped");
}
