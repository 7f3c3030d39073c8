//! Metrics collection and exposition.
//!
//! # Metrics
//! - `monitor_probes_total` (counter): fresh probes by outcome
//! - `monitor_cache_lookups_total` (counter): cache hits and misses
//! - `monitor_circuit_open` (gauge): 1=open, 0=closed
//! - `monitor_queue_executing` (gauge): tasks currently executing
//! - `monitor_tasks_dropped_total` (counter): tasks refused or dropped by the circuit
//! - `monitor_status_changes_total` (counter): persisted changes by new status
//! - `monitor_persist_failures_total` (counter): status updates dropped after retries
//! - `monitor_notifications_total` (counter): notifications by result

use metrics::{counter, gauge};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;

use crate::target::StatusKind;

/// Install the Prometheus recorder and its HTTP listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_probe(outcome: &'static str) {
    counter!("monitor_probes_total", "outcome" => outcome).increment(1);
}

pub fn record_cache_lookup(hit: bool) {
    let result = if hit { "hit" } else { "miss" };
    counter!("monitor_cache_lookups_total", "result" => result).increment(1);
}

pub fn record_circuit_open(open: bool) {
    gauge!("monitor_circuit_open").set(if open { 1.0 } else { 0.0 });
}

pub fn record_queue_executing(executing: usize) {
    gauge!("monitor_queue_executing").set(executing as f64);
}

pub fn record_task_dropped(reason: &'static str) {
    counter!("monitor_tasks_dropped_total", "reason" => reason).increment(1);
}

pub fn record_status_change(kind: StatusKind) {
    counter!("monitor_status_changes_total", "kind" => kind.as_str()).increment(1);
}

pub fn record_persist_failure() {
    counter!("monitor_persist_failures_total").increment(1);
}

pub fn record_notification(result: &'static str) {
    counter!("monitor_notifications_total", "result" => result).increment(1);
}
