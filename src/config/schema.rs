//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the monitor.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the uptime monitor.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct MonitorConfig {
    /// Tenant session settings.
    pub session: SessionConfig,

    /// Reachability probe settings.
    pub probe: ProbeConfig,

    /// Result cache settings.
    pub cache: CacheConfig,

    /// Request queue and circuit breaker settings.
    pub queue: QueueConfig,

    /// Poll scheduler settings.
    pub scheduler: SchedulerConfig,

    /// Status change notification settings.
    pub notifications: NotificationConfig,

    /// Target store settings.
    pub store: StoreConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Admin API settings.
    pub admin: AdminConfig,

    /// Targets tracked for the session's tenant.
    pub targets: Vec<TargetConfig>,
}

/// Tenant session configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Tenant whose targets this process monitors.
    pub tenant: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            tenant: "default".to_string(),
        }
    }
}

/// Probe configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ProbeConfig {
    /// Per-attempt timeout in seconds.
    pub timeout_secs: u64,

    /// Attempts per probe including the first one.
    pub max_attempts: u32,

    /// Base delay for exponential backoff in seconds.
    pub retry_base_delay_secs: u64,

    /// Maximum delay for exponential backoff in seconds.
    pub retry_max_delay_secs: u64,

    /// Path requested on the target's origin.
    pub probe_path: String,

    /// User-Agent header sent with probes.
    pub user_agent: String,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 15,
            max_attempts: 2,
            retry_base_delay_secs: 10,
            retry_max_delay_secs: 60,
            probe_path: "/".to_string(),
            user_agent: "uptime-monitor-probe".to_string(),
        }
    }
}

/// Result cache configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Freshness window in seconds.
    pub ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { ttl_secs: 300 }
    }
}

/// Queue configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct QueueConfig {
    /// Maximum concurrently executing tasks.
    pub max_concurrency: usize,

    /// Consecutive failures before the circuit opens.
    pub failure_threshold: u32,

    /// Seconds after the last failure before the circuit closes again.
    pub cooldown_secs: u64,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            max_concurrency: 1,
            failure_threshold: 5,
            cooldown_secs: 60,
        }
    }
}

/// Poll scheduler configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Lower bound on the poll interval in seconds.
    pub min_interval_secs: u64,

    /// Poll interval used while the tenant has no targets.
    pub idle_interval_secs: u64,

    /// Attempts to persist a status change including the first one.
    pub persist_attempts: u32,

    /// Fixed delay between persistence attempts in seconds.
    pub persist_retry_delay_secs: u64,

    /// Notify when a target leaves `pending` (its first observed status).
    pub notify_from_pending: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            min_interval_secs: 30,
            idle_interval_secs: 60,
            persist_attempts: 2,
            persist_retry_delay_secs: 10,
            notify_from_pending: true,
        }
    }
}

/// Notification configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct NotificationConfig {
    /// Enable notifications on status change.
    pub enabled: bool,

    /// Webhook receiving JSON status change events. Log-only when unset.
    pub webhook_url: Option<String>,

    /// Webhook request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            webhook_url: None,
            timeout_secs: 10,
        }
    }
}

/// Target store configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct StoreConfig {
    /// JSON snapshot restored on startup and written on shutdown.
    pub snapshot_path: Option<String>,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Emit JSON log lines instead of the human-readable format.
    pub json_logs: bool,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Admin API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Enable admin API.
    pub enabled: bool,

    /// API key for authentication (Bearer token).
    pub api_key: String,

    /// Admin API bind address.
    pub bind_address: String,

    /// Request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            // WARNING: This is a placeholder! Change this in production.
            api_key: "CHANGE_ME_IN_PRODUCTION".to_string(),
            bind_address: "127.0.0.1:8081".to_string(),
            request_timeout_secs: 10,
        }
    }
}

/// A target declared in the config file.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct TargetConfig {
    /// Display name, unique per tenant.
    pub name: String,

    /// URL to probe.
    pub url: String,

    /// Preferred check frequency in seconds.
    #[serde(default = "default_check_frequency")]
    pub check_frequency_secs: u64,

    /// Notify when the status changes.
    #[serde(default)]
    pub notify_on_change: bool,
}

fn default_check_frequency() -> u64 {
    60
}
