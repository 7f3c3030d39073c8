//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, thresholds > 0)
//! - Check target URLs and detect duplicate target names
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: MonitorConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::fmt;

use crate::config::schema::MonitorConfig;
use crate::target::types::parse_target_url;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Upper bound for any configured duration: one day.
const MAX_DURATION_SECS: u64 = 86_400;

fn check_upper_bound(errors: &mut Vec<ValidationError>, field: &str, secs: u64) {
    if secs > MAX_DURATION_SECS {
        errors.push(ValidationError::new(
            field,
            format!("must not exceed {} seconds", MAX_DURATION_SECS),
        ));
    }
}

pub fn validate_config(config: &MonitorConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.session.tenant.trim().is_empty() {
        errors.push(ValidationError::new("session.tenant", "must not be empty"));
    }

    if config.probe.timeout_secs == 0 {
        errors.push(ValidationError::new("probe.timeout_secs", "must be greater than 0"));
    }
    if config.probe.max_attempts == 0 {
        errors.push(ValidationError::new("probe.max_attempts", "must be at least 1"));
    }
    if config.probe.retry_max_delay_secs < config.probe.retry_base_delay_secs {
        errors.push(ValidationError::new(
            "probe.retry_max_delay_secs",
            "must not be less than retry_base_delay_secs",
        ));
    }
    if !config.probe.probe_path.starts_with('/') {
        errors.push(ValidationError::new("probe.probe_path", "must start with '/'"));
    }

    if config.cache.ttl_secs == 0 {
        errors.push(ValidationError::new("cache.ttl_secs", "must be greater than 0"));
    }

    if config.queue.max_concurrency == 0 {
        errors.push(ValidationError::new("queue.max_concurrency", "must be at least 1"));
    }
    if config.queue.failure_threshold == 0 {
        errors.push(ValidationError::new("queue.failure_threshold", "must be at least 1"));
    }

    if config.scheduler.min_interval_secs == 0 {
        errors.push(ValidationError::new("scheduler.min_interval_secs", "must be greater than 0"));
    }
    if config.scheduler.persist_attempts == 0 {
        errors.push(ValidationError::new("scheduler.persist_attempts", "must be at least 1"));
    }

    for (field, secs) in [
        ("probe.timeout_secs", config.probe.timeout_secs),
        ("probe.retry_base_delay_secs", config.probe.retry_base_delay_secs),
        ("probe.retry_max_delay_secs", config.probe.retry_max_delay_secs),
        ("cache.ttl_secs", config.cache.ttl_secs),
        ("queue.cooldown_secs", config.queue.cooldown_secs),
        ("scheduler.min_interval_secs", config.scheduler.min_interval_secs),
        ("scheduler.idle_interval_secs", config.scheduler.idle_interval_secs),
        ("scheduler.persist_retry_delay_secs", config.scheduler.persist_retry_delay_secs),
        ("notifications.timeout_secs", config.notifications.timeout_secs),
        ("admin.request_timeout_secs", config.admin.request_timeout_secs),
    ] {
        check_upper_bound(&mut errors, field, secs);
    }

    if let Some(url) = &config.notifications.webhook_url {
        if let Err(e) = parse_target_url(url) {
            errors.push(ValidationError::new("notifications.webhook_url", e.to_string()));
        }
    }

    if config.admin.enabled && config.admin.bind_address.parse::<std::net::SocketAddr>().is_err() {
        errors.push(ValidationError::new("admin.bind_address", "must be a socket address"));
    }
    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<std::net::SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            "must be a socket address",
        ));
    }

    let mut names = HashSet::new();
    for (i, target) in config.targets.iter().enumerate() {
        let field = format!("targets[{}]", i);
        if target.name.trim().is_empty() {
            errors.push(ValidationError::new(format!("{}.name", field), "must not be empty"));
        } else if !names.insert(target.name.as_str()) {
            errors.push(ValidationError::new(
                format!("{}.name", field),
                format!("duplicate target name '{}'", target.name),
            ));
        }
        if let Err(e) = parse_target_url(&target.url) {
            errors.push(ValidationError::new(format!("{}.url", field), e.to_string()));
        }
        check_upper_bound(
            &mut errors,
            &format!("{}.check_frequency_secs", field),
            target.check_frequency_secs,
        );
        if target.check_frequency_secs == 0 {
            errors.push(ValidationError::new(
                format!("{}.check_frequency_secs", field),
                "must be greater than 0",
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::TargetConfig;

    fn target(name: &str, url: &str) -> TargetConfig {
        TargetConfig {
            name: name.to_string(),
            url: url.to_string(),
            check_frequency_secs: 60,
            notify_on_change: false,
        }
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&MonitorConfig::default()).is_ok());
    }

    #[test]
    fn test_duplicate_target_names() {
        let mut config = MonitorConfig::default();
        config.targets.push(target("site", "https://a.example"));
        config.targets.push(target("site", "https://b.example"));

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "targets[1].name");
    }

    #[test]
    fn test_range_checks() {
        let mut config = MonitorConfig::default();
        config.probe.timeout_secs = 0;
        config.queue.failure_threshold = 0;
        config.probe.probe_path = "health".to_string();

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
        assert!(fields.contains(&"probe.timeout_secs"));
        assert!(fields.contains(&"queue.failure_threshold"));
        assert!(fields.contains(&"probe.probe_path"));
    }

    #[test]
    fn test_durations_have_upper_bound() {
        let mut config = MonitorConfig::default();
        config.cache.ttl_secs = u64::MAX;
        config.queue.cooldown_secs = u64::MAX;
        config.probe.retry_max_delay_secs = u64::MAX;
        config.targets.push(TargetConfig {
            check_frequency_secs: u64::MAX,
            ..target("site", "https://a.example")
        });

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
        assert!(fields.contains(&"cache.ttl_secs"));
        assert!(fields.contains(&"queue.cooldown_secs"));
        assert!(fields.contains(&"probe.retry_max_delay_secs"));
        assert!(fields.contains(&"targets[0].check_frequency_secs"));
    }
}
