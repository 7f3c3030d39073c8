//! Target and status types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use url::Url;
use uuid::Uuid;

use crate::probe::ProbeError;

/// Identifier of a tenant (an isolated user account).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TenantId(pub String);

impl TenantId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of a tracked target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TargetId(pub Uuid);

impl TargetId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TargetId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TargetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Why a probe did not confirm reachability.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "detail", rename_all = "snake_case")]
pub enum UnreachableReason {
    Timeout,
    Network(String),
    UnexpectedResponse(u16),
}

impl fmt::Display for UnreachableReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnreachableReason::Timeout => write!(f, "timeout"),
            UnreachableReason::Network(msg) => write!(f, "network error: {}", msg),
            UnreachableReason::UnexpectedResponse(code) => write!(f, "unexpected status {}", code),
        }
    }
}

impl From<ProbeError> for UnreachableReason {
    fn from(err: ProbeError) -> Self {
        match err {
            ProbeError::Timeout(_) => UnreachableReason::Timeout,
            ProbeError::Network(msg) => UnreachableReason::Network(msg),
            ProbeError::UnexpectedResponse(code) => UnreachableReason::UnexpectedResponse(code),
            ProbeError::InvalidUrl(msg) => UnreachableReason::Network(msg),
        }
    }
}

/// Reachability of a target as last observed.
///
/// `Unreachable` means "not confirmed reachable". A host that answers but
/// refuses the probe path is indistinguishable from one that is down.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ProbeStatus {
    Reachable,
    Unreachable { reason: UnreachableReason },
    #[default]
    Unknown,
}

impl ProbeStatus {
    pub fn unreachable(reason: UnreachableReason) -> Self {
        ProbeStatus::Unreachable { reason }
    }

    pub fn kind(&self) -> StatusKind {
        match self {
            ProbeStatus::Reachable => StatusKind::Online,
            ProbeStatus::Unreachable { .. } => StatusKind::Offline,
            ProbeStatus::Unknown => StatusKind::Pending,
        }
    }

    pub fn is_confirmed(&self) -> bool {
        !matches!(self, ProbeStatus::Unknown)
    }
}

impl From<Result<ProbeStatus, ProbeError>> for ProbeStatus {
    fn from(result: Result<ProbeStatus, ProbeError>) -> Self {
        match result {
            Ok(status) => status,
            Err(err) => ProbeStatus::unreachable(err.into()),
        }
    }
}

/// Coarse status used for display, change detection and notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusKind {
    Online,
    Offline,
    Pending,
}

impl StatusKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatusKind::Online => "online",
            StatusKind::Offline => "offline",
            StatusKind::Pending => "pending",
        }
    }
}

impl fmt::Display for StatusKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An externally tracked endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Target {
    pub id: TargetId,
    pub tenant: TenantId,
    pub name: String,
    pub url: Url,
    #[serde(default)]
    pub status: ProbeStatus,
    #[serde(default)]
    pub last_checked: Option<DateTime<Utc>>,
    /// Preferred check frequency in seconds.
    pub check_frequency_secs: u64,
    #[serde(default)]
    pub notify_on_change: bool,
}

impl Target {
    /// Create a never-checked target.
    ///
    /// Rejects URLs that are not http(s) or have no host.
    pub fn new(
        tenant: TenantId,
        name: impl Into<String>,
        url: &str,
        check_frequency_secs: u64,
        notify_on_change: bool,
    ) -> Result<Self, ProbeError> {
        let url = parse_target_url(url)?;
        Ok(Self {
            id: TargetId::new(),
            tenant,
            name: name.into(),
            url,
            status: ProbeStatus::Unknown,
            last_checked: None,
            check_frequency_secs,
            notify_on_change,
        })
    }

    pub fn check_frequency(&self) -> Duration {
        Duration::from_secs(self.check_frequency_secs)
    }
}

/// Parse and check a target URL.
pub fn parse_target_url(raw: &str) -> Result<Url, ProbeError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ProbeError::InvalidUrl("empty url".to_string()));
    }
    let url = Url::parse(trimmed).map_err(|e| ProbeError::InvalidUrl(e.to_string()))?;
    match url.scheme() {
        "http" | "https" => {}
        other => return Err(ProbeError::InvalidUrl(format!("unsupported scheme '{}'", other))),
    }
    if url.host_str().is_none() {
        return Err(ProbeError::InvalidUrl("missing host".to_string()));
    }
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_kinds() {
        assert_eq!(ProbeStatus::Reachable.kind(), StatusKind::Online);
        assert_eq!(
            ProbeStatus::unreachable(UnreachableReason::Timeout).kind(),
            StatusKind::Offline
        );
        assert_eq!(ProbeStatus::Unknown.kind(), StatusKind::Pending);
        assert!(!ProbeStatus::Unknown.is_confirmed());
    }

    #[test]
    fn test_probe_error_folds_into_unreachable() {
        let status: ProbeStatus = Err(ProbeError::UnexpectedResponse(503)).into();
        assert_eq!(
            status,
            ProbeStatus::unreachable(UnreachableReason::UnexpectedResponse(503))
        );
    }

    #[test]
    fn test_target_url_validation() {
        let tenant = TenantId::new("acme");
        assert!(Target::new(tenant.clone(), "site", "https://example.com", 60, false).is_ok());
        assert!(Target::new(tenant.clone(), "empty", "  ", 60, false).is_err());
        assert!(Target::new(tenant.clone(), "ftp", "ftp://example.com", 60, false).is_err());
        assert!(Target::new(tenant, "garbage", "not a url", 60, false).is_err());
    }

    #[test]
    fn test_status_serde_shape() {
        let status = ProbeStatus::unreachable(UnreachableReason::UnexpectedResponse(502));
        let json = serde_json::to_value(&status).unwrap();
        assert_eq!(json["state"], "unreachable");
        assert_eq!(json["reason"]["type"], "unexpected_response");
        assert_eq!(json["reason"]["detail"], 502);
    }
}
