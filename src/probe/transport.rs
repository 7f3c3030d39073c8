//! HTTP reachability transport.

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use url::Url;

use crate::probe::ProbeError;

/// Issues one reachability request.
#[async_trait]
pub trait ProbeTransport: Send + Sync {
    /// Check `url` once, giving up after `timeout`.
    async fn probe(&self, url: &Url, timeout: Duration) -> Result<(), ProbeError>;
}

/// Probes targets with a GET of a fixed path on the target's origin.
#[derive(Debug, Clone)]
pub struct HttpProbeTransport {
    client: Client,
    probe_path: String,
}

impl HttpProbeTransport {
    pub fn new(probe_path: impl Into<String>, user_agent: &str) -> Result<Self, ProbeError> {
        let client = Client::builder()
            .user_agent(user_agent)
            .build()
            .map_err(|e| ProbeError::Network(e.to_string()))?;

        Ok(Self {
            client,
            probe_path: probe_path.into(),
        })
    }

    /// Resolve the probe path against the target's origin.
    pub fn probe_url(&self, url: &Url) -> Result<Url, ProbeError> {
        url.join(&self.probe_path)
            .map_err(|e| ProbeError::InvalidUrl(e.to_string()))
    }
}

#[async_trait]
impl ProbeTransport for HttpProbeTransport {
    async fn probe(&self, url: &Url, timeout: Duration) -> Result<(), ProbeError> {
        let probe_url = self.probe_url(url)?;

        let response = self
            .client
            .get(probe_url.clone())
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ProbeError::Timeout(timeout)
                } else {
                    ProbeError::Network(e.to_string())
                }
            })?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            tracing::debug!(url = %probe_url, status = %status, "Probe got non-success status");
            Err(ProbeError::UnexpectedResponse(status.as_u16()))
        }
    }
}
