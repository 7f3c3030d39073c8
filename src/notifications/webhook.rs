use async_trait::async_trait;
use reqwest::{header, Client};
use std::time::Duration;
use url::Url;

use super::{Notifier, NotifyError, StatusChangeEvent};

/// Posts each status change as JSON to a webhook.
#[derive(Debug, Clone)]
pub struct WebhookNotifier {
    client: Client,
    url: Url,
}

impl WebhookNotifier {
    pub fn new(url: &str, timeout: Duration) -> Result<Self, NotifyError> {
        let url = Url::parse(url)
            .map_err(|e| NotifyError::InvalidConfiguration(format!("Invalid webhook url: {}", e)))?;
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, url })
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn notify(&self, event: &StatusChangeEvent) -> Result<(), NotifyError> {
        let response = self
            .client
            .post(self.url.clone())
            .header(header::CONTENT_TYPE, "application/json")
            .json(event)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error body".to_string());
            return Err(NotifyError::SendFailed(format!(
                "Webhook returned non-success status: {}. Body: {}",
                status, body
            )));
        }

        Ok(())
    }
}
