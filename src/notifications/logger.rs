use async_trait::async_trait;

use super::{Notifier, NotifyError, StatusChangeEvent};

/// Writes notifications to the log only.
#[derive(Debug, Default, Clone)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, event: &StatusChangeEvent) -> Result<(), NotifyError> {
        tracing::info!(
            tenant = %event.tenant,
            target_id = %event.target,
            name = %event.target_name,
            old = %event.old_status,
            new = %event.new_status,
            reason = event.reason.as_deref().unwrap_or(""),
            "Target status changed"
        );
        Ok(())
    }
}
