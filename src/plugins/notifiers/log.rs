use async_trait::async_trait;

use crate::models::{ChatId, NotificationPayload};
use crate::plugins::traits::Notifier;
use crate::utils::error::NotifyError;

/// Writes payloads to the log instead of delivering them. Used for dry runs.
#[derive(Debug, Clone, Default)]
pub struct LogNotifier;

impl LogNotifier {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(
        &self,
        destination: ChatId,
        payload: &NotificationPayload,
    ) -> Result<(), NotifyError> {
        tracing::info!(
            "Would notify chat {}: {} (image: {})",
            destination,
            payload.text.replace('\n', " | "),
            payload.image.as_deref().unwrap_or("none")
        );
        Ok(())
    }
}
