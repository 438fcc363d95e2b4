use async_trait::async_trait;

use crate::models::{ChatId, NotificationPayload};
use crate::utils::error::NotifyError;

/// Delivers a matched listing to a human.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(
        &self,
        destination: ChatId,
        payload: &NotificationPayload,
    ) -> Result<(), NotifyError>;
}
