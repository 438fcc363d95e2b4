use async_trait::async_trait;
use std::sync::Arc;

use crate::bot::telegram::TelegramClient;
use crate::models::{ChatId, NotificationPayload};
use crate::plugins::traits::Notifier;
use crate::utils::error::NotifyError;

/// Sends matches to a Telegram chat: a photo with caption when the listing has
/// an image, a plain message otherwise.
pub struct TelegramNotifier {
    client: Arc<TelegramClient>,
}

impl TelegramNotifier {
    pub fn new(client: Arc<TelegramClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn notify(
        &self,
        destination: ChatId,
        payload: &NotificationPayload,
    ) -> Result<(), NotifyError> {
        match &payload.image {
            Some(image) => {
                self.client
                    .send_photo(destination, image, &payload.text)
                    .await
            }
            None => {
                self.client
                    .send_message(destination, &payload.text, None)
                    .await
            }
        }
    }
}
