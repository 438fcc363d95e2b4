pub mod commands;
pub mod dialogue;
pub mod telegram;

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::{self, UnboundedReceiver};

use crate::check_engine::CheckEngine;
use crate::models::ChatId;
use crate::store::WatchStore;

pub use commands::Command;
pub use dialogue::{BotHandler, DialogueState, Outgoing, Reply};
pub use telegram::TelegramClient;

const RETRY_DELAY: Duration = Duration::from_secs(5);

/// Long-polling chat front end over the watch store and the check engine.
pub struct TelegramBot {
    client: Arc<TelegramClient>,
    handler: BotHandler,
    outbox: UnboundedReceiver<Outgoing>,
    poll_timeout: u64,
}

impl TelegramBot {
    pub fn new(
        client: Arc<TelegramClient>,
        store: Arc<WatchStore>,
        engine: Arc<CheckEngine>,
        interval_minutes: u64,
        poll_timeout: u64,
    ) -> Self {
        let (tx, outbox) = mpsc::unbounded_channel();
        Self {
            client,
            handler: BotHandler::new(store, engine, interval_minutes, tx),
            outbox,
            poll_timeout,
        }
    }

    /// Polls for updates until the task is dropped.
    pub async fn run(mut self) {
        tracing::info!("Telegram bot polling started");
        let mut offset: Option<i64> = None;

        loop {
            tokio::select! {
                Some(outgoing) = self.outbox.recv() => {
                    self.send(outgoing.chat_id, &outgoing.reply).await;
                }
                updates = self.client.get_updates(offset, self.poll_timeout) => match updates {
                    Ok(updates) => {
                        for update in updates {
                            offset = Some(update.update_id + 1);
                            let Some(message) = update.message else { continue };
                            let Some(text) = message.text else { continue };

                            tracing::debug!("Message from chat {}: {}", message.chat.id, text);
                            for reply in self.handler.handle(message.chat.id, &text).await {
                                self.send(message.chat.id, &reply).await;
                            }
                        }
                    }
                    Err(e) => {
                        tracing::warn!("Failed to poll Telegram updates: {}", e);
                        tokio::time::sleep(RETRY_DELAY).await;
                    }
                },
            }
        }
    }

    async fn send(&self, chat_id: ChatId, reply: &Reply) {
        if let Err(e) = self
            .client
            .send_message(chat_id, &reply.text, reply.markup.as_ref())
            .await
        {
            tracing::error!("Failed to reply to chat {}: {}", chat_id, e);
        }
    }
}
