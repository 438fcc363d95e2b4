//! Minimal Telegram Bot API client: long polling plus the two send methods
//! the bot and the notifier need.

use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;

use crate::config::TelegramConfig;
use crate::models::ChatId;
use crate::utils::error::{NotifyError, Result};

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<Message>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub message_id: i64,
    pub chat: Chat,
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: ChatId,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KeyboardButton {
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReplyKeyboardMarkup {
    pub keyboard: Vec<Vec<KeyboardButton>>,
    pub resize_keyboard: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReplyKeyboardRemove {
    pub remove_keyboard: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ReplyMarkup {
    Keyboard(ReplyKeyboardMarkup),
    Remove(ReplyKeyboardRemove),
}

impl ReplyMarkup {
    pub fn keyboard(rows: &[&[&str]]) -> Self {
        Self::Keyboard(ReplyKeyboardMarkup {
            keyboard: rows
                .iter()
                .map(|row| {
                    row.iter()
                        .map(|text| KeyboardButton {
                            text: text.to_string(),
                        })
                        .collect()
                })
                .collect(),
            resize_keyboard: true,
        })
    }

    pub fn remove() -> Self {
        Self::Remove(ReplyKeyboardRemove {
            remove_keyboard: true,
        })
    }
}

pub struct TelegramClient {
    http: Client,
    endpoint: String,
}

impl TelegramClient {
    pub fn new(config: &TelegramConfig, token: &str) -> Result<Self> {
        // Must outlive the long-poll window
        let http = Client::builder()
            .timeout(Duration::from_secs(config.poll_timeout + 10))
            .build()?;

        Ok(Self {
            http,
            endpoint: format!("{}/bot{}", config.api_base_url.trim_end_matches('/'), token),
        })
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        body: serde_json::Value,
    ) -> std::result::Result<T, NotifyError> {
        let response = self
            .http
            .post(format!("{}/{}", self.endpoint, method))
            .json(&body)
            .send()
            .await?;

        let api: ApiResponse<T> = response.json().await?;
        match (api.ok, api.result) {
            (true, Some(result)) => Ok(result),
            _ => Err(NotifyError::Api(
                api.description
                    .unwrap_or_else(|| format!("{} returned no result", method)),
            )),
        }
    }

    pub async fn get_updates(
        &self,
        offset: Option<i64>,
        timeout: u64,
    ) -> std::result::Result<Vec<Update>, NotifyError> {
        let mut body = json!({
            "timeout": timeout,
            "allowed_updates": ["message"],
        });
        if let Some(offset) = offset {
            body["offset"] = json!(offset);
        }
        self.call("getUpdates", body).await
    }

    pub async fn send_message(
        &self,
        chat_id: ChatId,
        text: &str,
        markup: Option<&ReplyMarkup>,
    ) -> std::result::Result<(), NotifyError> {
        let mut body = json!({
            "chat_id": chat_id,
            "text": text,
        });
        if let Some(markup) = markup {
            body["reply_markup"] = json!(markup);
        }
        self.call::<serde_json::Value>("sendMessage", body).await?;
        Ok(())
    }

    pub async fn send_photo(
        &self,
        chat_id: ChatId,
        photo: &str,
        caption: &str,
    ) -> std::result::Result<(), NotifyError> {
        let body = json!({
            "chat_id": chat_id,
            "photo": photo,
            "caption": caption,
        });
        self.call::<serde_json::Value>("sendPhoto", body).await?;
        Ok(())
    }
}
