use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;
use tokio::sync::Mutex;

use super::commands::{main_keyboard, Command, BUTTON_ADD_PRODUCT, BUTTON_ADD_SITE};
use super::telegram::ReplyMarkup;
use crate::check_engine::CheckEngine;
use crate::models::{format_price, ChatId, NewWatchedProduct};
use crate::price_normalizer::PriceNormalizer;
use crate::store::WatchStore;
use crate::utils::error::{AppError, Result};

#[derive(Debug, Clone, Default, PartialEq)]
pub enum DialogueState {
    #[default]
    Idle,
    AwaitingProductName,
    AwaitingProductPrice {
        name: String,
    },
    AwaitingSiteName,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub text: String,
    pub markup: Option<ReplyMarkup>,
}

impl Reply {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            markup: None,
        }
    }

    pub fn with_keyboard(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            markup: Some(main_keyboard()),
        }
    }

    pub fn without_keyboard(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            markup: Some(ReplyMarkup::remove()),
        }
    }
}

/// A reply produced after the triggering message was already answered.
#[derive(Debug, Clone, PartialEq)]
pub struct Outgoing {
    pub chat_id: ChatId,
    pub reply: Reply,
}

/// Turns chat messages into store edits, check runs and replies. Dialogue
/// state is kept per chat.
pub struct BotHandler {
    store: Arc<WatchStore>,
    engine: Arc<CheckEngine>,
    normalizer: PriceNormalizer,
    dialogues: Mutex<HashMap<ChatId, DialogueState>>,
    interval_minutes: u64,
    outbox: UnboundedSender<Outgoing>,
}

impl BotHandler {
    pub fn new(
        store: Arc<WatchStore>,
        engine: Arc<CheckEngine>,
        interval_minutes: u64,
        outbox: UnboundedSender<Outgoing>,
    ) -> Self {
        Self {
            store,
            engine,
            normalizer: PriceNormalizer::new(),
            dialogues: Mutex::new(HashMap::new()),
            interval_minutes,
            outbox,
        }
    }

    pub async fn state(&self, chat_id: ChatId) -> DialogueState {
        let dialogues = self.dialogues.lock().await;
        dialogues.get(&chat_id).cloned().unwrap_or_default()
    }

    async fn set_state(&self, chat_id: ChatId, state: DialogueState) {
        let mut dialogues = self.dialogues.lock().await;
        if state == DialogueState::Idle {
            dialogues.remove(&chat_id);
        } else {
            dialogues.insert(chat_id, state);
        }
    }

    pub async fn handle(&self, chat_id: ChatId, text: &str) -> Vec<Reply> {
        match self.dispatch(chat_id, text).await {
            Ok(replies) => replies,
            Err(e) => {
                tracing::error!("Failed to handle message from chat {}: {}", chat_id, e);
                self.set_state(chat_id, DialogueState::Idle).await;
                vec![Reply::with_keyboard("❌ Something went wrong, please try again.")]
            }
        }
    }

    async fn dispatch(&self, chat_id: ChatId, text: &str) -> Result<Vec<Reply>> {
        let command = Command::parse(text);
        let state = self.state(chat_id).await;

        // Commands and menu buttons leave any open dialogue
        if !command.is_text() && state != DialogueState::Idle {
            tracing::debug!("Chat {} left dialogue {:?}", chat_id, state);
            self.set_state(chat_id, DialogueState::Idle).await;
        }

        let reply = match (state, command) {
            (DialogueState::AwaitingProductName, Command::Text(name)) => {
                self.receive_product_name(chat_id, name).await
            }
            (DialogueState::AwaitingProductPrice { name }, Command::Text(price)) => {
                self.receive_product_price(chat_id, name, &price).await?
            }
            (DialogueState::AwaitingSiteName, Command::Text(site)) => {
                self.receive_site_name(chat_id, &site).await?
            }
            (_, Command::Start) => self.start(chat_id).await?,
            (_, Command::Cancel) => Reply::with_keyboard("Action cancelled."),
            (_, Command::ShowProducts) => self.show_products().await?,
            (_, Command::ShowSites) => self.show_sites().await?,
            (_, Command::AddProduct) => {
                self.set_state(chat_id, DialogueState::AwaitingProductName).await;
                Reply::without_keyboard("📝 Enter the name of the product to watch:")
            }
            (_, Command::AddSite) => {
                self.set_state(chat_id, DialogueState::AwaitingSiteName).await;
                Reply::without_keyboard("🏪 Enter the site to add (for example: ozon.ru):")
            }
            (_, Command::DeleteProduct(position)) => self.delete_product(position).await?,
            (_, Command::DeleteSite(position)) => self.delete_site(position).await?,
            (_, Command::Check) => self.check_now(chat_id),
            (_, Command::Settings) => self.show_settings().await?,
            (_, Command::Unknown(_) | Command::Text(_)) => {
                Reply::with_keyboard("Use the menu buttons to control the bot!")
            }
        };

        Ok(vec![reply])
    }

    async fn start(&self, chat_id: ChatId) -> Result<Reply> {
        self.store.set_chat_id(chat_id).await?;
        Ok(Reply::with_keyboard(
            "👋 Hi! I watch store search results and tell you when a product \
             shows up under your price.\n\n\
             Notifications will arrive in this chat. Use the buttons below to \
             manage products and sites.",
        ))
    }

    async fn receive_product_name(&self, chat_id: ChatId, name: String) -> Reply {
        if name.is_empty() {
            return Reply::text("📝 The name must not be empty. Enter the product name:");
        }
        self.set_state(chat_id, DialogueState::AwaitingProductPrice { name })
            .await;
        Reply::text("💰 Enter the maximum price for this product (in rubles):")
    }

    async fn receive_product_price(
        &self,
        chat_id: ChatId,
        name: String,
        raw_price: &str,
    ) -> Result<Reply> {
        const RETRY: &str = "❌ Please enter a valid price (a number greater than 0):";

        let Ok(max_price) = self.normalizer.normalize(raw_price) else {
            return Ok(Reply::text(RETRY));
        };

        match self
            .store
            .add_product(NewWatchedProduct::new(&name, max_price))
            .await
        {
            Ok(product) => {
                self.set_state(chat_id, DialogueState::Idle).await;
                Ok(Reply::with_keyboard(format!(
                    "✅ Product added!\n\n📦 {}\n💰 Max price: {} ₽",
                    product.name,
                    format_price(product.max_price)
                )))
            }
            Err(AppError::Validation(_)) => Ok(Reply::text(RETRY)),
            Err(e) => Err(e),
        }
    }

    async fn receive_site_name(&self, chat_id: ChatId, name: &str) -> Result<Reply> {
        match self.store.add_site(name).await {
            Ok(site) => {
                self.set_state(chat_id, DialogueState::Idle).await;
                let mut text = format!("✅ Site {} added!", site.name);
                if !self.engine.supports_site(&site.name).await {
                    text.push_str("\n⚠️ This site is not supported yet and will be skipped during checks.");
                }
                Ok(Reply::with_keyboard(text))
            }
            Err(AppError::Duplicate(_)) => {
                self.set_state(chat_id, DialogueState::Idle).await;
                Ok(Reply::with_keyboard("❌ This site is already in the list!"))
            }
            Err(AppError::Validation(_)) => Ok(Reply::text(
                "🏪 The site name must not be empty. Enter the site:",
            )),
            Err(e) => Err(e),
        }
    }

    async fn show_products(&self) -> Result<Reply> {
        let products = self.store.list_products().await?;
        if products.is_empty() {
            return Ok(Reply::text(format!(
                "📦 Your product list is empty.\nUse '{}'.",
                BUTTON_ADD_PRODUCT
            )));
        }

        let lines: Vec<String> = products
            .iter()
            .enumerate()
            .map(|(i, p)| format!("{}. {} - up to {} ₽", i + 1, p.name, format_price(p.max_price)))
            .collect();
        Ok(Reply::text(format!(
            "📦 Your products:\n\n{}\n\nTo delete one: /delete_product N",
            lines.join("\n")
        )))
    }

    async fn show_sites(&self) -> Result<Reply> {
        let sites = self.store.list_sites().await?;
        if sites.is_empty() {
            return Ok(Reply::text(format!(
                "🏪 Your site list is empty.\nUse '{}'.",
                BUTTON_ADD_SITE
            )));
        }

        let lines: Vec<String> = sites
            .iter()
            .enumerate()
            .map(|(i, s)| format!("{}. {}", i + 1, s.name))
            .collect();
        Ok(Reply::text(format!(
            "🏪 Your sites:\n\n{}\n\nTo delete one: /delete_site N",
            lines.join("\n")
        )))
    }

    async fn delete_product(&self, position: Option<usize>) -> Result<Reply> {
        let Some(position) = position else {
            return Ok(Reply::text("❌ Usage: /delete_product N"));
        };
        let products = self.store.list_products().await?;
        if products.is_empty() {
            return Ok(Reply::text("📦 Your product list is empty."));
        }

        match position.checked_sub(1).and_then(|index| products.get(index)) {
            Some(product) => {
                let removed = self.store.remove_product(&product.id).await?;
                Ok(Reply::text(format!("✅ Product '{}' removed!", removed.name)))
            }
            None => Ok(Reply::text("❌ Invalid product number.")),
        }
    }

    async fn delete_site(&self, position: Option<usize>) -> Result<Reply> {
        let Some(position) = position else {
            return Ok(Reply::text("❌ Usage: /delete_site N"));
        };
        let sites = self.store.list_sites().await?;
        if sites.is_empty() {
            return Ok(Reply::text("🏪 Your site list is empty."));
        }

        match position.checked_sub(1).and_then(|index| sites.get(index)) {
            Some(site) => {
                let removed = self.store.remove_site(&site.id).await?;
                Ok(Reply::text(format!("✅ Site '{}' removed!", removed.name)))
            }
            None => Ok(Reply::text("❌ Invalid site number.")),
        }
    }

    fn check_now(&self, chat_id: ChatId) -> Reply {
        if self.engine.is_running() {
            return Reply::text("⏳ A check is already running, please wait.");
        }

        let engine = Arc::clone(&self.engine);
        let store = Arc::clone(&self.store);
        let outbox = self.outbox.clone();
        tokio::spawn(async move {
            let text = match engine.run_from_store(&store).await {
                Ok(listings) => format!("✅ Check finished, matches found: {}", listings.len()),
                Err(AppError::CheckInProgress) => {
                    "⏳ A check is already running, please wait.".to_string()
                }
                Err(e) => {
                    tracing::error!("Manual check failed: {}", e);
                    format!("❌ Check failed: {}", e)
                }
            };
            let reply = Reply::text(text);
            if outbox.send(Outgoing { chat_id, reply }).is_err() {
                tracing::debug!("Bot stopped before the check result could be sent");
            }
        });

        Reply::text("🔍 Starting check...")
    }

    async fn show_settings(&self) -> Result<Reply> {
        let products = self.store.list_products().await?;
        let sites = self.store.list_sites().await?;
        let deduplicate = if self.engine.settings().deduplicate {
            "on"
        } else {
            "off"
        };

        Ok(Reply::text(format!(
            "⚙️ Current settings:\n\n\
             📦 Products: {}\n\
             🏪 Sites: {}\n\
             ⏰ Check interval: {} minutes\n\
             🧹 Skip already reported listings: {}",
            products.len(),
            sites.len(),
            self.interval_minutes,
            deduplicate
        )))
    }
}
