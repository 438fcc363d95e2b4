use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

use super::*;
use bargain_hunter::bot::{BotHandler, DialogueState};

const CHAT: i64 = 31337;

async fn say(handler: &BotHandler, text: &str) -> String {
    let replies = handler.handle(CHAT, text).await;
    assert_eq!(replies.len(), 1, "one reply for {:?}", text);
    replies[0].text.clone()
}

#[tokio::test]
async fn test_chat_setup_then_manual_check_delivers_matches() {
    let (_dir, store) = create_test_store().await;
    let fetcher = Arc::new(FakeFetcher::serving(OZON_SEARCH_PAGE));
    let notifier = Arc::new(RecordingNotifier::default());
    let engine = create_test_engine(fetcher.clone(), notifier.clone(), test_settings()).await;

    let (tx, mut rx) = mpsc::unbounded_channel();
    let handler = BotHandler::new(store.clone(), engine, 30, tx);

    say(&handler, "/start").await;
    assert_eq!(store.chat_id().await.unwrap(), Some(CHAT));

    say(&handler, "➕ Add product").await;
    say(&handler, "наушники").await;
    let added = say(&handler, "2 000 ₽").await;
    assert!(added.contains("Product added"));

    say(&handler, "➕ Add site").await;
    let added = say(&handler, "ozon.ru").await;
    assert!(added.contains("Site ozon.ru added"));
    assert_eq!(handler.state(CHAT).await, DialogueState::Idle);

    assert_eq!(say(&handler, "/check").await, "🔍 Starting check...");
    let outgoing = tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("check finishes")
        .expect("handler alive");
    assert_eq!(outgoing.chat_id, CHAT);
    assert_eq!(outgoing.reply.text, "✅ Check finished, matches found: 2");

    let sent = notifier.sent();
    assert_eq!(sent.len(), 2);
    assert!(sent.iter().all(|(chat, _)| *chat == CHAT));
    assert!(sent[0].1.text.contains("📦 Product: наушники"));
    assert!(sent[0].1.text.contains("🏪 Store: ozon.ru"));
    assert_eq!(fetcher.calls(), 1);
}

#[tokio::test]
async fn test_deleting_by_position_uses_current_order() {
    let (_dir, store) = create_test_store().await;
    let engine = create_test_engine(
        Arc::new(FakeFetcher::serving(OZON_SEARCH_PAGE)),
        Arc::new(RecordingNotifier::default()),
        test_settings(),
    )
    .await;
    let (tx, _rx) = mpsc::unbounded_channel();
    let handler = BotHandler::new(store.clone(), engine, 30, tx);

    for site in ["ozon.ru", "wildberries.ru", "market.yandex.ru"] {
        store.add_site(site).await.unwrap();
    }

    let removed = say(&handler, "/delete_site 2").await;
    assert!(removed.contains("'wildberries.ru' removed"));

    let listing = say(&handler, "🏪 My sites").await;
    assert!(listing.contains("1. ozon.ru"));
    assert!(listing.contains("2. market.yandex.ru"));
    assert!(!listing.contains("wildberries"));
}
