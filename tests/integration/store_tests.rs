use bargain_hunter::models::NewWatchedProduct;
use bargain_hunter::{AppError, WatchStore};
use tempfile::TempDir;

#[tokio::test]
async fn test_store_round_trips_through_files() {
    let dir = TempDir::new().unwrap();
    let product_id = {
        let store = WatchStore::open(dir.path()).await.unwrap();
        store.add_site("ozon.ru").await.unwrap();
        store.set_chat_id(12345).await.unwrap();
        store
            .add_product(NewWatchedProduct::new("наушники", 2000.0))
            .await
            .unwrap()
            .id
    };

    let reopened = WatchStore::open(dir.path()).await.unwrap();
    let products = reopened.list_products().await.unwrap();
    assert_eq!(products.len(), 1);
    assert_eq!(products[0].id, product_id);
    assert_eq!(reopened.list_sites().await.unwrap()[0].name, "ozon.ru");
    assert_eq!(reopened.chat_id().await.unwrap(), Some(12345));
}

#[tokio::test]
async fn test_files_written_by_hand_are_picked_up() {
    let dir = TempDir::new().unwrap();
    let store = WatchStore::open(dir.path()).await.unwrap();

    std::fs::write(
        dir.path().join("products.json"),
        r#"[{"id": "abc", "name": "ноутбук", "max_price": 55000.5}]"#,
    )
    .unwrap();
    std::fs::write(dir.path().join("settings.json"), r#"{"chat_id": -100200300}"#).unwrap();

    let products = store.list_products().await.unwrap();
    assert_eq!(products[0].id, "abc");
    assert_eq!(products[0].max_price, 55000.5);
    assert_eq!(store.chat_id().await.unwrap(), Some(-100200300));
}

#[tokio::test]
async fn test_concurrent_adds_are_serialized() {
    let dir = TempDir::new().unwrap();
    let store = std::sync::Arc::new(WatchStore::open(dir.path()).await.unwrap());

    let mut tasks = Vec::new();
    for i in 0..10 {
        let store = store.clone();
        tasks.push(tokio::spawn(async move {
            store
                .add_product(NewWatchedProduct::new(&format!("товар {}", i), 100.0 + i as f64))
                .await
        }));
    }
    for task in tasks {
        task.await.unwrap().unwrap();
    }

    assert_eq!(store.list_products().await.unwrap().len(), 10);
}

#[tokio::test]
async fn test_duplicate_site_is_rejected_case_insensitively() {
    let dir = TempDir::new().unwrap();
    let store = WatchStore::open(dir.path()).await.unwrap();

    store.add_site("ozon.ru").await.unwrap();
    let err = store.add_site(" Ozon.Ru").await.unwrap_err();
    assert!(matches!(err, AppError::Duplicate(_)));
}
