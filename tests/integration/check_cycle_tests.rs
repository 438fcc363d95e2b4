use std::sync::Arc;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::*;
use bargain_hunter::{
    config::ScraperConfig,
    models::{NewWatchedProduct, WatchedProduct, WatchedSite},
    AppError, CheckSettings, HttpFetcher, MAX_CONTAINERS,
};

fn product(name: &str, max_price: f64) -> WatchedProduct {
    WatchedProduct::new(NewWatchedProduct::new(name, max_price))
}

#[tokio::test]
async fn test_fixture_page_yields_matches_under_ceiling() {
    let fetcher = Arc::new(FakeFetcher::serving(OZON_SEARCH_PAGE));
    let notifier = Arc::new(RecordingNotifier::default());
    let engine = create_test_engine(fetcher, notifier.clone(), test_settings()).await;

    let listings = engine
        .run_check(&[product("наушники", 2000.0)], &[WatchedSite::new("ozon.ru")], Some(5))
        .await
        .unwrap();

    let names: Vec<&str> = listings.iter().map(|l| l.name.as_str()).collect();
    assert_eq!(
        names,
        vec!["Наушники Sony WH-1000XM4", "Наушники Xiaomi Redmi Buds 4"]
    );
    assert_eq!(listings[0].price, 1999.0);
    assert_eq!(listings[0].link, "https://www.ozon.ru/product/sony-wh-1000xm4-123/");
    assert_eq!(
        listings[0].image.as_deref(),
        Some("https://ir.ozone.ru/s3/multimedia-1/wc500/sony.jpg")
    );
    assert_eq!(listings[1].price, 1490.0);
    assert_eq!(
        listings[1].image.as_deref(),
        Some("https://ir.ozone.ru/s3/multimedia-3/wc500/buds.jpg")
    );

    let sent = notifier.sent();
    assert_eq!(sent.len(), 2);
    assert!(sent.iter().all(|(chat, payload)| *chat == 5 && payload.image.is_some()));
}

#[tokio::test]
async fn test_every_listing_respects_name_and_ceiling() {
    let fetcher = Arc::new(FakeFetcher::serving(OZON_SEARCH_PAGE));
    let engine = create_test_engine(
        fetcher,
        Arc::new(RecordingNotifier::default()),
        test_settings(),
    )
    .await;

    let products = vec![product("наушники", 100_000.0), product("SONY", 2500.0)];
    let listings = engine
        .run_check(&products, &[WatchedSite::new("ozon.ru")], Some(5))
        .await
        .unwrap();

    assert_eq!(listings.len(), 4);
    for listing in &listings {
        let ceiling = products
            .iter()
            .find(|p| p.name == listing.product)
            .unwrap()
            .max_price;
        assert!(listing.price <= ceiling);
        assert!(listing.name.to_lowercase().contains(&listing.product.to_lowercase()));
        assert!(listing.link.starts_with("https://"));
    }
}

#[tokio::test]
async fn test_failing_fetches_are_isolated() {
    let fetcher = Arc::new(FakeFetcher::failing());
    let notifier = Arc::new(RecordingNotifier::default());
    let engine = create_test_engine(fetcher.clone(), notifier.clone(), test_settings()).await;

    let products = vec![product("наушники", 2000.0), product("ноутбук", 80_000.0)];
    let listings = engine
        .run_check(&products, &[WatchedSite::new("ozon.ru")], Some(5))
        .await
        .unwrap();

    assert!(listings.is_empty());
    assert_eq!(fetcher.calls(), 2);
    assert!(notifier.sent().is_empty());
}

#[tokio::test]
async fn test_unsupported_sites_are_not_fetched() {
    let fetcher = Arc::new(FakeFetcher::serving(OZON_SEARCH_PAGE));
    let engine = create_test_engine(
        fetcher.clone(),
        Arc::new(RecordingNotifier::default()),
        test_settings(),
    )
    .await;

    let sites = vec![WatchedSite::new("wildberries.ru"), WatchedSite::new("market.yandex.ru")];
    let listings = engine
        .run_check(&[product("наушники", 2000.0)], &sites, Some(5))
        .await
        .unwrap();

    assert!(listings.is_empty());
    assert_eq!(fetcher.calls(), 0);
}

#[tokio::test]
async fn test_container_cap_applies_to_large_pages() {
    let tiles: String = (0..30)
        .map(|i| {
            format!(
                r#"<div class="tile-root"><a class="tile-hover-target" href="/product/{i}">Наушники модель {i}</a>
                   <span class="tsHeadline500Medium">{} ₽</span></div>"#,
                100 + i
            )
        })
        .collect();
    let fetcher = Arc::new(FakeFetcher::serving(&tiles));
    let engine = create_test_engine(
        fetcher,
        Arc::new(RecordingNotifier::default()),
        test_settings(),
    )
    .await;

    let listings = engine
        .run_check(&[product("наушники", 10_000.0)], &[WatchedSite::new("ozon.ru")], Some(5))
        .await
        .unwrap();
    assert_eq!(listings.len(), MAX_CONTAINERS);
}

#[tokio::test]
async fn test_deduplication_across_runs() {
    let fetcher = Arc::new(FakeFetcher::serving(OZON_SEARCH_PAGE));
    let notifier = Arc::new(RecordingNotifier::default());
    let settings = CheckSettings {
        deduplicate: true,
        ..test_settings()
    };
    let engine = create_test_engine(fetcher, notifier.clone(), settings).await;

    let products = vec![product("наушники", 2000.0)];
    let sites = vec![WatchedSite::new("ozon.ru")];

    assert_eq!(engine.run_check(&products, &sites, Some(5)).await.unwrap().len(), 2);
    assert!(engine.run_check(&products, &sites, Some(5)).await.unwrap().is_empty());
    assert_eq!(notifier.sent().len(), 2);
}

#[tokio::test]
async fn test_run_from_store_requires_destination() {
    let (_dir, store) = create_test_store().await;
    store
        .add_product(NewWatchedProduct::new("наушники", 2000.0))
        .await
        .unwrap();
    store.add_site("ozon.ru").await.unwrap();

    let fetcher = Arc::new(FakeFetcher::serving(OZON_SEARCH_PAGE));
    let notifier = Arc::new(RecordingNotifier::default());
    let engine = create_test_engine(fetcher.clone(), notifier.clone(), test_settings()).await;

    assert!(engine.run_from_store(&store).await.unwrap().is_empty());
    assert_eq!(fetcher.calls(), 0);

    store.set_chat_id(99).await.unwrap();
    let listings = engine.run_from_store(&store).await.unwrap();
    assert_eq!(listings.len(), 2);
    assert!(notifier.sent().iter().all(|(chat, _)| *chat == 99));
}

#[test]
fn test_check_in_progress_error_message() {
    assert_eq!(
        AppError::CheckInProgress.to_string(),
        "A check is already in progress"
    );
}

#[tokio::test]
async fn test_http_pipeline_against_mock_site() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search/"))
        .and(query_param("text", "наушники"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(SINGLE_TILE_PAGE.as_bytes(), "text/html; charset=utf-8"),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/search/"))
        .and(query_param("text", "ноутбук"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let fetcher = HttpFetcher::new(&ScraperConfig {
        request_timeout: 5,
        user_agent: "Mozilla/5.0 (test)".to_string(),
        accept_language: "ru-RU".to_string(),
    })
    .unwrap();
    let notifier = Arc::new(RecordingNotifier::default());
    let engine = bargain_hunter::CheckEngine::new(
        Arc::new(fetcher),
        ozon_plugins(&server.uri()).await,
        notifier.clone(),
        test_settings(),
    );

    let products = vec![product("ноутбук", 90_000.0), product("наушники", 2000.0)];
    let listings = engine
        .run_check(&products, &[WatchedSite::new("ozon.ru")], Some(7))
        .await
        .unwrap();

    assert_eq!(listings.len(), 1);
    assert_eq!(listings[0].link, format!("{}/product/123", server.uri()));
    assert_eq!(notifier.sent().len(), 1);
}

const SINGLE_TILE_PAGE: &str = r#"
    <div class="tile-root">
      <a class="tile-hover-target" href="/product/123">Наушники Sony WH-1000</a>
      <span class="tsHeadline500Medium">1 999 ₽</span>
    </div>"#;
