use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use std::sync::Arc;
use tower::ServiceExt;

use super::*;
use bargain_hunter::web::{create_router, AppState};

async fn create_test_app_state() -> AppState {
    let engine = create_test_engine(
        Arc::new(FakeFetcher::serving(OZON_SEARCH_PAGE)),
        Arc::new(RecordingNotifier::default()),
        test_settings(),
    )
    .await;
    AppState {
        engine,
        metrics: None,
    }
}

#[tokio::test]
async fn test_health_endpoint_reports_service() {
    let app = create_router(create_test_app_state().await, "/metrics");

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
    assert!(json["timestamp"].is_string());
}

#[tokio::test]
async fn test_banner_endpoint() {
    let app = create_router(create_test_app_state().await, "/metrics");

    let response = app
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
