use axum::{routing::get, Router};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::check_engine::CheckEngine;
use crate::config::AppConfig;

pub mod handlers;

pub use handlers::{health_check, home, metrics};

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<CheckEngine>,
    /// Present when metrics are enabled
    pub metrics: Option<PrometheusHandle>,
}

pub fn create_router(state: AppState, metrics_endpoint: &str) -> Router {
    let mut router = Router::new()
        .route("/", get(home))
        .route("/health", get(health_check));

    if state.metrics.is_some() {
        router = router.route(metrics_endpoint, get(metrics));
    }

    router
        .layer(
            ServiceBuilder::new().layer(
                TraceLayer::new_for_http()
                    .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                    .on_response(DefaultOnResponse::new().level(Level::INFO)),
            ),
        )
        .with_state(state)
}

pub async fn serve(config: &AppConfig, state: AppState) -> anyhow::Result<()> {
    let app = create_router(state, &config.metrics.endpoint);

    let listener =
        tokio::net::TcpListener::bind(format!("{}:{}", config.server.host, config.server.port))
            .await?;

    tracing::info!(
        "Health server starting on {}:{}",
        config.server.host,
        config.server.port
    );

    axum::serve(listener, app).await?;

    Ok(())
}
