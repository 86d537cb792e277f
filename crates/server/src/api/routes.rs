use std::sync::Arc;

use axum::response::Html;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use super::{cache, config, display};
use crate::state::AppState;

const INDEX_HTML: &str = include_str!("../../static/index.html");

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok".to_string() })
}

pub async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        // Display control
        .route("/update", post(display::update))
        .route("/pause", post(display::pause))
        .route("/resume", post(display::resume))
        .route("/stop", post(display::stop))
        .route("/current", get(display::current))
        .route("/status", get(display::status))
        // Cache
        .route("/cache/stats", get(cache::stats))
        .route("/cache/entries", get(cache::entries))
        .route("/cache/clear", post(cache::clear))
        // Persisted configuration
        .route("/config", post(config::update_config))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
