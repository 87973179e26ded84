//! HTTP surface of the binding cache.

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Json};
use axum::routing::get;
use axum::Router;
use draincache_types::Binding;

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/bindings", get(get_bindings))
        .route("/aggregate", get(get_aggregate))
        .route("/health", get(health_check))
        .route("/metrics", get(get_metrics))
        .fallback(not_found)
}

/// The merged snapshot, as published by the store.
async fn get_bindings(State(state): State<AppState>) -> Json<Vec<Binding>> {
    Json(state.store.get())
}

/// Platform-wide aggregate drain URLs.
async fn get_aggregate(State(state): State<AppState>) -> Json<Vec<String>> {
    Json(state.aggregate.get())
}

async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, Json(serde_json::json!({"status": "ok"})))
}

async fn get_metrics() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4; charset=utf-8")],
        draincache_core::metrics::render_metrics(),
    )
        .into_response()
}

async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, Json(serde_json::json!({"error": "Not found"})))
}
