use axum::extract::{DefaultBodyLimit, State};
use axum::routing::get;
use axum::Router;
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use tower_http::limit::RequestBodyLimitLayer;

use crate::app_state::AppState;

pub mod documents;
pub mod health;

/// Document intake API and health check.
///
/// Request bodies are capped at `max_request_bytes` instead of axum's 2 MB
/// default, so oversized documents reach validation and are rejected there.
pub fn api_router(state: AppState, max_request_bytes: usize) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .route(
            "/api/v1/documents",
            get(documents::list_documents).post(documents::submit_documents),
        )
        .route(
            "/api/v1/documents/{id}",
            get(documents::get_document).delete(documents::remove_document),
        )
        .route(
            "/api/v1/documents/{id}/analysis",
            get(documents::analysis_link),
        )
        .with_state(state)
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(max_request_bytes))
}

/// GET /metrics — Prometheus text exposition.
pub async fn prometheus_metrics(State(handle): State<Arc<PrometheusHandle>>) -> String {
    handle.render()
}
