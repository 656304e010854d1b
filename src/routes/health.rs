use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::app_state::AppState;

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub documents: DocumentCounts,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DocumentCounts {
    pub tracked: usize,
    pub in_flight: usize,
}

/// GET /health — liveness plus tracked document counts.
pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let stats = state.intake.stats();

    let response = HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        documents: DocumentCounts {
            tracked: stats.tracked,
            in_flight: stats.in_flight,
        },
    };

    (StatusCode::OK, Json(response))
}
