use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;

use crate::server::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Readiness check backed by a store round trip.
pub async fn health_check(State(state): State<Arc<AppState>>) -> (StatusCode, Json<HealthResponse>) {
    match state.store.status_check().await {
        Ok(()) => (StatusCode::OK, Json(HealthResponse { status: "OK" })),
        Err(err) => {
            tracing::warn!(error = %err, "health check failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(HealthResponse { status: "db not ready" }),
            )
        }
    }
}
