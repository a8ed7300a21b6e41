//! Health, liveness and readiness probes

use crate::{models::ApiResponse, AppState};
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use tracing::{debug, warn};

pub async fn handle_health(State(state): State<AppState>) -> impl IntoResponse {
    debug!("GET /health");

    let upstream_configured = state.contact.is_configured();

    Json(ApiResponse::success(serde_json::json!({
        "status": if upstream_configured { "healthy" } else { "degraded" },
        "timestamp": chrono::Utc::now().timestamp(),
        "version": state.version,
        "upstream_configured": upstream_configured,
        "uptime_seconds": state.metrics.uptime_seconds(),
    })))
}

/// Ready only when submissions can actually be relayed.
pub async fn handle_readiness(State(state): State<AppState>) -> impl IntoResponse {
    debug!("GET /ready - Readiness probe");

    if state.contact.is_configured() {
        (
            StatusCode::OK,
            Json(ApiResponse::success(serde_json::json!({
                "status": "ready",
                "timestamp": chrono::Utc::now().timestamp()
            }))),
        )
    } else {
        warn!("Readiness check failed: upstream endpoint not configured");
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ApiResponse::error("Service not ready: upstream_not_configured")),
        )
    }
}

pub async fn handle_liveness() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(ApiResponse::success(serde_json::json!({
            "status": "alive",
            "timestamp": chrono::Utc::now().timestamp()
        }))),
    )
}
