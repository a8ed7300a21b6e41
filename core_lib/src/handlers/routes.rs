//! Informational routes shared by every deployment

use crate::{
    handlers::{health, metrics},
    models::ApiResponse,
    AppState,
};
use axum::{extract::State, response::IntoResponse, routing::get, Json, Router};

pub fn create_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handle_root))
        .route("/health", get(health::handle_health))
        .route("/live", get(health::handle_liveness))
        .route("/ready", get(health::handle_readiness))
        .route("/api/metrics", get(metrics::handle_metrics))
}

async fn handle_root(State(state): State<AppState>) -> impl IntoResponse {
    Json(ApiResponse::success(serde_json::json!({
        "app": state.app_name,
        "version": state.version,
        "endpoints": {
            "contact": "POST /api/contact",
            "health": "GET /health",
            "live": "GET /live",
            "ready": "GET /ready",
            "metrics": "GET /api/metrics"
        }
    })))
}
