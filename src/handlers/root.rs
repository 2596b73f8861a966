// handlers/root.rs - GET / and GET /health

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use chrono::Utc;
use serde_json::{json, Value};

use crate::state::AppState;

/// GET / - service banner
pub async fn root() -> Json<Value> {
    Json(json!({
        "message": "Welcome to OfficeScapes API",
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// GET /health - storage reachability; 503 when the store does not answer
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = Utc::now();
    let storage = state.store.backend();

    match state.store.health_check().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "status": "ok",
                "timestamp": now,
                "storage": storage,
            })),
        ),
        Err(e) => {
            tracing::error!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "success": false,
                    "status": "degraded",
                    "timestamp": now,
                    "storage": storage,
                    "message": "Storage unavailable",
                })),
            )
        }
    }
}
