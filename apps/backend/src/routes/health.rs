//! Health check, service banner and fallback

use axum::{
    extract::State,
    http::{Method, StatusCode, Uri},
    Json,
};
use chrono::Utc;
use serde_json::{json, Value};

use crate::models::{HealthResponse, NotFoundResponse};
use crate::AppState;

const SERVER_NAME: &str = "Grammar API";

const ENDPOINTS: &[&str] = &[
    "/api/health",
    "/api/topics",
    "/api/topics/progress",
    "/api/progress/{userId}",
    "/api/auth/verify",
    "/api/user/progress",
    "/api/writing",
];

/// GET /api/health
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let connected = state.db.ping().await;
    if !connected {
        tracing::warn!("health check could not reach the database");
    }

    Json(HealthResponse {
        status: "OK".to_string(),
        server: SERVER_NAME.to_string(),
        timestamp: Utc::now(),
        database: if connected { "Connected" } else { "Disconnected" }.to_string(),
        endpoints: ENDPOINTS.iter().map(|e| e.to_string()).collect(),
    })
}

/// GET /
pub async fn root() -> Json<Value> {
    Json(json!({
        "message": format!("{SERVER_NAME} is running!"),
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": ENDPOINTS,
    }))
}

/// Fallback for unmatched routes
pub async fn not_found(method: Method, uri: Uri) -> (StatusCode, Json<NotFoundResponse>) {
    tracing::debug!(%method, path = uri.path(), "route not found");
    (
        StatusCode::NOT_FOUND,
        Json(NotFoundResponse {
            error: "Route not found".to_string(),
            requested: format!("{method} {}", uri.path()),
        }),
    )
}
