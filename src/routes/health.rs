use axum::response::Json;
use serde_json::json;

/// Health check endpoint handler.
///
/// # Route
/// - **Method**: GET
/// - **Path**: `/ping`
/// - **Response**: `{"status": "pong"}`
///
/// Used by load balancers and uptime monitors; touches no storage.
pub async fn ping() -> Json<serde_json::Value> {
    Json(json!({ "status": "pong" }))
}

/// Root banner, `GET /`.
pub async fn root() -> Json<serde_json::Value> {
    Json(json!({ "message": "API is running..." }))
}
