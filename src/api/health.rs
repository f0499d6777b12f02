use axum::{extract::State, routing::get, Json, Router};
use axum::http::StatusCode;
use serde_json::{json, Value};

use crate::app_state::AppState;

/// Defines health check routes
pub fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/health/live", get(liveness_check))  // ✅ Liveness check
        .route("/health/ready", get(readiness_check)) // ✅ Readiness check
}

/// **Liveness Check (Basic Check)**  
/// - ✅ Verifies that the API is running  
/// - ❌ Does NOT check the storage backend  
async fn liveness_check() -> Json<Value> {
    Json(json!({ "success": true, "message": "API is live" }))
}

/// **Readiness Check (Storage Round-Trip)**  
/// - ✅ Ensures the key-value backend answers  
/// - ❌ Returns `503` with a JSON body if it does not  
async fn readiness_check(State(state): State<AppState>) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let persistence = state.store.persistence();
    persistence.ping().await.map_err(|e| {
        tracing::error!(backend = persistence.backend(), "readiness check failed: {e}");
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "success": false,
                "error": "Storage unavailable",
                "storage": persistence.backend(),
                "details": e.to_string(),
            })),
        )
    })?;

    Ok(Json(json!({ "success": true, "message": "API is ready", "storage": persistence.backend() })))
}
