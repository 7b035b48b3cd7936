use axum::Json;
use serde_json::{Value, json};

/// Liveness probe for the edge itself; never gated or proxied.
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
