//! # GET /health

use axum::Json;

/// GET /health — 死活確認。プロバイダには問い合わせない。
pub async fn handle_health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}
