use axum::extract::State;
use axum::Json;

use crate::state::AppState;

/// GET /api/health: liveness plus the store identity. Public.
pub async fn health(State(app): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "store": app.config.store.name,
        "business_type": app.config.store.business_type,
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
