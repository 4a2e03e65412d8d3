use axum::extract::{Path, State};
use axum::Json;
use pos_core::types::BusinessType;

use crate::auth::AuthUser;
use crate::error::AppError;
use crate::state::AppState;

/// GET /api/config: UI and workflow bundle for the caller's vertical.
pub async fn get_config(
    State(app): State<AppState>,
    user: AuthUser,
) -> Result<Json<serde_json::Value>, AppError> {
    bundle_json(&app, user.0.business_type)
}

/// GET /api/config/{business_type}: bundle for any vertical.
pub async fn get_business_config(
    State(app): State<AppState>,
    _user: AuthUser,
    Path(business_type): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let bt: BusinessType = business_type.parse()?;
    bundle_json(&app, bt)
}

fn bundle_json(app: &AppState, bt: BusinessType) -> Result<Json<serde_json::Value>, AppError> {
    let bundle = app.config.business_config(bt);
    Ok(Json(serde_json::json!({
        "store": app.config.store.name,
        "business_type": bt,
        "ui": bundle.ui,
        "workflows": bundle.workflows,
    })))
}
