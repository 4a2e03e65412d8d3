use axum::Json;
use pos_core::permissions;
use pos_core::types::Role;

use crate::auth::AuthUser;
use crate::error::AppError;

/// GET /api/permissions/templates: default permission set per role.
pub async fn list_templates(user: AuthUser) -> Result<Json<serde_json::Value>, AppError> {
    user.require(&[Role::Admin, Role::Manager])?;
    Ok(Json(serde_json::to_value(permissions::templates())?))
}
