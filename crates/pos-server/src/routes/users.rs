use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use pos_core::types::Role;
use pos_core::users::{self, NewUser};
use pos_core::PosError;

use crate::auth::AuthUser;
use crate::error::AppError;
use crate::routes::blocking;
use crate::state::AppState;

/// GET /api/users: admin only.
pub async fn list_users(
    State(app): State<AppState>,
    user: AuthUser,
) -> Result<Json<serde_json::Value>, AppError> {
    user.require(&[Role::Admin])?;
    let db = app.db.clone();
    let list = blocking(move || {
        let conn = db.conn()?;
        users::list_users(&conn)
    })
    .await?;
    Ok(Json(serde_json::to_value(list)?))
}

/// POST /api/users: admin only.
pub async fn create_user(
    State(app): State<AppState>,
    user: AuthUser,
    Json(body): Json<NewUser>,
) -> Result<(StatusCode, Json<serde_json::Value>), AppError> {
    user.require(&[Role::Admin])?;
    let db = app.db.clone();
    let cost = app.hash_cost;
    let created = blocking(move || {
        let conn = db.conn()?;
        users::create_user(&conn, &body, cost)
    })
    .await?;
    tracing::info!(
        username = %created.username,
        role = %created.role,
        by = %user.0.username,
        "user created"
    );
    Ok((StatusCode::CREATED, Json(serde_json::to_value(created)?)))
}

/// DELETE /api/users/{id}: deactivates; the row is kept and the user's
/// outstanding tokens stop working.
pub async fn deactivate_user(
    State(app): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    user.require(&[Role::Admin])?;
    if id == user.0.sub {
        return Err(PosError::Validation("cannot deactivate your own account".to_string()).into());
    }
    let db = app.db.clone();
    let updated = blocking(move || {
        let conn = db.conn()?;
        users::deactivate_user(&conn, &id)
    })
    .await?;
    tracing::info!(username = %updated.username, by = %user.0.username, "user deactivated");
    Ok(Json(serde_json::to_value(updated)?))
}
