use axum::extract::State;
use axum::Json;
use pos_core::{permissions, users};
use serde::Deserialize;

use crate::auth::AuthUser;
use crate::error::AppError;
use crate::routes::blocking;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct LoginBody {
    username: String,
    password: String,
}

/// POST /api/auth/login: exchange credentials for a bearer token.
pub async fn login(
    State(app): State<AppState>,
    Json(body): Json<LoginBody>,
) -> Result<Json<serde_json::Value>, AppError> {
    let db = app.db.clone();
    let user = blocking(move || {
        let mut conn = db.conn()?;
        users::authenticate(&mut conn, body.username.trim(), &body.password)
    })
    .await?;

    let (token, claims) =
        app.signer
            .issue(&user.id, &user.username, user.business_type, user.role)?;
    Ok(Json(serde_json::json!({
        "token": token,
        "token_type": "Bearer",
        "expires_at": claims.exp,
        "user": user,
    })))
}

/// GET /api/auth/me: the caller's account, claims and permission set.
pub async fn me(
    State(app): State<AppState>,
    user: AuthUser,
) -> Result<Json<serde_json::Value>, AppError> {
    let db = app.db.clone();
    let id = user.0.sub.clone();
    let account = blocking(move || {
        let conn = db.conn()?;
        users::get_user(&conn, &id)
    })
    .await?;
    if !account.active {
        return Err(AppError::unauthorized("account deactivated"));
    }
    Ok(Json(serde_json::json!({
        "user": account,
        "claims": user.0,
        "permissions": permissions::template(user.0.role).permissions,
    })))
}
