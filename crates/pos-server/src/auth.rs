use axum::extract::{FromRequestParts, Request, State};
use axum::http::request::Parts;
use axum::http::{header, HeaderMap};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use pos_core::auth::Claims;
use pos_core::types::Role;
use pos_core::{users, PosError};

use crate::error::AppError;
use crate::routes::blocking;
use crate::state::AppState;

/// Verified caller, placed in request extensions by [`require_auth`].
#[derive(Debug, Clone)]
pub struct AuthUser(pub Claims);

impl AuthUser {
    /// 403 unless the caller holds one of `roles`.
    pub fn require(&self, roles: &[Role]) -> Result<(), AppError> {
        if roles.contains(&self.0.role) {
            return Ok(());
        }
        let allowed: Vec<&str> = roles.iter().map(|r| r.as_str()).collect();
        Err(AppError::forbidden(format!(
            "role '{}' may not do this (needs {})",
            self.0.role,
            allowed.join(" or ")
        )))
    }
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or_else(|| AppError::unauthorized("missing bearer token"))
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer ").or_else(|| v.strip_prefix("bearer ")))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Verify `token` and confirm its subject is still an active account.
/// Deactivating a user revokes every token already issued to them.
pub(crate) async fn verify_token(app: &AppState, token: &str) -> Result<Claims, AppError> {
    let claims = app.signer.verify(token)?;
    let db = app.db.clone();
    let user_id = claims.sub.clone();
    let active = blocking(move || {
        let conn = db.conn()?;
        match users::get_user(&conn, &user_id) {
            Ok(user) => Ok(user.active),
            Err(PosError::UserNotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    })
    .await?;
    if !active {
        return Err(AppError::unauthorized("account deactivated"));
    }
    Ok(claims)
}

/// Axum middleware: verify `Authorization: Bearer <jwt>` and attach the
/// claims to the request. Missing, malformed, forged or expired tokens and
/// tokens of deactivated accounts get a 401 JSON body.
pub async fn require_auth(State(app): State<AppState>, mut req: Request, next: Next) -> Response {
    let Some(token) = bearer_token(req.headers()) else {
        return AppError::unauthorized("missing bearer token").into_response();
    };
    let claims = match verify_token(&app, token).await {
        Ok(c) => c,
        Err(e) => {
            tracing::debug!(path = %req.uri().path(), error = %e.0, "token rejected");
            return e.into_response();
        }
    };
    req.extensions_mut().insert(AuthUser(claims));
    next.run(req).await
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
