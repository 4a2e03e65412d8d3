use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use pos_core::error::PosError;

// ---------------------------------------------------------------------------
// AppError: unified error type for HTTP responses
// ---------------------------------------------------------------------------

/// Unified error type for HTTP responses. The body is always
/// `{"error": message}`.
#[derive(Debug)]
pub struct AppError(pub anyhow::Error);

impl AppError {
    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self(PosError::Unauthorized(msg.into()).into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self(PosError::Forbidden(msg.into()).into())
    }

    pub(crate) fn join(err: tokio::task::JoinError) -> Self {
        Self(anyhow::anyhow!("task join error: {err}"))
    }

    fn status(&self) -> StatusCode {
        let Some(e) = self.0.downcast_ref::<PosError>() else {
            return StatusCode::INTERNAL_SERVER_ERROR;
        };
        match e {
            PosError::NotInitialized => StatusCode::BAD_REQUEST,
            PosError::UserNotFound(_)
            | PosError::ProductNotFound(_)
            | PosError::CustomerNotFound(_)
            | PosError::OrderNotFound(_)
            | PosError::ItemNotFound(_) => StatusCode::NOT_FOUND,
            PosError::UserExists(_) | PosError::ProductExists(_) => StatusCode::CONFLICT,
            PosError::InsufficientStock { .. } => StatusCode::CONFLICT,
            PosError::InvalidBusinessType(_)
            | PosError::InvalidRole(_)
            | PosError::InvalidStatus(_)
            | PosError::InvalidOrderType(_)
            | PosError::Validation(_) => StatusCode::BAD_REQUEST,
            PosError::InvalidTransition { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            PosError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            PosError::Forbidden(_) => StatusCode::FORBIDDEN,
            PosError::UnknownWorkflow(_)
            | PosError::Hash(_)
            | PosError::Db(_)
            | PosError::Io(_)
            | PosError::Yaml(_)
            | PosError::Json(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %format!("{:#}", self.0), "request failed");
        }
        let body = serde_json::json!({ "error": self.0.to_string() });
        (status, axum::Json(body)).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}
