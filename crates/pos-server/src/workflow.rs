//! Runs the caller's vertical workflow chain ahead of inventory handlers.

use axum::extract::{Request, State};
use axum::http::HeaderValue;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use pos_core::workflow::WorkflowContext;

use crate::auth::AuthUser;
use crate::error::AppError;
use crate::state::AppState;

/// Response header listing the workflow steps that ran, comma separated.
pub const WORKFLOW_HEADER: &str = "x-pos-workflows";

/// Must sit inside [`crate::auth::require_auth`]; the chain is chosen by the
/// business type in the caller's token.
pub async fn run_workflows(State(app): State<AppState>, req: Request, next: Next) -> Response {
    let Some(AuthUser(claims)) = req.extensions().get::<AuthUser>().cloned() else {
        return AppError::unauthorized("missing bearer token").into_response();
    };

    let bundle = app.config.business_config(claims.business_type);
    let chain = match app.registry.chain(bundle.workflows.as_slice()) {
        Ok(c) => c,
        Err(e) => return AppError::from(e).into_response(),
    };
    let mut ctx = WorkflowContext::new(claims.business_type, req.method().as_str(), req.uri().path())
        .with_user(claims.sub.clone());
    let executed = match chain.run(&mut ctx) {
        Ok(names) => names,
        Err(e) => return AppError::from(e).into_response(),
    };

    let mut resp = next.run(req).await;
    if let Ok(value) = HeaderValue::from_str(&executed.join(",")) {
        resp.headers_mut().insert(WORKFLOW_HEADER, value);
    }
    resp
}
