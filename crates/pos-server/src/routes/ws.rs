//! Terminal push channel: `GET /ws?token=<jwt>`.
//!
//! Browsers cannot set headers on a WebSocket handshake, so the bearer token
//! rides in the query string. Each connected terminal receives every
//! broadcast `{type, data}` envelope; lagging terminals skip what they missed.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::response::Response;
use futures::{SinkExt, StreamExt};
use pos_core::auth::Claims;
use serde::Deserialize;
use std::sync::atomic::Ordering;
use tokio::sync::broadcast::error::RecvError;

use crate::auth::verify_token;
use crate::error::AppError;
use crate::state::{AppState, PushMessage};

#[derive(Deserialize)]
pub struct WsQuery {
    #[serde(default)]
    token: Option<String>,
}

/// Verify the query-string token of a terminal handshake.
pub(crate) async fn authorize_terminal(
    app: &AppState,
    token: Option<&str>,
) -> Result<Claims, AppError> {
    let token = token
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::unauthorized("missing token"))?;
    verify_token(app, token).await
}

pub async fn ws_handler(
    State(app): State<AppState>,
    Query(q): Query<WsQuery>,
    ws: WebSocketUpgrade,
) -> Result<Response, AppError> {
    let claims = authorize_terminal(&app, q.token.as_deref()).await?;
    Ok(ws.on_upgrade(move |socket| terminal_session(socket, app, claims)))
}

async fn terminal_session(socket: WebSocket, app: AppState, claims: Claims) {
    let terminal_id = uuid::Uuid::new_v4().to_string();
    let (mut sender, mut receiver) = socket.split();
    let mut rx = app.event_tx.subscribe();

    app.terminals.fetch_add(1, Ordering::Relaxed);
    tracing::info!(terminal = %terminal_id, user = %claims.username, "terminal connected");
    app.publish(PushMessage::new(
        "terminal_connected",
        serde_json::json!({
            "terminal_id": terminal_id,
            "username": claims.username,
            "role": claims.role,
            "business_type": claims.business_type,
        }),
    ));

    let send_terminal = terminal_id.clone();
    let mut send_task = tokio::spawn(async move {
        loop {
            let msg = match rx.recv().await {
                Ok(msg) => msg,
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(terminal = %send_terminal, skipped, "terminal lagging");
                    continue;
                }
                Err(RecvError::Closed) => break,
            };
            let text = match serde_json::to_string(&msg) {
                Ok(t) => t,
                Err(e) => {
                    tracing::warn!(error = %e, "unserializable push message");
                    continue;
                }
            };
            if sender.send(Message::Text(text.into())).await.is_err() {
                break;
            }
        }
    });

    let recv_terminal = terminal_id.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            match msg {
                Message::Close(_) => break,
                Message::Text(text) => {
                    let len = text.as_str().len();
                    tracing::debug!(terminal = %recv_terminal, len, "terminal message ignored");
                }
                _ => {}
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }

    app.terminals.fetch_sub(1, Ordering::Relaxed);
    tracing::info!(terminal = %terminal_id, "terminal disconnected");
    app.publish(PushMessage::new(
        "terminal_disconnected",
        serde_json::json!({ "terminal_id": terminal_id }),
    ));
}
