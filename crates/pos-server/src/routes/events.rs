use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use std::convert::Infallible;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt as _;

use crate::state::AppState;

/// GET /api/events: public SSE stream for kitchen displays. Each push is
/// sent as an event named after its type with no payload; displays refetch.
pub async fn sse_events(State(app): State<AppState>) -> impl axum::response::IntoResponse {
    let rx = app.event_tx.subscribe();
    let stream = BroadcastStream::new(rx).filter_map(|msg| {
        msg.ok()
            .map(|m| Ok::<Event, Infallible>(Event::default().event(m.kind.clone()).data(m.kind)))
    });
    Sse::new(stream).keep_alive(KeepAlive::default())
}
