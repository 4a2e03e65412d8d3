//! Kitchen board endpoints.
//!
//! Every mutation runs under the board lock and is written to
//! `.pos/kitchen.json` before the lock is released. If the write fails the
//! touched order is rolled back. Closed orders past the retention window are
//! pruned ahead of each write. Resulting events are pushed afterwards.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use pos_core::io::atomic_write;
use pos_core::kitchen::{self, KitchenBoard, Mutation, NewOrder};
use pos_core::paths;
use pos_core::types::ItemStatus;
use serde::Deserialize;

use crate::auth::AuthUser;
use crate::error::AppError;
use crate::state::AppState;

async fn apply<F>(
    app: &AppState,
    user: &AuthUser,
    op: &str,
    target: Option<&str>,
    f: F,
) -> Result<Mutation, AppError>
where
    F: FnOnce(&mut KitchenBoard) -> pos_core::Result<Mutation> + Send,
{
    let mut board = app.kitchen.lock().await;
    if let Some(keep) = app.config.kitchen.retention() {
        if let Some(cutoff) = Utc::now().checked_sub_signed(keep) {
            board.prune_closed(cutoff);
        }
    }
    let checkpoint = board.checkpoint(target);
    let mutation = match f(&mut board) {
        Ok(m) => m,
        Err(e) => {
            board.restore(checkpoint);
            return Err(e.into());
        }
    };

    let path = paths::kitchen_path(&app.root);
    let saved = match board.to_json() {
        Ok(data) => tokio::task::spawn_blocking(move || atomic_write(&path, &data))
            .await
            .map_err(AppError::join)
            .and_then(|r| r.map_err(AppError::from)),
        Err(e) => Err(AppError::from(e)),
    };
    if let Err(err) = saved {
        board.restore(checkpoint);
        tracing::warn!(op, error = %err.0, "kitchen board not saved; change rolled back");
        return Err(err);
    }
    drop(board);

    tracing::info!(
        op,
        order = %mutation.order.id,
        status = %mutation.order.status,
        by = %user.0.username,
        events = mutation.events.len(),
        "kitchen board updated"
    );
    app.publish_kitchen(&mutation.events);
    Ok(mutation)
}

fn mutation_json(mutation: &Mutation) -> Result<Json<serde_json::Value>, AppError> {
    Ok(Json(serde_json::to_value(mutation)?))
}

// ---------------------------------------------------------------------------
// Orders
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    all: bool,
}

/// GET /api/kitchen/orders: open orders; `?all=true` includes closed ones.
pub async fn list_orders(
    State(app): State<AppState>,
    _user: AuthUser,
    Query(q): Query<ListQuery>,
) -> Result<Json<serde_json::Value>, AppError> {
    let board = app.kitchen.lock().await;
    let orders: Vec<_> = if q.all {
        board.orders().iter().collect()
    } else {
        board.open_orders().collect()
    };
    Ok(Json(serde_json::to_value(orders)?))
}

/// POST /api/kitchen/orders
pub async fn create_order(
    State(app): State<AppState>,
    user: AuthUser,
    Json(body): Json<NewOrder>,
) -> Result<(StatusCode, Json<serde_json::Value>), AppError> {
    let now = Utc::now();
    let mutation = apply(&app, &user, "add_order", None, move |b| {
        b.add_order(body, now)
    })
    .await?;
    Ok((StatusCode::CREATED, mutation_json(&mutation)?))
}

/// GET /api/kitchen/orders/{id}
pub async fn get_order(
    State(app): State<AppState>,
    _user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let board = app.kitchen.lock().await;
    let order = board.get_order(&id)?;
    Ok(Json(serde_json::to_value(order)?))
}

/// POST /api/kitchen/orders/{id}/prepare
pub async fn prepare_order(
    State(app): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let m = apply(&app, &user, "mark_order_being_prepared", Some(id.as_str()), |b| {
        b.mark_order_being_prepared(&id)
    })
    .await?;
    mutation_json(&m)
}

/// POST /api/kitchen/orders/{id}/complete
pub async fn complete_order(
    State(app): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let now = Utc::now();
    let m = apply(&app, &user, "mark_order_complete", Some(id.as_str()), |b| {
        b.mark_order_complete(&id, now)
    })
    .await?;
    mutation_json(&m)
}

/// POST /api/kitchen/orders/{id}/cancel
pub async fn cancel_order(
    State(app): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let now = Utc::now();
    let m = apply(&app, &user, "cancel_order", Some(id.as_str()), |b| {
        b.cancel_order(&id, now)
    })
    .await?;
    mutation_json(&m)
}

/// POST /api/kitchen/orders/{id}/advance-course
pub async fn advance_course(
    State(app): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let m = apply(&app, &user, "advance_course", Some(id.as_str()), |b| {
        b.advance_course(&id)
    })
    .await?;
    mutation_json(&m)
}

// ---------------------------------------------------------------------------
// Items
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
pub struct AssignBody {
    cook: String,
    #[serde(default)]
    station: Option<String>,
}

/// POST /api/kitchen/orders/{id}/items/{item}/assign
pub async fn assign_item(
    State(app): State<AppState>,
    user: AuthUser,
    Path((id, item)): Path<(String, String)>,
    Json(body): Json<AssignBody>,
) -> Result<Json<serde_json::Value>, AppError> {
    let now = Utc::now();
    let m = apply(&app, &user, "assign_item_to_cook", Some(id.as_str()), |b| {
        b.assign_item_to_cook(&id, &item, &body.cook, body.station.as_deref(), now)
    })
    .await?;
    mutation_json(&m)
}

/// POST /api/kitchen/orders/{id}/items/{item}/start
pub async fn start_item(
    State(app): State<AppState>,
    user: AuthUser,
    Path((id, item)): Path<(String, String)>,
) -> Result<Json<serde_json::Value>, AppError> {
    let now = Utc::now();
    let m = apply(&app, &user, "start_preparing_item", Some(id.as_str()), |b| {
        b.start_preparing_item(&id, &item, now)
    })
    .await?;
    mutation_json(&m)
}

#[derive(Deserialize)]
pub struct StatusBody {
    status: String,
}

/// POST /api/kitchen/orders/{id}/items/{item}/status
pub async fn set_item_status(
    State(app): State<AppState>,
    user: AuthUser,
    Path((id, item)): Path<(String, String)>,
    Json(body): Json<StatusBody>,
) -> Result<Json<serde_json::Value>, AppError> {
    let to: ItemStatus = body.status.parse()?;
    let now = Utc::now();
    let m = apply(&app, &user, "update_item_status", Some(id.as_str()), |b| {
        b.update_item_status(&id, &item, to, now)
    })
    .await?;
    mutation_json(&m)
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
pub struct UrgentQuery {
    #[serde(default)]
    minutes: Option<i64>,
}

/// GET /api/kitchen/urgent: `?minutes=` overrides the configured threshold.
pub async fn urgent(
    State(app): State<AppState>,
    _user: AuthUser,
    Query(q): Query<UrgentQuery>,
) -> Result<Json<serde_json::Value>, AppError> {
    let minutes = q.minutes.unwrap_or(app.config.kitchen.urgent_after_minutes);
    let threshold = kitchen::urgent_threshold(minutes)?;
    let board = app.kitchen.lock().await;
    let orders = board.urgent_orders(Utc::now(), threshold);
    Ok(Json(serde_json::json!({ "minutes": minutes, "orders": orders })))
}

/// GET /api/kitchen/workload
pub async fn workload(
    State(app): State<AppState>,
    _user: AuthUser,
) -> Result<Json<serde_json::Value>, AppError> {
    let board = app.kitchen.lock().await;
    Ok(Json(serde_json::json!({
        "cooks": board.cook_workload(),
        "stations": board.station_workload(),
    })))
}

/// GET /api/kitchen/queue: unassigned items in the order cooks should take them.
pub async fn queue(
    State(app): State<AppState>,
    _user: AuthUser,
) -> Result<Json<serde_json::Value>, AppError> {
    let board = app.kitchen.lock().await;
    Ok(Json(serde_json::to_value(board.next_to_assign())?))
}
