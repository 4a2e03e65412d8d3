//! Inventory endpoints. All of them sit behind the workflow middleware.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use pos_core::catalog;
use pos_core::inventory::{self, AdjustRequest, DeductRequest, NewBatch};
use pos_core::types::Role;
use serde::Deserialize;

use crate::auth::AuthUser;
use crate::error::AppError;
use crate::routes::blocking;
use crate::state::{AppState, PushMessage};

/// GET /api/inventory: the caller's vertical's products with a low-stock flag.
pub async fn list_inventory(
    State(app): State<AppState>,
    user: AuthUser,
) -> Result<Json<serde_json::Value>, AppError> {
    let db = app.db.clone();
    let bt = user.0.business_type;
    let threshold = app.config.inventory.low_stock_threshold;
    let rows = blocking(move || {
        let conn = db.conn()?;
        let products = catalog::list_products(&conn, Some(bt))?;
        Ok(products
            .into_iter()
            .map(|p| {
                let low = p.is_low_stock(threshold);
                serde_json::json!({ "product": p, "low_stock": low })
            })
            .collect::<Vec<_>>())
    })
    .await?;
    Ok(Json(serde_json::json!(rows)))
}

/// POST /api/inventory/adjust: signed stock change with a reason.
pub async fn adjust(
    State(app): State<AppState>,
    user: AuthUser,
    Json(body): Json<AdjustRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    user.require(&[Role::Admin, Role::Manager])?;
    let db = app.db.clone();
    let user_id = user.0.sub.clone();
    let adjustment = blocking(move || {
        let mut conn = db.conn()?;
        inventory::adjust_stock(&mut conn, &body, Some(&user_id))
    })
    .await?;

    if adjustment.product.is_low_stock(app.config.inventory.low_stock_threshold) {
        app.publish(PushMessage::new(
            "low_stock",
            serde_json::json!({
                "product_id": adjustment.product.id,
                "sku": adjustment.product.sku,
                "stock": adjustment.product.stock,
            }),
        ));
    }
    Ok(Json(serde_json::to_value(adjustment)?))
}

#[derive(Deserialize)]
pub struct ThresholdQuery {
    #[serde(default)]
    threshold: Option<i64>,
}

/// GET /api/inventory/low-stock: `?threshold=` overrides the configured one.
pub async fn low_stock(
    State(app): State<AppState>,
    _user: AuthUser,
    Query(q): Query<ThresholdQuery>,
) -> Result<Json<serde_json::Value>, AppError> {
    let db = app.db.clone();
    let threshold = q
        .threshold
        .unwrap_or(app.config.inventory.low_stock_threshold);
    let products = blocking(move || {
        let conn = db.conn()?;
        inventory::low_stock(&conn, threshold)
    })
    .await?;
    Ok(Json(serde_json::to_value(products)?))
}

#[derive(Deserialize)]
pub struct ExpiringQuery {
    #[serde(default)]
    days: Option<i64>,
}

/// GET /api/inventory/expiring?days=N
pub async fn expiring(
    State(app): State<AppState>,
    _user: AuthUser,
    Query(q): Query<ExpiringQuery>,
) -> Result<Json<serde_json::Value>, AppError> {
    let db = app.db.clone();
    let days = q.days.unwrap_or(app.config.inventory.expiry_warning_days);
    let today = Utc::now().date_naive();
    let batches = blocking(move || {
        let conn = db.conn()?;
        inventory::expiring_batches(&conn, today, days)
    })
    .await?;
    Ok(Json(serde_json::json!({ "days": days, "batches": batches })))
}

/// POST /api/inventory/batches: receive a lot.
pub async fn add_batch(
    State(app): State<AppState>,
    user: AuthUser,
    Json(body): Json<NewBatch>,
) -> Result<(StatusCode, Json<serde_json::Value>), AppError> {
    user.require(&[Role::Admin, Role::Manager])?;
    let db = app.db.clone();
    let user_id = user.0.sub.clone();
    let batch = blocking(move || {
        let mut conn = db.conn()?;
        inventory::add_batch(&mut conn, &body, Some(&user_id))
    })
    .await?;
    Ok((StatusCode::CREATED, Json(serde_json::to_value(batch)?)))
}

/// POST /api/inventory/batches/deduct: first-expiry-first-out sale.
pub async fn deduct_batches(
    State(app): State<AppState>,
    user: AuthUser,
    Json(body): Json<DeductRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    user.require(&[Role::Admin, Role::Manager, Role::Cashier])?;
    let db = app.db.clone();
    let user_id = user.0.sub.clone();
    let today = Utc::now().date_naive();
    let product_id = body.product_id.clone();
    let taken = blocking(move || {
        let mut conn = db.conn()?;
        inventory::deduct_by_batch(&mut conn, &body, today, Some(&user_id))
    })
    .await?;
    Ok(Json(serde_json::json!({ "product_id": product_id, "batches": taken })))
}
