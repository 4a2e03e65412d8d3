use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use pos_core::catalog::{self, NewProduct, ProductUpdate};
use pos_core::types::{BusinessType, Role};
use serde::Deserialize;

use crate::auth::AuthUser;
use crate::error::AppError;
use crate::routes::blocking;
use crate::state::AppState;

const EDITORS: &[Role] = &[Role::Admin, Role::Manager];

#[derive(Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    business_type: Option<String>,
}

/// GET /api/products: all products, or one vertical's with `?business_type=`.
pub async fn list_products(
    State(app): State<AppState>,
    _user: AuthUser,
    Query(q): Query<ListQuery>,
) -> Result<Json<serde_json::Value>, AppError> {
    let filter: Option<BusinessType> = q
        .business_type
        .as_deref()
        .map(str::parse::<BusinessType>)
        .transpose()?;
    let db = app.db.clone();
    let products = blocking(move || {
        let conn = db.conn()?;
        catalog::list_products(&conn, filter)
    })
    .await?;
    Ok(Json(serde_json::to_value(products)?))
}

/// POST /api/products: defaults `business_type` to the caller's vertical.
pub async fn create_product(
    State(app): State<AppState>,
    user: AuthUser,
    Json(body): Json<NewProduct>,
) -> Result<(StatusCode, Json<serde_json::Value>), AppError> {
    user.require(EDITORS)?;
    let db = app.db.clone();
    let fallback = user.0.business_type;
    let product = blocking(move || {
        let conn = db.conn()?;
        catalog::create_product(&conn, &body, fallback)
    })
    .await?;
    tracing::info!(sku = %product.sku, by = %user.0.username, "product created");
    Ok((StatusCode::CREATED, Json(serde_json::to_value(product)?)))
}

/// GET /api/products/{id}
pub async fn get_product(
    State(app): State<AppState>,
    _user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let db = app.db.clone();
    let product = blocking(move || {
        let conn = db.conn()?;
        catalog::get_product(&conn, &id)
    })
    .await?;
    Ok(Json(serde_json::to_value(product)?))
}

/// PUT /api/products/{id}: partial update; stock changes go through inventory.
pub async fn update_product(
    State(app): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    Json(body): Json<ProductUpdate>,
) -> Result<Json<serde_json::Value>, AppError> {
    user.require(EDITORS)?;
    let db = app.db.clone();
    let product = blocking(move || {
        let conn = db.conn()?;
        catalog::update_product(&conn, &id, &body)
    })
    .await?;
    Ok(Json(serde_json::to_value(product)?))
}

/// DELETE /api/products/{id}
pub async fn delete_product(
    State(app): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    user.require(EDITORS)?;
    let db = app.db.clone();
    let deleted = id.clone();
    blocking(move || {
        let conn = db.conn()?;
        catalog::delete_product(&conn, &id)
    })
    .await?;
    tracing::info!(product = %deleted, by = %user.0.username, "product deleted");
    Ok(Json(serde_json::json!({ "deleted": deleted })))
}
