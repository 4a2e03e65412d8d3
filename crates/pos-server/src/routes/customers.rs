use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use pos_core::catalog::{self, CustomerUpdate, NewCustomer};
use serde::Deserialize;

use crate::auth::AuthUser;
use crate::error::AppError;
use crate::routes::blocking;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    q: Option<String>,
}

/// GET /api/customers: optional `?q=` matches name, email or phone.
pub async fn list_customers(
    State(app): State<AppState>,
    _user: AuthUser,
    Query(query): Query<SearchQuery>,
) -> Result<Json<serde_json::Value>, AppError> {
    let db = app.db.clone();
    let customers = blocking(move || {
        let conn = db.conn()?;
        catalog::list_customers(&conn, query.q.as_deref())
    })
    .await?;
    Ok(Json(serde_json::to_value(customers)?))
}

/// POST /api/customers
pub async fn create_customer(
    State(app): State<AppState>,
    _user: AuthUser,
    Json(body): Json<NewCustomer>,
) -> Result<(StatusCode, Json<serde_json::Value>), AppError> {
    let db = app.db.clone();
    let customer = blocking(move || {
        let conn = db.conn()?;
        catalog::create_customer(&conn, &body)
    })
    .await?;
    Ok((StatusCode::CREATED, Json(serde_json::to_value(customer)?)))
}

/// GET /api/customers/{id}
pub async fn get_customer(
    State(app): State<AppState>,
    _user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let db = app.db.clone();
    let customer = blocking(move || {
        let conn = db.conn()?;
        catalog::get_customer(&conn, &id)
    })
    .await?;
    Ok(Json(serde_json::to_value(customer)?))
}

/// PUT /api/customers/{id}
pub async fn update_customer(
    State(app): State<AppState>,
    _user: AuthUser,
    Path(id): Path<String>,
    Json(body): Json<CustomerUpdate>,
) -> Result<Json<serde_json::Value>, AppError> {
    let db = app.db.clone();
    let customer = blocking(move || {
        let conn = db.conn()?;
        catalog::update_customer(&conn, &id, &body)
    })
    .await?;
    Ok(Json(serde_json::to_value(customer)?))
}
