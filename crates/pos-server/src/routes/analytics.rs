use axum::extract::State;
use axum::Json;
use chrono::Utc;
use pos_core::types::Role;
use pos_core::{catalog, inventory, users};

use crate::auth::AuthUser;
use crate::error::AppError;
use crate::routes::blocking;
use crate::state::AppState;

/// GET /api/analytics/realtime: store counters plus live kitchen load.
pub async fn realtime(
    State(app): State<AppState>,
    user: AuthUser,
) -> Result<Json<serde_json::Value>, AppError> {
    user.require(&[Role::Admin, Role::Manager])?;

    let db = app.db.clone();
    let threshold = app.config.inventory.low_stock_threshold;
    let store = blocking(move || {
        let conn = db.conn()?;
        Ok(serde_json::json!({
            "products": catalog::count_products(&conn)?,
            "customers": catalog::count_customers(&conn)?,
            "users": users::count_users(&conn)?,
            "inventory_value_cents": catalog::inventory_value_cents(&conn)?,
            "low_stock": inventory::low_stock(&conn, threshold)?.len(),
        }))
    })
    .await?;

    let now = Utc::now();
    let urgent_after = app.config.kitchen.urgent_after()?;
    let kitchen = {
        let board = app.kitchen.lock().await;
        let items_in_progress = board
            .open_orders()
            .flat_map(|o| o.items.iter())
            .filter(|i| i.status.is_in_progress())
            .count();
        serde_json::json!({
            "open_orders": board.open_orders().count(),
            "urgent_orders": board.urgent_orders(now, urgent_after).len(),
            "items_in_progress": items_in_progress,
            "queue_length": board.next_to_assign().len(),
        })
    };

    Ok(Json(serde_json::json!({
        "store": store,
        "kitchen": kitchen,
        "connected_terminals": app.connected_terminals(),
        "generated_at": now,
    })))
}
