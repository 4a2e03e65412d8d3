//! Stock levels, the movement ledger and expiry-tracked batches.
//!
//! Every change to `products.stock` goes through this module and writes a
//! `stock_movements` row in the same transaction. Batches are deducted
//! first-expiry-first-out and expired batches are never drawn from.

use crate::catalog::{self, Product};
use crate::db::{new_id, now_rfc3339};
use crate::error::{PosError, Result};
use chrono::{Days, NaiveDate};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Widest expiry look-ahead accepted, in days.
pub const MAX_EXPIRY_DAYS: i64 = 3650;

/// Largest absolute stock change accepted in one adjustment.
pub const MAX_STOCK_DELTA: i64 = 1_000_000_000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockMovement {
    pub id: String,
    pub product_id: String,
    pub delta: i64,
    pub reason: String,
    pub user_id: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Adjustment {
    pub product: Product,
    pub movement: StockMovement,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AdjustRequest {
    pub product_id: String,
    pub delta: i64,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Batch {
    pub id: String,
    pub product_id: String,
    pub batch_number: String,
    pub quantity: i64,
    pub expiry_date: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewBatch {
    pub product_id: String,
    pub batch_number: String,
    pub quantity: i64,
    /// `YYYY-MM-DD`.
    #[serde(default)]
    pub expiry_date: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExpiringBatch {
    #[serde(flatten)]
    pub batch: Batch,
    pub sku: String,
    pub product_name: String,
    /// Negative once the batch has expired.
    pub days_left: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchDeduction {
    pub batch_id: String,
    pub batch_number: String,
    pub quantity: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeductRequest {
    pub product_id: String,
    pub quantity: i64,
}

fn movement_from_row(row: &Row<'_>) -> rusqlite::Result<StockMovement> {
    Ok(StockMovement {
        id: row.get(0)?,
        product_id: row.get(1)?,
        delta: row.get(2)?,
        reason: row.get(3)?,
        user_id: row.get(4)?,
        created_at: row.get(5)?,
    })
}

fn batch_from_row(row: &Row<'_>) -> rusqlite::Result<Batch> {
    Ok(Batch {
        id: row.get(0)?,
        product_id: row.get(1)?,
        batch_number: row.get(2)?,
        quantity: row.get(3)?,
        expiry_date: row.get(4)?,
        created_at: row.get(5)?,
    })
}

fn parse_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value, DATE_FORMAT)
        .map_err(|_| PosError::Validation(format!("invalid date '{value}', expected YYYY-MM-DD")))
}

/// Apply `delta` to a product's stock and record the movement.
///
/// Fails with `InsufficientStock` when the result would be negative.
fn apply_delta(
    conn: &Connection,
    product_id: &str,
    delta: i64,
    reason: &str,
    user_id: Option<&str>,
) -> Result<Adjustment> {
    let mut product = catalog::get_product(conn, product_id)?;
    let next = product
        .stock
        .checked_add(delta)
        .ok_or_else(|| PosError::Validation(format!("stock change {delta} is out of range")))?;
    if next < 0 {
        return Err(PosError::InsufficientStock {
            product: product.sku.clone(),
            requested: delta.saturating_neg(),
            available: product.stock,
        });
    }

    let now = now_rfc3339();
    conn.execute(
        "UPDATE products SET stock = ?1, updated_at = ?2 WHERE id = ?3",
        params![next, now, product_id],
    )?;
    let movement = StockMovement {
        id: new_id(),
        product_id: product_id.to_string(),
        delta,
        reason: reason.to_string(),
        user_id: user_id.map(str::to_string),
        created_at: now.clone(),
    };
    conn.execute(
        "INSERT INTO stock_movements (id, product_id, delta, reason, user_id, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            movement.id,
            movement.product_id,
            movement.delta,
            movement.reason,
            movement.user_id,
            movement.created_at,
        ],
    )?;
    product.stock = next;
    product.updated_at = now;
    Ok(Adjustment { product, movement })
}

pub fn adjust_stock(
    conn: &mut Connection,
    request: &AdjustRequest,
    user_id: Option<&str>,
) -> Result<Adjustment> {
    if request.delta == 0 {
        return Err(PosError::Validation("delta must not be zero".to_string()));
    }
    if request.delta.unsigned_abs() > MAX_STOCK_DELTA.unsigned_abs() {
        return Err(PosError::Validation(format!(
            "delta magnitude must not exceed {MAX_STOCK_DELTA}"
        )));
    }
    if request.reason.trim().is_empty() {
        return Err(PosError::Validation("reason must not be empty".to_string()));
    }
    let tx = conn.transaction()?;
    let adjustment = apply_delta(&tx, &request.product_id, request.delta, request.reason.trim(), user_id)?;
    tx.commit()?;
    info!(
        sku = %adjustment.product.sku,
        delta = request.delta,
        stock = adjustment.product.stock,
        "stock adjusted"
    );
    Ok(adjustment)
}

pub fn movements(conn: &Connection, product_id: &str) -> Result<Vec<StockMovement>> {
    let mut stmt = conn.prepare(
        "SELECT id, product_id, delta, reason, user_id, created_at FROM stock_movements
         WHERE product_id = ?1 ORDER BY created_at, rowid",
    )?;
    let rows = stmt
        .query_map(params![product_id], movement_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

/// Products at or below `max(reorder_level, threshold)`, emptiest first.
pub fn low_stock(conn: &Connection, threshold: i64) -> Result<Vec<Product>> {
    let mut low: Vec<Product> = catalog::list_products(conn, None)?
        .into_iter()
        .filter(|p| p.is_low_stock(threshold))
        .collect();
    low.sort_by(|a, b| a.stock.cmp(&b.stock).then_with(|| a.name.cmp(&b.name)));
    Ok(low)
}

// ---------------------------------------------------------------------------
// Batches
// ---------------------------------------------------------------------------

/// Receive a batch: the batch row and the matching stock increase commit together.
pub fn add_batch(conn: &mut Connection, new: &NewBatch, user_id: Option<&str>) -> Result<Batch> {
    if new.batch_number.trim().is_empty() {
        return Err(PosError::Validation("batch_number must not be empty".to_string()));
    }
    if !(1..=MAX_STOCK_DELTA).contains(&new.quantity) {
        return Err(PosError::Validation(format!(
            "quantity must be between 1 and {MAX_STOCK_DELTA}"
        )));
    }
    if let Some(date) = &new.expiry_date {
        parse_date(date)?;
    }

    let batch_number = new.batch_number.trim();

    let tx = conn.transaction()?;
    catalog::get_product(&tx, &new.product_id)?;
    let exists: Option<String> = tx
        .query_row(
            "SELECT id FROM inventory_batches WHERE product_id = ?1 AND batch_number = ?2",
            params![new.product_id, batch_number],
            |r| r.get(0),
        )
        .optional()?;
    if exists.is_some() {
        return Err(PosError::Validation(format!(
            "batch '{batch_number}' already recorded for this product"
        )));
    }

    let batch = Batch {
        id: new_id(),
        product_id: new.product_id.clone(),
        batch_number: batch_number.to_string(),
        quantity: new.quantity,
        expiry_date: new.expiry_date.clone(),
        created_at: now_rfc3339(),
    };
    tx.execute(
        "INSERT INTO inventory_batches (id, product_id, batch_number, quantity, expiry_date, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            batch.id,
            batch.product_id,
            batch.batch_number,
            batch.quantity,
            batch.expiry_date,
            batch.created_at,
        ],
    )?;
    apply_delta(
        &tx,
        &batch.product_id,
        batch.quantity,
        &format!("batch {} received", batch.batch_number),
        user_id,
    )?;
    tx.commit()?;
    info!(batch = %batch.batch_number, quantity = batch.quantity, "batch received");
    Ok(batch)
}

pub fn list_batches(conn: &Connection, product_id: &str) -> Result<Vec<Batch>> {
    let mut stmt = conn.prepare(
        "SELECT id, product_id, batch_number, quantity, expiry_date, created_at
         FROM inventory_batches WHERE product_id = ?1
         ORDER BY expiry_date IS NULL, expiry_date, created_at",
    )?;
    let rows = stmt
        .query_map(params![product_id], batch_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

/// Batches with stock left that expire on or before `today + days`,
/// soonest first. Already expired batches are included.
pub fn expiring_batches(conn: &Connection, today: NaiveDate, days: i64) -> Result<Vec<ExpiringBatch>> {
    if !(0..=MAX_EXPIRY_DAYS).contains(&days) {
        return Err(PosError::Validation(format!(
            "days must be between 0 and {MAX_EXPIRY_DAYS}"
        )));
    }
    let horizon = today
        .checked_add_days(Days::new(days.unsigned_abs()))
        .ok_or_else(|| PosError::Validation(format!("days {days} is out of range")))?
        .format(DATE_FORMAT)
        .to_string();
    let mut stmt = conn.prepare(
        "SELECT b.id, b.product_id, b.batch_number, b.quantity, b.expiry_date, b.created_at,
                p.sku, p.name
         FROM inventory_batches b JOIN products p ON p.id = b.product_id
         WHERE b.quantity > 0 AND b.expiry_date IS NOT NULL AND b.expiry_date <= ?1
         ORDER BY b.expiry_date, p.name",
    )?;
    let rows = stmt
        .query_map(params![horizon], |row| {
            Ok((batch_from_row(row)?, row.get::<_, String>(6)?, row.get::<_, String>(7)?))
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    let mut out = Vec::with_capacity(rows.len());
    for (batch, sku, product_name) in rows {
        let expiry = match batch.expiry_date.as_deref().map(parse_date) {
            Some(Ok(date)) => date,
            _ => {
                warn!(batch = %batch.id, "skipping batch with unreadable expiry date");
                continue;
            }
        };
        out.push(ExpiringBatch {
            days_left: (expiry - today).num_days(),
            batch,
            sku,
            product_name,
        });
    }
    Ok(out)
}

/// Take `quantity` units from a product's unexpired batches, soonest expiry
/// first (undated batches last), and reduce product stock to match.
pub fn deduct_by_batch(
    conn: &mut Connection,
    request: &DeductRequest,
    today: NaiveDate,
    user_id: Option<&str>,
) -> Result<Vec<BatchDeduction>> {
    if !(1..=MAX_STOCK_DELTA).contains(&request.quantity) {
        return Err(PosError::Validation(format!(
            "quantity must be between 1 and {MAX_STOCK_DELTA}"
        )));
    }
    let tx = conn.transaction()?;
    let product = catalog::get_product(&tx, &request.product_id)?;
    let today_str = today.format(DATE_FORMAT).to_string();

    let usable: Vec<Batch> = {
        let mut stmt = tx.prepare(
            "SELECT id, product_id, batch_number, quantity, expiry_date, created_at
             FROM inventory_batches
             WHERE product_id = ?1 AND quantity > 0 AND (expiry_date IS NULL OR expiry_date >= ?2)
             ORDER BY expiry_date IS NULL, expiry_date, created_at",
        )?;
        let rows = stmt
            .query_map(params![request.product_id, today_str], batch_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        rows
    };

    let available: i64 = usable.iter().map(|b| b.quantity).sum();
    if available < request.quantity {
        return Err(PosError::InsufficientStock {
            product: product.sku,
            requested: request.quantity,
            available,
        });
    }

    let mut remaining = request.quantity;
    let mut taken = Vec::new();
    for batch in usable {
        if remaining == 0 {
            break;
        }
        let take = remaining.min(batch.quantity);
        tx.execute(
            "UPDATE inventory_batches SET quantity = quantity - ?1 WHERE id = ?2",
            params![take, batch.id],
        )?;
        remaining -= take;
        taken.push(BatchDeduction {
            batch_id: batch.id,
            batch_number: batch.batch_number,
            quantity: take,
        });
    }

    apply_delta(&tx, &request.product_id, -request.quantity, "batch deduction", user_id)?;
    tx.commit()?;
    info!(sku = %product.sku, quantity = request.quantity, batches = taken.len(), "deducted by batch");
    Ok(taken)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
