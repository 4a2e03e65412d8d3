//! SQLite storage for users, catalog and inventory.
//!
//! One connection guarded by a mutex; WAL mode and foreign keys on. Schema
//! is applied by numbered migrations recorded in `schema_version`.

use crate::error::{PosError, Result};
use rusqlite::Connection;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{info, warn};

/// Current schema version. Bump when adding a migration.
pub const CURRENT_SCHEMA_VERSION: i32 = 2;

pub struct Db {
    conn: Mutex<Connection>,
    path: Option<PathBuf>,
}

impl Db {
    /// Open (or create) the database file and run pending migrations.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA foreign_keys = ON;
             PRAGMA busy_timeout = 5000;
             PRAGMA synchronous = NORMAL;",
        )?;
        run_migrations(&conn)?;
        info!(path = %path.display(), "database ready (schema v{CURRENT_SCHEMA_VERSION})");
        Ok(Self {
            conn: Mutex::new(conn),
            path: Some(path.to_path_buf()),
        })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        run_migrations(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
            path: None,
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Lock the connection. A panic while the lock was held leaves the
    /// connection usable since SQLite rolls back any open transaction.
    pub fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        Ok(self.conn.lock().unwrap_or_else(|poisoned| {
            warn!("database lock was poisoned; recovering");
            self.conn.clear_poison();
            PoisonError::into_inner(poisoned)
        }))
    }

    pub fn schema_version(&self) -> Result<i32> {
        let conn = self.conn()?;
        Ok(current_version(&conn)?)
    }
}

/// Parse an enum stored as TEXT, surfacing bad values as a conversion error.
pub(crate) fn parse_text<T>(idx: usize, value: &str) -> rusqlite::Result<T>
where
    T: std::str::FromStr<Err = PosError>,
{
    value.parse().map_err(|e: PosError| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

pub(crate) fn now_rfc3339() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true)
}

pub(crate) fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

fn current_version(conn: &Connection) -> rusqlite::Result<i32> {
    conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |row| row.get(0),
    )
}

fn run_migrations(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT DEFAULT (datetime('now'))
        );",
    )?;

    let current = current_version(conn)?;
    if current >= CURRENT_SCHEMA_VERSION {
        return Ok(());
    }

    info!("migrating database from v{current} to v{CURRENT_SCHEMA_VERSION}");
    if current < 1 {
        migrate_v1(conn)?;
    }
    if current < 2 {
        migrate_v2(conn)?;
    }
    Ok(())
}

/// Users, products, customers.
fn migrate_v1(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "BEGIN;
         CREATE TABLE IF NOT EXISTS users (
            id TEXT PRIMARY KEY,
            username TEXT NOT NULL UNIQUE,
            password_hash TEXT NOT NULL,
            display_name TEXT NOT NULL,
            role TEXT NOT NULL,
            business_type TEXT NOT NULL,
            active INTEGER NOT NULL DEFAULT 1,
            last_login TEXT,
            created_at TEXT NOT NULL
         );
         CREATE TABLE IF NOT EXISTS products (
            id TEXT PRIMARY KEY,
            sku TEXT NOT NULL UNIQUE,
            name TEXT NOT NULL,
            category TEXT,
            price_cents INTEGER NOT NULL DEFAULT 0,
            stock INTEGER NOT NULL DEFAULT 0,
            reorder_level INTEGER NOT NULL DEFAULT 0,
            business_type TEXT NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
         );
         CREATE TABLE IF NOT EXISTS customers (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            email TEXT,
            phone TEXT,
            loyalty_points INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL
         );
         INSERT INTO schema_version (version) VALUES (1);
         COMMIT;",
    )?;
    Ok(())
}

/// Inventory batches and the stock movement ledger.
fn migrate_v2(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "BEGIN;
         CREATE TABLE IF NOT EXISTS inventory_batches (
            id TEXT PRIMARY KEY,
            product_id TEXT NOT NULL REFERENCES products(id) ON DELETE CASCADE,
            batch_number TEXT NOT NULL,
            quantity INTEGER NOT NULL,
            expiry_date TEXT,
            created_at TEXT NOT NULL,
            UNIQUE(product_id, batch_number)
         );
         CREATE TABLE IF NOT EXISTS stock_movements (
            id TEXT PRIMARY KEY,
            product_id TEXT NOT NULL REFERENCES products(id) ON DELETE CASCADE,
            delta INTEGER NOT NULL,
            reason TEXT NOT NULL,
            user_id TEXT,
            created_at TEXT NOT NULL
         );
         CREATE INDEX IF NOT EXISTS idx_movements_product ON stock_movements(product_id);
         CREATE INDEX IF NOT EXISTS idx_batches_expiry ON inventory_batches(expiry_date);
         INSERT INTO schema_version (version) VALUES (2);
         COMMIT;",
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn in_memory_is_fully_migrated() {
        let db = Db::open_in_memory().unwrap();
        assert_eq!(db.schema_version().unwrap(), CURRENT_SCHEMA_VERSION);
        assert!(db.path().is_none());
    }

    #[test]
    fn reopen_does_not_rerun_migrations() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(".pos/pos.db");
        {
            let db = Db::open(&path).unwrap();
            assert_eq!(db.schema_version().unwrap(), CURRENT_SCHEMA_VERSION);
        }
        let db = Db::open(&path).unwrap();
        let conn = db.conn().unwrap();
        let rows: i64 = conn
            .query_row("SELECT COUNT(*) FROM schema_version", [], |r| r.get(0))
            .unwrap();
        assert_eq!(rows, CURRENT_SCHEMA_VERSION as i64);
    }

    #[test]
    fn panic_while_locked_does_not_wedge_the_database() {
        let db = Db::open_in_memory().unwrap();
        let outcome = std::thread::scope(|s| {
            s.spawn(|| {
                let mut conn = db.conn().unwrap();
                let tx = conn.transaction().unwrap();
                tx.execute("DELETE FROM schema_version", []).unwrap();
                panic!("handler bug");
            })
            .join()
        });
        assert!(outcome.is_err());
        assert_eq!(db.schema_version().unwrap(), CURRENT_SCHEMA_VERSION);
        assert!(db.conn().is_ok());
    }
}
