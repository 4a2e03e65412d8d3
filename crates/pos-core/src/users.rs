use crate::auth;
use crate::db::{new_id, now_rfc3339, parse_text};
use crate::error::{PosError, Result};
use crate::paths;
use crate::types::{BusinessType, Role};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

const USER_COLUMNS: &str =
    "id, username, display_name, role, business_type, active, last_login, created_at";

/// A user as exposed outside storage; never carries the password hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub username: String,
    pub display_name: String,
    pub role: Role,
    pub business_type: BusinessType,
    pub active: bool,
    pub last_login: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub display_name: Option<String>,
    pub role: Role,
    pub business_type: BusinessType,
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    let role: String = row.get(3)?;
    let business_type: String = row.get(4)?;
    Ok(User {
        id: row.get(0)?,
        username: row.get(1)?,
        display_name: row.get(2)?,
        role: parse_text(3, &role)?,
        business_type: parse_text(4, &business_type)?,
        active: row.get::<_, i64>(5)? != 0,
        last_login: row.get(6)?,
        created_at: row.get(7)?,
    })
}

pub fn create_user(conn: &Connection, new: &NewUser, hash_cost: u32) -> Result<User> {
    paths::validate_username(&new.username)?;
    let existing: Option<String> = conn
        .query_row(
            "SELECT id FROM users WHERE username = ?1",
            params![new.username],
            |r| r.get(0),
        )
        .optional()?;
    if existing.is_some() {
        return Err(PosError::UserExists(new.username.clone()));
    }

    let hash = auth::hash_password(&new.password, hash_cost)?;
    let user = User {
        id: new_id(),
        username: new.username.clone(),
        display_name: new
            .display_name
            .clone()
            .filter(|d| !d.trim().is_empty())
            .unwrap_or_else(|| new.username.clone()),
        role: new.role,
        business_type: new.business_type,
        active: true,
        last_login: None,
        created_at: now_rfc3339(),
    };
    conn.execute(
        "INSERT INTO users (id, username, password_hash, display_name, role, business_type, active, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, 1, ?7)",
        params![
            user.id,
            user.username,
            hash,
            user.display_name,
            user.role.as_str(),
            user.business_type.as_str(),
            user.created_at,
        ],
    )?;
    info!(username = %user.username, role = %user.role, "user created");
    Ok(user)
}

pub fn list_users(conn: &Connection) -> Result<Vec<User>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {USER_COLUMNS} FROM users ORDER BY created_at, username"
    ))?;
    let users = stmt
        .query_map([], user_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(users)
}

pub fn get_user(conn: &Connection, id: &str) -> Result<User> {
    conn.query_row(
        &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
        params![id],
        user_from_row,
    )
    .optional()?
    .ok_or_else(|| PosError::UserNotFound(id.to_string()))
}

/// Soft-delete: the row stays for audit, login is refused.
pub fn deactivate_user(conn: &Connection, id: &str) -> Result<User> {
    let changed = conn.execute("UPDATE users SET active = 0 WHERE id = ?1", params![id])?;
    if changed == 0 {
        return Err(PosError::UserNotFound(id.to_string()));
    }
    get_user(conn, id)
}

pub fn count_users(conn: &Connection) -> Result<i64> {
    Ok(conn.query_row("SELECT COUNT(*) FROM users", [], |r| r.get(0))?)
}

/// Verify credentials and stamp `last_login` in one transaction.
///
/// Unknown user, inactive user and wrong password all produce the same
/// `Unauthorized` error.
pub fn authenticate(conn: &mut Connection, username: &str, password: &str) -> Result<User> {
    let rejected = || PosError::Unauthorized("invalid username or password".to_string());

    let tx = conn.transaction()?;
    let found: Option<(User, String)> = tx
        .query_row(
            &format!("SELECT {USER_COLUMNS}, password_hash FROM users WHERE username = ?1"),
            params![username],
            |row| Ok((user_from_row(row)?, row.get::<_, String>(8)?)),
        )
        .optional()?;

    let Some((mut user, hash)) = found else {
        warn!(username, "login failed: unknown user");
        return Err(rejected());
    };
    if !user.active {
        warn!(username, "login failed: user inactive");
        return Err(rejected());
    }
    if !auth::verify_password(password, &hash) {
        warn!(username, "login failed: bad password");
        return Err(rejected());
    }

    let now = now_rfc3339();
    tx.execute(
        "UPDATE users SET last_login = ?1 WHERE id = ?2",
        params![now, user.id],
    )?;
    tx.commit()?;

    user.last_login = Some(now);
    info!(username, role = %user.role, "login successful");
    Ok(user)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
