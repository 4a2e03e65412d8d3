use crate::error::{PosError, Result};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

// ---------------------------------------------------------------------------
// Directory constants
// ---------------------------------------------------------------------------

pub const POS_DIR: &str = ".pos";
pub const CONFIG_FILE: &str = ".pos/config.yaml";
pub const DB_FILE: &str = ".pos/pos.db";
pub const KITCHEN_FILE: &str = ".pos/kitchen.json";

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

pub fn pos_dir(root: &Path) -> PathBuf {
    root.join(POS_DIR)
}

pub fn config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE)
}

pub fn db_path(root: &Path) -> PathBuf {
    root.join(DB_FILE)
}

pub fn kitchen_path(root: &Path) -> PathBuf {
    root.join(KITCHEN_FILE)
}

// ---------------------------------------------------------------------------
// Identifier validation
// ---------------------------------------------------------------------------

static USERNAME_RE: OnceLock<Regex> = OnceLock::new();
static SKU_RE: OnceLock<Regex> = OnceLock::new();

fn username_re() -> &'static Regex {
    USERNAME_RE.get_or_init(|| Regex::new(r"^[a-z0-9][a-z0-9._\-]{1,31}$").unwrap())
}

fn sku_re() -> &'static Regex {
    SKU_RE.get_or_init(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9\-_.]{0,47}$").unwrap())
}

/// Usernames are 2-32 chars of lowercase alphanumerics, `.`, `_` or `-`.
pub fn validate_username(username: &str) -> Result<()> {
    if !username_re().is_match(username) {
        return Err(PosError::Validation(format!(
            "invalid username '{username}': use 2-32 lowercase letters, digits, '.', '_' or '-'"
        )));
    }
    Ok(())
}

pub fn validate_sku(sku: &str) -> Result<()> {
    if !sku_re().is_match(sku) {
        return Err(PosError::Validation(format!("invalid sku '{sku}'")));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_usernames() {
        for name in ["admin", "jane.doe", "cook_2", "ab"] {
            validate_username(name).unwrap_or_else(|_| panic!("expected valid: {name}"));
        }
    }

    #[test]
    fn invalid_usernames() {
        for name in ["", "a", "Admin", "-dash", "has space", &"x".repeat(40)] {
            assert!(validate_username(name).is_err(), "expected invalid: {name}");
        }
    }

    #[test]
    fn sku_rules() {
        assert!(validate_sku("AMOX-500").is_ok());
        assert!(validate_sku("").is_err());
        assert!(validate_sku("bad sku").is_err());
    }

    #[test]
    fn paths_live_under_pos_dir() {
        let root = Path::new("/tmp/store");
        assert_eq!(config_path(root), root.join(".pos/config.yaml"));
        assert!(db_path(root).starts_with(pos_dir(root)));
        assert!(kitchen_path(root).starts_with(pos_dir(root)));
    }
}
