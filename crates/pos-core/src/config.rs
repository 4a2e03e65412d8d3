use crate::auth::MAX_TOKEN_TTL_HOURS;
use crate::error::{PosError, Result};
use crate::inventory::MAX_EXPIRY_DAYS;
use crate::kitchen::{self, MAX_URGENT_MINUTES};
use crate::paths;
use crate::types::BusinessType;
use crate::verticals::{self, BusinessConfig};
use crate::workflow::WorkflowRegistry;
use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Environment variable that overrides `auth.jwt_secret`.
pub const JWT_SECRET_ENV: &str = "POS_JWT_SECRET";

const MIN_SECRET_LEN: usize = 32;

/// Longest closed-order retention honoured, in hours.
pub const MAX_RETAIN_CLOSED_HOURS: i64 = 24 * 365;

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    pub name: String,
    pub business_type: BusinessType,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(default)]
    pub jwt_secret: String,
    #[serde(default = "default_token_ttl_hours")]
    pub token_ttl_hours: i64,
}

fn default_token_ttl_hours() -> i64 {
    12
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KitchenConfig {
    #[serde(default = "default_urgent_after_minutes")]
    pub urgent_after_minutes: i64,
    /// Hours a completed or cancelled order stays on the board; 0 keeps them.
    #[serde(default = "default_retain_closed_hours")]
    pub retain_closed_hours: i64,
}

fn default_urgent_after_minutes() -> i64 {
    15
}

fn default_retain_closed_hours() -> i64 {
    24
}

impl Default for KitchenConfig {
    fn default() -> Self {
        Self {
            urgent_after_minutes: default_urgent_after_minutes(),
            retain_closed_hours: default_retain_closed_hours(),
        }
    }
}

impl KitchenConfig {
    pub fn urgent_after(&self) -> Result<Duration> {
        kitchen::urgent_threshold(self.urgent_after_minutes)
    }

    /// How long closed orders are kept, or `None` to keep them indefinitely.
    pub fn retention(&self) -> Option<Duration> {
        if self.retain_closed_hours <= 0 {
            return None;
        }
        Duration::try_hours(self.retain_closed_hours.min(MAX_RETAIN_CLOSED_HOURS))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryConfig {
    #[serde(default = "default_low_stock_threshold")]
    pub low_stock_threshold: i64,
    #[serde(default = "default_expiry_warning_days")]
    pub expiry_warning_days: i64,
}

fn default_low_stock_threshold() -> i64 {
    5
}

fn default_expiry_warning_days() -> i64 {
    30
}

impl Default for InventoryConfig {
    fn default() -> Self {
        Self {
            low_stock_threshold: default_low_stock_threshold(),
            expiry_warning_days: default_expiry_warning_days(),
        }
    }
}

// ---------------------------------------------------------------------------
// Config (top-level)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_version")]
    pub version: u32,
    pub store: StoreConfig,
    pub auth: AuthConfig,
    #[serde(default)]
    pub kitchen: KitchenConfig,
    #[serde(default)]
    pub inventory: InventoryConfig,
    /// Per-vertical replacements for the built-in UI/workflow bundles.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub verticals: BTreeMap<BusinessType, BusinessConfig>,
}

fn default_version() -> u32 {
    1
}

impl Config {
    /// Fresh config with a newly generated signing secret.
    pub fn new(store_name: impl Into<String>, business_type: BusinessType) -> Self {
        Self {
            version: 1,
            store: StoreConfig {
                name: store_name.into(),
                business_type,
            },
            auth: AuthConfig {
                jwt_secret: crate::auth::generate_secret(),
                token_ttl_hours: default_token_ttl_hours(),
            },
            kitchen: KitchenConfig::default(),
            inventory: InventoryConfig::default(),
            verticals: BTreeMap::new(),
        }
    }

    pub fn load(root: &Path) -> Result<Self> {
        let path = paths::config_path(root);
        if !path.exists() {
            return Err(PosError::NotInitialized);
        }
        let data = std::fs::read_to_string(&path)?;
        let cfg: Config = serde_yaml::from_str(&data)?;
        Ok(cfg)
    }

    pub fn save(&self, root: &Path) -> Result<()> {
        let path = paths::config_path(root);
        let data = serde_yaml::to_string(self)?;
        crate::io::atomic_write(&path, data.as_bytes())
    }

    /// Signing secret, preferring `POS_JWT_SECRET` when set and non-empty.
    pub fn jwt_secret(&self) -> String {
        std::env::var(JWT_SECRET_ENV)
            .ok()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| self.auth.jwt_secret.clone())
    }

    /// UI + workflow bundle for a vertical, honouring overrides.
    pub fn business_config(&self, business_type: BusinessType) -> BusinessConfig {
        self.verticals
            .get(&business_type)
            .cloned()
            .unwrap_or_else(|| verticals::builtin(business_type))
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    pub fn validate(&self, registry: &WorkflowRegistry) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();

        if self.auth.jwt_secret.trim().is_empty() {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: "auth.jwt_secret is empty".to_string(),
            });
        } else if self.auth.jwt_secret.len() < MIN_SECRET_LEN {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: format!(
                    "auth.jwt_secret is shorter than {MIN_SECRET_LEN} characters"
                ),
            });
        }

        if !(1..=MAX_TOKEN_TTL_HOURS).contains(&self.auth.token_ttl_hours) {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: format!(
                    "auth.token_ttl_hours must be between 1 and {MAX_TOKEN_TTL_HOURS} (got {})",
                    self.auth.token_ttl_hours
                ),
            });
        }

        let urgent = self.kitchen.urgent_after_minutes;
        if urgent > MAX_URGENT_MINUTES || urgent < -MAX_URGENT_MINUTES {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: format!(
                    "kitchen.urgent_after_minutes must not exceed {MAX_URGENT_MINUTES} (got {urgent})"
                ),
            });
        } else if urgent <= 0 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: "kitchen.urgent_after_minutes <= 0 marks every open order urgent"
                    .to_string(),
            });
        }

        let retain = self.kitchen.retain_closed_hours;
        if !(0..=MAX_RETAIN_CLOSED_HOURS).contains(&retain) {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: format!(
                    "kitchen.retain_closed_hours must be between 0 and {MAX_RETAIN_CLOSED_HOURS} (got {retain})"
                ),
            });
        }

        let days = self.inventory.expiry_warning_days;
        if !(0..=MAX_EXPIRY_DAYS).contains(&days) {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: format!(
                    "inventory.expiry_warning_days must be between 0 and {MAX_EXPIRY_DAYS} (got {days})"
                ),
            });
        }

        for (bt, bundle) in &self.verticals {
            for name in &bundle.workflows {
                if !registry.contains(name) {
                    warnings.push(ConfigWarning {
                        level: WarnLevel::Error,
                        message: format!("unknown workflow '{name}' in verticals.{bt}"),
                    });
                }
            }
            if bundle.ui.fields.is_empty() {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Warning,
                    message: format!("verticals.{bt} defines no UI fields"),
                });
            }
        }

        warnings
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
