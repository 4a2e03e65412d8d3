use anyhow::Context;
use pos_core::auth::DEFAULT_HASH_COST;
use pos_core::config::Config;
use pos_core::db::Db;
use pos_core::types::{BusinessType, Role};
use pos_core::users::{self, NewUser};
use pos_core::{io, paths};
use std::path::Path;

/// Idempotent: an existing config and database are kept as they are.
pub fn run(
    root: &Path,
    business_type: BusinessType,
    name: Option<&str>,
    admin: Option<(&str, &str)>,
) -> anyhow::Result<()> {
    let store_name = name.map(str::to_string).unwrap_or_else(|| {
        root.file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "store".to_string())
    });

    println!("Initializing POS in: {}", root.display());

    let pos_dir = paths::pos_dir(root);
    io::ensure_dir(&pos_dir).with_context(|| format!("failed to create {}", pos_dir.display()))?;

    if paths::config_path(root).exists() {
        let existing = Config::load(root).context("failed to read existing config.yaml")?;
        println!(
            "  exists:  {} ({})",
            paths::CONFIG_FILE,
            existing.store.business_type
        );
    } else {
        Config::new(&store_name, business_type)
            .save(root)
            .context("failed to write config.yaml")?;
        println!("  created: {} ({business_type})", paths::CONFIG_FILE);
    }

    let db_existed = paths::db_path(root).exists();
    let db = Db::open(&paths::db_path(root)).context("failed to open database")?;
    println!(
        "  {}: {} (schema v{})",
        if db_existed { "exists " } else { "created" },
        paths::DB_FILE,
        db.schema_version()?
    );

    if let Some((username, password)) = admin {
        let config = Config::load(root)?;
        let conn = db.conn()?;
        let user = users::create_user(
            &conn,
            &NewUser {
                username: username.to_string(),
                password: password.to_string(),
                display_name: None,
                role: Role::Admin,
                business_type: config.store.business_type,
            },
            DEFAULT_HASH_COST,
        )
        .with_context(|| format!("failed to create admin user '{username}'"))?;
        println!("  created: admin user '{}'", user.username);
    }

    println!("\nRun `pos serve` to start the API.");
    Ok(())
}
