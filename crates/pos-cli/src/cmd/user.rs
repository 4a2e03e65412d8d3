use crate::output::{or_dash, print_json, Table};
use anyhow::Context;
use clap::Subcommand;
use pos_core::auth::DEFAULT_HASH_COST;
use pos_core::config::Config;
use pos_core::db::Db;
use pos_core::paths;
use pos_core::types::{BusinessType, Role};
use pos_core::users::{self, NewUser};
use std::path::Path;

#[derive(Subcommand)]
pub enum UserSubcommand {
    /// Create an account
    Add {
        username: String,
        #[arg(long)]
        password: String,
        /// admin, manager, cashier or kitchen
        #[arg(long)]
        role: Role,
        /// Vertical the account's tokens carry (default: the store's)
        #[arg(long)]
        business_type: Option<BusinessType>,
        #[arg(long)]
        display_name: Option<String>,
    },
    /// List accounts
    List,
}

pub fn run(root: &Path, subcmd: UserSubcommand, json: bool) -> anyhow::Result<()> {
    let config = Config::load(root).context("failed to load config")?;
    let db = Db::open(&paths::db_path(root)).context("failed to open database")?;
    match subcmd {
        UserSubcommand::Add {
            username,
            password,
            role,
            business_type,
            display_name,
        } => {
            let conn = db.conn()?;
            let new = NewUser {
                username,
                password,
                display_name,
                role,
                business_type: business_type.unwrap_or(config.store.business_type),
            };
            let user = users::create_user(&conn, &new, DEFAULT_HASH_COST)?;
            if json {
                print_json(&user)?;
            } else {
                println!("Created user '{}' ({}, {})", user.username, user.role, user.business_type);
            }
        }
        UserSubcommand::List => {
            let list = users::list_users(&*db.conn()?)?;
            if json {
                return print_json(&list);
            }
            if list.is_empty() {
                println!("No users.");
                return Ok(());
            }
            let mut table = Table::new(&["USERNAME", "ROLE", "VERTICAL", "ACTIVE", "LAST LOGIN"]);
            for u in &list {
                table.row([
                    u.username.clone(),
                    u.role.to_string(),
                    u.business_type.to_string(),
                    if u.active { "yes" } else { "no" }.to_string(),
                    or_dash(u.last_login.as_deref()),
                ]);
            }
            table.print();
        }
    }
    Ok(())
}
