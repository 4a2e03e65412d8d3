use crate::output::print_json;
use anyhow::Context;
use clap::Subcommand;
use pos_core::config::{Config, WarnLevel};
use pos_core::types::BusinessType;
use pos_core::workflow::WorkflowRegistry;
use std::path::Path;

#[derive(Subcommand)]
pub enum ConfigSubcommand {
    /// Print the UI and workflow bundle for a vertical
    Show {
        /// Vertical (default: the store's)
        business_type: Option<BusinessType>,
    },

    /// Validate the config for common mistakes
    Validate,
}

pub fn run(root: &Path, subcmd: ConfigSubcommand, json: bool) -> anyhow::Result<()> {
    let config = Config::load(root).context("failed to load config")?;
    match subcmd {
        ConfigSubcommand::Show { business_type } => show(&config, business_type, json),
        ConfigSubcommand::Validate => validate(&config, json),
    }
}

fn show(config: &Config, business_type: Option<BusinessType>, json: bool) -> anyhow::Result<()> {
    let bt = business_type.unwrap_or(config.store.business_type);
    let bundle = config.business_config(bt);
    if json {
        let mut value = serde_json::to_value(&bundle)?;
        value["business_type"] = serde_json::Value::String(bt.to_string());
        return print_json(&value);
    }
    println!("# {bt}");
    print!("{}", serde_yaml::to_string(&bundle)?);
    Ok(())
}

fn validate(config: &Config, json: bool) -> anyhow::Result<()> {
    let warnings = config.validate(&WorkflowRegistry::builtin());

    if json {
        print_json(&serde_json::json!({ "warnings": warnings }))?;
    } else if warnings.is_empty() {
        println!("Config is valid. No warnings.");
    } else {
        for w in &warnings {
            let prefix = match w.level {
                WarnLevel::Warning => "warning",
                WarnLevel::Error => "error",
            };
            println!("[{prefix}] {}", w.message);
        }
    }

    if warnings.iter().any(|w| w.level == WarnLevel::Error) {
        anyhow::bail!("config validation found errors");
    }
    Ok(())
}
