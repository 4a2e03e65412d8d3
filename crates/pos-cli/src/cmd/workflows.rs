use crate::output::print_json;
use anyhow::Context;
use pos_core::config::Config;
use pos_core::types::BusinessType;
use pos_core::workflow::WorkflowRegistry;
use std::path::Path;

/// Resolve the chain through the registry so unknown names in an override
/// fail here the same way they would on a request.
pub fn run(root: &Path, business_type: Option<BusinessType>, json: bool) -> anyhow::Result<()> {
    let config = Config::load(root).context("failed to load config")?;
    let bt = business_type.unwrap_or(config.store.business_type);
    let bundle = config.business_config(bt);
    let chain = WorkflowRegistry::builtin()
        .chain(bundle.workflows.as_slice())
        .with_context(|| format!("workflow chain for {bt} does not resolve"))?;

    if json {
        return print_json(&serde_json::json!({
            "business_type": bt,
            "workflows": chain.names(),
        }));
    }
    println!("{bt}:");
    for (i, name) in chain.names().iter().enumerate() {
        println!("  {}. {name}", i + 1);
    }
    Ok(())
}
