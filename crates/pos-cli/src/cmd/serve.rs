use anyhow::Context;
use pos_core::config::Config;
use std::path::Path;

pub fn run(root: &Path, port: u16, open: bool) -> anyhow::Result<()> {
    // Fail before binding if the store was never initialized.
    Config::load(root).context("failed to load config")?;

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(pos_server::serve(root.to_path_buf(), port, open))
}
