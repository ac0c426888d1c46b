//! Command: build and persist the mapping manifest.

use std::sync::Arc;

use anyhow::Result;

use super::CommandSetup;
use crate::cli::GlobalOpts;
use crate::logging::Logger;
use crate::scan;

/// Run the scan command.
///
/// # Errors
///
/// Returns an error when configuration loading, the scan itself, or manifest
/// persistence fails.
pub fn run(global: &GlobalOpts, log: &Arc<Logger>) -> Result<()> {
    let setup = CommandSetup::init(global, log)?;
    let config = setup.config;

    log.stage("Scanning mod directories");
    let table = scan::build_mapping(&config, log.as_ref())?;
    let stats = table.stats();
    log.info(&format!(
        "{} entries from {} origins ({} root-tree, {} data-tree, {} bytes)",
        stats.entries,
        stats.origins,
        stats.root_entries,
        stats.data_entries,
        stats.total_size_bytes
    ));

    if global.dry_run {
        log.dry_run(&format!(
            "would write manifest to {}",
            config.manifest_path().display()
        ));
        return Ok(());
    }
    table.save(&config.manifest_path())?;
    log.info(&format!(
        "manifest written to {}",
        config.manifest_path().display()
    ));
    Ok(())
}
