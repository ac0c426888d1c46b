//! Command: summarize the persisted execution report and manifest.

use std::sync::Arc;

use anyhow::Result;

use super::CommandSetup;
use crate::cli::GlobalOpts;
use crate::logging::Logger;
use crate::manifest::MappingTable;
use crate::metadata::BuildMetadata;
use crate::report::ExecutionReport;

/// Targets listed per failure group.
const GROUP_TARGET_CAP: usize = 10;

/// Origins listed in the manifest summary.
const TOP_ORIGIN_CAP: usize = 5;

/// Run the report command.
///
/// # Errors
///
/// Returns an error when the persisted report or manifest is missing.
pub fn run(global: &GlobalOpts, log: &Arc<Logger>) -> Result<()> {
    let setup = CommandSetup::init(global, log)?;
    let config = setup.config;

    let report = ExecutionReport::load(&config.report_path())?;
    let table = MappingTable::load(&config.manifest_path())?;

    log.stage("Execution report");
    let (hardlinks, copies) = report.method_counts();
    log.info(&format!(
        "{} records: {} succeeded ({hardlinks} hardlinked, {copies} copied), {} failed",
        report.len(),
        report.success_count(),
        report.failure_count()
    ));
    for group in report.failure_groups(GROUP_TARGET_CAP) {
        log.info(&format!("{} targets failed: {}", group.count, group.error));
        for target in &group.targets {
            log.info(&format!("  {target}"));
        }
        if group.count > group.targets.len() {
            log.info(&format!("  ... and {} more", group.count - group.targets.len()));
        }
    }

    log.stage("Manifest");
    let stats = table.stats();
    log.info(&format!(
        "{} entries from {} origins, {} root-tree, {} data-tree, {} bytes declared",
        stats.entries,
        stats.origins,
        stats.root_entries,
        stats.data_entries,
        stats.total_size_bytes
    ));
    for (origin, count) in stats.top_origins.iter().take(TOP_ORIGIN_CAP) {
        log.info(&format!("  {origin}: {count} entries"));
    }

    if let Some(metadata) = BuildMetadata::load(&config.metadata_path())? {
        log.info(&format!(
            "last deployment: profile {} ({}) at {}",
            metadata.profile, metadata.game, metadata.built_at
        ));
    }
    Ok(())
}
