//! Task: reclaim orphaned target files.

use anyhow::Result;

use super::{Context, Task, TaskResult};
use crate::deploy::reclaim::reclaim_orphans;
use crate::manifest::MappingTable;

/// Delete target files the current manifest no longer claims.
#[derive(Debug)]
pub struct ReclaimOrphans {
    /// Whether reclamation was requested for this run.
    pub enabled: bool,
}

impl Task for ReclaimOrphans {
    fn name(&self) -> &'static str {
        "Reclaim orphans"
    }

    fn should_run(&self, _ctx: &Context) -> bool {
        self.enabled
    }

    fn run(&self, ctx: &Context) -> Result<TaskResult> {
        let table = MappingTable::load(&ctx.config.manifest_path())?;
        let candidates = reclaim_orphans(
            &table,
            &ctx.config.target_root,
            ctx.dry_run,
            ctx.log.as_ref(),
        )?;
        if ctx.dry_run {
            return Ok(TaskResult::DryRun);
        }
        if candidates.is_empty() {
            return Ok(TaskResult::Skipped("no orphaned files".to_string()));
        }
        Ok(TaskResult::Ok)
    }
}
