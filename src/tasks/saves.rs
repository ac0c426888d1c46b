//! Task: import profile saves.

use anyhow::Result;

use super::{Context, Task, TaskResult};
use crate::sync::{SyncDirection, sync_saves};

/// Import profile saves into the portable profile, when requested.
#[derive(Debug)]
pub struct ImportSaves {
    /// Whether save synchronization was requested for this run.
    pub enabled: bool,
}

impl Task for ImportSaves {
    fn name(&self) -> &'static str {
        "Import saves"
    }

    fn should_run(&self, _ctx: &Context) -> bool {
        self.enabled
    }

    fn run(&self, ctx: &Context) -> Result<TaskResult> {
        let outcome = sync_saves(
            &ctx.config,
            SyncDirection::Import,
            &ctx.run_timestamp,
            ctx.decisions.as_ref(),
            ctx.dry_run,
            ctx.log.as_ref(),
        )?;
        if ctx.dry_run {
            return Ok(TaskResult::DryRun);
        }
        let total = outcome.copied + outcome.overwritten + outcome.quarantined;
        if total == 0 {
            return Ok(TaskResult::Skipped("no save files to import".to_string()));
        }
        ctx.log.info(&format!(
            "{} saves copied, {} overwritten, {} quarantined",
            outcome.copied, outcome.overwritten, outcome.quarantined
        ));
        Ok(TaskResult::Ok)
    }
}
