//! Task: verify the deployed tree.

use anyhow::{anyhow, Result};

use super::{Context, Task, TaskResult};
use crate::manifest::MappingTable;
use crate::verify::{VerificationResult, verify_build};

/// Verify the deployed tree against the persisted manifest.
#[derive(Debug)]
pub struct VerifyBuild;

impl Task for VerifyBuild {
    fn name(&self) -> &'static str {
        "Verify build"
    }

    fn should_run(&self, ctx: &Context) -> bool {
        !ctx.dry_run
    }

    fn run(&self, ctx: &Context) -> Result<TaskResult> {
        let table = MappingTable::load(&ctx.config.manifest_path())?;
        let result = verify_build(&ctx.config, &table, &ctx.run_timestamp, ctx.log.as_ref())?;
        log_details(ctx, &result);

        if result.has_hard_issues() {
            return Err(anyhow!(
                "{} missing files, {} missing configs, {} unaccounted saves",
                result.missing.len(),
                result.config_missing.len(),
                result.save_missing.len()
            ));
        }
        Ok(TaskResult::Ok)
    }
}

fn log_details(ctx: &Context, result: &VerificationResult) {
    for path in &result.missing {
        ctx.log.error(&format!("missing: {path}"));
    }
    for path in &result.empty {
        ctx.log.warn(&format!("empty despite declared size: {path}"));
    }
    for name in &result.config_missing {
        ctx.log.error(&format!("config not published: {name}"));
    }
    for name in &result.config_mismatch {
        ctx.log.warn(&format!("config drift: {name}"));
    }
    for name in &result.save_missing {
        ctx.log.error(&format!("save unaccounted for: {name}"));
    }
    for file in &result.quarantined_now {
        ctx.log
            .info(&format!("quarantined this run: {} ({})", file.name, file.reason));
    }
    if result.historic_quarantine {
        ctx.log
            .warn("older quarantine directories exist and remain unresolved");
    }
}
