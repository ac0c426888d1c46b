//! Task: publish profile configuration files.

use anyhow::Result;

use super::{Context, Task, TaskResult};
use crate::sync::publish_configs;

/// Publish the profile's INIs and plugin-order files into the portable
/// layout, taking the one-time backup first.
#[derive(Debug)]
pub struct PublishConfigs;

impl Task for PublishConfigs {
    fn name(&self) -> &'static str {
        "Publish configs"
    }

    fn should_run(&self, _ctx: &Context) -> bool {
        true
    }

    fn run(&self, ctx: &Context) -> Result<TaskResult> {
        let published = publish_configs(&ctx.config, ctx.dry_run, ctx.log.as_ref())?;
        if ctx.dry_run {
            return Ok(TaskResult::DryRun);
        }
        if published == 0 {
            return Ok(TaskResult::Skipped(
                "profile has no configuration files".to_string(),
            ));
        }
        ctx.log
            .info(&format!("{published} configuration files published"));
        Ok(TaskResult::Ok)
    }
}
