//! Task: build and persist the mapping table.

use anyhow::Result;

use super::{Context, Task, TaskResult};
use crate::scan;

/// Scan the activation list and persist the mapping table.
#[derive(Debug)]
pub struct BuildManifest;

impl Task for BuildManifest {
    fn name(&self) -> &'static str {
        "Build manifest"
    }

    fn should_run(&self, _ctx: &Context) -> bool {
        true
    }

    fn run(&self, ctx: &Context) -> Result<TaskResult> {
        let table = scan::build_mapping(&ctx.config, ctx.log.as_ref())?;
        ctx.log
            .info(&format!("mapping table holds {} entries", table.len()));
        if ctx.dry_run {
            ctx.log.dry_run(&format!(
                "would write manifest to {}",
                ctx.config.manifest_path().display()
            ));
            return Ok(TaskResult::DryRun);
        }
        table.save(&ctx.config.manifest_path())?;
        Ok(TaskResult::Ok)
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::manifest::MappingTable;
    use crate::tasks::test_helpers::{make_context, seed_manager, test_config};

    #[test]
    fn builds_and_persists_the_manifest() {
        let tmp = tempfile::tempdir().unwrap();
        let config = test_config(tmp.path());
        seed_manager(&config);
        let (ctx, _log) = make_context(config);

        let result = BuildManifest.run(&ctx).unwrap();
        assert_eq!(result, TaskResult::Ok);
        let table = MappingTable::load(&ctx.config.manifest_path()).unwrap();
        assert!(table.get("Data/Alpha.esp").is_some());
    }

    #[test]
    fn dry_run_skips_persistence() {
        let tmp = tempfile::tempdir().unwrap();
        let config = test_config(tmp.path());
        seed_manager(&config);
        let (mut_ctx, _log) = make_context(config);
        let ctx = Context {
            dry_run: true,
            ..mut_ctx
        };

        let result = BuildManifest.run(&ctx).unwrap();
        assert_eq!(result, TaskResult::DryRun);
        assert!(!ctx.config.manifest_path().exists());
    }

    #[test]
    fn missing_activation_list_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let config = test_config(tmp.path());
        let (ctx, _log) = make_context(config);
        let err = BuildManifest.run(&ctx).unwrap_err();
        assert!(err.to_string().contains("activation list not found"));
    }
}
