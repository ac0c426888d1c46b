//! Task: deploy the persisted manifest.

use anyhow::{anyhow, Result};

use super::{Context, Task, TaskResult};
use crate::deploy::deploy_manifest;
use crate::manifest::MappingTable;
use crate::metadata::BuildMetadata;

/// Materialize the persisted manifest into the target tree.
///
/// The execution report is persisted whether or not entries failed; the task
/// itself fails when any per-entry record did, and build metadata is written
/// only after a fully clean deployment.
#[derive(Debug)]
pub struct DeployManifest;

impl Task for DeployManifest {
    fn name(&self) -> &'static str {
        "Deploy manifest"
    }

    fn should_run(&self, _ctx: &Context) -> bool {
        true
    }

    fn run(&self, ctx: &Context) -> Result<TaskResult> {
        let table = MappingTable::load(&ctx.config.manifest_path())?;
        let report = deploy_manifest(
            &table,
            &ctx.config.target_root,
            ctx.dry_run,
            ctx.log.as_ref(),
        )?;
        if ctx.dry_run {
            return Ok(TaskResult::DryRun);
        }
        report.save(&ctx.config.report_path())?;

        let failures = report.failure_count();
        if failures > 0 {
            return Err(anyhow!(
                "{failures} of {} entries failed to deploy (see {})",
                report.len(),
                ctx.config.report_path().display()
            ));
        }
        BuildMetadata::new(&ctx.config.profile, ctx.config.game.id, chrono::Local::now())
            .save(&ctx.config.metadata_path())?;
        Ok(TaskResult::Ok)
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::manifest::MappingEntry;
    use crate::report::ExecutionReport;
    use crate::tasks::test_helpers::{make_context, test_config};
    use std::path::{Path, PathBuf};

    fn persist_manifest(ctx: &Context, entries: &[(&str, &Path)]) {
        let mut table = MappingTable::new();
        for (rel, source) in entries {
            table.insert(
                (*rel).to_string(),
                MappingEntry {
                    source: source.to_path_buf(),
                    mod_origin: "A".to_string(),
                    is_root: false,
                    size_bytes: 1,
                },
            );
        }
        table.save(&ctx.config.manifest_path()).unwrap();
    }

    #[test]
    fn deploys_and_writes_metadata() {
        let tmp = tempfile::tempdir().unwrap();
        let (ctx, _log) = make_context(test_config(tmp.path()));
        let source = tmp.path().join("x.esp");
        std::fs::write(&source, b"plugin").unwrap();
        persist_manifest(&ctx, &[("Data/x.esp", &source)]);

        let result = DeployManifest.run(&ctx).unwrap();
        assert_eq!(result, TaskResult::Ok);
        assert!(ctx.config.target_root.join("Data/x.esp").exists());
        let metadata = BuildMetadata::load(&ctx.config.metadata_path())
            .unwrap()
            .unwrap();
        assert_eq!(metadata.profile, "Default");
        assert_eq!(metadata.game, "skyrimse");
    }

    #[test]
    fn failures_fail_the_task_but_persist_the_report() {
        let tmp = tempfile::tempdir().unwrap();
        let (ctx, _log) = make_context(test_config(tmp.path()));
        persist_manifest(
            &ctx,
            &[("Data/gone.esp", &PathBuf::from("/nonexistent/gone.esp"))],
        );

        let err = DeployManifest.run(&ctx).unwrap_err();
        assert!(err.to_string().contains("failed to deploy"));
        let report = ExecutionReport::load(&ctx.config.report_path()).unwrap();
        assert_eq!(report.failure_count(), 1);
        assert!(
            BuildMetadata::load(&ctx.config.metadata_path())
                .unwrap()
                .is_none(),
            "no metadata after a failed deployment"
        );
    }

    #[test]
    fn missing_manifest_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let (ctx, _log) = make_context(test_config(tmp.path()));
        let err = DeployManifest.run(&ctx).unwrap_err();
        assert!(err.to_string().contains("run a scan first"));
    }

    #[test]
    fn dry_run_persists_nothing() {
        let tmp = tempfile::tempdir().unwrap();
        let (base, _log) = make_context(test_config(tmp.path()));
        let source = tmp.path().join("x.esp");
        std::fs::write(&source, b"plugin").unwrap();
        persist_manifest(&base, &[("Data/x.esp", &source)]);
        let ctx = Context {
            dry_run: true,
            ..base
        };

        let result = DeployManifest.run(&ctx).unwrap();
        assert_eq!(result, TaskResult::DryRun);
        assert!(!ctx.config.report_path().exists());
        assert!(!ctx.config.target_root.join("Data/x.esp").exists());
    }
}
