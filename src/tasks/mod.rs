//! Named tasks composing the build pipeline.
//!
//! Tasks run in a fixed order, each consulting the shared [`Context`]. A
//! failed task is recorded and later tasks still run; they fail on their own
//! when an input the earlier task should have produced is missing.

pub mod clone;
pub mod configs;
pub mod deploy;
pub mod manifest;
pub mod reclaim;
pub mod saves;
pub mod verify;

use std::sync::Arc;

use anyhow::Result;

use crate::config::Config;
use crate::decisions::DecisionHandler;
use crate::deploy::clone::CloneMode;
use crate::logging::{Log, TaskStatus};

/// Shared context for task execution.
pub struct Context {
    /// Validated run configuration.
    pub config: Config,
    /// Logger for output and task recording.
    pub log: Arc<dyn Log>,
    /// Handler for mid-operation decision points.
    pub decisions: Arc<dyn DecisionHandler>,
    /// Whether to preview changes without applying them.
    pub dry_run: bool,
    /// Timestamp identifying this run, `YYYYMMDD_HHMM`.
    pub run_timestamp: String,
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("config", &self.config)
            .field("log", &"<dyn Log>")
            .field("decisions", &"<dyn DecisionHandler>")
            .field("dry_run", &self.dry_run)
            .field("run_timestamp", &self.run_timestamp)
            .finish()
    }
}

/// Outcome of one task run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskResult {
    /// The task completed and changed (or confirmed) state.
    Ok,
    /// The task had nothing to do, with a reason.
    Skipped(String),
    /// The task previewed its changes without applying them.
    DryRun,
}

/// A named, executable pipeline step.
pub trait Task: Send + Sync {
    /// Human-readable task name, also the `--skip`/`--only` match target.
    fn name(&self) -> &str;

    /// Whether this task applies to the current invocation at all.
    fn should_run(&self, ctx: &Context) -> bool;

    /// Execute the task.
    ///
    /// # Errors
    ///
    /// Returns an error when a required input is missing or the operation
    /// itself fails; the error is recorded and later tasks still run.
    fn run(&self, ctx: &Context) -> Result<TaskResult>;
}

/// Options selecting the optional pipeline steps.
#[derive(Debug, Default, Clone, Copy)]
pub struct BuildOpts {
    /// Bulk-clone the vanilla tree first, in this mode.
    pub clone: Option<CloneMode>,
    /// Reclaim orphaned target files after the scan.
    pub reclaim: bool,
    /// Import profile saves after deployment.
    pub sync_saves: bool,
}

/// The full build pipeline, in execution order.
#[must_use]
pub fn all_build_tasks(opts: BuildOpts) -> Vec<Box<dyn Task>> {
    vec![
        Box::new(manifest::BuildManifest),
        Box::new(clone::CloneVanilla { mode: opts.clone }),
        Box::new(reclaim::ReclaimOrphans {
            enabled: opts.reclaim,
        }),
        Box::new(deploy::DeployManifest),
        Box::new(configs::PublishConfigs),
        Box::new(saves::ImportSaves {
            enabled: opts.sync_saves,
        }),
        Box::new(verify::VerifyBuild),
    ]
}

/// The subset run by the deploy command, which trusts the persisted manifest.
#[must_use]
pub fn all_deploy_tasks(clone: Option<CloneMode>, reclaim: bool) -> Vec<Box<dyn Task>> {
    vec![
        Box::new(clone::CloneVanilla { mode: clone }),
        Box::new(reclaim::ReclaimOrphans { enabled: reclaim }),
        Box::new(deploy::DeployManifest),
    ]
}

/// Drop tasks excluded by `--skip`/`--only` name-substring filters.
#[must_use]
pub fn filter_tasks(
    tasks: Vec<Box<dyn Task>>,
    skip: &[String],
    only: &[String],
) -> Vec<Box<dyn Task>> {
    tasks
        .into_iter()
        .filter(|task| {
            let name = task.name().to_lowercase();
            if !only.is_empty() && !only.iter().any(|o| name.contains(&o.to_lowercase())) {
                return false;
            }
            !skip.iter().any(|s| name.contains(&s.to_lowercase()))
        })
        .collect()
}

/// Execute a task, recording the result in the logger.
pub fn execute(task: &dyn Task, ctx: &Context) {
    if !task.should_run(ctx) {
        ctx.log
            .debug(&format!("skipping task: {} (not applicable)", task.name()));
        ctx.log
            .record_task(task.name(), TaskStatus::NotApplicable, None);
        return;
    }

    ctx.log.stage(task.name());

    match task.run(ctx) {
        Ok(TaskResult::Ok) => {
            ctx.log.record_task(task.name(), TaskStatus::Ok, None);
        }
        Ok(TaskResult::Skipped(reason)) => {
            ctx.log.info(&format!("skipped: {reason}"));
            ctx.log
                .record_task(task.name(), TaskStatus::Skipped, Some(&reason));
        }
        Ok(TaskResult::DryRun) => {
            ctx.log.record_task(task.name(), TaskStatus::DryRun, None);
        }
        Err(e) => {
            ctx.log.error(&format!("{}: {e:#}", task.name()));
            ctx.log
                .record_task(task.name(), TaskStatus::Failed, Some(&format!("{e:#}")));
        }
    }
}

/// Shared fixtures for task unit tests.
#[cfg(test)]
#[allow(clippy::expect_used)]
pub mod test_helpers {
    use std::path::Path;
    use std::sync::Arc;

    use super::Context;
    use crate::config::{Config, Excludes};
    use crate::decisions::PresetDecisions;
    use crate::logging::Logger;

    /// A config whose three roots live under `root`, for the skyrimse game.
    #[must_use]
    pub fn test_config(root: &Path) -> Config {
        Config {
            manager_root: root.join("mo2"),
            game_root: root.join("game"),
            target_root: root.join("target"),
            profile: "Default".to_string(),
            game: crate::config::game::lookup("skyrimse").expect("skyrimse is built in"),
            excludes: Excludes::default(),
        }
    }

    /// A context with preset decisions and a plain logger.
    #[must_use]
    pub fn make_context(config: Config) -> (Context, Arc<Logger>) {
        let log = Arc::new(Logger::new("test"));
        let ctx = Context {
            config,
            log: Arc::clone(&log) as Arc<dyn crate::logging::Log>,
            decisions: Arc::new(PresetDecisions::default()),
            dry_run: false,
            run_timestamp: "20260827_1200".to_string(),
        };
        (ctx, log)
    }

    /// Seed a minimal manager layout: one active mod with one plugin.
    pub fn seed_manager(config: &Config) {
        let mod_dir = config.mods_dir().join("Alpha");
        std::fs::create_dir_all(&mod_dir).expect("create mod dir");
        std::fs::write(mod_dir.join("Alpha.esp"), b"TES4 plugin").expect("write plugin");
        let profile = config.profile_dir();
        std::fs::create_dir_all(&profile).expect("create profile dir");
        std::fs::write(profile.join("modlist.txt"), "+Alpha\n").expect("write modlist");
        std::fs::create_dir_all(config.overlay_dir()).expect("create overlay dir");
    }
}
