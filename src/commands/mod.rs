//! Top-level subcommand orchestration.

pub mod build;
pub mod clean;
pub mod deploy;
pub mod report;
pub mod scan;
pub mod sync;
pub mod verify;
pub mod version;

use std::sync::Arc;

use anyhow::Result;

use crate::cli::{GlobalOpts, LinkFailureArg, SaveConflictArg};
use crate::config::Config;
use crate::decisions::{DecisionHandler, InteractiveDecisions, PresetDecisions};
use crate::logging::{Log, Logger};
use crate::quarantine;
use crate::safety;
use crate::tasks::{self, Context, Task};

/// Shared state produced by the common command setup sequence.
#[derive(Debug)]
pub struct CommandSetup {
    /// The validated run configuration.
    pub config: Config,
}

impl CommandSetup {
    /// Load and validate the configuration and surface plausibility
    /// warnings about the source roots.
    ///
    /// # Errors
    ///
    /// Returns an error when the settings file or its CLI overrides are
    /// unusable.
    pub fn init(global: &GlobalOpts, log: &Logger) -> Result<Self> {
        log.stage("Loading configuration");
        let config = Config::load(global)?;
        log.info(&format!(
            "profile {} for {} -> {}",
            config.profile,
            config.game.id,
            config.target_root.display()
        ));
        log.debug(&format!("manager root: {}", config.manager_root.display()));
        log.debug(&format!("game root: {}", config.game_root.display()));

        for warning in safety::plausibility_warnings(&config) {
            log.warn(&warning);
        }
        Ok(Self { config })
    }
}

/// Build the decision handler for a run.
///
/// Dry runs always use the deterministic presets. Otherwise, any preset flag
/// switches the whole run to preset answers (unspecified ones fall back to
/// the lossless defaults) and a run without flags prompts interactively.
#[must_use]
pub fn decision_handler(
    dry_run: bool,
    link: Option<LinkFailureArg>,
    conflict: Option<SaveConflictArg>,
) -> Arc<dyn DecisionHandler> {
    if !dry_run && link.is_none() && conflict.is_none() {
        return Arc::new(InteractiveDecisions);
    }
    let defaults = PresetDecisions::default();
    Arc::new(PresetDecisions {
        link_fallback: link.map_or(defaults.link_fallback, Into::into),
        conflict_resolution: conflict.map_or(defaults.conflict_resolution, Into::into),
    })
}

/// Assemble the shared task context for one run.
#[must_use]
pub fn make_context(
    config: Config,
    log: Arc<dyn Log>,
    decisions: Arc<dyn DecisionHandler>,
    dry_run: bool,
) -> Context {
    Context {
        config,
        log,
        decisions,
        dry_run,
        run_timestamp: quarantine::run_timestamp(chrono::Local::now()),
    }
}

/// Execute every task in order, print the summary, and bail if any task
/// failed.
///
/// # Errors
///
/// Returns an error if one or more tasks recorded a failure.
pub fn run_tasks_to_completion(
    tasks: &[Box<dyn Task>],
    ctx: &Context,
    log: &Logger,
) -> Result<()> {
    for task in tasks {
        tasks::execute(task.as_ref(), ctx);
    }

    log.print_summary();

    let count = log.failure_count();
    if count > 0 {
        anyhow::bail!("{count} task(s) failed");
    }
    Ok(())
}
