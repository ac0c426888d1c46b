//! Command: deploy the persisted manifest into the target tree.

use std::sync::Arc;

use anyhow::Result;

use super::{CommandSetup, decision_handler, make_context, run_tasks_to_completion};
use crate::cli::{DeployOpts, GlobalOpts};
use crate::error::EngineError;
use crate::logging::{Log, Logger};
use crate::safety;
use crate::tasks;

/// Run the deploy command.
///
/// # Errors
///
/// Returns an error when the layout is unsafe, no manifest has been
/// persisted yet, or any task fails.
pub fn run(global: &GlobalOpts, opts: &DeployOpts, log: &Arc<Logger>) -> Result<()> {
    let setup = CommandSetup::init(global, log)?;
    let config = setup.config;
    safety::ensure_safe_layout(&config)?;

    // The deploy command trusts a prior scan; fail before any work starts.
    let manifest_path = config.manifest_path();
    if !manifest_path.exists() {
        return Err(EngineError::ManifestMissing {
            path: manifest_path,
        }
        .into());
    }

    let decisions = decision_handler(global.dry_run, opts.on_link_failure, None);
    let ctx = make_context(
        config,
        Arc::clone(log) as Arc<dyn Log>,
        decisions,
        global.dry_run,
    );
    let tasks = tasks::all_deploy_tasks(opts.clone.map(Into::into), opts.reclaim);
    run_tasks_to_completion(&tasks, &ctx, log)
}
