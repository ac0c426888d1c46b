//! Command: run the full build pipeline.

use std::sync::Arc;

use anyhow::Result;

use super::{CommandSetup, decision_handler, make_context, run_tasks_to_completion};
use crate::cli::{BuildOpts, GlobalOpts};
use crate::logging::{Log, Logger};
use crate::safety;
use crate::tasks;

/// Run the build command.
///
/// # Errors
///
/// Returns an error when the layout is unsafe or any pipeline task fails.
pub fn run(global: &GlobalOpts, opts: &BuildOpts, log: &Arc<Logger>) -> Result<()> {
    let setup = CommandSetup::init(global, log)?;
    let config = setup.config;
    safety::ensure_safe_layout(&config)?;

    let decisions = decision_handler(global.dry_run, opts.on_link_failure, opts.on_save_conflict);
    let ctx = make_context(
        config,
        Arc::clone(log) as Arc<dyn Log>,
        decisions,
        global.dry_run,
    );

    let pipeline = tasks::all_build_tasks(tasks::BuildOpts {
        clone: opts.clone.map(Into::into),
        reclaim: opts.reclaim,
        sync_saves: opts.sync_saves,
    });
    let selected = tasks::filter_tasks(pipeline, &opts.skip, &opts.only);
    run_tasks_to_completion(&selected, &ctx, log)
}
