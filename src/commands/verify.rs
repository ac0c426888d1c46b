//! Command: verify the target tree against the persisted manifest.

use std::sync::Arc;

use anyhow::Result;

use super::{CommandSetup, make_context, run_tasks_to_completion};
use crate::cli::GlobalOpts;
use crate::decisions::PresetDecisions;
use crate::logging::{Log, Logger};
use crate::tasks::{self, Task};

/// Run the verify command.
///
/// Exits non-zero on hard issues (missing files, save deficiencies); soft
/// warnings are logged only.
///
/// # Errors
///
/// Returns an error when no manifest has been persisted or verification
/// finds hard issues.
pub fn run(global: &GlobalOpts, log: &Arc<Logger>) -> Result<()> {
    let setup = CommandSetup::init(global, log)?;
    // Verification never mutates, so the dry-run flag is irrelevant and the
    // decision handler is never consulted.
    let ctx = make_context(
        setup.config,
        Arc::clone(log) as Arc<dyn Log>,
        Arc::new(PresetDecisions::default()),
        false,
    );
    let tasks: Vec<Box<dyn Task>> = vec![Box::new(tasks::verify::VerifyBuild)];
    run_tasks_to_completion(&tasks, &ctx, log)
}
