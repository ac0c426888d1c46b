//! Command: synchronize save files between profile and target.

use std::sync::Arc;

use anyhow::Result;

use super::{CommandSetup, decision_handler};
use crate::cli::{GlobalOpts, SyncOpts};
use crate::logging::Logger;
use crate::quarantine;
use crate::safety;
use crate::sync;

/// Run the sync command.
///
/// # Errors
///
/// Returns an error when the layout is unsafe or the sync aborts on a
/// conflict decision.
pub fn run(global: &GlobalOpts, opts: &SyncOpts, log: &Arc<Logger>) -> Result<()> {
    let setup = CommandSetup::init(global, log)?;
    let config = setup.config;
    safety::ensure_safe_layout(&config)?;

    let direction: sync::SyncDirection = opts.direction.into();
    let decisions = decision_handler(global.dry_run, None, opts.on_save_conflict);
    let timestamp = quarantine::run_timestamp(chrono::Local::now());

    log.stage(&format!("Syncing saves ({})", direction.label()));
    let outcome = sync::sync_saves(
        &config,
        direction,
        &timestamp,
        decisions.as_ref(),
        global.dry_run,
        log.as_ref(),
    )?;
    log.info(&format!(
        "{} saves copied, {} overwritten, {} quarantined",
        outcome.copied, outcome.overwritten, outcome.quarantined
    ));
    Ok(())
}
