//! Command: restore the target tree to pristine.

use std::sync::Arc;

use anyhow::{Result, anyhow};

use super::CommandSetup;
use crate::cli::{CleanOpts, GlobalOpts};
use crate::config::paths::find_save_dir;
use crate::decisions::PresetDecisions;
use crate::logging::Logger;
use crate::metadata::BuildMetadata;
use crate::quarantine;
use crate::safety;
use crate::sync::{self, SyncDirection};

/// Run the clean command.
///
/// Every top-level entry under the target is deleted; per-item failures are
/// reported and non-fatal. Saves in the portable profile block the clean
/// unless `--keep-saves` exports them back to the owning profile first.
///
/// # Errors
///
/// Returns an error when the layout is unsafe, saves would be lost, or save
/// export routing fails.
pub fn run(global: &GlobalOpts, opts: &CleanOpts, log: &Arc<Logger>) -> Result<()> {
    let setup = CommandSetup::init(global, log)?;
    let config = setup.config;
    safety::ensure_safe_layout(&config)?;

    let save_dir = config.portable().save_dir();
    let saves = save_files(&save_dir, &config);
    if !saves.is_empty() {
        if !opts.keep_saves {
            return Err(anyhow!(
                "target holds {} save files in {}; pass --keep-saves to export them first",
                saves.len(),
                save_dir.display()
            ));
        }
        export_saves(&config, &save_dir, global.dry_run, log)?;
    }

    log.stage("Cleaning target");
    let mut removed = 0;
    for entry in std::fs::read_dir(&config.target_root)
        .map_err(|e| anyhow!("reading {}: {e}", config.target_root.display()))?
        .flatten()
    {
        let path = entry.path();
        if global.dry_run {
            log.dry_run(&format!("would remove {}", path.display()));
            continue;
        }
        let result = if path.is_dir() {
            std::fs::remove_dir_all(&path)
        } else {
            std::fs::remove_file(&path)
        };
        match result {
            Ok(()) => removed += 1,
            Err(e) => log.warn(&format!("could not remove {}: {e}", path.display())),
        }
    }
    if !global.dry_run {
        log.info(&format!("{removed} top-level entries removed"));
    }
    Ok(())
}

/// Export the target's saves back to the profile recorded in the build
/// metadata. The metadata is the only trustworthy routing source; without
/// it the clean refuses rather than guess.
fn export_saves(
    config: &crate::config::Config,
    save_dir: &std::path::Path,
    dry_run: bool,
    log: &Arc<Logger>,
) -> Result<()> {
    let metadata = BuildMetadata::load(&config.metadata_path())?
        .ok_or_else(|| anyhow!("no build metadata; cannot route the save export"))?;
    if metadata.profile.is_empty() {
        return Err(anyhow!("build metadata names no profile"));
    }
    let profile_dir = config.manager_root.join("profiles").join(&metadata.profile);
    let dest = find_save_dir(&profile_dir);

    log.stage(&format!("Exporting saves to profile {}", metadata.profile));
    let timestamp = quarantine::run_timestamp(chrono::Local::now());
    let outcome = sync::sync_between(
        save_dir,
        &dest,
        SyncDirection::Export,
        &timestamp,
        &PresetDecisions::default(),
        dry_run,
        log.as_ref(),
    )?;
    log.info(&format!(
        "{} saves exported, {} quarantined",
        outcome.copied + outcome.overwritten,
        outcome.quarantined
    ));
    Ok(())
}

/// Save files in `dir` matching the game's extensions.
fn save_files(dir: &std::path::Path, config: &crate::config::Config) -> Vec<String> {
    std::fs::read_dir(dir)
        .into_iter()
        .flatten()
        .flatten()
        .filter(|entry| entry.path().is_file())
        .filter_map(|entry| entry.file_name().to_str().map(str::to_string))
        .filter(|name| config.game.is_save_file(name))
        .collect()
}
