//! Save and configuration synchronization between the manager profile and
//! the portable profile under the target.
//!
//! Saves flow in either direction; files that would overwrite an existing
//! destination are split out and resolved by one decision covering the whole
//! run (overwrite, quarantine, or abort), while non-conflicting files are
//! always copied. Config publication copies the game INIs and plugin-order
//! files into the portable layout and strips the volatile local-save-path
//! line from the published custom INI. Every copy lands via a temporary file
//! and rename, and preserves the source modification time.

use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};

use crate::config::Config;
use crate::config::game::PLUGIN_FILES;
use crate::config::paths::find_save_dir;
use crate::decisions::{ConflictResolution, DecisionHandler, SaveConflict};
use crate::deploy::copy_preserving_mtime;
use crate::error::EngineError;
use crate::logging::Log;
use crate::quarantine::{EXPORT_PREFIX, IMPORT_PREFIX, QuarantineStore};

/// Direction of a save synchronization run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncDirection {
    /// Manager profile saves into the portable profile.
    Import,
    /// Portable profile saves back into the manager profile.
    Export,
}

impl SyncDirection {
    /// Quarantine directory prefix for this direction.
    #[must_use]
    pub fn prefix(self) -> &'static str {
        match self {
            Self::Import => IMPORT_PREFIX,
            Self::Export => EXPORT_PREFIX,
        }
    }

    /// Human-readable label used in prompts and logs.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Import => "import",
            Self::Export => "export",
        }
    }
}

/// Counters for one sync run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SyncOutcome {
    /// Non-conflicting files copied to the destination.
    pub copied: usize,
    /// Conflicting files copied over the destination.
    pub overwritten: usize,
    /// Conflicting files diverted into quarantine.
    pub quarantined: usize,
}

/// Synchronize save files in the given direction.
///
/// # Errors
///
/// Returns [`EngineError::Aborted`] when the decision handler aborts a
/// conflicted run; new files copied before the decision stay in place.
pub fn sync_saves(
    config: &Config,
    direction: SyncDirection,
    run_timestamp: &str,
    decisions: &dyn DecisionHandler,
    dry_run: bool,
    log: &dyn Log,
) -> Result<SyncOutcome> {
    let profile_saves = find_save_dir(&config.profile_dir());
    let portable_saves = config.portable().save_dir();
    let (source_dir, dest_dir) = match direction {
        SyncDirection::Import => (profile_saves, portable_saves),
        SyncDirection::Export => (portable_saves, profile_saves),
    };
    sync_between(
        &source_dir,
        &dest_dir,
        direction,
        run_timestamp,
        decisions,
        dry_run,
        log,
    )
}

/// The directory-to-directory sync procedure, separated for tests and for
/// metadata-routed exports during a clean.
pub fn sync_between(
    source_dir: &Path,
    dest_dir: &Path,
    direction: SyncDirection,
    run_timestamp: &str,
    decisions: &dyn DecisionHandler,
    dry_run: bool,
    log: &dyn Log,
) -> Result<SyncOutcome> {
    let mut outcome = SyncOutcome::default();
    let files = regular_files(source_dir);
    if files.is_empty() {
        log.info(&format!(
            "no save files to {} from {}",
            direction.label(),
            source_dir.display()
        ));
        return Ok(outcome);
    }

    let (conflicting, new): (Vec<String>, Vec<String>) = files
        .into_iter()
        .partition(|name| dest_dir.join(name).exists());

    if !dry_run {
        std::fs::create_dir_all(dest_dir)
            .with_context(|| format!("creating {}", dest_dir.display()))?;
    }
    for name in &new {
        if dry_run {
            log.dry_run(&format!("would copy {name} to {}", dest_dir.display()));
            outcome.copied += 1;
            continue;
        }
        match copy_atomic(&source_dir.join(name), &dest_dir.join(name)) {
            Ok(()) => outcome.copied += 1,
            Err(e) => log.warn(&format!("could not copy {name}: {e}")),
        }
    }

    if conflicting.is_empty() {
        return Ok(outcome);
    }

    let request = SaveConflict {
        direction: direction.label(),
        dest_root: dest_dir,
        files: &conflicting,
    };
    match decisions.on_save_conflict(&request) {
        ConflictResolution::Overwrite => {
            for name in &conflicting {
                if dry_run {
                    log.dry_run(&format!("would overwrite {name}"));
                    outcome.overwritten += 1;
                    continue;
                }
                match copy_atomic(&source_dir.join(name), &dest_dir.join(name)) {
                    Ok(()) => outcome.overwritten += 1,
                    Err(e) => log.warn(&format!("could not overwrite {name}: {e}")),
                }
            }
        }
        ConflictResolution::Quarantine => {
            let store = QuarantineStore::new(dest_dir, direction.prefix());
            if dry_run {
                for name in &conflicting {
                    log.dry_run(&format!(
                        "would quarantine {name} into {}",
                        store.folder_name(run_timestamp)
                    ));
                    outcome.quarantined += 1;
                }
            } else {
                let quarantine_dir = store.create(run_timestamp)?;
                for name in &conflicting {
                    match copy_atomic(&source_dir.join(name), &quarantine_dir.join(name)) {
                        Ok(()) => outcome.quarantined += 1,
                        Err(e) => log.warn(&format!("could not quarantine {name}: {e}")),
                    }
                }
            }
        }
        ConflictResolution::Abort => {
            return Err(EngineError::Aborted {
                reason: format!(
                    "{} sync with {} conflicting saves",
                    direction.label(),
                    conflicting.len()
                ),
            }
            .into());
        }
    }
    Ok(outcome)
}

/// Publish the profile's configuration into the portable layout.
///
/// The game INIs land in the portable documents directory and the
/// plugin-order files in the portable appdata directory; missing sources are
/// skipped. The published custom INI loses every `sLocalSavePath` line.
/// Returns the number of files published.
///
/// # Errors
///
/// Returns an error when a destination directory cannot be created or a
/// present source fails to copy.
pub fn publish_configs(config: &Config, dry_run: bool, log: &dyn Log) -> Result<usize> {
    if !dry_run {
        backup_portable_configs(config)?;
    }
    let profile_dir = config.profile_dir();
    let portable = config.portable();
    let mut published = 0;

    for ini in config.game.ini_files() {
        published += publish_one(&profile_dir.join(&ini), &portable.docs_dir.join(&ini), dry_run, log)?;
    }
    for plugin in PLUGIN_FILES {
        published += publish_one(
            &profile_dir.join(plugin),
            &portable.appdata_dir.join(plugin),
            dry_run,
            log,
        )?;
    }

    let custom = portable.docs_dir.join(config.game.custom_ini());
    if !dry_run && custom.exists() {
        strip_local_save_path(&custom)
            .with_context(|| format!("rewriting {}", custom.display()))?;
    }
    Ok(published)
}

/// Copy the portable INIs back to the manager profile.
///
/// # Errors
///
/// Returns an error when a present source fails to copy.
pub fn export_configs(config: &Config, dry_run: bool, log: &dyn Log) -> Result<usize> {
    let profile_dir = config.profile_dir();
    let portable = config.portable();
    let mut exported = 0;
    for ini in config.game.ini_files() {
        exported += publish_one(&portable.docs_dir.join(&ini), &profile_dir.join(&ini), dry_run, log)?;
    }
    Ok(exported)
}

fn publish_one(source: &Path, dest: &Path, dry_run: bool, log: &dyn Log) -> Result<usize> {
    if !source.exists() {
        return Ok(0);
    }
    if dry_run {
        log.dry_run(&format!("would publish {}", dest.display()));
        return Ok(1);
    }
    if let Some(parent) = dest.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    copy_atomic(source, dest).with_context(|| format!("publishing {}", dest.display()))?;
    Ok(1)
}

/// Copy the pre-existing portable configuration into the backup directory,
/// once per target. Later runs never overwrite it.
fn backup_portable_configs(config: &Config) -> Result<()> {
    let backups = config.backups_dir();
    if backups.exists() {
        return Ok(());
    }
    let portable = config.portable();
    let mut sources: Vec<PathBuf> = config
        .game
        .ini_files()
        .iter()
        .map(|ini| portable.docs_dir.join(ini))
        .collect();
    sources.extend(PLUGIN_FILES.iter().map(|p| portable.appdata_dir.join(p)));

    std::fs::create_dir_all(&backups)
        .with_context(|| format!("creating {}", backups.display()))?;
    for source in sources {
        if !source.is_file() {
            continue;
        }
        if let Some(name) = source.file_name() {
            copy_preserving_mtime(&source, &backups.join(name))
                .with_context(|| format!("backing up {}", source.display()))?;
        }
    }
    Ok(())
}

/// Remove every line containing `slocalsavepath` (case-insensitive) from an
/// INI file, preserving a leading BOM if one was present.
fn strip_local_save_path(path: &Path) -> std::io::Result<()> {
    let bytes = std::fs::read(path)?;
    let had_bom = bytes.starts_with(b"\xef\xbb\xbf");
    let content = String::from_utf8_lossy(&bytes);
    let content = content.strip_prefix('\u{feff}').unwrap_or(&content);

    let kept: Vec<&str> = content
        .lines()
        .filter(|line| !line.to_lowercase().contains("slocalsavepath"))
        .collect();
    let mut out = String::new();
    if had_bom {
        out.push('\u{feff}');
    }
    out.push_str(&kept.join("\n"));
    if content.ends_with('\n') && !kept.is_empty() {
        out.push('\n');
    }
    std::fs::write(path, out)
}

/// Copy via a sibling temp file and rename, preserving modification time.
fn copy_atomic(source: &Path, dest: &Path) -> std::io::Result<()> {
    let tmp = dest.with_extension("tmp-sync");
    copy_preserving_mtime(source, &tmp)?;
    std::fs::rename(&tmp, dest)
}

/// Names of regular files directly under `dir`, sorted.
fn regular_files(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .into_iter()
        .flatten()
        .flatten()
        .filter(|entry| entry.path().is_file())
        .filter_map(|entry| entry.file_name().to_str().map(str::to_string))
        .collect();
    names.sort();
    names
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::decisions::{LinkFallback, RecordingDecisions};

    fn dirs() -> (tempfile::TempDir, PathBuf, PathBuf) {
        let tmp = tempfile::tempdir().unwrap();
        let source = tmp.path().join("src");
        let dest = tmp.path().join("dst");
        std::fs::create_dir_all(&source).unwrap();
        std::fs::create_dir_all(&dest).unwrap();
        (tmp, source, dest)
    }

    fn handler(resolution: ConflictResolution) -> RecordingDecisions {
        RecordingDecisions::new(LinkFallback::Copy, resolution)
    }

    #[test]
    fn new_files_copy_without_a_decision() {
        let (_tmp, source, dest) = dirs();
        std::fs::write(source.join("quick.ess"), b"save").unwrap();
        let decisions = handler(ConflictResolution::Abort);
        let (log, _t, _g) = crate::logging::isolated_logger();

        let outcome = sync_between(
            &source,
            &dest,
            SyncDirection::Import,
            "20260827_1200",
            &decisions,
            false,
            &log,
        )
        .unwrap();
        assert_eq!(outcome.copied, 1);
        assert!(dest.join("quick.ess").exists());
        assert!(decisions.conflict_requests.lock().unwrap().is_empty());
    }

    #[test]
    fn empty_source_is_a_noop() {
        let (_tmp, source, dest) = dirs();
        let decisions = handler(ConflictResolution::Abort);
        let (log, _t, _g) = crate::logging::isolated_logger();
        let outcome = sync_between(
            &source,
            &dest,
            SyncDirection::Import,
            "20260827_1200",
            &decisions,
            false,
            &log,
        )
        .unwrap();
        assert_eq!(outcome, SyncOutcome::default());
    }

    #[test]
    fn one_decision_covers_all_conflicts() {
        let (_tmp, source, dest) = dirs();
        for name in ["a.ess", "b.ess"] {
            std::fs::write(source.join(name), b"new").unwrap();
            std::fs::write(dest.join(name), b"old").unwrap();
        }
        let decisions = handler(ConflictResolution::Overwrite);
        let (log, _t, _g) = crate::logging::isolated_logger();

        let outcome = sync_between(
            &source,
            &dest,
            SyncDirection::Import,
            "20260827_1200",
            &decisions,
            false,
            &log,
        )
        .unwrap();
        assert_eq!(outcome.overwritten, 2);
        assert_eq!(std::fs::read(dest.join("a.ess")).unwrap(), b"new");
        let requests = decisions.conflict_requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0], vec!["a.ess".to_string(), "b.ess".to_string()]);
    }

    #[test]
    fn quarantine_diverts_conflicts_and_keeps_destination() {
        let (_tmp, source, dest) = dirs();
        std::fs::write(source.join("quick.ess"), b"incoming").unwrap();
        std::fs::write(dest.join("quick.ess"), b"existing").unwrap();
        let decisions = handler(ConflictResolution::Quarantine);
        let (log, _t, _g) = crate::logging::isolated_logger();

        let outcome = sync_between(
            &source,
            &dest,
            SyncDirection::Import,
            "20260827_1200",
            &decisions,
            false,
            &log,
        )
        .unwrap();
        assert_eq!(outcome.quarantined, 1);
        assert_eq!(std::fs::read(dest.join("quick.ess")).unwrap(), b"existing");
        assert_eq!(
            std::fs::read(dest.join("import_save_20260827_1200/quick.ess")).unwrap(),
            b"incoming"
        );
    }

    #[test]
    fn abort_leaves_new_files_already_copied() {
        let (_tmp, source, dest) = dirs();
        std::fs::write(source.join("conflict.ess"), b"new").unwrap();
        std::fs::write(dest.join("conflict.ess"), b"old").unwrap();
        std::fs::write(source.join("fresh.ess"), b"fresh").unwrap();
        let decisions = handler(ConflictResolution::Abort);
        let (log, _t, _g) = crate::logging::isolated_logger();

        let err = sync_between(
            &source,
            &dest,
            SyncDirection::Export,
            "20260827_1200",
            &decisions,
            false,
            &log,
        )
        .unwrap_err();
        assert!(err.to_string().contains("run aborted"));
        assert!(dest.join("fresh.ess").exists());
        assert_eq!(std::fs::read(dest.join("conflict.ess")).unwrap(), b"old");
    }

    #[test]
    fn dry_run_consults_handler_but_mutates_nothing() {
        let (_tmp, source, dest) = dirs();
        std::fs::write(source.join("quick.ess"), b"new").unwrap();
        std::fs::write(dest.join("quick.ess"), b"old").unwrap();
        let decisions = handler(ConflictResolution::Quarantine);
        let (log, _t, _g) = crate::logging::isolated_logger();

        let outcome = sync_between(
            &source,
            &dest,
            SyncDirection::Import,
            "20260827_1200",
            &decisions,
            true,
            &log,
        )
        .unwrap();
        assert_eq!(outcome.quarantined, 1);
        assert_eq!(std::fs::read(dest.join("quick.ess")).unwrap(), b"old");
        assert!(!dest.join("import_save_20260827_1200").exists());
    }

    #[test]
    fn strip_removes_save_path_lines_and_keeps_bom() {
        let tmp = tempfile::tempdir().unwrap();
        let ini = tmp.path().join("SkyrimCustom.ini");
        std::fs::write(
            &ini,
            b"\xef\xbb\xbf[General]\nsLocalSavePath=Saves\\Profile\\\nbInvalidateOlderFiles=1\n",
        )
        .unwrap();
        strip_local_save_path(&ini).unwrap();
        let bytes = std::fs::read(&ini).unwrap();
        assert!(bytes.starts_with(b"\xef\xbb\xbf"));
        let text = String::from_utf8(bytes).unwrap();
        assert!(!text.to_lowercase().contains("slocalsavepath"));
        assert!(text.contains("bInvalidateOlderFiles=1"));
    }

    #[test]
    fn strip_without_bom_adds_none() {
        let tmp = tempfile::tempdir().unwrap();
        let ini = tmp.path().join("SkyrimCustom.ini");
        std::fs::write(&ini, "[General]\nSLocalSavePath=x\n").unwrap();
        strip_local_save_path(&ini).unwrap();
        let bytes = std::fs::read(&ini).unwrap();
        assert!(!bytes.starts_with(b"\xef\xbb\xbf"));
        assert_eq!(bytes, b"[General]\n");
    }

    #[test]
    fn copies_preserve_modification_time() {
        let (_tmp, source, dest) = dirs();
        let file = source.join("quick.ess");
        std::fs::write(&file, b"save").unwrap();
        let old = std::time::SystemTime::UNIX_EPOCH + std::time::Duration::from_secs(1_600_000_000);
        std::fs::OpenOptions::new()
            .write(true)
            .open(&file)
            .unwrap()
            .set_modified(old)
            .unwrap();

        copy_atomic(&file, &dest.join("quick.ess")).unwrap();
        assert_eq!(
            std::fs::metadata(dest.join("quick.ess"))
                .unwrap()
                .modified()
                .unwrap(),
            old
        );
    }

    #[test]
    fn direction_prefixes_are_fixed() {
        assert_eq!(SyncDirection::Import.prefix(), "import_save");
        assert_eq!(SyncDirection::Export.prefix(), "export_save");
    }

    fn config_fixture(root: &Path) -> Config {
        Config {
            manager_root: root.join("mo2"),
            game_root: root.join("game"),
            target_root: root.join("target"),
            profile: "Default".to_string(),
            game: crate::config::game::lookup("skyrimse").unwrap(),
            excludes: crate::config::Excludes::default(),
        }
    }

    #[test]
    fn publish_copies_configs_and_strips_save_path() {
        let tmp = tempfile::tempdir().unwrap();
        let config = config_fixture(tmp.path());
        let profile_dir = config.profile_dir();
        std::fs::create_dir_all(&profile_dir).unwrap();
        std::fs::write(profile_dir.join("Skyrim.ini"), "[Display]\n").unwrap();
        std::fs::write(
            profile_dir.join("SkyrimCustom.ini"),
            "[General]\nsLocalSavePath=Saves\\Default\\\n",
        )
        .unwrap();
        std::fs::write(profile_dir.join("plugins.txt"), "*Mod.esp\n").unwrap();
        let (log, _t, _g) = crate::logging::isolated_logger();

        let published = publish_configs(&config, false, &log).unwrap();
        assert_eq!(published, 3, "SkyrimPrefs.ini and loadorder.txt are absent");

        let portable = config.portable();
        assert!(portable.docs_dir.join("Skyrim.ini").exists());
        assert!(portable.appdata_dir.join("plugins.txt").exists());
        let custom =
            std::fs::read_to_string(portable.docs_dir.join("SkyrimCustom.ini")).unwrap();
        assert!(!custom.to_lowercase().contains("slocalsavepath"));
    }

    #[test]
    fn backup_is_taken_once_and_never_overwritten() {
        let tmp = tempfile::tempdir().unwrap();
        let config = config_fixture(tmp.path());
        let portable = config.portable();
        std::fs::create_dir_all(&portable.docs_dir).unwrap();
        std::fs::write(portable.docs_dir.join("Skyrim.ini"), "original\n").unwrap();

        backup_portable_configs(&config).unwrap();
        let backup = config.backups_dir().join("Skyrim.ini");
        assert_eq!(std::fs::read_to_string(&backup).unwrap(), "original\n");

        std::fs::write(portable.docs_dir.join("Skyrim.ini"), "changed\n").unwrap();
        backup_portable_configs(&config).unwrap();
        assert_eq!(std::fs::read_to_string(&backup).unwrap(), "original\n");
    }

    #[test]
    fn export_copies_inis_back_to_the_profile() {
        let tmp = tempfile::tempdir().unwrap();
        let config = config_fixture(tmp.path());
        let portable = config.portable();
        std::fs::create_dir_all(&portable.docs_dir).unwrap();
        std::fs::write(portable.docs_dir.join("SkyrimPrefs.ini"), "[Display]\n").unwrap();
        let (log, _t, _g) = crate::logging::isolated_logger();

        let exported = export_configs(&config, false, &log).unwrap();
        assert_eq!(exported, 1);
        assert!(config.profile_dir().join("SkyrimPrefs.ini").exists());
    }
}
