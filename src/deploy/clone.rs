//! Bulk clone of the vanilla game tree into the target root.
//!
//! The clone replicates every file under the game root at the same relative
//! path, skipping destinations that already exist so repeated builds only
//! fill gaps. Redistributable installer payloads (`_CommonRedist`) are never
//! cloned. In hardlink mode a failed link is routed through the decision
//! handler; a byte copy is the usual recovery.

use std::path::Path;

use anyhow::{Context as _, Result};
use walkdir::WalkDir;

use crate::decisions::{DecisionHandler, LinkFailure, LinkFallback};
use crate::error::EngineError;
use crate::logging::Log;

use super::copy_preserving_mtime;

/// How the bulk clone materializes each file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloneMode {
    /// Hardlink each file, consulting the decision handler on failure.
    Hardlink,
    /// Byte-copy each file, preserving modification times.
    Copy,
}

/// Outcome counters for one clone pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CloneStats {
    /// Files materialized as hardlinks.
    pub linked: usize,
    /// Files materialized as byte copies.
    pub copied: usize,
    /// Files left alone because the destination already existed.
    pub skipped: usize,
}

impl CloneStats {
    /// Files touched or deliberately left in place.
    #[must_use]
    pub fn total(&self) -> usize {
        self.linked + self.copied + self.skipped
    }
}

/// Clone the vanilla tree from `game_root` into `target_root`.
///
/// # Errors
///
/// Returns [`EngineError::Aborted`] when the decision handler chooses to
/// abort after a link failure, or an I/O error with context when a copy or
/// directory creation fails.
pub fn clone_vanilla(
    game_root: &Path,
    target_root: &Path,
    mode: CloneMode,
    decisions: &dyn DecisionHandler,
    dry_run: bool,
    log: &dyn Log,
) -> Result<CloneStats> {
    let mut stats = CloneStats::default();

    let walker = WalkDir::new(game_root)
        .into_iter()
        .filter_entry(|entry| !is_redist_dir(entry));
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                log.warn(&format!("skipping unreadable entry during clone: {e}"));
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let rel = entry
            .path()
            .strip_prefix(game_root)
            .with_context(|| format!("walking outside {}", game_root.display()))?;
        let dest = target_root.join(rel);
        if dest.exists() {
            stats.skipped += 1;
            continue;
        }
        if dry_run {
            log.dry_run(&format!("would clone {}", rel.display()));
            stats.copied += 1;
            continue;
        }
        if let Some(parent) = dest.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        match clone_one(entry.path(), &dest, mode, decisions, log)? {
            Some(CloneMethod::Linked) => stats.linked += 1,
            Some(CloneMethod::Copied) => stats.copied += 1,
            None => stats.skipped += 1,
        }
    }

    if !dry_run {
        log.info(&format!(
            "vanilla clone: {} linked, {} copied, {} skipped",
            stats.linked, stats.copied, stats.skipped
        ));
    }
    Ok(stats)
}

#[derive(Debug)]
enum CloneMethod {
    Linked,
    Copied,
}

/// Materialize one file, consulting the decision handler if a hardlink
/// fails. `None` means the handler chose to skip the file.
fn clone_one(
    source: &Path,
    dest: &Path,
    mode: CloneMode,
    decisions: &dyn DecisionHandler,
    log: &dyn Log,
) -> Result<Option<CloneMethod>> {
    if mode == CloneMode::Copy {
        copy_preserving_mtime(source, dest)
            .with_context(|| format!("copying {}", source.display()))?;
        return Ok(Some(CloneMethod::Copied));
    }
    match std::fs::hard_link(source, dest) {
        Ok(()) => Ok(Some(CloneMethod::Linked)),
        Err(error) => {
            let request = LinkFailure {
                source,
                dest,
                error: &error,
            };
            match decisions.on_link_failure(&request) {
                LinkFallback::Copy => {
                    copy_preserving_mtime(source, dest)
                        .with_context(|| format!("copying {}", source.display()))?;
                    Ok(Some(CloneMethod::Copied))
                }
                LinkFallback::Skip => {
                    log.warn(&format!("skipped {} after link failure", dest.display()));
                    Ok(None)
                }
                LinkFallback::Abort => Err(EngineError::Aborted {
                    reason: format!("hardlink fallback for {}", dest.display()),
                }
                .into()),
            }
        }
    }
}

/// Whether a walk entry is a redistributables directory, matched
/// case-insensitively.
fn is_redist_dir(entry: &walkdir::DirEntry) -> bool {
    entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| name.eq_ignore_ascii_case("_commonredist"))
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::decisions::{ConflictResolution, PresetDecisions, RecordingDecisions};
    use std::path::PathBuf;

    fn game_fixture() -> (tempfile::TempDir, PathBuf, PathBuf) {
        let tmp = tempfile::tempdir().unwrap();
        let game = tmp.path().join("game");
        std::fs::create_dir_all(game.join("Data")).unwrap();
        std::fs::write(game.join("SkyrimSE.exe"), b"mz").unwrap();
        std::fs::write(game.join("Data/Skyrim.esm"), b"TES4").unwrap();
        std::fs::create_dir_all(game.join("_CommonRedist/vcredist")).unwrap();
        std::fs::write(game.join("_CommonRedist/vcredist/setup.exe"), b"mz").unwrap();
        let target = tmp.path().join("target");
        (tmp, game, target)
    }

    #[test]
    fn clone_replicates_tree_and_skips_redist() {
        let (_tmp, game, target) = game_fixture();
        let (log, _t, _g) = crate::logging::isolated_logger();
        let stats = clone_vanilla(
            &game,
            &target,
            CloneMode::Hardlink,
            &PresetDecisions::default(),
            false,
            &log,
        )
        .unwrap();

        assert_eq!(stats.linked, 2);
        assert!(target.join("SkyrimSE.exe").exists());
        assert!(target.join("Data/Skyrim.esm").exists());
        assert!(!target.join("_CommonRedist").exists());
    }

    #[test]
    fn copy_mode_copies_instead_of_linking() {
        let (_tmp, game, target) = game_fixture();
        let (log, _t, _g) = crate::logging::isolated_logger();
        let stats = clone_vanilla(
            &game,
            &target,
            CloneMode::Copy,
            &PresetDecisions::default(),
            false,
            &log,
        )
        .unwrap();

        assert_eq!(stats.copied, 2);
        assert_eq!(stats.linked, 0);
        // Copies are independent of the source.
        std::fs::write(game.join("Data/Skyrim.esm"), b"changed").unwrap();
        assert_eq!(std::fs::read(target.join("Data/Skyrim.esm")).unwrap(), b"TES4");
    }

    #[test]
    fn existing_destinations_are_left_alone() {
        let (_tmp, game, target) = game_fixture();
        std::fs::create_dir_all(&target).unwrap();
        std::fs::write(target.join("SkyrimSE.exe"), b"already here").unwrap();
        let (log, _t, _g) = crate::logging::isolated_logger();
        let stats = clone_vanilla(
            &game,
            &target,
            CloneMode::Hardlink,
            &PresetDecisions::default(),
            false,
            &log,
        )
        .unwrap();

        assert_eq!(stats.skipped, 1);
        assert_eq!(stats.linked, 1);
        assert_eq!(
            std::fs::read(target.join("SkyrimSE.exe")).unwrap(),
            b"already here"
        );
    }

    #[test]
    fn dry_run_creates_nothing() {
        let (_tmp, game, target) = game_fixture();
        let (log, _t, _g) = crate::logging::isolated_logger();
        let stats = clone_vanilla(
            &game,
            &target,
            CloneMode::Hardlink,
            &PresetDecisions::default(),
            true,
            &log,
        )
        .unwrap();

        assert_eq!(stats.total(), 2);
        assert!(!target.exists());
    }

    #[test]
    fn skip_decision_leaves_file_out() {
        let tmp = tempfile::tempdir().unwrap();
        let source = tmp.path().join("a.bsa");
        std::fs::write(&source, b"x").unwrap();
        let dest = tmp.path().join("out/a.bsa");
        std::fs::create_dir_all(dest.parent().unwrap()).unwrap();
        // A dangling source path forces the hardlink to fail.
        let missing = tmp.path().join("missing.bsa");
        let decisions = RecordingDecisions::new(LinkFallback::Skip, ConflictResolution::Abort);
        let (log, _t, _g) = crate::logging::isolated_logger();

        let outcome = clone_one(&missing, &dest, CloneMode::Hardlink, &decisions, &log).unwrap();
        assert!(outcome.is_none());
        assert!(!dest.exists());
        assert_eq!(decisions.link_requests.lock().unwrap().len(), 1);
    }

    #[test]
    fn abort_decision_halts_the_run() {
        let tmp = tempfile::tempdir().unwrap();
        let dest = tmp.path().join("out/a.bsa");
        std::fs::create_dir_all(dest.parent().unwrap()).unwrap();
        let missing = tmp.path().join("missing.bsa");
        let decisions = RecordingDecisions::new(LinkFallback::Abort, ConflictResolution::Abort);
        let (log, _t, _g) = crate::logging::isolated_logger();

        let err = clone_one(&missing, &dest, CloneMode::Hardlink, &decisions, &log).unwrap_err();
        assert!(err.to_string().contains("run aborted"));
    }

    #[test]
    fn redist_matching_is_case_insensitive() {
        let tmp = tempfile::tempdir().unwrap();
        let game = tmp.path().join("game");
        std::fs::create_dir_all(game.join("_commonredist")).unwrap();
        std::fs::write(game.join("_commonredist/x.exe"), b"mz").unwrap();
        std::fs::write(game.join("keep.txt"), b"ok").unwrap();
        let target = tmp.path().join("target");
        let (log, _t, _g) = crate::logging::isolated_logger();
        let stats = clone_vanilla(
            &game,
            &target,
            CloneMode::Copy,
            &PresetDecisions::default(),
            false,
            &log,
        )
        .unwrap();
        assert_eq!(stats.total(), 1);
        assert!(target.join("keep.txt").exists());
    }
}
