//! Integrity verifier: read-only checks of a materialized target tree.
//!
//! Three checks aggregate into one [`VerificationResult`]: every manifest
//! entry must exist in the target (a renamed `_X_original.exe` counts as
//! proof for a missing `X.exe`), published configuration files must match
//! their profile counterparts, and every source-side save must be accounted
//! for on the destination side, quarantine folders included. Nothing here
//! mutates.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::config::Config;
use crate::config::game::{GameProfile, PLUGIN_FILES};
use crate::config::paths::find_save_dir;
use crate::logging::Log;
use crate::manifest::MappingTable;
use crate::quarantine::{EXPORT_PREFIX, IMPORT_PREFIX, QuarantineStore};

/// A file moved into quarantine by the current run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuarantinedFile {
    /// File name inside the quarantine directory.
    pub name: String,
    /// Why it was quarantined.
    pub reason: String,
}

/// Aggregated outcome of one verification pass.
#[derive(Debug, Default)]
pub struct VerificationResult {
    /// Manifest entries with no file at the target (substitute included).
    pub missing: Vec<String>,
    /// Targets that exist but are empty despite a declared non-zero size.
    pub empty: Vec<String>,
    /// Config files absent on the published side.
    pub config_missing: Vec<String>,
    /// Config files whose normalized content differs between the sides.
    pub config_mismatch: Vec<String>,
    /// Source-side saves absent from the destination and its quarantines.
    pub save_missing: Vec<String>,
    /// Files quarantined by the current run, informational only.
    pub quarantined_now: Vec<QuarantinedFile>,
    /// Older quarantine directories exist and remain unresolved.
    pub historic_quarantine: bool,
}

impl VerificationResult {
    /// Conditions that should fail a verification run.
    #[must_use]
    pub fn has_hard_issues(&self) -> bool {
        !self.missing.is_empty()
            || !self.config_missing.is_empty()
            || !self.save_missing.is_empty()
    }

    /// Conditions surfaced but never blocking.
    #[must_use]
    pub fn has_soft_warnings(&self) -> bool {
        !self.empty.is_empty() || !self.config_mismatch.is_empty() || self.historic_quarantine
    }

    /// Nothing to report at all.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        !self.has_hard_issues() && !self.has_soft_warnings() && self.quarantined_now.is_empty()
    }
}

/// Outcome of one config pair comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigStatus {
    /// Normalized contents are identical.
    Match,
    /// A residual line-level difference remains.
    Mismatch,
    /// The published side does not exist.
    MissingDest,
    /// The reference side does not exist; nothing to compare.
    NoSource,
}

/// Run all checks against the live target tree.
///
/// `run_timestamp` identifies quarantine directories created by the current
/// run, so they can be reported separately from historic ones.
///
/// # Errors
///
/// Only setup failures surface here; individual file problems land in the
/// result.
pub fn verify_build(
    config: &Config,
    table: &MappingTable,
    run_timestamp: &str,
    log: &dyn Log,
) -> Result<VerificationResult> {
    let mut result = VerificationResult::default();

    check_deployment(table, &config.target_root, &mut result);

    let profile_dir = config.profile_dir();
    let portable = config.portable();
    for ini in config.game.ini_files() {
        // Only the custom INI carries the volatile local-save-path line.
        let ignore = (ini == config.game.custom_ini()).then_some("slocalsavepath");
        record_config(
            &mut result,
            &ini,
            compare_config_pair(&profile_dir.join(&ini), &portable.docs_dir.join(&ini), ignore),
        );
    }
    for plugin in PLUGIN_FILES {
        record_config(
            &mut result,
            plugin,
            compare_config_pair(
                &profile_dir.join(plugin),
                &portable.appdata_dir.join(plugin),
                None,
            ),
        );
    }

    check_saves(
        &find_save_dir(&profile_dir),
        &portable.save_dir(),
        config.game,
        run_timestamp,
        &mut result,
    );

    log.info(&format!(
        "verified {} entries: {} missing, {} empty, {} config issues, {} save deficiencies",
        table.len(),
        result.missing.len(),
        result.empty.len(),
        result.config_missing.len() + result.config_mismatch.len(),
        result.save_missing.len()
    ));
    Ok(result)
}

/// Existence and size check for every manifest entry.
fn check_deployment(table: &MappingTable, target_root: &Path, result: &mut VerificationResult) {
    for (rel_path, entry) in table.iter() {
        let target = target_root.join(rel_path);
        let proof = if target.exists() {
            Some(target)
        } else {
            hidden_original(&target)
        };
        match proof {
            None => result.missing.push(rel_path.clone()),
            Some(path) => {
                let actual = std::fs::metadata(&path).map_or(0, |m| m.len());
                if actual == 0 && entry.size_bytes > 0 {
                    result.empty.push(rel_path.clone());
                }
            }
        }
    }
}

/// The `_X_original.exe` substitute for a missing `X.exe`, if it exists.
fn hidden_original(target: &Path) -> Option<PathBuf> {
    let ext = target.extension()?.to_str()?;
    if !ext.eq_ignore_ascii_case("exe") {
        return None;
    }
    let stem = target.file_stem()?.to_str()?;
    let substitute = target.with_file_name(format!("_{stem}_original.{ext}"));
    substitute.exists().then_some(substitute)
}

/// Compare a reference/published config pair line by line.
///
/// Lines are trimmed, lower-cased, and blank lines dropped before the
/// comparison; lines containing `ignore` (case-insensitive substring) are
/// excluded on both sides.
#[must_use]
pub fn compare_config_pair(source: &Path, dest: &Path, ignore: Option<&str>) -> ConfigStatus {
    if !source.exists() {
        return ConfigStatus::NoSource;
    }
    if !dest.exists() {
        return ConfigStatus::MissingDest;
    }
    if normalized_lines(source, ignore) == normalized_lines(dest, ignore) {
        ConfigStatus::Match
    } else {
        ConfigStatus::Mismatch
    }
}

fn record_config(result: &mut VerificationResult, name: &str, status: ConfigStatus) {
    match status {
        ConfigStatus::MissingDest => result.config_missing.push(name.to_string()),
        ConfigStatus::Mismatch => result.config_mismatch.push(name.to_string()),
        ConfigStatus::Match | ConfigStatus::NoSource => {}
    }
}

/// Read a config file lossily, strip a BOM, and normalize its lines.
fn normalized_lines(path: &Path, ignore: Option<&str>) -> Vec<String> {
    let bytes = std::fs::read(path).unwrap_or_default();
    let content = String::from_utf8_lossy(&bytes);
    let content = content.strip_prefix('\u{feff}').unwrap_or(&content);
    content
        .lines()
        .map(|line| line.trim().to_lowercase())
        .filter(|line| !line.is_empty())
        .filter(|line| ignore.is_none_or(|pattern| !line.contains(pattern)))
        .collect()
}

/// Save-set accounting between a source and destination save directory.
fn check_saves(
    source_dir: &Path,
    dest_dir: &Path,
    game: &GameProfile,
    run_timestamp: &str,
    result: &mut VerificationResult,
) {
    let source_saves = list_saves(source_dir, game);
    let mut dest_set: HashSet<String> = list_saves(dest_dir, game)
        .iter()
        .map(|name| name.to_lowercase())
        .collect();

    for prefix in [IMPORT_PREFIX, EXPORT_PREFIX] {
        let store = QuarantineStore::new(dest_dir, prefix);
        for dir in store.list() {
            let current = dir
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|name| name == store.folder_name(run_timestamp));
            for name in list_saves(&dir, game) {
                dest_set.insert(name.to_lowercase());
                if current {
                    result.quarantined_now.push(QuarantinedFile {
                        name,
                        reason: format!("{prefix} conflict"),
                    });
                }
            }
        }
        if store.has_historic(run_timestamp) {
            result.historic_quarantine = true;
        }
    }

    for name in source_saves {
        if !dest_set.contains(&name.to_lowercase()) {
            result.save_missing.push(name);
        }
    }
}

/// Regular files in `dir` with one of the game's save extensions.
fn list_saves(dir: &Path, game: &GameProfile) -> Vec<String> {
    let mut saves: Vec<String> = std::fs::read_dir(dir)
        .into_iter()
        .flatten()
        .flatten()
        .filter(|entry| entry.path().is_file())
        .filter_map(|entry| entry.file_name().to_str().map(str::to_string))
        .filter(|name| game.is_save_file(name))
        .collect();
    saves.sort();
    saves
}
