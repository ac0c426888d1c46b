//! Orphan reclamation: delete target files no longer backed by the manifest.
//!
//! A file in the target tree that the current mapping table does not claim
//! is an orphan from an earlier build, unless a protection rule marks it as
//! vanilla or engine-owned content. Matching against the table is
//! case-insensitive, like every other path comparison. The candidate set is
//! computed identically whether or not the run mutates, so a dry run lists
//! exactly what a real run would delete.

use std::path::Path;

use anyhow::Result;
use walkdir::WalkDir;

use crate::config::{STATE_DIR_NAME, paths::PROFILE_DIR_NAME};
use crate::logging::Log;
use crate::manifest::{MappingTable, normalize_key};
use crate::scan::forward_slashes;

/// Normalized path prefixes never reclaimed: vanilla archives and masters
/// live under these regardless of what the manifest says.
const PROTECTED_PREFIXES: &[&str] = &[
    "data/skyrim",
    "data/fallout",
    "data/starfield",
    "data/oblivion",
    "data/update",
];

/// Extensions protected at the target root only.
const PROTECTED_ROOT_EXTENSIONS: &[&str] = &["exe", "dll", "esm", "ba2"];

/// Whether a normalized relative path is protected from reclamation.
#[must_use]
pub fn is_protected(normalized: &str) -> bool {
    if PROTECTED_PREFIXES
        .iter()
        .any(|prefix| normalized.starts_with(prefix))
    {
        return true;
    }
    // Archives are protected wherever they sit.
    if normalized.ends_with(".bsa") {
        return true;
    }
    if !normalized.contains('/') {
        if let Some((_, ext)) = normalized.rsplit_once('.') {
            if PROTECTED_ROOT_EXTENSIONS.contains(&ext) {
                return true;
            }
        }
    }
    false
}

/// Delete (or, in dry-run mode, list) unmanaged files in the target tree.
///
/// Returns the relative paths of every reclamation candidate. The engine's
/// own state directory and the portable profile are never visited.
///
/// # Errors
///
/// Returns an error only when a relative path is not valid UTF-8; individual
/// deletion failures are logged and skipped.
pub fn reclaim_orphans(
    table: &MappingTable,
    target_root: &Path,
    dry_run: bool,
    log: &dyn Log,
) -> Result<Vec<String>> {
    let mut candidates = Vec::new();

    let walker = WalkDir::new(target_root)
        .into_iter()
        .filter_entry(|entry| !is_engine_dir(entry, target_root));
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                log.warn(&format!("skipping unreadable entry during reclaim: {e}"));
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let Ok(rel) = entry.path().strip_prefix(target_root) else {
            continue;
        };
        let Some(rel_str) = forward_slashes(rel) else {
            log.warn(&format!("skipping non-UTF-8 path {}", rel.display()));
            continue;
        };
        let normalized = normalize_key(&rel_str);
        if table.contains_key_normalized(&normalized) || is_protected(&normalized) {
            continue;
        }
        if dry_run {
            log.dry_run(&format!("would reclaim {rel_str}"));
        } else {
            log.debug(&format!("reclaiming {rel_str}"));
            if let Err(e) = std::fs::remove_file(entry.path()) {
                log.warn(&format!("could not reclaim {rel_str}: {e}"));
            }
        }
        candidates.push(rel_str);
    }

    if !dry_run {
        log.info(&format!("{} orphaned files reclaimed", candidates.len()));
    }
    Ok(candidates)
}

/// Whether a walk entry is an engine-owned directory at the target root.
fn is_engine_dir(entry: &walkdir::DirEntry, target_root: &Path) -> bool {
    entry.file_type().is_dir()
        && entry.path().parent() == Some(target_root)
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| name == STATE_DIR_NAME || name == PROFILE_DIR_NAME)
}
