//! Manifest builder: scans priority-ordered source units into a mapping table.
//!
//! Units are walked lowest priority first, the overlay root last, each file
//! inserted under its normalized target path. Because insertion replaces any
//! earlier entry for the same path, the finished table holds the
//! highest-priority contributor for every target — plain last-write-wins
//! overlay semantics matching the activation order.

use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};
use walkdir::WalkDir;

use crate::config::{Config, Excludes};
use crate::error::EngineError;
use crate::logging::Log;
use crate::manifest::{MappingEntry, MappingTable};

/// Identifier recorded as the overlay root's owning unit.
pub const OVERLAY_ORIGIN: &str = "overlay";

/// One activated source unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceUnit {
    /// Unit identifier (directory name under `mods/`).
    pub name: String,
    /// Position in the activation ordering; higher wins conflicts.
    pub priority: usize,
    /// The unit's root directory.
    pub root: PathBuf,
}

/// Parse an activation list into unit names, lowest priority first.
///
/// The file lists entries highest priority first; lines starting with `+`
/// name an active unit, everything else (disabled `-` entries, comments,
/// separators) is ignored. Reading bottom-up yields ascending priority.
///
/// # Errors
///
/// Returns [`EngineError::ActivationListMissing`] when the file does not
/// exist — a fatal/setup error.
pub fn read_activation_list(path: &Path) -> Result<Vec<String>> {
    if !path.exists() {
        return Err(EngineError::ActivationListMissing {
            path: path.to_path_buf(),
        }
        .into());
    }
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading activation list {}", path.display()))?;
    Ok(content
        .lines()
        .rev()
        .filter_map(|line| {
            let line = line.trim();
            line.strip_prefix('+').map(String::from)
        })
        .collect())
}

/// Resolve activated unit names against the mods directory.
///
/// A listed unit whose root directory does not exist is silently skipped —
/// activation lists routinely carry stale entries.
#[must_use]
pub fn resolve_units(names: Vec<String>, mods_dir: &Path) -> Vec<SourceUnit> {
    names
        .into_iter()
        .filter_map(|name| {
            let root = mods_dir.join(&name);
            root.is_dir().then_some((name, root))
        })
        .enumerate()
        .map(|(priority, (name, root))| SourceUnit {
            name,
            priority,
            root,
        })
        .collect()
}

/// Classify a unit-relative path into its target path and root flag.
///
/// The first segment decides: `root` strips the segment and deploys against
/// the engine root; `data` deploys as-is; anything else goes under a
/// synthetic `Data/` prefix. A marker file with no remainder (a file
/// literally named `root` at the unit root) is an ordinary file.
#[must_use]
pub fn classify(rel: &str) -> (String, bool) {
    let (first, rest) = match rel.split_once('/') {
        Some((first, rest)) => (first, Some(rest)),
        None => (rel, None),
    };
    match rest {
        Some(rest) if first.eq_ignore_ascii_case("root") => (rest.to_string(), true),
        _ if first.eq_ignore_ascii_case("data") && rest.is_some() => (rel.to_string(), false),
        _ => (format!("Data/{rel}"), false),
    }
}

/// Build the mapping table for the configured profile.
///
/// # Errors
///
/// Returns [`EngineError::ActivationListMissing`] when the profile has no
/// activation list. Unreadable individual files are skipped with a warning.
pub fn build_mapping(config: &Config, log: &dyn Log) -> Result<MappingTable> {
    let names = read_activation_list(&config.activation_list_path())?;
    let units = resolve_units(names, &config.mods_dir());
    log.info(&format!(
        "scanning {} active units for profile '{}'",
        units.len(),
        config.profile
    ));

    let mut table = MappingTable::new();
    for unit in &units {
        scan_unit(&unit.root, &unit.name, &config.excludes, &mut table, log);
    }

    let overlay = config.overlay_dir();
    if overlay.is_dir() {
        log.debug("including overlay root as highest priority");
        scan_unit(&overlay, OVERLAY_ORIGIN, &config.excludes, &mut table, log);
    }

    log.info(&format!("{} unique target paths", table.len()));
    Ok(table)
}

/// Walk one unit root, inserting every deployable file into the table.
fn scan_unit(
    root: &Path,
    origin: &str,
    excludes: &Excludes,
    table: &mut MappingTable,
    log: &dyn Log,
) {
    let walker = WalkDir::new(root).into_iter().filter_entry(|entry| {
        if !entry.file_type().is_dir() {
            return true;
        }
        entry
            .file_name()
            .to_str()
            .is_none_or(|name| !excludes.skips_dir(name))
    });

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                log.warn(&format!("skipping unreadable entry in {origin}: {e}"));
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let Some(name) = entry.file_name().to_str() else {
            log.warn(&format!(
                "skipping non-unicode file name in {origin}: {}",
                entry.path().display()
            ));
            continue;
        };
        if excludes.skips_file(name) {
            continue;
        }
        let Ok(rel) = entry.path().strip_prefix(root) else {
            continue;
        };
        let Some(rel) = forward_slashes(rel) else {
            continue;
        };
        let size_bytes = match entry.metadata() {
            Ok(meta) => meta.len(),
            Err(e) => {
                log.warn(&format!("cannot stat {}: {e}", entry.path().display()));
                continue;
            }
        };
        let (target, is_root) = classify(&rel);
        table.insert(
            target,
            MappingEntry {
                source: entry.path().to_path_buf(),
                mod_origin: origin.to_string(),
                is_root,
                size_bytes,
            },
        );
    }
}

/// Join path components with forward slashes, preserving case.
pub(crate) fn forward_slashes(rel: &Path) -> Option<String> {
    let parts: Option<Vec<&str>> = rel
        .components()
        .map(|c| c.as_os_str().to_str())
        .collect();
    parts.map(|p| p.join("/"))
}
