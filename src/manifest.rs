//! The mapping table: one entry per normalized target path.
//!
//! The table realizes the overlay invariant — exactly one visible file per
//! target path, with later-priority insertions unconditionally replacing
//! earlier ones. Lookup is case-insensitive so case-variant contributions
//! from different units collapse to one physical target, but the originally
//! seen casing is preserved as the display path for output and persistence.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};
use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// One resolved manifest entry: where a target file comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingEntry {
    /// Absolute path of the winning source file.
    pub source: PathBuf,
    /// Identifier of the contributing source unit.
    pub mod_origin: String,
    /// Whether the file deploys relative to the engine root rather than the
    /// data tree. Informational metadata; deployment consults only the path.
    pub is_root: bool,
    /// Source file size at scan time.
    pub size_bytes: u64,
}

/// Lower-case a forward-slash relative path for use as an index key.
#[must_use]
pub fn normalize_key(path: &str) -> String {
    path.to_lowercase()
}

/// Mapping from target relative path to its winning [`MappingEntry`].
#[derive(Debug, Default)]
pub struct MappingTable {
    /// Display path → entry. BTreeMap keeps persisted output deterministic.
    entries: BTreeMap<String, MappingEntry>,
    /// Normalized key → display path currently holding that key.
    index: HashMap<String, String>,
}

impl MappingTable {
    /// Create an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an entry, unconditionally replacing any earlier entry for the
    /// same normalized path. `path` is the forward-slash display path.
    pub fn insert(&mut self, path: String, entry: MappingEntry) {
        let key = normalize_key(&path);
        if let Some(previous) = self.index.insert(key, path.clone()) {
            // A case-variant display path may already hold this key.
            if previous != path {
                self.entries.remove(&previous);
            }
        }
        self.entries.insert(path, entry);
    }

    /// Look up an entry by path, case-insensitively.
    #[must_use]
    pub fn get(&self, path: &str) -> Option<&MappingEntry> {
        let display = self.index.get(&normalize_key(path))?;
        self.entries.get(display)
    }

    /// Whether the table holds an entry for this normalized key.
    #[must_use]
    pub fn contains_key_normalized(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate entries in display-path order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &MappingEntry)> {
        self.entries.iter()
    }

    /// Persist the table as JSON, atomically (temp file + rename).
    ///
    /// # Errors
    ///
    /// Returns an error if the parent directory cannot be created or the
    /// write/rename fails.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating state directory {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(&self.entries)
            .context("serializing mapping manifest")?;
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, json)
            .with_context(|| format!("writing manifest to {}", tmp.display()))?;
        std::fs::rename(&tmp, path)
            .with_context(|| format!("moving manifest into place at {}", path.display()))?;
        Ok(())
    }

    /// Load a persisted table.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::ManifestMissing`] when the file does not exist
    /// (fatal/setup class), or a parse error for a corrupt file.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(EngineError::ManifestMissing {
                path: path.to_path_buf(),
            }
            .into());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading manifest {}", path.display()))?;
        let entries: BTreeMap<String, MappingEntry> = serde_json::from_str(&content)
            .with_context(|| format!("parsing manifest {}", path.display()))?;
        let index = entries
            .keys()
            .map(|display| (normalize_key(display), display.clone()))
            .collect();
        Ok(Self { entries, index })
    }

    /// Summary statistics for reporting.
    #[must_use]
    pub fn stats(&self) -> ManifestStats {
        let mut per_origin: HashMap<&str, usize> = HashMap::new();
        let mut root_entries = 0;
        let mut total_size = 0u64;
        for entry in self.entries.values() {
            *per_origin.entry(entry.mod_origin.as_str()).or_default() += 1;
            if entry.is_root {
                root_entries += 1;
            }
            total_size += entry.size_bytes;
        }
        let mut top_origins: Vec<(String, usize)> = per_origin
            .into_iter()
            .map(|(origin, count)| (origin.to_string(), count))
            .collect();
        top_origins.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

        ManifestStats {
            entries: self.entries.len(),
            origins: top_origins.len(),
            root_entries,
            data_entries: self.entries.len() - root_entries,
            total_size_bytes: total_size,
            top_origins,
        }
    }
}

/// Aggregate numbers over a [`MappingTable`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestStats {
    /// Total entry count.
    pub entries: usize,
    /// Distinct contributing origins.
    pub origins: usize,
    /// Entries flagged as root-tree deployment.
    pub root_entries: usize,
    /// Entries flagged as data-tree deployment.
    pub data_entries: usize,
    /// Sum of declared source sizes.
    pub total_size_bytes: u64,
    /// Origins with their entry counts, largest first.
    pub top_origins: Vec<(String, usize)>,
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    fn entry(origin: &str, size: u64) -> MappingEntry {
        MappingEntry {
            source: PathBuf::from(format!("/mods/{origin}/file")),
            mod_origin: origin.to_string(),
            is_root: false,
            size_bytes: size,
        }
    }

    #[test]
    fn later_insert_replaces_earlier() {
        let mut table = MappingTable::new();
        table.insert("Data/x.esp".to_string(), entry("A", 10));
        table.insert("Data/x.esp".to_string(), entry("B", 20));
        assert_eq!(table.len(), 1);
        assert_eq!(table.get("Data/x.esp").unwrap().mod_origin, "B");
    }

    #[test]
    fn case_variant_paths_collapse_to_one_entry() {
        let mut table = MappingTable::new();
        table.insert("Data/Textures/A.dds".to_string(), entry("A", 10));
        table.insert("data/textures/a.dds".to_string(), entry("B", 20));
        assert_eq!(table.len(), 1, "case variants must not duplicate");
        let found = table.get("DATA/TEXTURES/A.DDS").unwrap();
        assert_eq!(found.mod_origin, "B");
    }

    #[test]
    fn latest_casing_becomes_display_path() {
        let mut table = MappingTable::new();
        table.insert("Data/X.esp".to_string(), entry("A", 10));
        table.insert("data/x.esp".to_string(), entry("B", 20));
        let keys: Vec<&String> = table.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["data/x.esp"]);
    }

    #[test]
    fn get_is_case_insensitive() {
        let mut table = MappingTable::new();
        table.insert("Data/x.esp".to_string(), entry("A", 10));
        assert!(table.get("data/X.ESP").is_some());
        assert!(table.get("data/missing.esp").is_none());
    }

    #[test]
    fn save_then_load_round_trips() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("state").join("mapping_manifest.json");

        let mut table = MappingTable::new();
        table.insert(
            "Data/x.esp".to_string(),
            MappingEntry {
                source: PathBuf::from("/src/A/Data/x.esp"),
                mod_origin: "A".to_string(),
                is_root: false,
                size_bytes: 120,
            },
        );
        table.insert("f4se_loader.exe".to_string(), entry("B", 5));
        table.save(&path).unwrap();

        let loaded = MappingTable::load(&path).unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded.get("Data/x.esp").unwrap().size_bytes, 120);
        assert!(loaded.contains_key_normalized("f4se_loader.exe"));
    }

    #[test]
    fn save_leaves_no_temp_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("mapping_manifest.json");
        MappingTable::new().save(&path).unwrap();
        assert!(path.exists());
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn load_missing_manifest_is_fatal() {
        let err = MappingTable::load(Path::new("/nonexistent/mapping_manifest.json")).unwrap_err();
        let engine = err.downcast_ref::<EngineError>().expect("typed error");
        assert!(matches!(engine, EngineError::ManifestMissing { .. }));
    }

    #[test]
    fn persisted_format_matches_contract() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("mapping_manifest.json");
        let mut table = MappingTable::new();
        table.insert(
            "Data/x.esp".to_string(),
            MappingEntry {
                source: PathBuf::from("/src/A/Data/x.esp"),
                mod_origin: "A".to_string(),
                is_root: false,
                size_bytes: 120,
            },
        );
        table.save(&path).unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        let entry = &raw["Data/x.esp"];
        assert_eq!(entry["source"], "/src/A/Data/x.esp");
        assert_eq!(entry["mod_origin"], "A");
        assert_eq!(entry["is_root"], false);
        assert_eq!(entry["size_bytes"], 120);
    }

    #[test]
    fn stats_aggregate_origins_and_sizes() {
        let mut table = MappingTable::new();
        table.insert("Data/a.esp".to_string(), entry("A", 10));
        table.insert("Data/b.esp".to_string(), entry("A", 20));
        table.insert(
            "enbseries.ini".to_string(),
            MappingEntry {
                source: PathBuf::from("/mods/B/root/enbseries.ini"),
                mod_origin: "B".to_string(),
                is_root: true,
                size_bytes: 5,
            },
        );
        let stats = table.stats();
        assert_eq!(stats.entries, 3);
        assert_eq!(stats.origins, 2);
        assert_eq!(stats.root_entries, 1);
        assert_eq!(stats.data_entries, 2);
        assert_eq!(stats.total_size_bytes, 35);
        assert_eq!(stats.top_origins[0], ("A".to_string(), 2));
    }
}
