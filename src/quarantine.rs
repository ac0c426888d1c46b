//! Timestamped quarantine directories with bounded retention.
//!
//! A quarantine directory preserves files that lost a copy-time conflict
//! instead of silently overwriting the destination. Directories are named
//! `<prefix>_<YYYYMMDD_HHMM>` under the destination root; at most
//! [`RETENTION`] directories are kept per (root, prefix) pair, pruned oldest
//! first immediately after a new one is created. The lexicographic order of
//! the timestamp suffix is its chronological order.

use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};

/// Maximum quarantine directories kept per (root, prefix) pair.
pub const RETENTION: usize = 5;

/// Prefix for saves flowing manager → target.
pub const IMPORT_PREFIX: &str = "import_save";

/// Prefix for saves flowing target → manager.
pub const EXPORT_PREFIX: &str = "export_save";

/// Format a run timestamp the way quarantine names embed it.
#[must_use]
pub fn run_timestamp(now: chrono::DateTime<chrono::Local>) -> String {
    now.format("%Y%m%d_%H%M").to_string()
}

/// Quarantine directories for one (destination root, prefix) pair.
#[derive(Debug, Clone)]
pub struct QuarantineStore {
    root: PathBuf,
    prefix: String,
}

impl QuarantineStore {
    /// A store rooted at `root` using `prefix` for its directory names.
    #[must_use]
    pub fn new(root: &Path, prefix: &str) -> Self {
        Self {
            root: root.to_path_buf(),
            prefix: prefix.to_string(),
        }
    }

    /// The directory name for a given run timestamp.
    #[must_use]
    pub fn folder_name(&self, timestamp: &str) -> String {
        format!("{}_{timestamp}", self.prefix)
    }

    /// Create the quarantine directory for this run and enforce retention.
    ///
    /// The fresh directory counts toward the retention limit.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created. Pruning failures
    /// of individual old directories are ignored.
    pub fn create(&self, timestamp: &str) -> Result<PathBuf> {
        let dir = self.root.join(self.folder_name(timestamp));
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("creating quarantine directory {}", dir.display()))?;
        self.prune();
        Ok(dir)
    }

    /// All quarantine directories for this pair, oldest first.
    #[must_use]
    pub fn list(&self) -> Vec<PathBuf> {
        let marker = format!("{}_", self.prefix);
        let mut dirs: Vec<PathBuf> = std::fs::read_dir(&self.root)
            .into_iter()
            .flatten()
            .flatten()
            .filter(|entry| {
                entry.path().is_dir()
                    && entry
                        .file_name()
                        .to_str()
                        .is_some_and(|name| name.starts_with(&marker))
            })
            .map(|entry| entry.path())
            .collect();
        dirs.sort();
        dirs
    }

    /// Delete all but the [`RETENTION`] most recent directories.
    pub fn prune(&self) {
        let dirs = self.list();
        if dirs.len() <= RETENTION {
            return;
        }
        let excess = dirs.len() - RETENTION;
        for dir in dirs.into_iter().take(excess) {
            // Best effort; a stuck old quarantine never blocks the run.
            let _ = std::fs::remove_dir_all(&dir);
        }
    }

    /// Whether directories from runs other than `current_timestamp` exist.
    #[must_use]
    pub fn has_historic(&self, current_timestamp: &str) -> bool {
        let current = self.folder_name(current_timestamp);
        self.list().iter().any(|dir| {
            dir.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|name| name != current)
        })
    }

    /// The directory created by the run with `timestamp`, if present.
    #[must_use]
    pub fn dir_for(&self, timestamp: &str) -> Option<PathBuf> {
        let dir = self.root.join(self.folder_name(timestamp));
        dir.is_dir().then_some(dir)
    }
}
