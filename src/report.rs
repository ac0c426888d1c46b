//! The execution report: per-target deployment outcomes.
//!
//! Rebuilt from scratch on every deployment run and persisted regardless of
//! partial failures, so a half-failed run still leaves a complete record of
//! what happened to every entry.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context as _, Result};
use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// Outcome of one entry's deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeployStatus {
    /// The target was materialized.
    Success,
    /// The target could not be materialized; `error` holds the detail.
    Failure,
}

/// How a successful deployment materialized the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeployMethod {
    /// Second directory entry to the same content (same volume).
    Hardlink,
    /// Byte copy with modification time preserved (cross volume).
    Copy,
}

/// One record: what happened to one target path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionRecord {
    /// Success or failure.
    pub status: DeployStatus,
    /// Method used; only present on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<DeployMethod>,
    /// Identifier of the owning source unit.
    #[serde(rename = "mod")]
    pub mod_origin: String,
    /// Error detail; only present on failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Target relative path → [`ExecutionRecord`].
#[derive(Debug, Default)]
pub struct ExecutionReport {
    records: BTreeMap<String, ExecutionRecord>,
}

impl ExecutionReport {
    /// Create an empty report.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a successful deployment.
    pub fn record_success(&mut self, path: &str, method: DeployMethod, mod_origin: &str) {
        self.records.insert(
            path.to_string(),
            ExecutionRecord {
                status: DeployStatus::Success,
                method: Some(method),
                mod_origin: mod_origin.to_string(),
                error: None,
            },
        );
    }

    /// Record a failed deployment.
    pub fn record_failure(&mut self, path: &str, mod_origin: &str, error: &str) {
        self.records.insert(
            path.to_string(),
            ExecutionRecord {
                status: DeployStatus::Failure,
                method: None,
                mod_origin: mod_origin.to_string(),
                error: Some(error.to_string()),
            },
        );
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the report is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of failed records.
    #[must_use]
    pub fn failure_count(&self) -> usize {
        self.records
            .values()
            .filter(|r| r.status == DeployStatus::Failure)
            .count()
    }

    /// Number of successful records.
    #[must_use]
    pub fn success_count(&self) -> usize {
        self.records.len() - self.failure_count()
    }

    /// Iterate records in path order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &ExecutionRecord)> {
        self.records.iter()
    }

    /// Persist the report as JSON, atomically (temp file + rename).
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
        let json = serde_json::to_string_pretty(&self.records)
            .context("serializing execution report")?;
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, json)
            .with_context(|| format!("writing report to {}", tmp.display()))?;
        std::fs::rename(&tmp, path)
            .with_context(|| format!("moving report into place at {}", path.display()))?;
        Ok(())
    }

    /// Load a persisted report.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::ReportMissing`] when the file does not exist,
    /// or a parse error for a corrupt file.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(EngineError::ReportMissing {
                path: path.to_path_buf(),
            }
            .into());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading report {}", path.display()))?;
        let records: BTreeMap<String, ExecutionRecord> = serde_json::from_str(&content)
            .with_context(|| format!("parsing report {}", path.display()))?;
        Ok(Self { records })
    }

    /// Method breakdown among successful records.
    #[must_use]
    pub fn method_counts(&self) -> (usize, usize) {
        let mut hardlinks = 0;
        let mut copies = 0;
        for record in self.records.values() {
            match record.method {
                Some(DeployMethod::Hardlink) => hardlinks += 1,
                Some(DeployMethod::Copy) => copies += 1,
                None => {}
            }
        }
        (hardlinks, copies)
    }

    /// Failures grouped by error detail, largest group first.
    ///
    /// Each group lists up to `cap` affected targets.
    #[must_use]
    pub fn failure_groups(&self, cap: usize) -> Vec<FailureGroup> {
        let mut groups: BTreeMap<&str, FailureGroup> = BTreeMap::new();
        for (path, record) in &self.records {
            let Some(error) = record.error.as_deref() else {
                continue;
            };
            let group = groups.entry(error).or_insert_with(|| FailureGroup {
                error: error.to_string(),
                count: 0,
                targets: Vec::new(),
            });
            group.count += 1;
            if group.targets.len() < cap {
                group.targets.push(path.clone());
            }
        }
        let mut out: Vec<FailureGroup> = groups.into_values().collect();
        out.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.error.cmp(&b.error)));
        out
    }
}

/// Failures sharing one error detail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureGroup {
    /// The shared error detail.
    pub error: String,
    /// How many targets failed with it.
    pub count: usize,
    /// A capped sample of affected targets.
    pub targets: Vec<String>,
}
