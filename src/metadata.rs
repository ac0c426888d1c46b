//! Build metadata persisted after a successful deployment.
//!
//! Records which profile and game produced the target tree and when. The
//! clean command consults it to route save exports back to the owning
//! profile; the report command prints it when present.

use std::path::Path;

use anyhow::{Context as _, Result};
use serde::{Deserialize, Serialize};

/// Provenance of the last successful deployment into a target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildMetadata {
    /// Profile name the build was made from.
    pub profile: String,
    /// Game id the build was made for.
    pub game: String,
    /// ISO-8601 timestamp of the deployment.
    pub built_at: String,
}

impl BuildMetadata {
    /// Metadata for a deployment finishing now.
    #[must_use]
    pub fn new(profile: &str, game: &str, now: chrono::DateTime<chrono::Local>) -> Self {
        Self {
            profile: profile.to_string(),
            game: game.to_string(),
            built_at: now.to_rfc3339(),
        }
    }

    /// Persist atomically next to the other state files.
    ///
    /// # Errors
    ///
    /// Returns an error when the parent directory cannot be created or the
    /// file cannot be written.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(self).context("serializing build metadata")?;
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, json)
            .with_context(|| format!("writing {}", tmp.display()))?;
        std::fs::rename(&tmp, path)
            .with_context(|| format!("renaming {} into place", tmp.display()))?;
        Ok(())
    }

    /// Load persisted metadata; `None` when no build has recorded any.
    ///
    /// # Errors
    ///
    /// Returns an error when the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let metadata = serde_json::from_str(&content)
            .with_context(|| format!("parsing {}", path.display()))?;
        Ok(Some(metadata))
    }
}
