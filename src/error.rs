//! Typed errors for the overlay engine.
//!
//! Engine modules return [`EngineError`] for conditions that halt a run:
//! missing required inputs, unsafe path layouts detected before any work
//! starts, and operator-requested aborts at decision points. Per-item file
//! failures never surface here — they accumulate into the execution report
//! and the run continues. Command handlers at the CLI boundary convert these
//! to [`anyhow::Error`] via the standard `?` operator.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that halt an engine operation.
#[derive(Error, Debug)]
pub enum EngineError {
    /// The profile's activation list file does not exist.
    #[error("activation list not found: {}", path.display())]
    ActivationListMissing {
        /// Expected location of the activation list.
        path: PathBuf,
    },

    /// The persisted mapping manifest does not exist; run a scan first.
    #[error("mapping manifest not found: {} (run a scan first)", path.display())]
    ManifestMissing {
        /// Expected location of the manifest.
        path: PathBuf,
    },

    /// The persisted execution report does not exist; run a deployment first.
    #[error("execution report not found: {} (run a deployment first)", path.display())]
    ReportMissing {
        /// Expected location of the report.
        path: PathBuf,
    },

    /// An unsafe path relationship was detected before any work started.
    #[error("unsafe layout: {reason}")]
    UnsafeLayout {
        /// Which relationship check failed.
        reason: String,
    },

    /// A decision handler chose to abort the run.
    #[error("run aborted: {reason}")]
    Aborted {
        /// What was being decided when the abort was requested.
        reason: String,
    },

    /// The settings file or its CLI overrides are unusable.
    #[error("invalid settings: {reason}")]
    InvalidSettings {
        /// Which setting failed validation.
        reason: String,
    },

    /// The configured game id is not in the built-in game table.
    #[error("unknown game '{id}' (known: {known})")]
    UnknownGame {
        /// The id that failed to resolve.
        id: String,
        /// Comma-separated list of recognized ids.
        known: String,
    },
}
