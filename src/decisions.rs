//! Decision points surfaced mid-operation.
//!
//! The engine never talks to a terminal itself. When an operation hits a
//! context-dependent fork — a hardlink that failed during the bulk clone, or
//! save files that already exist at a sync destination — it hands a
//! structured request to the [`DecisionHandler`] supplied by the caller and
//! resumes with the returned decision.

use std::io::{BufRead as _, Write as _};
use std::path::Path;

/// A hardlink creation failed during the bulk clone phase.
#[derive(Debug)]
pub struct LinkFailure<'a> {
    /// The file that could not be linked.
    pub source: &'a Path,
    /// Where the link was being created.
    pub dest: &'a Path,
    /// The underlying OS error.
    pub error: &'a std::io::Error,
}

/// Recovery choice for a failed hardlink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkFallback {
    /// Retry the file as a byte copy.
    Copy,
    /// Leave the file out and continue.
    Skip,
    /// Abort the entire run.
    Abort,
}

/// Same-named files already exist at a save-sync destination.
#[derive(Debug)]
pub struct SaveConflict<'a> {
    /// Human-readable sync direction label.
    pub direction: &'a str,
    /// The destination save directory.
    pub dest_root: &'a Path,
    /// Names of the conflicted files.
    pub files: &'a [String],
}

/// Resolution covering all conflicts of one sync run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictResolution {
    /// Copy conflicting files over the destination.
    Overwrite,
    /// Copy conflicting files into a fresh quarantine directory.
    Quarantine,
    /// Abort the sync; already-copied new files stay in place.
    Abort,
}

/// Supplies decisions at the engine's suspend points.
pub trait DecisionHandler: Send + Sync {
    /// Decide how to recover from a failed hardlink.
    fn on_link_failure(&self, request: &LinkFailure<'_>) -> LinkFallback;

    /// Decide how to resolve save conflicts for one sync run.
    fn on_save_conflict(&self, request: &SaveConflict<'_>) -> ConflictResolution;
}

/// Fixed answers supplied up front, for non-interactive runs.
#[derive(Debug, Clone, Copy)]
pub struct PresetDecisions {
    /// Answer for every link failure.
    pub link_fallback: LinkFallback,
    /// Answer for every save conflict.
    pub conflict_resolution: ConflictResolution,
}

impl Default for PresetDecisions {
    /// The deterministic defaults: copy on link failure, quarantine on
    /// conflict. Neither loses data.
    fn default() -> Self {
        Self {
            link_fallback: LinkFallback::Copy,
            conflict_resolution: ConflictResolution::Quarantine,
        }
    }
}

impl DecisionHandler for PresetDecisions {
    fn on_link_failure(&self, _request: &LinkFailure<'_>) -> LinkFallback {
        self.link_fallback
    }

    fn on_save_conflict(&self, _request: &SaveConflict<'_>) -> ConflictResolution {
        self.conflict_resolution
    }
}

/// Prompts on the controlling terminal. Used by default when no preset
/// flags were given.
#[derive(Debug, Default)]
pub struct InteractiveDecisions;

impl InteractiveDecisions {
    /// Print `prompt` to stderr and read one trimmed, lower-cased line.
    ///
    /// Returns an empty string when stdin is closed, which callers map to
    /// the safe choice.
    fn ask(prompt: &str) -> String {
        let mut err = std::io::stderr();
        let _ = write!(err, "{prompt} ");
        let _ = err.flush();
        let mut line = String::new();
        if std::io::stdin().lock().read_line(&mut line).is_err() {
            return String::new();
        }
        line.trim().to_lowercase()
    }
}

impl DecisionHandler for InteractiveDecisions {
    fn on_link_failure(&self, request: &LinkFailure<'_>) -> LinkFallback {
        let mut err = std::io::stderr();
        let _ = writeln!(
            err,
            "hardlink failed for {} -> {}: {}",
            request.source.display(),
            request.dest.display(),
            request.error
        );
        loop {
            match Self::ask("[c]opy this file, [s]kip it, or [a]bort the run?").as_str() {
                "c" | "copy" => return LinkFallback::Copy,
                "s" | "skip" => return LinkFallback::Skip,
                "a" | "abort" | "" => return LinkFallback::Abort,
                _ => {}
            }
        }
    }

    fn on_save_conflict(&self, request: &SaveConflict<'_>) -> ConflictResolution {
        let mut err = std::io::stderr();
        let _ = writeln!(
            err,
            "{} save files already exist in {} ({}):",
            request.files.len(),
            request.dest_root.display(),
            request.direction
        );
        for file in request.files {
            let _ = writeln!(err, "  {file}");
        }
        loop {
            match Self::ask("[o]verwrite them, [q]uarantine the incoming copies, or [a]bort?")
                .as_str()
            {
                "o" | "overwrite" => return ConflictResolution::Overwrite,
                "q" | "quarantine" => return ConflictResolution::Quarantine,
                "a" | "abort" | "" => return ConflictResolution::Abort,
                _ => {}
            }
        }
    }
}

/// A decision handler recording what it was asked, for tests.
#[cfg(test)]
#[derive(Debug)]
pub struct RecordingDecisions {
    /// Answer for every link failure.
    pub link_fallback: LinkFallback,
    /// Answer for every save conflict.
    pub conflict_resolution: ConflictResolution,
    /// Destinations of link-failure requests received.
    pub link_requests: std::sync::Mutex<Vec<std::path::PathBuf>>,
    /// File lists of save-conflict requests received.
    pub conflict_requests: std::sync::Mutex<Vec<Vec<String>>>,
}

#[cfg(test)]
impl RecordingDecisions {
    /// Build a handler with fixed answers and empty request logs.
    pub fn new(link_fallback: LinkFallback, conflict_resolution: ConflictResolution) -> Self {
        Self {
            link_fallback,
            conflict_resolution,
            link_requests: std::sync::Mutex::new(Vec::new()),
            conflict_requests: std::sync::Mutex::new(Vec::new()),
        }
    }
}

#[cfg(test)]
impl DecisionHandler for RecordingDecisions {
    fn on_link_failure(&self, request: &LinkFailure<'_>) -> LinkFallback {
        if let Ok(mut guard) = self.link_requests.lock() {
            guard.push(request.dest.to_path_buf());
        }
        self.link_fallback
    }

    fn on_save_conflict(&self, request: &SaveConflict<'_>) -> ConflictResolution {
        if let Ok(mut guard) = self.conflict_requests.lock() {
            guard.push(request.files.to_vec());
        }
        self.conflict_resolution
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn preset_returns_configured_answers() {
        let preset = PresetDecisions {
            link_fallback: LinkFallback::Skip,
            conflict_resolution: ConflictResolution::Abort,
        };
        let error = std::io::Error::other("cross-device link");
        let request = LinkFailure {
            source: Path::new("/game/a.bsa"),
            dest: Path::new("/sa/a.bsa"),
            error: &error,
        };
        assert_eq!(preset.on_link_failure(&request), LinkFallback::Skip);

        let conflict = SaveConflict {
            direction: "import",
            dest_root: Path::new("/sa/saves"),
            files: &["save1.ess".to_string()],
        };
        assert_eq!(
            preset.on_save_conflict(&conflict),
            ConflictResolution::Abort
        );
    }

    #[test]
    fn default_preset_is_lossless() {
        let preset = PresetDecisions::default();
        assert_eq!(preset.link_fallback, LinkFallback::Copy);
        assert_eq!(
            preset.conflict_resolution,
            ConflictResolution::Quarantine
        );
    }
}
