//! High-precision diagnostic log for capturing the real-time sequence of events.
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Instant;

use super::utils::{diag_log_file_path, format_utc_datetime_us, strip_ansi};

/// Event kinds for the diagnostic log.
///
/// Each variant maps to a short uppercase tag in the log output.
#[derive(Debug, Clone, Copy)]
pub enum DiagEvent {
    /// Informational message.
    Info,
    /// Debug-level message.
    Debug,
    /// Warning message.
    Warn,
    /// Error message.
    Error,
    /// Stage header (major section).
    Stage,
    /// Dry-run preview.
    DryRun,
}

impl DiagEvent {
    /// Short tag for the log line.
    const fn tag(self) -> &'static str {
        match self {
            Self::Info => "INFO",
            Self::Debug => "DEBUG",
            Self::Warn => "WARN",
            Self::Error => "ERROR",
            Self::Stage => "STAGE",
            Self::DryRun => "DRYRUN",
        }
    }
}

/// High-precision diagnostic log for capturing the real-time sequence of events.
///
/// Unlike the main log file (which uses second-precision timestamps), the
/// diagnostic log writes every event **immediately** with microsecond-precision
/// elapsed time from program start and an event kind tag, so slow filesystem
/// operations in a run can be pinpointed after the fact.
///
/// Written to `$XDG_CACHE_HOME/modlink/<command>.diag.log`.
#[derive(Debug)]
pub struct DiagnosticLog {
    file: Mutex<fs::File>,
    #[cfg_attr(not(test), allow(dead_code))]
    path: PathBuf,
    start: Instant,
}

impl DiagnosticLog {
    /// Create a new diagnostic log file for the given command.
    ///
    /// Returns `None` if the cache directory cannot be created or the file
    /// cannot be opened.
    pub(super) fn new(command: &str, start: Instant) -> Option<Self> {
        let path = diag_log_file_path(command)?;
        let version =
            option_env!("MODLINK_VERSION").unwrap_or(concat!("dev-", env!("CARGO_PKG_VERSION")));
        let header = format!(
            "# Diagnostic log — modlink {version} {}\n\
             # Columns: elapsed_us | wall_utc | event | message\n",
            format_utc_datetime_us(),
        );
        fs::write(&path, header).ok()?;
        let file = fs::OpenOptions::new().append(true).open(&path).ok()?;
        Some(Self {
            file: Mutex::new(file),
            path,
            start,
        })
    }

    /// Emit a diagnostic event.
    ///
    /// Each line is: `+<elapsed_us> <wall_utc_us> <TAG> <message>`
    ///
    /// ANSI escape sequences are stripped from the message.
    pub fn emit(&self, event: DiagEvent, message: &str) {
        let elapsed = self.start.elapsed();
        let elapsed_us = elapsed.as_micros();
        let wall = format_utc_datetime_us();
        let tag = event.tag();
        let clean = strip_ansi(message);
        let line = format!("+{elapsed_us:>12} {wall} {tag:<6} {clean}\n");
        if let Ok(mut f) = self.file.lock() {
            f.write_all(line.as_bytes()).ok();
        }
    }

    /// Return the path of the diagnostic log file (test-only).
    #[cfg(test)]
    pub(crate) fn path(&self) -> &std::path::Path {
        &self.path
    }
}
