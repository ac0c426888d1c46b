//! Deployment executor: materializes the mapping table into the target tree.
//!
//! Each entry gets a clean overwrite — any pre-existing target is deleted
//! first — then a hardlink when source and target share a volume, falling
//! back to a byte copy with the modification time preserved. A single
//! entry's failure never aborts the batch; it is recorded in the execution
//! report and processing continues.

pub mod clone;
pub mod reclaim;

use std::path::Path;

use anyhow::Result;

use crate::logging::Log;
use crate::manifest::MappingTable;
use crate::report::{DeployMethod, ExecutionReport};

/// Deploy every mapping entry into `target_root`.
///
/// In dry-run mode the planned operations are logged and an empty report is
/// returned; nothing is touched.
///
/// # Errors
///
/// Per-entry I/O errors are recorded in the report, not returned. The only
/// error case is a failure to log — effectively none; the signature leaves
/// room for callers to `?` uniformly.
pub fn deploy_manifest(
    table: &MappingTable,
    target_root: &Path,
    dry_run: bool,
    log: &dyn Log,
) -> Result<ExecutionReport> {
    let mut report = ExecutionReport::new();
    log.info(&format!(
        "deploying {} entries to {}",
        table.len(),
        target_root.display()
    ));

    for (rel_path, entry) in table.iter() {
        let target = target_root.join(rel_path);
        if dry_run {
            log.dry_run(&format!(
                "would deploy {rel_path} from {}",
                entry.source.display()
            ));
            continue;
        }
        match deploy_one(&entry.source, &target) {
            Ok(method) => report.record_success(rel_path, method, &entry.mod_origin),
            Err(e) => {
                log.debug(&format!("failed to deploy {rel_path}: {e}"));
                report.record_failure(rel_path, &entry.mod_origin, &e.to_string());
            }
        }
    }

    if !dry_run {
        let failures = report.failure_count();
        if failures > 0 {
            log.warn(&format!(
                "{} of {} entries failed to deploy",
                failures,
                report.len()
            ));
        } else {
            log.info(&format!("{} entries deployed", report.len()));
        }
    }
    Ok(report)
}

/// Materialize one entry: clean overwrite, then hardlink or copy.
fn deploy_one(source: &Path, target: &Path) -> std::io::Result<DeployMethod> {
    remove_existing(target)?;
    if let Some(parent) = target.parent() {
        std::fs::create_dir_all(parent)?;
    }
    match std::fs::hard_link(source, target) {
        Ok(()) => Ok(DeployMethod::Hardlink),
        // Cross-volume (or filesystem-refused) hardlinks are an expected
        // branch; the deterministic fallback is a byte copy.
        Err(_) => {
            copy_preserving_mtime(source, target)?;
            Ok(DeployMethod::Copy)
        }
    }
}

/// Delete whatever currently occupies `target`: file, symlink, or subtree.
pub(crate) fn remove_existing(target: &Path) -> std::io::Result<()> {
    match std::fs::symlink_metadata(target) {
        Ok(meta) if meta.is_dir() => std::fs::remove_dir_all(target),
        Ok(_) => std::fs::remove_file(target),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}

/// Byte-copy `source` to `dest` and carry the modification time over.
pub(crate) fn copy_preserving_mtime(source: &Path, dest: &Path) -> std::io::Result<()> {
    std::fs::copy(source, dest)?;
    let mtime = std::fs::metadata(source)?.modified()?;
    std::fs::OpenOptions::new()
        .write(true)
        .open(dest)?
        .set_modified(mtime)
}
