//! Task: bulk-clone the vanilla game tree.

use std::path::Path;

use anyhow::Result;

use super::{Context, Task, TaskResult};
use crate::deploy::clone::{CloneMode, clone_vanilla};

/// Bulk-clone the vanilla game tree into the target, when requested.
#[derive(Debug)]
pub struct CloneVanilla {
    /// Requested clone mode; `None` leaves the task out of the run.
    pub mode: Option<CloneMode>,
}

impl Task for CloneVanilla {
    fn name(&self) -> &'static str {
        "Clone vanilla"
    }

    fn should_run(&self, _ctx: &Context) -> bool {
        self.mode.is_some()
    }

    fn run(&self, ctx: &Context) -> Result<TaskResult> {
        let Some(mut mode) = self.mode else {
            return Ok(TaskResult::Skipped("clone not requested".to_string()));
        };
        if mode == CloneMode::Hardlink
            && !ctx.dry_run
            && crosses_volumes(&ctx.config.game_root, &ctx.config.target_root)
        {
            ctx.log
                .warn("game and target roots are on different volumes; cloning by copy");
            mode = CloneMode::Copy;
        }
        let stats = clone_vanilla(
            &ctx.config.game_root,
            &ctx.config.target_root,
            mode,
            ctx.decisions.as_ref(),
            ctx.dry_run,
            ctx.log.as_ref(),
        )?;
        if ctx.dry_run {
            return Ok(TaskResult::DryRun);
        }
        if stats.linked + stats.copied == 0 {
            return Ok(TaskResult::Skipped(
                "target already holds the vanilla tree".to_string(),
            ));
        }
        Ok(TaskResult::Ok)
    }
}

/// Probe whether a hardlink from the game root into the target would cross
/// volumes. Any probe failure other than a cross-device error is left for
/// the per-file decision handler to deal with.
fn crosses_volumes(game_root: &Path, target_root: &Path) -> bool {
    let Some(sample) = first_file(game_root) else {
        return false;
    };
    let probe = target_root.join(".volume_probe");
    if std::fs::create_dir_all(target_root).is_err() {
        return false;
    }
    let crossed = match std::fs::hard_link(&sample, &probe) {
        Ok(()) => false,
        Err(e) => e.kind() == std::io::ErrorKind::CrossesDevices,
    };
    let _ = std::fs::remove_file(&probe);
    crossed
}

fn first_file(dir: &Path) -> Option<std::path::PathBuf> {
    std::fs::read_dir(dir)
        .ok()?
        .flatten()
        .map(|entry| entry.path())
        .find(|path| path.is_file())
}
