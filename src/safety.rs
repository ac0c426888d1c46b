//! Path-relationship policy checks, run before any mutating operation.
//!
//! A target nested inside (or wrapping) the manager or game root would let a
//! deployment or clean destroy its own sources; a target that looks like a
//! live game or store installation must never be emptied. Violations refuse
//! the run before any work starts.

use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::config::{Config, STATE_DIR_NAME, paths::PROFILE_DIR_NAME};
use crate::error::EngineError;

/// Files identifying a store-client or live game installation.
const LIVE_INSTALL_MARKERS: &[&str] = &[
    "steam.exe",
    "Steam.dll",
    "Galaxy64.dll",
    "Galaxy.dll",
    "steam_api64.dll",
    "steam_api.dll",
];

/// Canonicalize a path for comparison, tolerating nonexistent paths.
fn canonical(path: &Path) -> PathBuf {
    dunce::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

/// Whether `child` is `parent` or nested anywhere beneath it.
#[must_use]
pub fn is_inside(child: &Path, parent: &Path) -> bool {
    canonical(child).starts_with(canonical(parent))
}

/// Whether the target carries the engine's own markers, identifying a tree
/// we built before and may safely rebuild or clean.
#[must_use]
pub fn is_recognized_target(target_root: &Path) -> bool {
    target_root.join(STATE_DIR_NAME).exists() || target_root.join(PROFILE_DIR_NAME).exists()
}

/// Refuse unsafe path relationships between the three roots.
///
/// # Errors
///
/// Returns [`EngineError::UnsafeLayout`] when the target is the manager or
/// game root, nested in either, a parent of either, or looks like a live
/// game/store installation without the engine's own markers.
pub fn ensure_safe_layout(config: &Config) -> Result<()> {
    let target = &config.target_root;

    for (root, label) in [
        (&config.manager_root, "manager root"),
        (&config.game_root, "game root"),
    ] {
        if is_inside(target, root) {
            return Err(EngineError::UnsafeLayout {
                reason: format!("target is the {label} or nested inside it"),
            }
            .into());
        }
        if is_inside(root, target) {
            return Err(EngineError::UnsafeLayout {
                reason: format!("target is a parent of the {label}"),
            }
            .into());
        }
    }

    if !is_recognized_target(target)
        && LIVE_INSTALL_MARKERS
            .iter()
            .any(|marker| target.join(marker).exists())
    {
        return Err(EngineError::UnsafeLayout {
            reason: "target looks like a live game or store installation".to_string(),
        }
        .into());
    }

    Ok(())
}

/// Whether a directory plausibly is a mod manager installation.
#[must_use]
pub fn looks_like_manager_root(path: &Path) -> bool {
    path.join("profiles").is_dir() || path.join("ModOrganizer.exe").exists()
}

/// Whether a directory plausibly is the configured game's installation.
#[must_use]
pub fn looks_like_game_root(config: &Config) -> bool {
    config.game_root.join(config.game.executable).exists()
}

/// Warn-level plausibility probes for the two source roots.
///
/// Missing markers are suspicious but not fatal — a stripped-down manager
/// layout can still be valid — so the result is a list of warnings, not an
/// error.
#[must_use]
pub fn plausibility_warnings(config: &Config) -> Vec<String> {
    let mut warnings = Vec::new();
    if !looks_like_manager_root(&config.manager_root) {
        warnings.push(format!(
            "{} does not look like a mod manager installation (no profiles/ or ModOrganizer.exe)",
            config.manager_root.display()
        ));
    }
    if !looks_like_game_root(config) {
        warnings.push(format!(
            "{} does not contain {}",
            config.game_root.display(),
            config.game.executable
        ));
    }
    warnings
}
