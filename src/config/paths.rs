//! Portable profile layout under the target tree.
//!
//! A materialized target carries its own profile data under
//! `<target>/_profile/` so the launched game never touches the real user
//! profile. The layout mirrors the paths the game would otherwise use:
//! `Documents/My Games/<docs name>/` for INIs and saves, and
//! `AppData/Local/<appdata name>/` for plugin-order files. This struct is
//! computed once from the loaded configuration and passed explicitly;
//! nothing reads process environment state at operation time.

use std::path::{Path, PathBuf};

use super::game::GameProfile;

/// Directory name of the portable profile under the target root.
pub const PROFILE_DIR_NAME: &str = "_profile";

/// Resolved portable-profile directories for one target tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortablePaths {
    /// `<target>/_profile/Documents/My Games/<docs name>` — INIs and saves.
    pub docs_dir: PathBuf,
    /// `<target>/_profile/AppData/Local/<appdata name>` — plugin-order files.
    pub appdata_dir: PathBuf,
}

impl PortablePaths {
    /// Compute the layout for `target_root` and `game`.
    #[must_use]
    pub fn new(target_root: &Path, game: &GameProfile) -> Self {
        let profile = target_root.join(PROFILE_DIR_NAME);
        Self {
            docs_dir: profile
                .join("Documents")
                .join("My Games")
                .join(game.docs_name),
            appdata_dir: profile.join("AppData").join("Local").join(game.appdata_name),
        }
    }

    /// The save directory under the portable documents directory.
    #[must_use]
    pub fn save_dir(&self) -> PathBuf {
        find_save_dir(&self.docs_dir)
    }
}

/// Locate the save directory under `root`, case-insensitively.
///
/// Games and mod managers disagree on `Saves` vs `saves`; whichever exists
/// wins, defaulting to `saves` when neither does.
#[must_use]
pub fn find_save_dir(root: &Path) -> PathBuf {
    if let Ok(entries) = std::fs::read_dir(root) {
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir()
                && entry
                    .file_name()
                    .to_str()
                    .is_some_and(|n| n.eq_ignore_ascii_case("saves"))
            {
                return path;
            }
        }
    }
    root.join("saves")
}
