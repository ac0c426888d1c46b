//! Built-in table of supported games.
//!
//! Each entry carries the per-game knowledge the engine needs: the main
//! executable (used to detect the game from a root directory), the folder
//! names the game uses under Documents and AppData, the INI file prefix,
//! and the canonical save-file extensions.

use std::path::Path;

/// Static description of one supported game.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameProfile {
    /// Short identifier used in settings files (`game = "skyrimse"`).
    pub id: &'static str,
    /// Main executable name, probed for game-root detection.
    pub executable: &'static str,
    /// Folder name under `Documents/My Games/`.
    pub docs_name: &'static str,
    /// Folder name under `AppData/Local/`.
    pub appdata_name: &'static str,
    /// Prefix of the game's INI files (`Skyrim` → `Skyrim.ini`, …).
    pub ini_prefix: &'static str,
    /// Save-file extensions, main save first, co-saves after.
    pub save_exts: &'static [&'static str],
}

/// All supported games.
pub const GAMES: &[GameProfile] = &[
    GameProfile {
        id: "skyrimse",
        executable: "SkyrimSE.exe",
        docs_name: "Skyrim Special Edition",
        appdata_name: "Skyrim Special Edition",
        ini_prefix: "Skyrim",
        save_exts: &["ess", "skse"],
    },
    GameProfile {
        id: "skyrim",
        executable: "TESV.exe",
        docs_name: "Skyrim",
        appdata_name: "Skyrim",
        ini_prefix: "Skyrim",
        save_exts: &["ess", "skse"],
    },
    GameProfile {
        id: "skyrimvr",
        executable: "Skyrim.exe",
        docs_name: "Skyrim",
        appdata_name: "Skyrim",
        ini_prefix: "Skyrim",
        save_exts: &["ess", "skse"],
    },
    GameProfile {
        id: "enderalse",
        executable: "EnderalSE.exe",
        docs_name: "Enderal Special Edition",
        appdata_name: "Enderal Special Edition",
        ini_prefix: "Enderal",
        save_exts: &["ess", "skse"],
    },
    GameProfile {
        id: "fallout4",
        executable: "Fallout4.exe",
        docs_name: "Fallout4",
        appdata_name: "Fallout4",
        ini_prefix: "Fallout4",
        save_exts: &["fos", "f4se"],
    },
    GameProfile {
        id: "fallout3",
        executable: "Fallout3.exe",
        docs_name: "Fallout3",
        appdata_name: "Fallout3",
        ini_prefix: "Fallout3",
        save_exts: &["fos"],
    },
    GameProfile {
        id: "falloutnv",
        executable: "FalloutNV.exe",
        docs_name: "FalloutNV",
        appdata_name: "FalloutNV",
        ini_prefix: "FalloutNV",
        save_exts: &["fos", "nvse"],
    },
    GameProfile {
        id: "oblivion",
        executable: "Oblivion.exe",
        docs_name: "Oblivion",
        appdata_name: "Oblivion",
        ini_prefix: "Oblivion",
        save_exts: &["ess", "obse"],
    },
    GameProfile {
        id: "starfield",
        executable: "Starfield.exe",
        docs_name: "Starfield",
        appdata_name: "Starfield",
        ini_prefix: "Starfield",
        save_exts: &["sfs", "sfse"],
    },
];

/// Plugin-order files synchronized into the portable AppData directory.
pub const PLUGIN_FILES: &[&str] = &["plugins.txt", "loadorder.txt"];

/// Look up a game by its short id.
#[must_use]
pub fn lookup(id: &str) -> Option<&'static GameProfile> {
    GAMES.iter().find(|g| g.id == id)
}

/// Detect the game by probing `game_root` for a known main executable.
///
/// Probes in table order, so more specific executables (`SkyrimSE.exe`)
/// must precede ambiguous ones (`Skyrim.exe`) in [`GAMES`].
#[must_use]
pub fn detect(game_root: &Path) -> Option<&'static GameProfile> {
    GAMES.iter().find(|g| game_root.join(g.executable).exists())
}

/// Comma-separated list of all known ids, for error messages.
#[must_use]
pub fn known_ids() -> String {
    GAMES
        .iter()
        .map(|g| g.id)
        .collect::<Vec<_>>()
        .join(", ")
}

impl GameProfile {
    /// The game's three INI file names: base, prefs, and custom.
    #[must_use]
    pub fn ini_files(&self) -> [String; 3] {
        [
            format!("{}.ini", self.ini_prefix),
            format!("{}Prefs.ini", self.ini_prefix),
            format!("{}Custom.ini", self.ini_prefix),
        ]
    }

    /// Name of the custom INI, which carries the volatile `sLocalSavePath`.
    #[must_use]
    pub fn custom_ini(&self) -> String {
        format!("{}Custom.ini", self.ini_prefix)
    }

    /// Whether `name` has one of this game's save-file extensions.
    #[must_use]
    pub fn is_save_file(&self, name: &str) -> bool {
        Path::new(name)
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| {
                self.save_exts
                    .iter()
                    .any(|s| s.eq_ignore_ascii_case(ext))
            })
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn lookup_finds_known_id() {
        let game = lookup("skyrimse").expect("skyrimse should be known");
        assert_eq!(game.executable, "SkyrimSE.exe");
        assert_eq!(game.ini_prefix, "Skyrim");
    }

    #[test]
    fn lookup_rejects_unknown_id() {
        assert!(lookup("morrowind").is_none());
    }

    #[test]
    fn detect_probes_executable() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("Fallout4.exe"), b"mz").unwrap();
        let game = detect(tmp.path()).expect("should detect fallout4");
        assert_eq!(game.id, "fallout4");
    }

    #[test]
    fn detect_returns_none_for_empty_dir() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(detect(tmp.path()).is_none());
    }

    #[test]
    fn detect_prefers_special_edition_over_vr() {
        // A SkyrimSE install also detected as VR would pick the wrong docs
        // folder; table order must resolve the ambiguity.
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("SkyrimSE.exe"), b"mz").unwrap();
        std::fs::write(tmp.path().join("Skyrim.exe"), b"mz").unwrap();
        assert_eq!(detect(tmp.path()).unwrap().id, "skyrimse");
    }

    #[test]
    fn ini_files_use_prefix() {
        let game = lookup("fallout4").unwrap();
        assert_eq!(
            game.ini_files(),
            [
                "Fallout4.ini".to_string(),
                "Fallout4Prefs.ini".to_string(),
                "Fallout4Custom.ini".to_string()
            ]
        );
    }

    #[test]
    fn is_save_file_matches_case_insensitively() {
        let game = lookup("skyrimse").unwrap();
        assert!(game.is_save_file("quicksave.ess"));
        assert!(game.is_save_file("quicksave.ESS"));
        assert!(game.is_save_file("quicksave.skse"));
        assert!(!game.is_save_file("quicksave.fos"));
        assert!(!game.is_save_file("readme.txt"));
    }

    #[test]
    fn known_ids_lists_all_games() {
        let ids = known_ids();
        for game in GAMES {
            assert!(ids.contains(game.id), "missing id: {}", game.id);
        }
    }
}
