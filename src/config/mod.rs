//! Explicit, immutable run configuration.
//!
//! A TOML settings file (`modlink.toml`, beside the binary or given via
//! `--config`) supplies the three directory anchors, the profile name, the
//! game id, and optional deny-list overrides. CLI flags override file values.
//! The loaded [`Config`] is validated once and passed by reference; nothing
//! reads ambient environment state at operation time.

pub mod game;
pub mod paths;

use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};
use serde::Deserialize;

use crate::cli::GlobalOpts;
use crate::error::EngineError;
use game::GameProfile;
use paths::PortablePaths;

/// Name of the settings file probed beside the binary.
pub const SETTINGS_FILE: &str = "modlink.toml";

/// Name of the engine state directory under the target root.
pub const STATE_DIR_NAME: &str = ".modlink";

/// Raw shape of the settings file. All fields optional so CLI flags can
/// fill the gaps; [`Config::load`] validates the merged result.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct Settings {
    manager_root: Option<PathBuf>,
    game_root: Option<PathBuf>,
    target_root: Option<PathBuf>,
    profile: Option<String>,
    game: Option<String>,
    #[serde(default)]
    excludes: ExcludeOverrides,
}

/// Optional deny-list overrides from the settings file.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ExcludeOverrides {
    files: Option<Vec<String>>,
    extensions: Option<Vec<String>>,
    directories: Option<Vec<String>>,
}

/// Deny lists applied during manifest building.
///
/// Matching is case-insensitive. Extensions include the leading dot.
#[derive(Debug, Clone)]
pub struct Excludes {
    /// Exact file names never deployed.
    pub files: Vec<String>,
    /// File extensions never deployed.
    pub extensions: Vec<String>,
    /// Directory names pruned from the walk.
    pub directories: Vec<String>,
}

impl Default for Excludes {
    fn default() -> Self {
        Self {
            files: [
                "meta.ini",
                "mo2_separator.txt",
                "thumbs.db",
                "desktop.ini",
                "readme.txt",
                "credits.txt",
                "changelog.txt",
                "license.txt",
                "readme.md",
                "credits.md",
                "changelog.md",
            ]
            .map(String::from)
            .to_vec(),
            extensions: [".pdf", ".docx", ".xlsx", ".pptx", ".doc", ".xls", ".ppt"]
                .map(String::from)
                .to_vec(),
            directories: [
                ".hidden",
                "fomod",
                "readmes",
                "readme",
                "docs",
                "documents",
                "credits",
                "changelog",
                "licenses",
            ]
            .map(String::from)
            .to_vec(),
        }
    }
}

impl Excludes {
    /// Whether a file with this name should be skipped.
    #[must_use]
    pub fn skips_file(&self, name: &str) -> bool {
        if self.files.iter().any(|f| f.eq_ignore_ascii_case(name)) {
            return true;
        }
        Path::new(name)
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| {
                self.extensions
                    .iter()
                    .any(|e| e.trim_start_matches('.').eq_ignore_ascii_case(ext))
            })
    }

    /// Whether a directory with this name should be pruned.
    #[must_use]
    pub fn skips_dir(&self, name: &str) -> bool {
        self.directories.iter().any(|d| d.eq_ignore_ascii_case(name))
    }
}

/// Validated, immutable configuration for one run.
#[derive(Debug, Clone)]
pub struct Config {
    /// Mod manager installation (holds `mods/`, `profiles/`, `overwrite/`).
    pub manager_root: PathBuf,
    /// Vanilla game installation.
    pub game_root: PathBuf,
    /// Standalone tree to materialize.
    pub target_root: PathBuf,
    /// Profile name under `<manager>/profiles/`.
    pub profile: String,
    /// The resolved game profile.
    pub game: &'static GameProfile,
    /// Deny lists for the manifest builder.
    pub excludes: Excludes,
}

impl Config {
    /// Load the settings file, apply CLI overrides, and validate.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidSettings`] when a required root is
    /// absent, and [`EngineError::UnknownGame`] when the configured game id
    /// is not in the built-in table.
    pub fn load(global: &GlobalOpts) -> Result<Self> {
        let settings = match settings_path(global) {
            Some(path) => read_settings(&path)?,
            None => Settings::default(),
        };

        let manager_root = global
            .manager_root
            .clone()
            .or(settings.manager_root)
            .ok_or_else(|| EngineError::InvalidSettings {
                reason: "manager_root is required (settings file or --manager-root)".to_string(),
            })?;
        let game_root = global
            .game_root
            .clone()
            .or(settings.game_root)
            .ok_or_else(|| EngineError::InvalidSettings {
                reason: "game_root is required (settings file or --game-root)".to_string(),
            })?;
        let target_root = global
            .target_root
            .clone()
            .or(settings.target_root)
            .ok_or_else(|| EngineError::InvalidSettings {
                reason: "target_root is required (settings file or --target-root)".to_string(),
            })?;
        let profile = global
            .profile
            .clone()
            .or(settings.profile)
            .unwrap_or_else(|| "Default".to_string());

        let game = match settings.game.as_deref() {
            Some(id) => game::lookup(id).ok_or_else(|| EngineError::UnknownGame {
                id: id.to_string(),
                known: game::known_ids(),
            })?,
            None => game::detect(&game_root).ok_or_else(|| EngineError::InvalidSettings {
                reason: format!(
                    "no known game executable found in {} (set `game` explicitly)",
                    game_root.display()
                ),
            })?,
        };

        let defaults = Excludes::default();
        let excludes = Excludes {
            files: settings.excludes.files.unwrap_or(defaults.files),
            extensions: settings.excludes.extensions.unwrap_or(defaults.extensions),
            directories: settings
                .excludes
                .directories
                .unwrap_or(defaults.directories),
        };

        Ok(Self {
            manager_root,
            game_root,
            target_root,
            profile,
            game,
            excludes,
        })
    }

    /// `<manager>/profiles/<profile>`.
    #[must_use]
    pub fn profile_dir(&self) -> PathBuf {
        self.manager_root.join("profiles").join(&self.profile)
    }

    /// `<manager>/mods`.
    #[must_use]
    pub fn mods_dir(&self) -> PathBuf {
        self.manager_root.join("mods")
    }

    /// `<manager>/overwrite` — the always-highest-priority overlay root.
    #[must_use]
    pub fn overlay_dir(&self) -> PathBuf {
        self.manager_root.join("overwrite")
    }

    /// The profile's activation list (`modlist.txt`).
    #[must_use]
    pub fn activation_list_path(&self) -> PathBuf {
        self.profile_dir().join("modlist.txt")
    }

    /// `<target>/.modlink` — all engine state persists here.
    #[must_use]
    pub fn state_dir(&self) -> PathBuf {
        self.target_root.join(STATE_DIR_NAME)
    }

    /// Location of the persisted mapping manifest.
    #[must_use]
    pub fn manifest_path(&self) -> PathBuf {
        self.state_dir().join("mapping_manifest.json")
    }

    /// Location of the persisted execution report.
    #[must_use]
    pub fn report_path(&self) -> PathBuf {
        self.state_dir().join("execution_report.json")
    }

    /// Location of the persisted build metadata.
    #[must_use]
    pub fn metadata_path(&self) -> PathBuf {
        self.state_dir().join("build_metadata.json")
    }

    /// `<target>/.modlink/backups` — one-time portable-config backup.
    #[must_use]
    pub fn backups_dir(&self) -> PathBuf {
        self.state_dir().join("backups")
    }

    /// The portable profile layout for this target and game.
    #[must_use]
    pub fn portable(&self) -> PortablePaths {
        PortablePaths::new(&self.target_root, self.game)
    }
}

/// Resolve the settings file location: `--config`, else `modlink.toml`
/// beside the binary if it exists.
fn settings_path(global: &GlobalOpts) -> Option<PathBuf> {
    if let Some(path) = &global.config {
        return Some(path.clone());
    }
    let beside_exe = std::env::current_exe()
        .ok()?
        .parent()?
        .join(SETTINGS_FILE);
    beside_exe.exists().then_some(beside_exe)
}

fn read_settings(path: &Path) -> Result<Settings> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading settings file {}", path.display()))?;
    toml::from_str(&content)
        .with_context(|| format!("parsing settings file {}", path.display()))
}
