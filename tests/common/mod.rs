// Shared helpers for integration tests.
//
// Provides a temporary-directory-backed manager/game/target layout and a
// fluent builder so each integration test can set up an isolated environment
// without repeating filesystem boilerplate.
//
// Used by all integration test binaries that declare `mod common;`.
#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use modlink::cli::GlobalOpts;
use modlink::config::Config;
use modlink::decisions::PresetDecisions;
use modlink::logging::{Log, Logger};
use modlink::tasks::Context;

/// Timestamp used for every fixture run, `YYYYMMDD_HHMM`.
pub const RUN_TIMESTAMP: &str = "20260827_1430";

/// Write the minimal layout required by the engine into `root`.
///
/// Creates:
/// - `manager/mods/`                — unit directories land here
/// - `manager/profiles/Default/modlist.txt` — empty activation list
/// - `manager/overwrite/`           — highest-priority overlay root
/// - `game/SkyrimSE.exe`            — game detection marker
/// - `game/Data/Skyrim.esm`         — one vanilla asset for clone tests
/// - `target/`                      — empty standalone tree
/// - `modlink.toml`                 — settings wiring the three roots
pub fn setup_minimal_install(root: &Path) {
    let profile_dir = root.join("manager/profiles/Default");
    std::fs::create_dir_all(&profile_dir).expect("create profile dir");
    std::fs::create_dir_all(root.join("manager/mods")).expect("create mods dir");
    std::fs::create_dir_all(root.join("manager/overwrite")).expect("create overlay dir");
    std::fs::write(profile_dir.join("modlist.txt"), "").expect("write modlist");

    let game = root.join("game");
    std::fs::create_dir_all(game.join("Data")).expect("create game data dir");
    std::fs::write(game.join("SkyrimSE.exe"), b"MZvanilla").expect("write game exe");
    std::fs::write(game.join("Data/Skyrim.esm"), b"vanilla master").expect("write vanilla esm");

    std::fs::create_dir_all(root.join("target")).expect("create target dir");

    std::fs::write(
        root.join("modlink.toml"),
        format!(
            "manager_root = \"{}\"\ngame_root = \"{}\"\ntarget_root = \"{}\"\nprofile = \"Default\"\ngame = \"skyrimse\"\n",
            root.join("manager").display(),
            game.display(),
            root.join("target").display(),
        ),
    )
    .expect("write settings file");
}

/// An isolated manager/game/target layout backed by a [`tempfile::TempDir`].
///
/// The directory is automatically deleted when dropped.
pub struct IntegrationTestContext {
    /// Temporary directory containing the whole layout.
    pub root: tempfile::TempDir,
}

impl IntegrationTestContext {
    /// Create a new context with a minimal but valid layout.
    pub fn new() -> Self {
        let root = tempfile::tempdir().expect("create temp dir");
        setup_minimal_install(root.path());
        Self { root }
    }

    /// Path to the layout root.
    pub fn root_path(&self) -> &Path {
        self.root.path()
    }

    /// Path to the manager root.
    pub fn manager_root(&self) -> PathBuf {
        self.root.path().join("manager")
    }

    /// Path to the vanilla game root.
    pub fn game_root(&self) -> PathBuf {
        self.root.path().join("game")
    }

    /// Path to the standalone target root.
    pub fn target_root(&self) -> PathBuf {
        self.root.path().join("target")
    }

    /// Load configuration through the real settings loader.
    pub fn load_config(&self) -> Config {
        let global = GlobalOpts {
            config: Some(self.root.path().join("modlink.toml")),
            manager_root: None,
            game_root: None,
            target_root: None,
            profile: None,
            dry_run: false,
        };
        Config::load(&global).expect("load config")
    }

    /// Build a task [`Context`] with preset decisions and a fixed timestamp.
    pub fn task_context(&self, log: &Arc<Logger>, dry_run: bool) -> Context {
        Context {
            config: self.load_config(),
            log: Arc::clone(log) as Arc<dyn Log>,
            decisions: Arc::new(PresetDecisions::default()),
            dry_run,
            run_timestamp: RUN_TIMESTAMP.to_string(),
        }
    }
}

/// Fluent builder for [`IntegrationTestContext`].
///
/// Mods are added in ascending priority; the activation list is written
/// highest-priority-first when the context is finalised, matching the
/// on-disk format of a real profile.
pub struct TestContextBuilder {
    ctx: IntegrationTestContext,
    activation: Vec<String>,
}

impl TestContextBuilder {
    /// Begin building a new context backed by a minimal layout.
    pub fn new() -> Self {
        Self {
            ctx: IntegrationTestContext::new(),
            activation: Vec::new(),
        }
    }

    /// Create an activated unit under `mods/<name>` with the given files.
    ///
    /// Units added later win conflicts against units added earlier.
    pub fn with_mod(mut self, name: &str, files: &[(&str, &str)]) -> Self {
        let unit_root = self.ctx.manager_root().join("mods").join(name);
        std::fs::create_dir_all(&unit_root).expect("create unit dir");
        for (rel, content) in files {
            write_file(&unit_root.join(rel), content);
        }
        self.activation.push(format!("+{name}"));
        self
    }

    /// Create a unit that exists on disk but is disabled in the activation list.
    pub fn with_disabled_mod(mut self, name: &str, files: &[(&str, &str)]) -> Self {
        let unit_root = self.ctx.manager_root().join("mods").join(name);
        std::fs::create_dir_all(&unit_root).expect("create unit dir");
        for (rel, content) in files {
            write_file(&unit_root.join(rel), content);
        }
        self.activation.push(format!("-{name}"));
        self
    }

    /// Write a file into the overlay root (`overwrite/`).
    pub fn with_overlay_file(self, rel: &str, content: &str) -> Self {
        write_file(&self.ctx.manager_root().join("overwrite").join(rel), content);
        self
    }

    /// Write a file into the vanilla game root.
    pub fn with_game_file(self, rel: &str, content: &str) -> Self {
        write_file(&self.ctx.game_root().join(rel), content);
        self
    }

    /// Write a file into the profile directory (`profiles/Default/`).
    pub fn with_profile_file(self, rel: &str, content: &str) -> Self {
        write_file(
            &self.ctx.manager_root().join("profiles/Default").join(rel),
            content,
        );
        self
    }

    /// Write a file directly into the target tree.
    pub fn with_target_file(self, rel: &str, content: &str) -> Self {
        write_file(&self.ctx.target_root().join(rel), content);
        self
    }

    /// Finish building: write the activation list and return the context.
    pub fn build(self) -> IntegrationTestContext {
        let modlist: Vec<&str> = self.activation.iter().rev().map(String::as_str).collect();
        std::fs::write(
            self.ctx
                .manager_root()
                .join("profiles/Default/modlist.txt"),
            modlist.join("\n"),
        )
        .expect("write modlist");
        self.ctx
    }
}

fn write_file(path: &Path, content: &str) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("create parent dir");
    }
    std::fs::write(path, content).expect("write file");
}
