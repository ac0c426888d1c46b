//! Mod overlay build engine.
//!
//! Materializes a mod manager's virtual file system into a standalone game
//! install: scans priority-ordered mod directories into a deterministic
//! manifest, deploys it with hardlinks (copy fallback), reclaims orphaned
//! files from earlier builds, verifies the result, and keeps saves and
//! configuration in sync with the owning profile.
//!
//! The public API is organised into layers:
//!
//! - **[`config`]** — settings file, game profiles, and path layout
//! - **[`scan`]**, **[`manifest`]** — activation-ordered source scan and the persisted mapping table
//! - **[`deploy`]**, **[`verify`]**, **[`sync`]** — filesystem primitives for building and checking a target
//! - **[`tasks`]** — named pipeline units wired to those primitives
//! - **[`commands`]** — top-level subcommand orchestration
#![deny(clippy::or_fun_call)]
#![deny(clippy::bool_to_int_with_if)]

pub mod cli;
pub mod commands;
pub mod config;
pub mod decisions;
pub mod deploy;
pub mod error;
pub mod logging;
pub mod manifest;
pub mod metadata;
pub mod quarantine;
pub mod report;
pub mod safety;
pub mod scan;
pub mod sync;
pub mod tasks;
pub mod verify;
