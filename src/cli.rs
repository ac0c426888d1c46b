//! Command-line argument definitions.

use clap::{Parser, Subcommand, ValueEnum};

use crate::decisions::{ConflictResolution, LinkFallback};
use crate::deploy::clone::CloneMode;
use crate::sync::SyncDirection;

/// Top-level CLI entry point for the mod overlay engine.
#[derive(Parser, Debug)]
#[command(
    name = "modlink",
    about = "Materializes mod-manager profiles into standalone game installs",
    version
)]
pub struct Cli {
    /// The selected subcommand.
    #[command(subcommand)]
    pub command: Command,

    /// Increase output verbosity
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Options shared across all subcommands.
    #[command(flatten)]
    pub global: GlobalOpts,
}

/// Options shared across all subcommands.
#[derive(Parser, Debug, Clone)]
pub struct GlobalOpts {
    /// Settings file to use instead of modlink.toml beside the binary
    #[arg(long, global = true)]
    pub config: Option<std::path::PathBuf>,

    /// Mod manager installation directory
    #[arg(long, global = true)]
    pub manager_root: Option<std::path::PathBuf>,

    /// Vanilla game installation directory
    #[arg(long, global = true)]
    pub game_root: Option<std::path::PathBuf>,

    /// Standalone tree to materialize
    #[arg(long, global = true)]
    pub target_root: Option<std::path::PathBuf>,

    /// Profile name under the manager's profiles directory
    #[arg(short, long, global = true)]
    pub profile: Option<String>,

    /// Preview changes without applying
    #[arg(short = 'd', long, global = true)]
    pub dry_run: bool,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Build and persist the mapping manifest
    Scan,
    /// Deploy the persisted manifest into the target tree
    Deploy(DeployOpts),
    /// Run the full build pipeline
    Build(BuildOpts),
    /// Verify the target tree against the persisted manifest
    Verify,
    /// Synchronize save files between profile and target
    Sync(SyncOpts),
    /// Restore the target tree to pristine
    Clean(CleanOpts),
    /// Summarize the persisted execution report and manifest
    Report,
    /// Print version information
    Version,
}

/// Options for the `deploy` subcommand.
#[derive(Parser, Debug, Clone)]
pub struct DeployOpts {
    /// Bulk-clone the vanilla game tree first, in this mode
    #[arg(long, value_enum)]
    pub clone: Option<CloneModeArg>,

    /// Delete target files the manifest no longer claims
    #[arg(long)]
    pub reclaim: bool,

    /// Preset answer for hardlink failures during the clone
    #[arg(long, value_enum)]
    pub on_link_failure: Option<LinkFailureArg>,
}

/// Options for the `build` subcommand.
#[derive(Parser, Debug, Clone)]
pub struct BuildOpts {
    /// Skip tasks whose name contains any of these substrings
    #[arg(long, value_delimiter = ',')]
    pub skip: Vec<String>,

    /// Run only tasks whose name contains any of these substrings
    #[arg(long, value_delimiter = ',')]
    pub only: Vec<String>,

    /// Bulk-clone the vanilla game tree first, in this mode
    #[arg(long, value_enum)]
    pub clone: Option<CloneModeArg>,

    /// Delete target files the manifest no longer claims
    #[arg(long)]
    pub reclaim: bool,

    /// Import profile saves after deployment
    #[arg(long)]
    pub sync_saves: bool,

    /// Preset answer for hardlink failures during the clone
    #[arg(long, value_enum)]
    pub on_link_failure: Option<LinkFailureArg>,

    /// Preset answer for save conflicts during the import
    #[arg(long, value_enum)]
    pub on_save_conflict: Option<SaveConflictArg>,
}

/// Options for the `sync` subcommand.
#[derive(Parser, Debug, Clone)]
pub struct SyncOpts {
    /// Which way the saves flow
    #[arg(long, value_enum)]
    pub direction: DirectionArg,

    /// Preset answer for save conflicts
    #[arg(long, value_enum)]
    pub on_save_conflict: Option<SaveConflictArg>,
}

/// Options for the `clean` subcommand.
#[derive(Parser, Debug, Clone)]
pub struct CleanOpts {
    /// Export saves back to the owning profile instead of refusing
    #[arg(long)]
    pub keep_saves: bool,
}

/// CLI spelling of the bulk clone mode.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloneModeArg {
    /// Hardlink each vanilla file.
    Hardlink,
    /// Byte-copy each vanilla file.
    Copy,
}

impl From<CloneModeArg> for CloneMode {
    fn from(arg: CloneModeArg) -> Self {
        match arg {
            CloneModeArg::Hardlink => Self::Hardlink,
            CloneModeArg::Copy => Self::Copy,
        }
    }
}

/// CLI spelling of the hardlink-failure recovery choice.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkFailureArg {
    /// Fall back to a byte copy.
    Copy,
    /// Leave the file undeployed.
    Skip,
    /// Stop the run.
    Abort,
}

impl From<LinkFailureArg> for LinkFallback {
    fn from(arg: LinkFailureArg) -> Self {
        match arg {
            LinkFailureArg::Copy => Self::Copy,
            LinkFailureArg::Skip => Self::Skip,
            LinkFailureArg::Abort => Self::Abort,
        }
    }
}

/// CLI spelling of the save-conflict resolution.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveConflictArg {
    /// Replace the destination copies.
    Overwrite,
    /// Divert the incoming copies into a timestamped folder.
    Quarantine,
    /// Stop the run.
    Abort,
}

impl From<SaveConflictArg> for ConflictResolution {
    fn from(arg: SaveConflictArg) -> Self {
        match arg {
            SaveConflictArg::Overwrite => Self::Overwrite,
            SaveConflictArg::Quarantine => Self::Quarantine,
            SaveConflictArg::Abort => Self::Abort,
        }
    }
}

/// CLI spelling of the sync direction.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectionArg {
    /// Profile saves into the portable profile.
    Import,
    /// Portable saves back into the profile.
    Export,
}

impl From<DirectionArg> for SyncDirection {
    fn from(arg: DirectionArg) -> Self {
        match arg {
            DirectionArg::Import => Self::Import,
            DirectionArg::Export => Self::Export,
        }
    }
}
