//! CLI argument definitions.

use super::clip::{ExtractArgs, FetchArgs, IngestArgs};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Clip extraction, loudness normalization and catalog tooling for `ChipNotes`.
#[derive(Debug, Parser)]
#[command(name = "chipnotes")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Command,

    /// Options shared by every subcommand.
    #[command(flatten)]
    pub global: GlobalArgs,
}

/// Options shared by every subcommand.
#[derive(Debug, Args)]
#[allow(clippy::struct_excessive_bools)]
pub struct GlobalArgs {
    /// Project root that clip and catalog paths are relative to.
    #[arg(long, global = true, env = "CHIPNOTES_ROOT", default_value = ".")]
    pub root: PathBuf,

    /// Catalog file (default: `<root>/data/clips.json`).
    #[arg(long, global = true, env = "CHIPNOTES_CATALOG")]
    pub catalog: Option<PathBuf>,

    /// Configuration file (default: platform config directory).
    #[arg(long, global = true, env = "CHIPNOTES_CONFIG")]
    pub config: Option<PathBuf>,

    /// Suppress progress output.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Increase verbosity (-v: debug, -vv: trace).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Hide progress bars.
    #[arg(long, global = true)]
    pub no_progress: bool,

    /// Do not render spectrograms.
    #[arg(long, global = true)]
    pub no_spectrograms: bool,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Cut one chosen segment from a recording into the catalog.
    Extract(ExtractArgs),
    /// Process every recording listed in a CSV manifest.
    Ingest(IngestArgs),
    /// Download recordings from Xeno-canto and ingest them.
    Fetch(FetchArgs),
    /// Append a candidate clip manifest to the catalog.
    Merge {
        /// JSON array of clip records.
        candidates: PathBuf,
    },
    /// Apply curation edits and remove rejected clips.
    Review {
        /// JSON change set (`{"modified": {...}}`).
        changes: PathBuf,
    },
    /// Check catalog invariants and referenced files.
    Validate {
        /// Rewrite the catalog with current field names.
        #[arg(long)]
        rewrite: bool,
    },
    /// Manage configuration.
    Config {
        /// Configuration action to perform.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommand actions.
#[derive(Debug, Clone, Copy, Subcommand)]
pub enum ConfigAction {
    /// Create default configuration file.
    Init,
    /// Display current configuration.
    Show,
    /// Print configuration file path.
    Path,
}
