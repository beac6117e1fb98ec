//! CLI for the clip-producing subcommands.

use std::path::PathBuf;

use clap::Args;

use super::validators::{parse_count, parse_length, parse_start};
use crate::catalog::VocalizationType;
use crate::sources::SpeciesTarget;

/// Arguments for the extract subcommand.
#[derive(Debug, Args)]
pub struct ExtractArgs {
    /// Source recording.
    pub input: PathBuf,

    /// Species code, e.g. NOCA.
    #[arg(short, long)]
    pub species: String,

    /// Segment start in seconds.
    #[arg(long, value_parser = parse_start)]
    pub start: f64,

    /// Segment length in seconds.
    #[arg(short, long)]
    pub duration: f64,

    /// Species common name (default: taken from existing catalog clips).
    #[arg(long)]
    pub common_name: Option<String>,

    /// Vocalization type.
    #[arg(long, default_value = "song")]
    pub vocalization_type: VocalizationType,

    /// Quality score (1-5).
    #[arg(long, default_value = "5", value_parser = clap::value_parser!(u8).range(1..=5))]
    pub quality: u8,

    /// Source name.
    #[arg(long, default_value = "local")]
    pub source: String,

    /// Identifier within the source, e.g. XC12345.
    #[arg(long)]
    pub source_id: Option<String>,

    /// Link to the source recording.
    #[arg(long)]
    pub source_url: Option<String>,

    /// Recordist.
    #[arg(long)]
    pub recordist: Option<String>,
}

/// Arguments for the ingest subcommand.
#[derive(Debug, Args)]
pub struct IngestArgs {
    /// CSV manifest of source recordings.
    pub manifest: PathBuf,

    /// Take several non-overlapping clips per recording.
    #[arg(long)]
    pub multi: bool,

    /// Window length in seconds for --multi (default from config).
    #[arg(long, requires = "multi", value_parser = parse_length)]
    pub window: Option<f64>,
}

/// Arguments for the fetch subcommand.
#[derive(Debug, Args)]
pub struct FetchArgs {
    /// Species to fetch, written "Common Name=CODE". Repeatable.
    #[arg(short, long, required = true)]
    pub species: Vec<SpeciesTarget>,

    /// Xeno-canto API key.
    #[arg(long, env = "XENO_CANTO_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Recordings to ingest per species (default from config).
    #[arg(long, value_parser = parse_count)]
    pub max_per_species: Option<usize>,

    /// Take several non-overlapping clips per recording.
    #[arg(long)]
    pub multi: bool,

    /// Window length in seconds for --multi (default from config).
    #[arg(long, requires = "multi", value_parser = parse_length)]
    pub window: Option<f64>,
}
