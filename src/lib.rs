//! `ChipNotes` - clip pipeline and catalog tooling for a bird-call game.
//!
//! Source recordings are cut into short clips, converted to mono 16-bit
//! WAV at 44.1 kHz, loudness normalized and recorded in a JSON catalog.

#![warn(missing_docs)]

pub mod audio;
pub mod catalog;
pub mod cli;
pub mod clipper;
pub mod config;
pub mod constants;
pub mod error;
pub mod locking;
pub mod output;
pub mod sources;
pub mod spectrogram;

use clap::Parser;
use cli::{Cli, Command, ConfigAction, GlobalArgs};
use config::{
    Config, ProjectLayout, config_file_path, load_config, project_config_path, save_config,
};
use std::path::PathBuf;
use tracing::{info, warn};

pub use error::{Error, Result};

/// Main entry point for the chipnotes CLI.
pub fn run() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.global.verbose, cli.global.quiet);

    // Install Ctrl+C handler to clean up lock files on interrupt
    if let Err(e) = ctrlc::set_handler(|| {
        locking::cleanup_all_locks();
        std::process::exit(130); // 128 + SIGINT(2)
    }) {
        warn!("Failed to install Ctrl+C handler: {e}");
    }

    handle_command(cli.command, &cli.global)
}

fn init_logging(verbose: u8, quiet: bool) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter_str = if quiet {
        "warn"
    } else {
        match verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter_str));

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Settings and paths shared by the catalog and clip commands.
struct Workspace {
    config: Config,
    layout: ProjectLayout,
    progress: bool,
}

impl Workspace {
    fn open(global: &GlobalArgs) -> Result<Self> {
        let path = project_config_path(global.config.as_deref(), &global.root);
        let mut config = load_config(path.as_deref())?;
        if global.no_spectrograms {
            config.pipeline.spectrograms = false;
        }
        let layout = ProjectLayout::new(&global.root, &config.paths, global.catalog.as_deref());
        Ok(Self {
            config,
            layout,
            progress: !global.quiet && !global.no_progress,
        })
    }
}

fn handle_command(command: Command, global: &GlobalArgs) -> Result<()> {
    if let Command::Config { action } = command {
        let path = project_config_path(global.config.as_deref(), &global.root);
        return handle_config_command(action, path);
    }

    let ws = Workspace::open(global)?;
    match command {
        Command::Extract(args) => {
            let clip = clipper::command::extract(&args, &ws.config, &ws.layout)?;
            println!("{}", clip.clip_id);
        }
        Command::Ingest(args) => {
            clipper::command::ingest(&args, &ws.config, &ws.layout, ws.progress)?;
        }
        Command::Fetch(args) => {
            clipper::command::fetch(&args, &ws.config, &ws.layout, ws.progress)?;
        }
        Command::Merge { candidates } => {
            catalog::command::merge(&candidates, &ws.layout)?;
        }
        Command::Review { changes } => {
            let outcome = catalog::command::review(&changes, &ws.layout)?;
            if !outcome.stats.unknown_ids.is_empty() {
                warn!(
                    "{} change(s) named unknown clips",
                    outcome.stats.unknown_ids.len()
                );
            }
            info!(
                "Removed {} rejected clip(s), deleted {} file(s)",
                outcome.removed, outcome.files_deleted
            );
        }
        Command::Validate { rewrite } => {
            catalog::command::validate(&ws.layout, rewrite)?;
        }
        Command::Config { .. } => {}
    }
    Ok(())
}

fn handle_config_command(action: ConfigAction, path: Option<PathBuf>) -> Result<()> {
    let path = match path {
        Some(path) => path,
        None => config_file_path()?,
    };

    match action {
        ConfigAction::Init => {
            if path.exists() {
                println!("Configuration file already exists: {}", path.display());
            } else {
                save_config(&Config::default(), &path)?;
                println!("Created configuration file: {}", path.display());
            }
            Ok(())
        }
        ConfigAction::Show => {
            let config = load_config(Some(&path))?;
            let text =
                toml::to_string_pretty(&config).map_err(|e| Error::ConfigSerialize { source: e })?;
            print!("{text}");
            Ok(())
        }
        ConfigAction::Path => {
            println!("{}", display_path(path).display());
            Ok(())
        }
    }
}

fn display_path(path: PathBuf) -> PathBuf {
    std::path::absolute(&path).unwrap_or(path)
}
