//! CLI argument parsing.

mod args;
mod clip;
mod validators;

pub use args::{Cli, Command, ConfigAction, GlobalArgs};
pub use clip::{ExtractArgs, FetchArgs, IngestArgs};
