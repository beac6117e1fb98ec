//! Configuration loading and management.

mod file;
mod layout;
mod paths;
mod types;
mod validate;

pub use file::{load_config, load_config_file, load_default_config, save_config};
pub use layout::ProjectLayout;
pub use paths::{config_dir, config_file_path, project_config_path};
pub use types::{Config, PathsConfig, PipelineSettings, XenoCantoConfig};
pub use validate::{validate_config, validate_pipeline};
