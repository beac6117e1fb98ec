//! Where configuration files are looked up.

use crate::constants::{APP_NAME, CONFIG_FILE_NAME, PROJECT_CONFIG_FILE};
use crate::error::{Error, Result};
use directories::ProjectDirs;
use std::path::{Path, PathBuf};

/// Platform configuration directory (`~/.config/chipnotes` on Linux).
pub fn config_dir() -> Result<PathBuf> {
    ProjectDirs::from("", "", APP_NAME)
        .map(|dirs| dirs.config_dir().to_path_buf())
        .ok_or(Error::ConfigDirNotFound)
}

/// Platform configuration file.
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Configuration file that overrides the platform one for a project.
///
/// An explicit path always wins; otherwise `chipnotes.toml` in the project
/// root is used if present. `None` means the platform file applies.
pub fn project_config_path(explicit: Option<&Path>, root: &Path) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    let local = root.join(PROJECT_CONFIG_FILE);
    local.is_file().then_some(local)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn platform_file_lives_under_app_dir() {
        let path = config_file_path().unwrap();
        assert!(path.ends_with(CONFIG_FILE_NAME));
        assert!(path.to_string_lossy().contains(APP_NAME));
    }

    #[test]
    fn explicit_path_wins() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(PROJECT_CONFIG_FILE), "").unwrap();
        let explicit = Path::new("/etc/other.toml");
        assert_eq!(
            project_config_path(Some(explicit), dir.path()),
            Some(explicit.to_path_buf())
        );
    }

    #[test]
    fn project_file_used_only_when_present() {
        let dir = TempDir::new().unwrap();
        assert_eq!(project_config_path(None, dir.path()), None);

        std::fs::write(dir.path().join(PROJECT_CONFIG_FILE), "").unwrap();
        assert_eq!(
            project_config_path(None, dir.path()),
            Some(dir.path().join(PROJECT_CONFIG_FILE))
        );
    }
}
