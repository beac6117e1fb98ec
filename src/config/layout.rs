//! Where clips, spectrograms and the catalog live inside a project.

use crate::config::PathsConfig;
use crate::constants::layout::{CLIP_EXTENSION, SPECTROGRAM_EXTENSION};
use std::path::{Path, PathBuf};

/// Resolved project layout.
///
/// Catalog records store paths relative to the project root with forward
/// slashes, e.g. `data/clips/NOCA_1.wav`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectLayout {
    root: PathBuf,
    clips_dir: PathBuf,
    spectrograms_dir: PathBuf,
    catalog: PathBuf,
}

impl ProjectLayout {
    /// Layout rooted at `root`. An explicit catalog path overrides the
    /// configured one and is used as given.
    pub fn new(root: &Path, paths: &PathsConfig, catalog_override: Option<&Path>) -> Self {
        Self {
            root: root.to_path_buf(),
            clips_dir: paths.clips_dir.clone(),
            spectrograms_dir: paths.spectrograms_dir.clone(),
            catalog: catalog_override.map_or_else(|| root.join(&paths.catalog), Path::to_path_buf),
        }
    }

    /// Project root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Catalog file.
    pub fn catalog_path(&self) -> &Path {
        &self.catalog
    }

    /// Catalog-relative path of a clip's audio.
    pub fn clip_file(&self, clip_id: &str) -> String {
        relative(&self.clips_dir, clip_id, CLIP_EXTENSION)
    }

    /// Catalog-relative path of a clip's spectrogram.
    pub fn spectrogram_file(&self, clip_id: &str) -> String {
        relative(&self.spectrograms_dir, clip_id, SPECTROGRAM_EXTENSION)
    }

    /// Absolute location of a catalog-relative path.
    pub fn resolve(&self, relative: &str) -> PathBuf {
        self.root.join(relative)
    }
}

fn relative(dir: &Path, clip_id: &str, extension: &str) -> String {
    let dir = dir.to_string_lossy().replace('\\', "/");
    let dir = dir.trim_end_matches('/');
    if dir.is_empty() {
        format!("{clip_id}.{extension}")
    } else {
        format!("{dir}/{clip_id}.{extension}")
    }
}
