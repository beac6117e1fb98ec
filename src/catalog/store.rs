//! Catalog persistence.

use super::clips::ensure_not_shrunk;
use super::{Catalog, ClipMetadata};
use crate::constants::CATALOG_BACKUP_SUFFIX;
use crate::error::{Error, Result};
use crate::locking::FileLock;
use crate::output::write_atomic;
use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Outcome of merging candidates into the stored catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergeReport {
    /// Records before the merge.
    pub before: usize,
    /// Records appended.
    pub added: usize,
    /// Records after the merge.
    pub after: usize,
}

/// Reads and writes the catalog JSON file.
#[derive(Debug, Clone)]
pub struct CatalogStore {
    path: PathBuf,
}

impl CatalogStore {
    /// Store backed by the file at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Catalog file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path of the copy taken before each save.
    pub fn backup_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_os_string();
        name.push(CATALOG_BACKUP_SUFFIX);
        PathBuf::from(name)
    }

    /// Take the exclusive writer lock.
    pub fn lock(&self) -> Result<FileLock> {
        FileLock::acquire(&self.path)
    }

    /// Load the catalog. A missing file is an empty catalog.
    pub fn load(&self) -> Result<Catalog> {
        if !self.path.exists() {
            debug!("No catalog at {}, starting empty", self.path.display());
            return Ok(Catalog::default());
        }
        Ok(Catalog::new(load_clip_file(&self.path)?))
    }

    /// Validate and atomically rewrite the catalog.
    ///
    /// The previous file is copied to the backup path first. Nothing is
    /// written if validation fails.
    pub fn save(&self, catalog: &Catalog) -> Result<()> {
        catalog.validate()?;

        if self.path.exists() {
            fs::copy(&self.path, self.backup_path()).map_err(|e| Error::CatalogWrite {
                path: self.backup_path(),
                source: e,
            })?;
        }

        write_atomic(&self.path, |file| {
            let mut writer = BufWriter::new(file);
            serde_json::to_writer_pretty(&mut writer, catalog.clips())
                .map_err(|e| Error::CatalogWrite {
                    path: self.path.clone(),
                    source: e.into(),
                })?;
            writer
                .write_all(b"\n")
                .and_then(|()| writer.flush())
                .map_err(|e| Error::CatalogWrite {
                    path: self.path.clone(),
                    source: e,
                })
        })?;

        info!(
            "Saved {} clips to {}",
            catalog.len(),
            self.path.display()
        );
        Ok(())
    }

    /// Append candidates to the stored catalog and save.
    ///
    /// Fails without touching the file on duplicate identifiers, invariant
    /// violations, or if the result would hold fewer records than the file.
    pub fn merge(&self, candidates: Vec<ClipMetadata>) -> Result<MergeReport> {
        let mut catalog = self.load()?;
        let before = catalog.len();
        let added = catalog.merge(candidates)?;
        let after = catalog.len();
        ensure_not_shrunk(before, after)?;
        self.save(&catalog)?;
        Ok(MergeReport {
            before,
            added,
            after,
        })
    }
}

/// Read a JSON array of clip records (a catalog or a candidate manifest).
pub fn load_clip_file(path: &Path) -> Result<Vec<ClipMetadata>> {
    let content = fs::read_to_string(path).map_err(|e| Error::CatalogRead {
        path: path.to_path_buf(),
        source: e,
    })?;
    // Tolerate a UTF-8 BOM from spreadsheet exports.
    let content = content.strip_prefix('\u{feff}').unwrap_or(&content);
    serde_json::from_str(content).map_err(|e| Error::CatalogParse {
        path: path.to_path_buf(),
        source: e,
    })
}
