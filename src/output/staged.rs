//! Write-then-rename file output.
//!
//! Content is written to a temporary file in the destination directory and
//! only becomes visible under its final name on [`StagedFile::commit`]. A
//! staged file that is dropped without committing is deleted.

use crate::error::{Error, Result};
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// A fully written file waiting to be moved into place.
#[derive(Debug)]
pub struct StagedFile {
    temp: NamedTempFile,
    destination: PathBuf,
}

impl StagedFile {
    /// Write a temporary file next to `destination` using `write`.
    pub fn stage<F>(destination: &Path, write: F) -> Result<Self>
    where
        F: FnOnce(&mut File) -> Result<()>,
    {
        let dir = destination
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(dir).map_err(|e| Error::OutputDirCreateFailed {
            path: dir.to_path_buf(),
            source: e,
        })?;

        let mut temp = NamedTempFile::new_in(dir).map_err(|e| Error::Persist {
            path: destination.to_path_buf(),
            source: e,
        })?;
        write(temp.as_file_mut())?;
        temp.as_file().sync_all().map_err(|e| Error::Persist {
            path: destination.to_path_buf(),
            source: e,
        })?;

        Ok(Self {
            temp,
            destination: destination.to_path_buf(),
        })
    }

    /// Final path of the file.
    pub fn destination(&self) -> &Path {
        &self.destination
    }

    /// Atomically rename the temporary file to its destination.
    pub fn commit(self) -> Result<PathBuf> {
        self.temp
            .persist(&self.destination)
            .map_err(|e| Error::Persist {
                path: self.destination.clone(),
                source: e.error,
            })?;
        Ok(self.destination)
    }
}

/// Write a whole file atomically.
pub fn write_atomic<F>(destination: &Path, write: F) -> Result<PathBuf>
where
    F: FnOnce(&mut File) -> Result<()>,
{
    StagedFile::stage(destination, write)?.commit()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn commit_moves_file_into_place() {
        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("nested/out.txt");

        let staged = StagedFile::stage(&dest, |f| Ok(f.write_all(b"hello")?)).unwrap();
        assert!(!dest.exists());

        staged.commit().unwrap();
        assert_eq!(fs::read_to_string(&dest).unwrap(), "hello");
    }

    #[test]
    fn dropped_stage_leaves_nothing_behind() {
        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("out.txt");

        let staged = StagedFile::stage(&dest, |f| Ok(f.write_all(b"hello")?)).unwrap();
        drop(staged);

        assert!(!dest.exists());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn failed_write_does_not_touch_destination() {
        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("out.txt");
        fs::write(&dest, "original").unwrap();

        let result = write_atomic(&dest, |_| {
            Err(Error::Internal {
                message: "boom".to_string(),
            })
        });

        assert!(result.is_err());
        assert_eq!(fs::read_to_string(&dest).unwrap(), "original");
    }
}
