//! Ingest manifest parsing.
//!
//! A manifest is a CSV file listing local source recordings and their
//! provenance:
//!
//! ```text
//! file,species_code,common_name,vocalization_type,source,source_id,recordist,quality
//! noca_01.wav,NOCA,Northern Cardinal,song,cornell,ML1234,Jane Doe,A
//! ```
//!
//! Only the first three columns are required. `quality` accepts a 1-5 score
//! or a Xeno-canto letter.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use super::{normalize_species_code, validate_quality};
use crate::catalog::{VocalizationType, quality_from_letter};
use crate::constants::quality;
use crate::error::{Error, Result};

/// Source name used when a row leaves `source` empty.
pub const DEFAULT_SOURCE: &str = "local";

#[derive(Debug, Deserialize)]
struct ManifestRecord {
    file: String,
    species_code: String,
    common_name: String,
    #[serde(default)]
    vocalization_type: Option<String>,
    #[serde(default)]
    source: Option<String>,
    #[serde(default)]
    source_id: Option<String>,
    #[serde(default)]
    recordist: Option<String>,
    #[serde(default)]
    quality: Option<String>,
}

/// One recording listed in a manifest.
#[derive(Debug, Clone, PartialEq)]
pub struct ManifestEntry {
    /// Source recording, resolved against the manifest's directory.
    pub file: PathBuf,
    /// Upper-case species code.
    pub species_code: String,
    /// Species common name.
    pub common_name: String,
    /// Vocalization type, `song` when the column is empty.
    pub vocalization_type: VocalizationType,
    /// Source name.
    pub source: String,
    /// Identifier within the source.
    pub source_id: Option<String>,
    /// Recordist.
    pub recordist: Option<String>,
    /// Quality score, 1-5.
    pub quality_score: u8,
}

/// Parse an ingest manifest.
///
/// Every row is validated up front, so a bad row fails the whole manifest
/// before any audio is processed.
pub fn parse_manifest(path: &Path) -> Result<Vec<ManifestEntry>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| Error::ManifestParse {
            path: path.to_path_buf(),
            source: Box::new(e),
        })?;

    let base = path
        .parent()
        .map_or_else(PathBuf::new, Path::to_path_buf);

    let mut entries = Vec::new();
    for (index, result) in reader.deserialize::<ManifestRecord>().enumerate() {
        let line = index + 2;
        let record = result.map_err(|e| Error::InvalidManifestRow {
            message: format!("line {line}: {e}"),
        })?;
        entries.push(entry_from_record(record, &base).map_err(|e| Error::InvalidManifestRow {
            message: format!("line {line}: {e}"),
        })?);
    }

    Ok(entries)
}

fn entry_from_record(record: ManifestRecord, base: &Path) -> Result<ManifestEntry> {
    if record.file.is_empty() {
        return Err(Error::InvalidManifestRow {
            message: "file is empty".to_string(),
        });
    }
    if record.common_name.is_empty() {
        return Err(Error::InvalidManifestRow {
            message: "common_name is empty".to_string(),
        });
    }

    let file = PathBuf::from(&record.file);
    let file = if file.is_absolute() {
        file
    } else {
        base.join(file)
    };

    let quality_score = match non_empty(record.quality) {
        None => quality::DEFAULT,
        Some(text) => match text.parse::<u8>() {
            Ok(score) => {
                validate_quality(score)?;
                score
            }
            Err(_) => quality_from_letter(&text),
        },
    };

    Ok(ManifestEntry {
        file,
        species_code: normalize_species_code(&record.species_code)?,
        common_name: record.common_name,
        vocalization_type: non_empty(record.vocalization_type)
            .map_or(VocalizationType::Song, |t| VocalizationType::normalize(&t)),
        source: non_empty(record.source).unwrap_or_else(|| DEFAULT_SOURCE.to_string()),
        source_id: non_empty(record.source_id),
        recordist: non_empty(record.recordist),
        quality_score,
    })
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_manifest(dir: &TempDir, contents: &str) -> PathBuf {
        let path = dir.path().join("manifest.csv");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn full_row_is_parsed() {
        let dir = TempDir::new().unwrap();
        let path = write_manifest(
            &dir,
            "file,species_code,common_name,vocalization_type,source,source_id,recordist,quality\n\
             audio/noca.wav,noca,Northern Cardinal,Alarm Call,cornell,ML1,Jane Doe,B\n",
        );

        let entries = parse_manifest(&path).unwrap();
        assert_eq!(entries.len(), 1);
        let entry = &entries[0];
        assert_eq!(entry.file, dir.path().join("audio/noca.wav"));
        assert_eq!(entry.species_code, "NOCA");
        assert_eq!(entry.vocalization_type, VocalizationType::AlarmCall);
        assert_eq!(entry.source, "cornell");
        assert_eq!(entry.source_id.as_deref(), Some("ML1"));
        assert_eq!(entry.quality_score, 4);
    }

    #[test]
    fn optional_columns_default() {
        let dir = TempDir::new().unwrap();
        let path = write_manifest(
            &dir,
            "file,species_code,common_name\nblja.wav,BLJA,\"Jay, Blue\"\n",
        );

        let entry = &parse_manifest(&path).unwrap()[0];
        assert_eq!(entry.common_name, "Jay, Blue");
        assert_eq!(entry.vocalization_type, VocalizationType::Song);
        assert_eq!(entry.source, DEFAULT_SOURCE);
        assert_eq!(entry.source_id, None);
        assert_eq!(entry.quality_score, quality::DEFAULT);
    }

    #[test]
    fn bom_is_tolerated() {
        let dir = TempDir::new().unwrap();
        let path = write_manifest(
            &dir,
            "\u{feff}file,species_code,common_name\nx.wav,AMRO,American Robin\n",
        );
        assert_eq!(parse_manifest(&path).unwrap()[0].species_code, "AMRO");
    }

    #[test]
    fn bad_row_reports_line() {
        let dir = TempDir::new().unwrap();
        let path = write_manifest(
            &dir,
            "file,species_code,common_name,quality\n\
             a.wav,AMRO,American Robin,5\n\
             b.wav,AMRO,American Robin,9\n",
        );
        let err = parse_manifest(&path).unwrap_err();
        assert!(err.to_string().contains("line 3"));
    }

    #[test]
    fn invalid_species_code_rejected() {
        let dir = TempDir::new().unwrap();
        let path = write_manifest(&dir, "file,species_code,common_name\na.wav,A-B,Robin\n");
        assert!(matches!(
            parse_manifest(&path).unwrap_err(),
            Error::InvalidManifestRow { .. }
        ));
    }

    #[test]
    fn missing_file_errors() {
        let err = parse_manifest(Path::new("/nonexistent/manifest.csv")).unwrap_err();
        assert!(matches!(err, Error::ManifestParse { .. }));
    }
}
