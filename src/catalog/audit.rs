//! Catalog health report.
//!
//! Beyond the hard invariants checked on every save, an audit looks for
//! problems that only matter before shipping: files referenced by the catalog
//! that are missing or not WAV audio, and species with no canonical clip.

use super::Catalog;
use std::path::Path;

/// Findings of a catalog audit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuditReport {
    /// All records.
    pub total: usize,
    /// Records not rejected.
    pub active: usize,
    /// Rejected records.
    pub rejected: usize,
    /// Distinct species.
    pub species: usize,
    /// Active canonical records.
    pub canonicals: usize,
    /// Active clips whose audio file is missing: `(clip_id, path)`.
    pub missing_audio: Vec<(String, String)>,
    /// Active clips whose spectrogram path is set but missing.
    pub missing_spectrograms: Vec<(String, String)>,
    /// Canonical clips whose audio is not a readable WAV file.
    pub unreadable_canonicals: Vec<String>,
    /// Species without an active canonical clip.
    pub species_without_canonical: Vec<String>,
}

impl AuditReport {
    /// Number of distinct problems found.
    pub fn issue_count(&self) -> usize {
        self.issues().len()
    }

    /// One line per problem category.
    pub fn issues(&self) -> Vec<String> {
        let mut issues = Vec::new();
        if !self.missing_audio.is_empty() {
            issues.push(format!("{} missing audio files", self.missing_audio.len()));
        }
        if !self.missing_spectrograms.is_empty() {
            issues.push(format!(
                "{} missing spectrogram files",
                self.missing_spectrograms.len()
            ));
        }
        if !self.unreadable_canonicals.is_empty() {
            issues.push(format!(
                "{} canonical clips are not readable WAV files",
                self.unreadable_canonicals.len()
            ));
        }
        if !self.species_without_canonical.is_empty() {
            issues.push(format!(
                "{} species without canonicals",
                self.species_without_canonical.len()
            ));
        }
        issues
    }
}

/// Audit `catalog`, resolving clip paths against `root`.
pub fn audit(catalog: &Catalog, root: &Path) -> AuditReport {
    let mut report = AuditReport {
        total: catalog.len(),
        ..AuditReport::default()
    };

    for clip in catalog.clips() {
        if clip.rejected {
            report.rejected += 1;
            continue;
        }
        report.active += 1;

        let audio = root.join(&clip.file_path);
        let audio_exists = !clip.file_path.is_empty() && audio.exists();
        if !audio_exists {
            report
                .missing_audio
                .push((clip.clip_id.clone(), clip.file_path.clone()));
        }

        if let Some(spectrogram) = &clip.spectrogram_path
            && !root.join(spectrogram).exists()
        {
            report
                .missing_spectrograms
                .push((clip.clip_id.clone(), spectrogram.clone()));
        }

        if clip.canonical {
            report.canonicals += 1;
            if audio_exists && hound::WavReader::open(&audio).is_err() {
                report.unreadable_canonicals.push(clip.clip_id.clone());
            }
        }
    }

    let species = catalog.species();
    report.species = species.len();
    report.species_without_canonical = species
        .into_iter()
        .filter(|code| catalog.canonical_for(code).is_none())
        .map(str::to_string)
        .collect();

    report
}
