//! What to cut from a recording and how to label it.

use super::{DurationBounds, IdScheme};
use crate::catalog::VocalizationType;
use crate::constants::quality;
use crate::error::{Error, Result};

/// Which part of a recording becomes clips.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Selection {
    /// The best window of the maximum clip length, or the whole recording
    /// if it is already short enough.
    Auto,
    /// Up to the configured number of non-overlapping windows.
    Distinct {
        /// Window length in seconds.
        window_secs: f64,
    },
    /// An explicit range chosen by a curator.
    Manual {
        /// Offset in seconds.
        start_secs: f64,
        /// Length in seconds.
        duration_secs: f64,
    },
}

/// Provenance and selection for one source recording.
#[derive(Debug, Clone, PartialEq)]
pub struct ClipRequest {
    /// Species code.
    pub species_code: String,
    /// Species common name.
    pub common_name: String,
    /// Vocalization type.
    pub vocalization_type: VocalizationType,
    /// Quality score, 1-5.
    pub quality_score: u8,
    /// Source name (`xenocanto`, `cornell`, `local`...).
    pub source: String,
    /// Identifier within the source.
    pub source_id: Option<String>,
    /// Link to the source recording.
    pub source_url: Option<String>,
    /// Recordist.
    pub recordist: Option<String>,
    /// File name of the source recording, hashed into content ids.
    pub source_file: String,
    /// Segments to extract.
    pub selection: Selection,
    /// Identifier scheme.
    pub id_scheme: IdScheme,
}

impl ClipRequest {
    /// Check everything that can be checked without touching audio.
    pub fn validate(&self, bounds: &DurationBounds) -> Result<()> {
        normalize_species_code(&self.species_code)?;
        validate_quality(self.quality_score)?;
        match self.selection {
            Selection::Auto => Ok(()),
            Selection::Distinct { window_secs } => bounds.validate(window_secs),
            Selection::Manual {
                start_secs,
                duration_secs,
            } => {
                bounds.validate(duration_secs)?;
                if !start_secs.is_finite() || start_secs < 0.0 {
                    return Err(Error::SelectionOutOfBounds {
                        start: start_secs,
                        end: start_secs + duration_secs,
                        length: f64::NAN,
                    });
                }
                Ok(())
            }
        }
    }
}

/// Upper-case a species code, rejecting anything but ASCII letters and digits.
pub fn normalize_species_code(code: &str) -> Result<String> {
    let trimmed = code.trim();
    if trimmed.is_empty() || !trimmed.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(Error::InvalidSpeciesCode {
            code: code.to_string(),
        });
    }
    Ok(trimmed.to_ascii_uppercase())
}

/// Reject quality scores outside 1-5.
pub fn validate_quality(score: u8) -> Result<()> {
    if !(quality::MIN..=quality::MAX).contains(&score) {
        return Err(Error::InvalidQualityScore { value: score });
    }
    Ok(())
}
