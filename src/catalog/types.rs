//! Catalog record types.

use crate::constants::quality;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Kind of vocalization a clip contains.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String")]
pub enum VocalizationType {
    /// Song.
    #[serde(rename = "song")]
    Song,
    /// Call.
    #[serde(rename = "call")]
    Call,
    /// Flight call.
    #[serde(rename = "flight call")]
    FlightCall,
    /// Alarm call.
    #[serde(rename = "alarm call")]
    AlarmCall,
    /// Chip note.
    #[serde(rename = "chip")]
    Chip,
    /// Drumming.
    #[serde(rename = "drum")]
    Drum,
    /// Wing sound.
    #[serde(rename = "wing sound")]
    WingSound,
    /// Rattle.
    #[serde(rename = "rattle")]
    Rattle,
    /// Trill.
    #[serde(rename = "trill")]
    Trill,
    /// Anything else.
    #[default]
    #[serde(rename = "other")]
    Other,
}

impl VocalizationType {
    /// All types in catalog order.
    pub const ALL: [Self; 10] = [
        Self::Song,
        Self::Call,
        Self::FlightCall,
        Self::AlarmCall,
        Self::Chip,
        Self::Drum,
        Self::WingSound,
        Self::Rattle,
        Self::Trill,
        Self::Other,
    ];

    /// Canonical name as stored in the catalog.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Song => "song",
            Self::Call => "call",
            Self::FlightCall => "flight call",
            Self::AlarmCall => "alarm call",
            Self::Chip => "chip",
            Self::Drum => "drum",
            Self::WingSound => "wing sound",
            Self::Rattle => "rattle",
            Self::Trill => "trill",
            Self::Other => "other",
        }
    }

    /// Map free text (e.g. a Xeno-canto `type` field) to a type.
    ///
    /// Substring rules are checked in order, so "alarm call" is an alarm
    /// call and "flight call, song" is a song.
    pub fn normalize(text: &str) -> Self {
        const RULES: [(&[&str], VocalizationType); 9] = [
            (&["song"], VocalizationType::Song),
            (&["flight", "flight-call"], VocalizationType::FlightCall),
            (&["alarm"], VocalizationType::AlarmCall),
            (&["chip", "chipping"], VocalizationType::Chip),
            (&["drum", "drumming"], VocalizationType::Drum),
            (&["wing"], VocalizationType::WingSound),
            (&["rattle", "rattling"], VocalizationType::Rattle),
            (&["trill"], VocalizationType::Trill),
            (&["call"], VocalizationType::Call),
        ];

        let lower = text.trim().to_lowercase();
        if let Some(exact) = Self::ALL.into_iter().find(|t| t.as_str() == lower) {
            return exact;
        }
        RULES
            .into_iter()
            .find(|(needles, _)| needles.iter().any(|n| lower.contains(n)))
            .map_or(Self::Other, |(_, t)| t)
    }
}

impl From<String> for VocalizationType {
    fn from(text: String) -> Self {
        Self::normalize(&text)
    }
}

impl FromStr for VocalizationType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::normalize(s))
    }
}

impl fmt::Display for VocalizationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Convert a Xeno-canto quality letter to a 1-5 score.
///
/// Unknown or missing letters get the default score.
pub fn quality_from_letter(letter: &str) -> u8 {
    match letter.trim().to_ascii_uppercase().as_str() {
        "A" => 5,
        "B" => 4,
        "C" => 3,
        "D" => 2,
        "E" => 1,
        _ => quality::DEFAULT,
    }
}

/// One clip in the catalog.
///
/// Legacy field names (`species_name`, `xeno_canto_id`, `quality_rating`,
/// letter-valued `quality`) are folded into their current names on load.
/// Fields this type does not know are carried through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawClip")]
pub struct ClipMetadata {
    /// Unique clip identifier.
    pub clip_id: String,
    /// Upper-case species code, e.g. `NOCA`.
    pub species_code: String,
    /// Species common name.
    pub common_name: String,
    /// Vocalization type.
    pub vocalization_type: VocalizationType,
    /// Clip length in milliseconds.
    pub duration_ms: u32,
    /// Curation quality, 1-5.
    pub quality_score: u8,
    /// Final integrated loudness, rounded to 0.1 LUFS.
    pub loudness_lufs: Option<f64>,
    /// Where the recording came from (`xenocanto`, `cornell`, `local`...).
    pub source: String,
    /// Identifier within the source, e.g. `XC12345`.
    pub source_id: Option<String>,
    /// Link to the source recording.
    pub source_url: Option<String>,
    /// Person who made the recording.
    pub recordist: Option<String>,
    /// Clip audio path relative to the project root.
    pub file_path: String,
    /// Spectrogram path relative to the project root.
    pub spectrogram_path: Option<String>,
    /// Whether this is the species' reference clip.
    pub canonical: bool,
    /// Whether curation rejected this clip.
    pub rejected: bool,
    /// Unknown fields, preserved verbatim.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl ClipMetadata {
    /// Not rejected.
    pub fn is_active(&self) -> bool {
        !self.rejected
    }
}

/// Round loudness to one decimal for storage.
pub fn round_lufs(lufs: f64) -> f64 {
    (lufs * 10.0).round() / 10.0
}

#[derive(Deserialize)]
#[serde(untagged)]
enum QualityRepr {
    Score(u8),
    Letter(String),
}

impl QualityRepr {
    fn score(self) -> u8 {
        match self {
            Self::Score(score) => score,
            Self::Letter(letter) => letter
                .trim()
                .parse::<u8>()
                .unwrap_or_else(|_| quality_from_letter(&letter)),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum IdRepr {
    Text(String),
    Number(u64),
}

impl IdRepr {
    fn into_string(self) -> String {
        match self {
            Self::Text(text) => text,
            Self::Number(n) => n.to_string(),
        }
    }
}

#[derive(Deserialize)]
struct RawClip {
    clip_id: Option<String>,
    #[serde(default)]
    species_code: String,
    common_name: Option<String>,
    species_name: Option<String>,
    vocalization_type: Option<VocalizationType>,
    #[serde(default)]
    duration_ms: u32,
    quality_score: Option<QualityRepr>,
    quality_rating: Option<QualityRepr>,
    quality: Option<QualityRepr>,
    loudness_lufs: Option<f64>,
    source: Option<String>,
    source_id: Option<IdRepr>,
    xeno_canto_id: Option<IdRepr>,
    source_url: Option<String>,
    recordist: Option<String>,
    file_path: Option<String>,
    spectrogram_path: Option<String>,
    #[serde(default)]
    canonical: bool,
    #[serde(default)]
    rejected: bool,
    #[serde(flatten)]
    extra: serde_json::Map<String, serde_json::Value>,
}

impl TryFrom<RawClip> for ClipMetadata {
    type Error = String;

    fn try_from(raw: RawClip) -> Result<Self, Self::Error> {
        let file_path = raw.file_path.unwrap_or_default();
        let clip_id = match raw.clip_id {
            Some(id) if !id.trim().is_empty() => id,
            _ => Path::new(&file_path)
                .file_stem()
                .and_then(|s| s.to_str())
                .map(str::to_string)
                .ok_or_else(|| "clip record has neither clip_id nor file_path".to_string())?,
        };

        Ok(Self {
            clip_id,
            species_code: raw.species_code,
            common_name: raw.common_name.or(raw.species_name).unwrap_or_default(),
            vocalization_type: raw.vocalization_type.unwrap_or_default(),
            duration_ms: raw.duration_ms,
            quality_score: raw
                .quality_score
                .or(raw.quality_rating)
                .or(raw.quality)
                .map_or(quality::DEFAULT, QualityRepr::score),
            loudness_lufs: raw.loudness_lufs,
            source: raw.source.unwrap_or_else(|| "unknown".to_string()),
            source_id: raw
                .source_id
                .or(raw.xeno_canto_id)
                .map(IdRepr::into_string),
            source_url: raw.source_url,
            recordist: raw.recordist,
            file_path,
            spectrogram_path: raw.spectrogram_path,
            canonical: raw.canonical,
            rejected: raw.rejected,
            extra: raw.extra,
        })
    }
}
