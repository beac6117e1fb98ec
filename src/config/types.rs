//! Configuration type definitions.

use crate::audio::ResampleMethod;
use crate::clipper::DurationBounds;
use crate::constants::{layout, pipeline, xenocanto};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Complete application configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Clip pipeline settings.
    pub pipeline: PipelineSettings,

    /// Project layout.
    pub paths: PathsConfig,

    /// Xeno-canto client settings.
    pub xenocanto: XenoCantoConfig,
}

/// Clip pipeline settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineSettings {
    /// Output sample rate in Hz.
    pub output_sample_rate: u32,

    /// Shortest clip in seconds.
    pub min_duration_secs: f64,

    /// Longest clip in seconds.
    pub max_duration_secs: f64,

    /// Integrated loudness target in LUFS.
    pub target_lufs: f64,

    /// Maximum clips taken from one source in multi-segment mode.
    pub max_segments: usize,

    /// Window length for multi-segment mode in seconds.
    pub segment_window_secs: f64,

    /// Scan step for single-best trimming in seconds.
    pub single_step_secs: f64,

    /// Scan step for multi-segment mode in seconds.
    pub multi_step_secs: f64,

    /// Resampling algorithm.
    pub resampler: ResampleMethod,

    /// Render a spectrogram next to each clip.
    pub spectrograms: bool,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            output_sample_rate: pipeline::OUTPUT_SAMPLE_RATE,
            min_duration_secs: pipeline::MIN_DURATION_SECS,
            max_duration_secs: pipeline::MAX_DURATION_SECS,
            target_lufs: pipeline::TARGET_LUFS,
            max_segments: pipeline::MAX_SEGMENTS,
            segment_window_secs: pipeline::SEGMENT_WINDOW_SECS,
            single_step_secs: pipeline::SINGLE_STEP_SECS,
            multi_step_secs: pipeline::MULTI_STEP_SECS,
            resampler: ResampleMethod::default(),
            spectrograms: true,
        }
    }
}

impl PipelineSettings {
    /// Clip duration bounds.
    pub fn duration_bounds(&self) -> DurationBounds {
        DurationBounds {
            min_secs: self.min_duration_secs,
            max_secs: self.max_duration_secs,
        }
    }
}

/// Project layout, relative to the project root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Clip WAV directory.
    pub clips_dir: PathBuf,

    /// Spectrogram PNG directory.
    pub spectrograms_dir: PathBuf,

    /// Catalog JSON file.
    pub catalog: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            clips_dir: PathBuf::from(layout::CLIPS_DIR),
            spectrograms_dir: PathBuf::from(layout::SPECTROGRAMS_DIR),
            catalog: PathBuf::from(layout::CATALOG_FILE),
        }
    }
}

/// Xeno-canto client settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct XenoCantoConfig {
    /// API key. `XENO_CANTO_API_KEY` takes precedence.
    pub api_key: Option<String>,

    /// HTTP user agent.
    pub user_agent: String,

    /// Per-request timeout in seconds.
    pub timeout_secs: u64,

    /// Pause between requests in milliseconds.
    pub request_delay_ms: u64,

    /// Accepted recording countries.
    pub countries: Vec<String>,

    /// Accepted quality letters.
    pub qualities: Vec<String>,

    /// Shortest accepted recording in seconds.
    pub min_length_secs: u32,

    /// Longest accepted recording in seconds.
    pub max_length_secs: u32,

    /// Recordings ingested per species.
    pub max_per_species: usize,
}

impl Default for XenoCantoConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            user_agent: xenocanto::DEFAULT_USER_AGENT.to_string(),
            timeout_secs: xenocanto::DEFAULT_TIMEOUT_SECS,
            request_delay_ms: xenocanto::DEFAULT_REQUEST_DELAY_MS,
            countries: xenocanto::DEFAULT_COUNTRIES
                .iter()
                .map(ToString::to_string)
                .collect(),
            qualities: xenocanto::DEFAULT_QUALITIES
                .iter()
                .map(ToString::to_string)
                .collect(),
            min_length_secs: xenocanto::MIN_LENGTH_SECS,
            max_length_secs: xenocanto::MAX_LENGTH_SECS,
            max_per_species: xenocanto::DEFAULT_MAX_PER_SPECIES,
        }
    }
}
