//! Application-wide constants.
//!
//! All magic numbers and strings are defined here to ensure consistency
//! and make changes easy to track.

/// Application name used for config directories and user-facing messages.
pub const APP_NAME: &str = "chipnotes";

/// Name of the platform configuration file.
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Project-local configuration file, looked up in the project root.
pub const PROJECT_CONFIG_FILE: &str = "chipnotes.toml";

/// Lock file extension appended to the catalog path.
pub const LOCK_FILE_EXTENSION: &str = ".chipnotes.lock";

/// Suffix of the catalog backup written before every save.
pub const CATALOG_BACKUP_SUFFIX: &str = ".backup";

/// Clip pipeline defaults.
///
/// The duration bounds and loudness target are game-design constants; the
/// scan steps, window and segment cap are tuning knobs exposed in config.
pub mod pipeline {
    /// Output sample rate for every clip in Hz.
    pub const OUTPUT_SAMPLE_RATE: u32 = 44_100;

    /// Shortest playable clip in seconds.
    pub const MIN_DURATION_SECS: f64 = 0.5;

    /// Longest playable clip in seconds.
    pub const MAX_DURATION_SECS: f64 = 3.0;

    /// Integrated loudness target in LUFS.
    pub const TARGET_LUFS: f64 = -16.0;

    /// Acceptable deviation from the target after normalization, in LU.
    pub const LUFS_TOLERANCE: f64 = 1.0;

    /// Maximum distinct clips taken from one long source recording.
    pub const MAX_SEGMENTS: usize = 3;

    /// Window length used when extracting several clips from one source.
    pub const SEGMENT_WINDOW_SECS: f64 = 2.0;

    /// Scan step for single-best trimming (100 ms).
    pub const SINGLE_STEP_SECS: f64 = 0.1;

    /// Scan step for multi-segment extraction (500 ms).
    pub const MULTI_STEP_SECS: f64 = 0.5;
}

/// Project directory layout, relative to the project root.
pub mod layout {
    /// Directory holding clip WAV files.
    pub const CLIPS_DIR: &str = "data/clips";

    /// Directory holding spectrogram PNG files.
    pub const SPECTROGRAMS_DIR: &str = "data/spectrograms";

    /// Catalog JSON file.
    pub const CATALOG_FILE: &str = "data/clips.json";

    /// Clip audio extension.
    pub const CLIP_EXTENSION: &str = "wav";

    /// Spectrogram extension.
    pub const SPECTROGRAM_EXTENSION: &str = "png";
}

/// Clip quality score bounds.
pub mod quality {
    /// Lowest quality score.
    pub const MIN: u8 = 1;
    /// Highest quality score.
    pub const MAX: u8 = 5;
    /// Score assigned when nothing better is known.
    pub const DEFAULT: u8 = 5;
}

/// Clip identifier constants.
pub mod ids {
    /// Hex characters kept from the content hash.
    pub const CONTENT_HASH_HEX_LEN: usize = 12;

    /// Middle tag for sequential identifiers without a source id.
    pub const GENERIC_TAG: &str = "clip";
}

/// Spectrogram rendering parameters.
///
/// These must stay fixed so every image in the game looks alike.
pub mod spectrogram {
    /// FFT window size.
    pub const N_FFT: usize = 1024;
    /// Hop between FFT frames.
    pub const HOP_LENGTH: usize = 256;
    /// Lowest displayed frequency in Hz.
    pub const FREQ_MIN_HZ: f32 = 500.0;
    /// Highest displayed frequency in Hz.
    pub const FREQ_MAX_HZ: f32 = 10_000.0;
    /// Image width in pixels.
    pub const WIDTH: u32 = 400;
    /// Image height in pixels.
    pub const HEIGHT: u32 = 200;
    /// Displayed dynamic range below the loudest bin in dB.
    pub const DYNAMIC_RANGE_DB: f32 = 80.0;
}

/// Xeno-canto API constants.
pub mod xenocanto {
    /// Recordings search endpoint (API v3).
    pub const API_URL: &str = "https://xeno-canto.org/api/3/recordings";
    /// Base URL for recording pages.
    pub const RECORDING_URL_BASE: &str = "https://xeno-canto.org";
    /// Results requested per page.
    pub const PER_PAGE: &str = "100";
    /// Source name stored in clip metadata.
    pub const SOURCE_NAME: &str = "xenocanto";
    /// Prefix of Xeno-canto source identifiers.
    pub const SOURCE_ID_PREFIX: &str = "XC";
    /// Default HTTP user agent.
    pub const DEFAULT_USER_AGENT: &str = "ChipNotes/1.0";
    /// Default request timeout in seconds.
    pub const DEFAULT_TIMEOUT_SECS: u64 = 60;
    /// Connect timeout in seconds.
    pub const CONNECT_TIMEOUT_SECS: u64 = 30;
    /// Default delay between requests in milliseconds.
    pub const DEFAULT_REQUEST_DELAY_MS: u64 = 500;
    /// Countries accepted by default.
    pub const DEFAULT_COUNTRIES: &[&str] = &["United States", "Canada"];
    /// Quality letters accepted by default.
    pub const DEFAULT_QUALITIES: &[&str] = &["A", "B"];
    /// Shortest source recording accepted, in seconds.
    pub const MIN_LENGTH_SECS: u32 = 3;
    /// Longest source recording accepted, in seconds.
    pub const MAX_LENGTH_SECS: u32 = 90;
    /// Recordings taken per species by default.
    pub const DEFAULT_MAX_PER_SPECIES: usize = 1;
    /// Upper bound on a single downloaded recording.
    pub const MAX_DOWNLOAD_BYTES: usize = 64 * 1024 * 1024;
}

/// Supported audio file extensions for source recordings.
pub const AUDIO_EXTENSIONS: &[&str] = &["wav", "flac", "mp3", "m4a", "aac"];
