//! Error types for chipnotes.

use std::path::PathBuf;

/// Result type alias for chipnotes operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type for chipnotes.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration directory could not be determined.
    #[error("could not determine configuration directory for this platform")]
    ConfigDirNotFound,

    /// Failed to read configuration file.
    #[error("failed to read config file '{path}'")]
    ConfigRead {
        /// Path to the config file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse configuration file.
    #[error("failed to parse config file '{path}'")]
    ConfigParse {
        /// Path to the config file.
        path: PathBuf,
        /// Underlying parse error.
        #[source]
        source: toml::de::Error,
    },

    /// Configuration validation failed.
    #[error("configuration validation failed: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    /// Failed to write configuration file.
    #[error("failed to write config file '{path}'")]
    ConfigWrite {
        /// Path to the config file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to serialize configuration.
    #[error("failed to serialize config")]
    ConfigSerialize {
        /// Underlying serialization error.
        #[source]
        source: toml::ser::Error,
    },

    // Audio errors
    /// Failed to open audio file.
    #[error("failed to open audio file '{path}'")]
    AudioOpen {
        /// Path (or URL) of the audio source.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Failed to decode audio.
    #[error("failed to decode audio from '{path}'")]
    AudioDecode {
        /// Path (or URL) of the audio source.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// No audio tracks found.
    #[error("no audio tracks found in '{path}'")]
    NoAudioTracks {
        /// Path (or URL) of the audio source.
        path: PathBuf,
    },

    /// Sample rate is zero or otherwise unusable.
    #[error("invalid sample rate: {rate} Hz")]
    InvalidSampleRate {
        /// Offending sample rate.
        rate: u32,
    },

    /// Audio buffer shape is inconsistent.
    #[error("invalid audio buffer: {reason}")]
    InvalidAudioBuffer {
        /// Description of the inconsistency.
        reason: String,
    },

    /// Failed to resample audio.
    #[error("failed to resample audio: {reason}")]
    Resample {
        /// Description of the resampling failure.
        reason: String,
    },

    /// Loudness meter failed.
    #[error("loudness measurement failed")]
    Loudness {
        /// Underlying meter error.
        #[source]
        source: ebur128::Error,
    },

    /// Failed to write WAV data.
    #[error("failed to write WAV file '{path}'")]
    WavWriteFailed {
        /// Destination of the WAV file.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: hound::Error,
    },

    /// Failed to encode a spectrogram image.
    #[error("failed to encode spectrogram image")]
    SpectrogramEncode {
        /// Underlying image error.
        #[source]
        source: image::ImageError,
    },

    // Validation errors
    /// Requested clip duration is outside the allowed range.
    #[error("duration must be between {min:.1} and {max:.1} seconds, got {value}")]
    InvalidDuration {
        /// Requested duration in seconds.
        value: f64,
        /// Minimum allowed duration in seconds.
        min: f64,
        /// Maximum allowed duration in seconds.
        max: f64,
    },

    /// Requested selection reads outside the recording.
    #[error("selection out of bounds: {start:.2}-{end:.2}s (recording is {length:.2}s)")]
    SelectionOutOfBounds {
        /// Selection start in seconds.
        start: f64,
        /// Selection end in seconds.
        end: f64,
        /// Recording length in seconds.
        length: f64,
    },

    /// Species code is empty or malformed.
    #[error("invalid species code '{code}' (expected letters and digits only)")]
    InvalidSpeciesCode {
        /// Offending code.
        code: String,
    },

    /// Quality score is outside 1-5.
    #[error("quality score must be between 1 and 5, got {value}")]
    InvalidQualityScore {
        /// Offending score.
        value: u8,
    },

    // Catalog errors
    /// Clip identifier is already present in the catalog.
    #[error("clip id '{id}' already exists in the catalog")]
    DuplicateClipId {
        /// Duplicated identifier.
        id: String,
    },

    /// More than one non-rejected canonical clip for a species.
    #[error("multiple canonical clips for species {species}: {first} and {second}")]
    MultipleCanonicals {
        /// Species code.
        species: String,
        /// First canonical clip id.
        first: String,
        /// Second canonical clip id.
        second: String,
    },

    /// A merge would have reduced the number of catalog records.
    #[error("catalog record count would decrease from {before} to {after}; refusing to save")]
    CatalogShrunk {
        /// Record count before the merge.
        before: usize,
        /// Record count after the merge.
        after: usize,
    },

    /// Failed to read the catalog file.
    #[error("failed to read catalog '{path}'")]
    CatalogRead {
        /// Path to the catalog.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse a catalog or manifest JSON file.
    #[error("failed to parse JSON file '{path}'")]
    CatalogParse {
        /// Path to the JSON file.
        path: PathBuf,
        /// Underlying parse error.
        #[source]
        source: serde_json::Error,
    },

    /// Failed to write the catalog file.
    #[error("failed to write catalog '{path}'")]
    CatalogWrite {
        /// Path to the catalog.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Catalog is locked by another writer.
    #[error("catalog is locked by another process: {path}")]
    CatalogLocked {
        /// Path to the lock file.
        path: PathBuf,
    },

    /// Failed to create lock file.
    #[error("failed to create lock file '{path}'")]
    LockCreate {
        /// Path to the lock file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to create output directory.
    #[error("failed to create output directory '{path}'")]
    OutputDirCreateFailed {
        /// Path to the output directory.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to move a finished file into place.
    #[error("failed to persist '{path}'")]
    Persist {
        /// Destination path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    // Manifest errors
    /// Failed to open or parse an ingest manifest.
    #[error("failed to parse manifest '{path}'")]
    ManifestParse {
        /// Path to the manifest.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Manifest row is malformed.
    #[error("invalid manifest row: {message}")]
    InvalidManifestRow {
        /// Description of the problem.
        message: String,
    },

    // Remote source errors
    /// No Xeno-canto API key configured.
    #[error("no Xeno-canto API key (set XENO_CANTO_API_KEY or xenocanto.api_key)")]
    MissingApiKey,

    /// HTTP request failed.
    #[error("request to '{url}' failed")]
    HttpRequest {
        /// URL that failed.
        url: String,
        /// Underlying error.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Remote API returned an error payload.
    #[error("remote API error: {message}")]
    RemoteApi {
        /// Message reported by the API.
        message: String,
    },

    /// Download exceeded the size limit.
    #[error("download from '{url}' exceeds {limit} bytes")]
    DownloadTooLarge {
        /// URL being downloaded.
        url: String,
        /// Size limit in bytes.
        limit: usize,
    },

    /// Catalog audit found problems.
    #[error("validation failed: {issues} issue(s) found")]
    AuditFailed {
        /// Number of issues.
        issues: usize,
    },

    // Batch errors
    /// A batch produced no clips at all.
    #[error("no clips produced ({skipped} skipped, {failed} failed)")]
    NoClipsProduced {
        /// Items skipped.
        skipped: usize,
        /// Items that failed.
        failed: usize,
    },

    /// Internal error (for unexpected failures).
    #[error("internal error: {message}")]
    Internal {
        /// Error message.
        message: String,
    },
}
