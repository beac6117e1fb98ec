//! Xeno-canto API v3 client.
//!
//! Searches by English name (`en:"Northern Cardinal"`) and filters country,
//! quality letter and length client-side, since server-side tag filters
//! on country frequently return nothing.

use std::path::Path;
use std::time::Duration;

use futures_util::StreamExt;
use reqwest::{Client, Url};
use serde::Deserialize;
use tracing::debug;

use crate::catalog::{VocalizationType, quality_from_letter};
use crate::config::XenoCantoConfig;
use crate::constants::xenocanto::{
    API_URL, CONNECT_TIMEOUT_SECS, MAX_DOWNLOAD_BYTES, PER_PAGE, RECORDING_URL_BASE,
    SOURCE_ID_PREFIX,
};
use crate::error::{Error, Result};

/// Extension assumed when a recording's file name has none.
const DEFAULT_EXTENSION: &str = "mp3";

/// Search response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecordingsResponse {
    /// Matching recordings on this page.
    #[serde(default)]
    pub recordings: Vec<Recording>,
    /// Error code, present on failed queries.
    #[serde(default)]
    pub error: Option<String>,
    /// Error description.
    #[serde(default)]
    pub message: Option<String>,
}

/// One recording as returned by the API. All values arrive as strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Recording {
    /// Catalogue number.
    pub id: String,
    /// Download URL.
    pub file: String,
    /// Original file name.
    #[serde(rename = "file-name")]
    pub file_name: String,
    /// Country.
    pub cnt: String,
    /// Quality letter.
    pub q: String,
    /// Length as `m:ss`.
    pub length: String,
    /// Recordist.
    pub rec: String,
    /// Comma-separated sound types.
    #[serde(rename = "type")]
    pub sound_type: String,
    /// English name.
    pub en: String,
}

impl Recording {
    /// Source identifier, `XC<id>`.
    pub fn source_id(&self) -> String {
        format!("{SOURCE_ID_PREFIX}{}", self.id)
    }

    /// Public page for the recording.
    pub fn source_url(&self) -> String {
        format!("{RECORDING_URL_BASE}/{}", self.id)
    }

    /// Download URL forced to https.
    pub fn download_url(&self) -> String {
        normalize_file_url(&self.file)
    }

    /// Audio extension of the original file.
    pub fn extension(&self) -> &str {
        Path::new(&self.file_name)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or(DEFAULT_EXTENSION)
    }

    /// Name used to derive content-hash identifiers.
    pub fn source_file(&self) -> String {
        format!("{}.{}", self.source_id(), self.extension())
    }

    /// First listed sound type, normalized.
    pub fn vocalization_type(&self) -> VocalizationType {
        let first = self.sound_type.split(',').next().unwrap_or_default();
        VocalizationType::normalize(first)
    }

    /// Quality letter as a 1-5 score.
    pub fn quality_score(&self) -> u8 {
        quality_from_letter(&self.q)
    }

    /// Length in seconds, if well formed.
    pub fn length_secs(&self) -> Option<u32> {
        parse_length(&self.length)
    }
}

/// Client-side recording filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordingFilter {
    countries: Vec<String>,
    qualities: Vec<String>,
    min_length_secs: u32,
    max_length_secs: u32,
}

impl RecordingFilter {
    /// Filter from client settings.
    pub fn from_config(config: &XenoCantoConfig) -> Self {
        Self {
            countries: config.countries.clone(),
            qualities: config.qualities.clone(),
            min_length_secs: config.min_length_secs,
            max_length_secs: config.max_length_secs,
        }
    }

    /// Whether a recording passes country, quality and length checks.
    /// Empty country or quality lists accept everything.
    pub fn accepts(&self, recording: &Recording) -> bool {
        let country_ok =
            self.countries.is_empty() || self.countries.iter().any(|c| *c == recording.cnt);
        let quality_ok = self.qualities.is_empty()
            || self
                .qualities
                .iter()
                .any(|q| q.eq_ignore_ascii_case(&recording.q));
        let length_ok = recording
            .length_secs()
            .is_some_and(|len| (self.min_length_secs..=self.max_length_secs).contains(&len));
        country_ok && quality_ok && length_ok
    }
}

/// Parse `m:ss` or `h:mm:ss` into seconds.
pub fn parse_length(text: &str) -> Option<u32> {
    let parts = text
        .trim()
        .split(':')
        .map(str::parse::<u32>)
        .collect::<std::result::Result<Vec<_>, _>>()
        .ok()?;
    match parts.as_slice() {
        [m, s] => Some(m * 60 + s),
        [h, m, s] => Some(h * 3600 + m * 60 + s),
        _ => None,
    }
}

/// Complete protocol-relative URLs and upgrade plain http.
pub fn normalize_file_url(url: &str) -> String {
    if let Some(rest) = url.strip_prefix("//") {
        format!("https://{rest}")
    } else if let Some(rest) = url.strip_prefix("http://") {
        format!("https://{rest}")
    } else {
        url.to_string()
    }
}

/// Xeno-canto HTTP client.
pub struct XenoCantoClient {
    client: Client,
    api_key: String,
    filter: RecordingFilter,
    delay: Duration,
}

impl XenoCantoClient {
    /// Build a client from settings.
    pub fn new(config: &XenoCantoConfig, api_key: String) -> Result<Self> {
        if api_key.trim().is_empty() {
            return Err(Error::MissingApiKey);
        }
        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::Internal {
                message: format!("Failed to create HTTP client: {e}"),
            })?;

        Ok(Self {
            client,
            api_key,
            filter: RecordingFilter::from_config(config),
            delay: Duration::from_millis(config.request_delay_ms),
        })
    }

    /// Pause between consecutive requests.
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Recordings of `common_name` that pass the filter, in API order.
    pub async fn search(&self, common_name: &str) -> Result<Vec<Recording>> {
        let query = format!("en:\"{common_name}\"");
        let url = Url::parse_with_params(
            API_URL,
            [
                ("query", query.as_str()),
                ("key", self.api_key.as_str()),
                ("per_page", PER_PAGE),
            ],
        )
        .map_err(|e| Error::Internal {
            message: format!("Failed to build search URL: {e}"),
        })?;

        let body = self.get_bytes(url.as_str(), usize::MAX).await?;
        let response: RecordingsResponse =
            serde_json::from_slice(&body).map_err(|e| Error::HttpRequest {
                url: API_URL.to_string(),
                source: Box::new(e),
            })?;
        let total = response.recordings.len();
        let accepted = filter_response(response, &self.filter)?;
        debug!(
            "{common_name}: {} of {total} recordings pass the filter",
            accepted.len()
        );
        Ok(accepted)
    }

    /// Download a recording's audio.
    pub async fn download(&self, recording: &Recording) -> Result<Vec<u8>> {
        self.get_bytes(&recording.download_url(), MAX_DOWNLOAD_BYTES)
            .await
    }

    async fn get_bytes(&self, url: &str, limit: usize) -> Result<Vec<u8>> {
        // The key travels in the query string; keep it out of error messages.
        let shown = url.split('?').next().unwrap_or(url).to_string();
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| Error::HttpRequest {
                url: shown.clone(),
                source: Box::new(e.without_url()),
            })?;

        if !response.status().is_success() {
            return Err(Error::HttpRequest {
                url: shown,
                source: format!("HTTP {}", response.status()).into(),
            });
        }

        let mut body = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| Error::HttpRequest {
                url: shown.clone(),
                source: Box::new(e.without_url()),
            })?;
            if body.len() + chunk.len() > limit {
                return Err(Error::DownloadTooLarge { url: shown, limit });
            }
            body.extend_from_slice(&chunk);
        }
        Ok(body)
    }
}

/// Surface API errors and apply the filter.
pub fn filter_response(
    response: RecordingsResponse,
    filter: &RecordingFilter,
) -> Result<Vec<Recording>> {
    if let Some(error) = response.error {
        let message = response
            .message
            .map_or_else(|| error.clone(), |m| format!("{error}: {m}"));
        return Err(Error::RemoteApi { message });
    }
    Ok(response
        .recordings
        .into_iter()
        .filter(|r| filter.accepts(r))
        .collect())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "numRecordings": "3",
        "numSpecies": "1",
        "page": 1,
        "numPages": 1,
        "recordings": [
            {"id": "101", "en": "Northern Cardinal", "cnt": "United States",
             "q": "A", "length": "0:45", "rec": "Jane Doe",
             "type": "alarm call, song", "file": "//xeno-canto.org/101/download",
             "file-name": "XC101-cardinal.mp3"},
            {"id": "102", "en": "Northern Cardinal", "cnt": "Mexico",
             "q": "A", "length": "0:30", "type": "song",
             "file": "https://xeno-canto.org/102/download"},
            {"id": "103", "en": "Northern Cardinal", "cnt": "Canada",
             "q": "C", "length": "0:30", "type": "song",
             "file": "https://xeno-canto.org/103/download"}
        ]
    }"#;

    #[test]
    fn filter_keeps_matching_recordings() {
        let response: RecordingsResponse = serde_json::from_str(SAMPLE).unwrap();
        let filter = RecordingFilter::from_config(&XenoCantoConfig::default());
        let accepted = filter_response(response, &filter).unwrap();

        assert_eq!(accepted.len(), 1);
        let rec = &accepted[0];
        assert_eq!(rec.source_id(), "XC101");
        assert_eq!(rec.source_url(), "https://xeno-canto.org/101");
        assert_eq!(rec.download_url(), "https://xeno-canto.org/101/download");
        assert_eq!(rec.source_file(), "XC101.mp3");
        assert_eq!(rec.vocalization_type(), VocalizationType::AlarmCall);
        assert_eq!(rec.quality_score(), 5);
    }

    #[test]
    fn api_error_is_reported() {
        let response: RecordingsResponse =
            serde_json::from_str(r#"{"error": "missing_key", "message": "No API key"}"#).unwrap();
        let filter = RecordingFilter::from_config(&XenoCantoConfig::default());
        let err = filter_response(response, &filter).unwrap_err();
        assert!(err.to_string().contains("missing_key: No API key"));
    }

    #[test]
    fn length_parsing() {
        assert_eq!(parse_length("0:45"), Some(45));
        assert_eq!(parse_length("1:30"), Some(90));
        assert_eq!(parse_length("1:00:05"), Some(3605));
        assert_eq!(parse_length("abc"), None);
        assert_eq!(parse_length(""), None);
    }

    #[test]
    fn length_bounds_are_inclusive() {
        let filter = RecordingFilter::from_config(&XenoCantoConfig::default());
        let mut rec = Recording {
            cnt: "Canada".to_string(),
            q: "b".to_string(),
            length: "0:03".to_string(),
            ..Recording::default()
        };
        assert!(filter.accepts(&rec));
        rec.length = "1:31".to_string();
        assert!(!filter.accepts(&rec));
    }

    #[test]
    fn urls_are_upgraded() {
        assert_eq!(normalize_file_url("//a/b"), "https://a/b");
        assert_eq!(normalize_file_url("http://a/b"), "https://a/b");
        assert_eq!(normalize_file_url("https://a/b"), "https://a/b");
    }

    #[test]
    fn empty_api_key_rejected() {
        let err = XenoCantoClient::new(&XenoCantoConfig::default(), "  ".to_string())
            .err()
            .unwrap();
        assert!(matches!(err, Error::MissingApiKey));
    }
}
