//! Request validation for the submission endpoint
//!
//! Parses the raw JSON payload into a [`DownloadRequest`] and applies the
//! checks that can be answered without touching the network. Whether the URL
//! actually resolves to a downloadable video is yt-dlp's problem and surfaces
//! later as a job failure in the log.

use crate::format::Quality;
use serde::Deserialize;
use thiserror::Error;

/// Host that submitted URLs must reference
pub const SUPPORTED_HOST: &str = "youtube.com";

fn default_format() -> String {
    "1080p".to_string()
}

/// A download submission as sent by the extension
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct DownloadRequest {
    /// Video page URL
    #[serde(default)]
    pub url: String,
    /// Quality selector label; unknown labels fall back to 1080p downstream
    #[serde(default = "default_format")]
    pub format: String,
    /// When set, the selector is ignored and audio is extracted instead
    #[serde(default, rename = "audioOnly")]
    pub audio_only: bool,
}

impl DownloadRequest {
    /// The parsed quality selector
    pub fn quality(&self) -> Quality {
        Quality::parse(&self.format)
    }

    /// Format label for log lines ("audio" when the audio flag is set)
    pub fn format_label(&self) -> &str {
        if self.audio_only {
            "audio"
        } else {
            &self.format
        }
    }
}

/// Why a submission was rejected before a job was launched
///
/// The Display strings are the exact error messages returned to the client.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// The body was not JSON of the expected shape
    #[error("Bad request body")]
    MalformedBody(#[from] serde_json::Error),

    /// `url` was missing, empty, or not a YouTube URL
    #[error("Invalid YouTube URL")]
    InvalidUrl,
}

/// Parse and validate a raw request body
///
/// The body must be a JSON object. A missing `format` defaults to 1080p and
/// a missing `audioOnly` to false. The URL check is substring containment on
/// the host name; a missing `url` field deserializes to the empty string and
/// fails the same check.
pub fn parse_request(raw: &[u8]) -> Result<DownloadRequest, ValidationError> {
    // An object is required up front: with every field defaulted, the derived
    // impl would otherwise accept a JSON array as well
    let fields: serde_json::Map<String, serde_json::Value> = serde_json::from_slice(raw)?;
    let request: DownloadRequest = serde_json::from_value(serde_json::Value::Object(fields))?;

    if request.url.is_empty() || !request.url.contains(SUPPORTED_HOST) {
        return Err(ValidationError::InvalidUrl);
    }

    Ok(request)
}
