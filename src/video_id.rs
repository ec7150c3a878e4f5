//! Video identifier extraction from YouTube URLs.

use regex::Regex;
use serde::Serialize;
use std::fmt;
use std::sync::LazyLock;

static SHORTS_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/shorts/([0-9A-Za-z_-]{11})").expect("valid shorts pattern"));

static VIDEO_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:v=|/)([0-9A-Za-z_-]{11})").expect("valid video pattern"));

/// An 11-character YouTube video identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct VideoId(String);

impl VideoId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn watch_url(&self) -> String {
        format!("https://www.youtube.com/watch?v={}", self.0)
    }
}

impl fmt::Display for VideoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for VideoId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Returned when no video id can be found in the input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid YouTube URL")]
pub struct InvalidUrl;

/// Extract the video id from a YouTube URL.
///
/// A `/shorts/<id>` segment wins over everything else; otherwise the first
/// `v=<id>` or `/<id>` occurrence is used.
pub fn extract_video_id(url: &str) -> Result<VideoId, InvalidUrl> {
    let url = url.trim();

    if url.contains("/shorts/") {
        if let Some(caps) = SHORTS_PATTERN.captures(url) {
            return Ok(VideoId(caps[1].to_string()));
        }
    }

    VIDEO_PATTERN
        .captures(url)
        .map(|caps| VideoId(caps[1].to_string()))
        .ok_or(InvalidUrl)
}
