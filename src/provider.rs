//! Captions provider seam.
//!
//! Handlers only talk to a [`CaptionProvider`]; the production implementation
//! lives in [`crate::youtube`], tests plug in their own.

use async_trait::async_trait;

use crate::captions::CaptionEntry;
use crate::languages::TranscriptCatalog;
use crate::video_id::VideoId;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ProviderError {
    #[error("Transcripts are disabled for this video")]
    TranscriptsDisabled,

    #[error("No transcript found{}", language_suffix(.requested.as_deref()))]
    NoTranscriptFound { requested: Option<String> },

    #[error("Video unavailable: {0}")]
    VideoUnavailable(String),

    #[error("{0}")]
    Failure(String),
}

fn language_suffix(language: Option<&str>) -> String {
    language.map(|l| format!(" for language {}", l)).unwrap_or_default()
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        ProviderError::Failure(format!("HTTP request failed: {}", err))
    }
}

pub type ProviderResult<T> = std::result::Result<T, ProviderError>;

#[async_trait]
pub trait CaptionProvider: Send + Sync {
    /// Fetch caption entries, optionally in a preferred language.
    async fn fetch_captions(
        &self,
        video_id: &VideoId,
        language: Option<&str>,
    ) -> ProviderResult<Vec<CaptionEntry>>;

    /// List the transcripts available for a video.
    async fn list_transcripts(&self, video_id: &VideoId) -> ProviderResult<TranscriptCatalog>;
}
