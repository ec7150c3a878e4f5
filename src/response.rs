use serde::Serialize;

use crate::languages::TranscriptLanguage;
use crate::video_id::VideoId;

#[derive(Debug, Serialize)]
pub struct TranscriptResponse {
    pub video_id: VideoId,
    pub language: Option<String>,
    pub transcript: String,
    pub status: String,
}

impl TranscriptResponse {
    pub fn success(video_id: VideoId, language: Option<String>, transcript: String) -> Self {
        Self {
            video_id,
            language,
            transcript,
            status: "success".to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LanguagesResponse {
    pub video_id: VideoId,
    pub languages: Vec<TranscriptLanguage>,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl LanguagesResponse {
    pub fn success(video_id: VideoId, languages: Vec<TranscriptLanguage>) -> Self {
        Self {
            video_id,
            languages,
            status: "success".to_string(),
            note: None,
        }
    }

    pub fn fallback(video_id: VideoId, languages: Vec<TranscriptLanguage>) -> Self {
        Self {
            video_id,
            languages,
            status: "fallback".to_string(),
            note: Some(
                "Could not list specific languages. Common options provided - transcript extraction may still work."
                    .to_string(),
            ),
        }
    }
}

#[derive(Debug, Default, Serialize)]
pub struct DiagnosticReport {
    pub url: String,
    pub video_id: Option<VideoId>,
    pub status: String,
    pub list_transcripts_success: bool,
    pub transcript_count: usize,
    pub available_transcripts: Vec<TranscriptLanguage>,
    pub fetch_success: bool,
    pub entry_count: usize,
    pub sample: Option<String>,
    pub errors: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct IndexResponse {
    pub status: String,
    pub message: String,
    pub api_endpoints: Vec<String>,
    pub environment: String,
    pub version: String,
}

impl IndexResponse {
    pub fn new(environment: &str) -> Self {
        Self {
            status: "success".to_string(),
            message: "YouTube Transcript API is running".to_string(),
            api_endpoints: vec![
                "/api/transcript".to_string(),
                "/api/languages".to_string(),
                "/api/diagnostic".to_string(),
            ],
            environment: environment.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}
