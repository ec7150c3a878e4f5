use axum::http::HeaderMap;
use serde::Deserialize;
use url::Url;
use validator::Validate;

use crate::error::ApiError;
use crate::video_id::{extract_video_id, VideoId};

/// Body of a transcript request, also accepted as query parameters.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct TranscriptRequest {
    #[serde(default)]
    #[validate(length(max = 2048, message = "URL is too long"))]
    pub url: String,

    pub language: Option<String>,
}

/// Body of a languages or diagnostic request.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UrlRequest {
    #[serde(default)]
    #[validate(length(max = 2048, message = "URL is too long"))]
    pub url: String,
}

/// Request validation utilities
pub struct RequestValidator;

impl RequestValidator {
    /// Validates a transcript request and extracts its video id
    pub fn validate_transcript_request(
        request: &TranscriptRequest,
    ) -> Result<(VideoId, Option<String>), ApiError> {
        request.validate()?;
        let video_id = Self::validate_url(&request.url)?;

        // Empty or blank means auto-select.
        let language = request
            .language
            .as_deref()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string);

        if let Some(code) = &language {
            Self::validate_language_code(code)?;
        }

        Ok((video_id, language))
    }

    fn validate_language_code(code: &str) -> Result<(), ApiError> {
        if !(2..=16).contains(&code.len()) {
            return Err(ApiError::ValidationError(
                "language: Language code must be 2 to 16 characters".to_string(),
            ));
        }
        if !code.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_') {
            return Err(ApiError::ValidationError(
                "Language code can only contain letters, digits, hyphens, and underscores".to_string(),
            ));
        }
        Ok(())
    }

    /// Validates a languages or diagnostic request
    pub fn validate_url_request(request: &UrlRequest) -> Result<VideoId, ApiError> {
        request.validate()?;
        Self::validate_url(&request.url)
    }

    fn validate_url(url: &str) -> Result<VideoId, ApiError> {
        if url.trim().is_empty() {
            return Err(ApiError::InvalidRequest("Missing YouTube URL".to_string()));
        }
        Ok(extract_video_id(url)?)
    }

    /// Checks the X-API-Key header against the configured key
    pub fn validate_api_key(headers: &HeaderMap, expected: &str) -> Result<(), ApiError> {
        let provided = headers
            .get("x-api-key")
            .and_then(|v| v.to_str().ok())
            .ok_or(ApiError::Unauthorized)?;

        if provided != expected {
            return Err(ApiError::Unauthorized);
        }

        Ok(())
    }

    /// Checks the Referer header against allowed host patterns.
    ///
    /// An empty pattern list accepts any referrer, including none.
    pub fn validate_referrer(headers: &HeaderMap, allowed: &[String]) -> Result<(), ApiError> {
        if allowed.is_empty() {
            return Ok(());
        }

        let referrer = headers
            .get("referer")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");

        if referrer.is_empty() {
            return Err(ApiError::ForbiddenReferrer);
        }

        let (host, authority) = referrer_host(referrer).ok_or(ApiError::ForbiddenReferrer)?;
        let matched = allowed.iter().any(|pattern| match pattern.strip_prefix('*') {
            Some(suffix) => host.ends_with(suffix),
            None => *pattern == authority,
        });

        if matched {
            Ok(())
        } else {
            Err(ApiError::ForbiddenReferrer)
        }
    }
}

/// Host and `host[:port]` of an absolute referrer URL.
fn referrer_host(referrer: &str) -> Option<(String, String)> {
    let url = Url::parse(referrer).ok()?;
    let host = url.host_str()?.to_ascii_lowercase();
    let authority = match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.clone(),
    };
    Some((host, authority))
}
