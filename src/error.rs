use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::provider::ProviderError;
use crate::video_id::InvalidUrl;

pub type Result<T> = std::result::Result<T, ApiError>;

#[derive(Debug, Clone, thiserror::Error)]
pub enum ApiError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Invalid YouTube URL")]
    InvalidUrl,

    #[error("{}", no_captions_message(.language.as_deref()))]
    NoCaptions { language: Option<String> },

    #[error("This video is unavailable or does not exist")]
    VideoUnavailable,

    #[error("Captions provider error: {0}")]
    ProviderFailure(String),

    #[error("Too many requests. Please try again later.")]
    RateLimitExceeded,

    #[error("Unauthorized - Invalid or missing API key")]
    Unauthorized,

    #[error("Forbidden - Invalid referrer")]
    ForbiddenReferrer,

    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    #[error("Internal server error: {0}")]
    InternalError(String),
}

fn no_captions_message(language: Option<&str>) -> String {
    match language {
        Some(code) => format!("Transcript not available in the selected language ({})", code),
        None => "Transcript not available for this video".to_string(),
    }
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::InvalidRequest(_) | ApiError::InvalidUrl => StatusCode::BAD_REQUEST,
            ApiError::ValidationError(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::NoCaptions { .. } | ApiError::VideoUnavailable => StatusCode::NOT_FOUND,
            ApiError::ProviderFailure(_) => StatusCode::BAD_GATEWAY,
            ApiError::RateLimitExceeded => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::ForbiddenReferrer => StatusCode::FORBIDDEN,
            ApiError::ConfigurationError(_) | ApiError::InternalError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::InvalidRequest(_) => "bad_request",
            ApiError::ValidationError(_) => "validation_error",
            ApiError::InvalidUrl => "invalid_url",
            ApiError::NoCaptions { .. } => "transcript_not_available",
            ApiError::VideoUnavailable => "video_unavailable",
            ApiError::ProviderFailure(_) => "provider_error",
            ApiError::RateLimitExceeded => "rate_limit_exceeded",
            ApiError::Unauthorized => "unauthorized",
            ApiError::ForbiddenReferrer => "forbidden",
            ApiError::ConfigurationError(_) => "configuration_error",
            ApiError::InternalError(_) => "internal_error",
        }
    }

    /// Hide server-side detail unless detailed errors are enabled.
    pub fn redact(self, detailed: bool) -> Self {
        if detailed || !self.status_code().is_server_error() {
            return self;
        }
        match self {
            ApiError::ProviderFailure(_) => {
                ApiError::ProviderFailure("An error occurred while processing your request".to_string())
            }
            _ => ApiError::InternalError("Internal server error".to_string()),
        }
    }
}

impl From<InvalidUrl> for ApiError {
    fn from(_: InvalidUrl) -> Self {
        ApiError::InvalidUrl
    }
}

impl From<ProviderError> for ApiError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::TranscriptsDisabled => ApiError::NoCaptions { language: None },
            ProviderError::NoTranscriptFound { requested } => ApiError::NoCaptions { language: requested },
            ProviderError::VideoUnavailable(_) => ApiError::VideoUnavailable,
            ProviderError::Failure(msg) => ApiError::ProviderFailure(msg),
        }
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(err: validator::ValidationErrors) -> Self {
        ApiError::ValidationError(err.to_string())
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub code: u16,
}

impl ErrorResponse {
    pub fn new(error: &str, message: &str, code: u16) -> Self {
        Self {
            error: error.to_string(),
            message: message.to_string(),
            code,
        }
    }

    pub fn from_api_error(err: &ApiError) -> Self {
        let status = err.status_code();
        let message = match err {
            ApiError::ProviderFailure(msg)
            | ApiError::InternalError(msg)
            | ApiError::ConfigurationError(msg) => msg.clone(),
            _ => err.to_string(),
        };
        Self::new(err.kind(), &message, status.as_u16())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse::from_api_error(&self);
        let mut response = (status, Json(body)).into_response();

        if matches!(self, ApiError::RateLimitExceeded) {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from_static("60"));
        }

        response
    }
}
