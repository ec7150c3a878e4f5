use axum::{
    extract::{rejection::JsonRejection, rejection::QueryRejection, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::captions::format_captions;
use crate::config::Config;
use crate::error::ApiError;
use crate::health::HealthChecker;
use crate::languages::{common_languages, list_languages};
use crate::metrics::MetricsCollector;
use crate::provider::{CaptionProvider, ProviderError};
use crate::rate_limiter::RateLimiter;
use crate::response::{DiagnosticReport, IndexResponse, LanguagesResponse, TranscriptResponse};
use crate::validation::{RequestValidator, TranscriptRequest, UrlRequest};
use crate::video_id::VideoId;

/// Shared application state
pub type SharedState = Arc<AppState>;

/// Application state shared by every request
pub struct AppState {
    pub config: Arc<Config>,
    pub referrers: Vec<String>,
    pub rate_limiter: Arc<RateLimiter>,
    pub provider: Arc<dyn CaptionProvider>,
    pub metrics: MetricsCollector,
    pub health: HealthChecker,
}

impl AppState {
    pub fn new(config: Config, provider: Arc<dyn CaptionProvider>) -> Self {
        let rate_limiter = Arc::new(RateLimiter::new(config.rate_limit));
        Self {
            referrers: config.referrer_patterns(),
            config: Arc::new(config),
            health: HealthChecker::new(rate_limiter.clone()),
            rate_limiter,
            provider,
            metrics: MetricsCollector::new(),
        }
    }

    /// Record the outcome for an endpoint and redact server-side detail.
    async fn finish<T>(&self, endpoint: &str, result: Result<T, ApiError>) -> Result<T, ApiError> {
        self.metrics.record_endpoint(endpoint, result.is_ok()).await;
        result.map_err(|err| {
            if err.status_code().is_server_error() {
                error!(endpoint, error = %err, "Request failed");
            } else {
                warn!(endpoint, error = %err, "Request rejected");
            }
            err.redact(self.config.detailed_errors)
        })
    }
}

fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| ApiError::InvalidRequest(rejection.body_text()))
}

fn query_params<T>(params: Result<Query<T>, QueryRejection>) -> Result<T, ApiError> {
    params
        .map(|Query(params)| params)
        .map_err(|rejection| ApiError::InvalidRequest(rejection.body_text()))
}

/// Service banner
pub async fn index(State(state): State<SharedState>) -> impl IntoResponse {
    Json(IndexResponse::new(&state.config.environment))
}

/// Fetch a formatted transcript from a JSON body
pub async fn post_transcript(
    State(state): State<SharedState>,
    payload: Result<Json<TranscriptRequest>, JsonRejection>,
) -> Result<Json<TranscriptResponse>, ApiError> {
    let result = match json_body(payload) {
        Ok(request) => transcript(&state, request).await,
        Err(err) => Err(err),
    };
    state.finish("transcript", result).await.map(Json)
}

/// Fetch a formatted transcript from query parameters
pub async fn get_transcript(
    State(state): State<SharedState>,
    params: Result<Query<TranscriptRequest>, QueryRejection>,
) -> Result<Json<TranscriptResponse>, ApiError> {
    let result = match query_params(params) {
        Ok(request) => transcript(&state, request).await,
        Err(err) => Err(err),
    };
    state.finish("transcript", result).await.map(Json)
}

async fn transcript(
    state: &AppState,
    request: TranscriptRequest,
) -> Result<TranscriptResponse, ApiError> {
    let (video_id, language) = RequestValidator::validate_transcript_request(&request)?;
    info!(
        video_id = %video_id,
        language = language.as_deref().unwrap_or("auto"),
        "Processing transcript request"
    );

    let entries = state
        .provider
        .fetch_captions(&video_id, language.as_deref())
        .await?;

    Ok(TranscriptResponse::success(
        video_id,
        language,
        format_captions(&entries),
    ))
}

/// List transcript languages from a JSON body
pub async fn post_languages(
    State(state): State<SharedState>,
    payload: Result<Json<UrlRequest>, JsonRejection>,
) -> Result<Json<LanguagesResponse>, ApiError> {
    let result = match json_body(payload) {
        Ok(request) => languages(&state, request).await,
        Err(err) => Err(err),
    };
    state.finish("languages", result).await.map(Json)
}

/// List transcript languages from query parameters
pub async fn get_languages(
    State(state): State<SharedState>,
    params: Result<Query<UrlRequest>, QueryRejection>,
) -> Result<Json<LanguagesResponse>, ApiError> {
    let result = match query_params(params) {
        Ok(request) => languages(&state, request).await,
        Err(err) => Err(err),
    };
    state.finish("languages", result).await.map(Json)
}

async fn languages(state: &AppState, request: UrlRequest) -> Result<LanguagesResponse, ApiError> {
    let video_id = RequestValidator::validate_url_request(&request)?;
    info!(video_id = %video_id, "Processing languages request");

    match state.provider.list_transcripts(&video_id).await {
        Ok(catalog) => Ok(LanguagesResponse::success(video_id, list_languages(&catalog))),
        Err(ProviderError::Failure(reason)) => {
            warn!(
                video_id = %video_id,
                error = %reason,
                "Language listing failed, probing for any transcript"
            );
            probe_fallback(state, video_id, reason).await
        }
        Err(err) => Err(err.into()),
    }
}

async fn probe_fallback(
    state: &AppState,
    video_id: VideoId,
    reason: String,
) -> Result<LanguagesResponse, ApiError> {
    match state.provider.fetch_captions(&video_id, None).await {
        Ok(_) => Ok(LanguagesResponse::fallback(video_id, common_languages())),
        Err(_) => Err(ApiError::ProviderFailure(reason)),
    }
}

/// Probe the provider for a video and report what worked
pub async fn diagnostic(
    State(state): State<SharedState>,
    payload: Result<Json<UrlRequest>, JsonRejection>,
) -> Result<Json<DiagnosticReport>, ApiError> {
    let result = match json_body(payload) {
        Ok(request) => run_diagnostic(&state, request).await,
        Err(err) => Err(err),
    };
    state.finish("diagnostic", result).await.map(Json)
}

async fn run_diagnostic(state: &AppState, request: UrlRequest) -> Result<DiagnosticReport, ApiError> {
    let video_id = RequestValidator::validate_url_request(&request)?;
    let detailed = state.config.detailed_errors;
    let describe = |err: ProviderError| {
        let api_error = ApiError::from(err.clone());
        if detailed {
            format!("{}: {}", api_error.kind(), err)
        } else {
            api_error.kind().to_string()
        }
    };

    let mut report = DiagnosticReport {
        url: request.url.clone(),
        video_id: Some(video_id.clone()),
        status: "diagnostic".to_string(),
        ..DiagnosticReport::default()
    };

    match state.provider.list_transcripts(&video_id).await {
        Ok(catalog) => {
            report.list_transcripts_success = true;
            report.transcript_count = catalog.len();
            report.available_transcripts = list_languages(&catalog);
        }
        Err(err) => report.errors.push(describe(err)),
    }

    match state.provider.fetch_captions(&video_id, None).await {
        Ok(entries) => {
            report.fetch_success = true;
            report.entry_count = entries.len();
            report.sample = entries.first().map(|entry| format_captions(std::slice::from_ref(entry)));
        }
        Err(err) => report.errors.push(describe(err)),
    }

    info!(
        video_id = %video_id,
        list_success = report.list_transcripts_success,
        fetch_success = report.fetch_success,
        "Diagnostic completed"
    );

    Ok(report)
}

/// Request counters
pub async fn metrics(State(state): State<SharedState>) -> impl IntoResponse {
    Json(state.metrics.snapshot().await)
}

/// Health check endpoint
pub async fn health_check(State(state): State<SharedState>) -> impl IntoResponse {
    Json(state.health.check_health())
}

/// Readiness check endpoint
pub async fn readiness_check(State(state): State<SharedState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(serde_json::json!({
            "status": "ready",
            "rate_limiting": state.rate_limiter.is_enabled(),
            "api_key_required": state.config.verify_api_key
        })),
    )
}
