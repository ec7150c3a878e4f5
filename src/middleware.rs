use axum::extract::{ConnectInfo, Request, State};
use axum::http::HeaderValue;
use axum::middleware::Next;
use axum::response::Response;
use std::net::SocketAddr;
use std::time::Instant;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::ApiError;
use crate::handlers::SharedState;
use crate::validation::RequestValidator;

/// Logging middleware for request/response tracking
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let client_ip = get_client_ip(&request);
    let request_id = Uuid::new_v4().to_string();

    info!(
        target: "transcript_api::middleware",
        request_id = %request_id,
        method = %method,
        uri = %uri,
        client_ip = %client_ip,
        "Incoming request"
    );

    let mut response = next.run(request).await;

    let status = response.status();
    info!(
        target: "transcript_api::middleware",
        request_id = %request_id,
        method = %method,
        uri = %uri,
        status = %status,
        "Request completed"
    );

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert("x-request-id", value);
    }

    response
}

/// Rejects clients that exceeded the per-minute request limit
pub async fn rate_limit_middleware(
    State(state): State<SharedState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if !state.rate_limiter.is_enabled() {
        return Ok(next.run(request).await);
    }

    let client_ip = get_client_ip(&request);
    let now = Instant::now();
    let decision = state
        .rate_limiter
        .check(&client_ip, now)
        .map_err(|err| err.redact(state.config.detailed_errors))?;
    state
        .metrics
        .record_request(&client_ip, decision.is_allowed(), now)
        .await;

    if !decision.is_allowed() {
        warn!(
            target: "transcript_api::middleware",
            client_ip = %client_ip,
            limit = state.rate_limiter.requests_per_minute(),
            "Rate limit exceeded"
        );
        return Err(ApiError::RateLimitExceeded);
    }

    Ok(next.run(request).await)
}

/// Enforces the API key and referrer allowlist
pub async fn access_middleware(
    State(state): State<SharedState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let config = &state.config;

    if config.verify_api_key {
        let expected = config.api_key.as_deref().unwrap_or_default();
        if let Err(err) = RequestValidator::validate_api_key(request.headers(), expected) {
            warn!(
                target: "transcript_api::middleware",
                client_ip = %get_client_ip(&request),
                "Invalid or missing API key"
            );
            return Err(err);
        }
    }

    if let Err(err) = RequestValidator::validate_referrer(request.headers(), &state.referrers) {
        warn!(
            target: "transcript_api::middleware",
            client_ip = %get_client_ip(&request),
            referrer = ?request.headers().get("referer"),
            "Invalid referrer"
        );
        return Err(err);
    }

    Ok(next.run(request).await)
}

pub fn get_client_ip(request: &Request) -> String {
    // Try to get real IP from headers first
    if let Some(forwarded) = request.headers().get("x-forwarded-for") {
        if let Ok(forwarded_str) = forwarded.to_str() {
            if let Some(first_ip) = forwarded_str.split(',').next() {
                let first_ip = first_ip.trim();
                if !first_ip.is_empty() {
                    return first_ip.to_string();
                }
            }
        }
    }

    if let Some(real_ip) = request.headers().get("x-real-ip") {
        if let Ok(ip_str) = real_ip.to_str() {
            return ip_str.trim().to_string();
        }
    }

    // Fallback to connection info
    if let Some(ConnectInfo(addr)) = request.extensions().get::<ConnectInfo<SocketAddr>>() {
        addr.ip().to_string()
    } else {
        "unknown".to_string()
    }
}
