use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tower::ServiceExt;
use transcript_api::{
    config::Config,
    handlers::AppState,
    languages::{CaptionTrack, TranscriptCatalog},
    provider::{CaptionProvider, ProviderError, ProviderResult},
    server::create_app,
    CaptionEntry, VideoId,
};

/// Provider that answers from fixed data and counts its calls.
#[derive(Default)]
struct StubProvider {
    fetch_error: Option<ProviderError>,
    list_error: Option<ProviderError>,
    calls: AtomicUsize,
}

#[async_trait]
impl CaptionProvider for StubProvider {
    async fn fetch_captions(
        &self,
        _video_id: &VideoId,
        language: Option<&str>,
    ) -> ProviderResult<Vec<CaptionEntry>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = &self.fetch_error {
            return Err(err.clone());
        }
        match language {
            None | Some("en") => Ok(vec![
                CaptionEntry::new(75.0, "hello"),
                CaptionEntry::new(5.0, "world"),
            ]),
            Some(other) => Err(ProviderError::NoTranscriptFound {
                requested: Some(other.to_string()),
            }),
        }
    }

    async fn list_transcripts(&self, video_id: &VideoId) -> ProviderResult<TranscriptCatalog> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = &self.list_error {
            return Err(err.clone());
        }
        Ok(TranscriptCatalog::new(
            video_id.clone(),
            vec![
                CaptionTrack {
                    language_code: "en".to_string(),
                    language: "English (auto-generated)".to_string(),
                    is_generated: Some(true),
                    is_translatable: true,
                },
                CaptionTrack {
                    language_code: "de".to_string(),
                    language: "German".to_string(),
                    is_generated: Some(false),
                    is_translatable: true,
                },
            ],
        ))
    }
}

fn app_with(config: Config, provider: StubProvider) -> (Router, Arc<StubProvider>) {
    let provider = Arc::new(provider);
    let state = Arc::new(AppState::new(config, provider.clone()));
    (create_app(state), provider)
}

fn app() -> Router {
    app_with(Config::default(), StubProvider::default()).0
}

fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn json_body(response: axum::response::Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_post_transcript() {
    let response = app()
        .oneshot(post_json(
            "/api/transcript",
            serde_json::json!({"url": "https://www.youtube.com/watch?v=ddcZnW1HKUY"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));

    let body = json_body(response).await;
    assert_eq!(body["video_id"], "ddcZnW1HKUY");
    assert_eq!(body["transcript"], "[1:15] hello\n[0:05] world");
    assert_eq!(body["status"], "success");
}

#[tokio::test]
async fn test_get_transcript_with_short_link() {
    let response = app()
        .oneshot(get("/api/transcript?url=https%3A%2F%2Fyoutu.be%2FddcZnW1HKUY%3Ft%3D5&language=en"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["video_id"], "ddcZnW1HKUY");
    assert_eq!(body["language"], "en");
}

#[tokio::test]
async fn test_transcript_invalid_url() {
    let response = app()
        .oneshot(post_json("/api/transcript", serde_json::json!({"url": "https://example.com/"})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["error"], "invalid_url");
    assert_eq!(body["code"], 400);
}

#[tokio::test]
async fn test_transcript_missing_url_and_bad_json() {
    let response = app()
        .oneshot(post_json("/api/transcript", serde_json::json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["message"], "Invalid request: Missing YouTube URL");

    let request = Request::builder()
        .method("POST")
        .uri("/api/transcript")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["error"], "bad_request");
}

#[tokio::test]
async fn test_transcript_language_not_available() {
    let response = app()
        .oneshot(post_json(
            "/api/transcript",
            serde_json::json!({"url": "https://youtu.be/ddcZnW1HKUY", "language": "fr"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = json_body(response).await;
    assert_eq!(body["error"], "transcript_not_available");
    assert_eq!(
        body["message"],
        "Transcript not available in the selected language (fr)"
    );
}

#[tokio::test]
async fn test_transcript_video_unavailable() {
    let provider = StubProvider {
        fetch_error: Some(ProviderError::VideoUnavailable("Private video".to_string())),
        ..StubProvider::default()
    };
    let (app, _) = app_with(Config::default(), provider);

    let response = app
        .oneshot(post_json("/api/transcript", serde_json::json!({"url": "https://youtu.be/ddcZnW1HKUY"})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(json_body(response).await["error"], "video_unavailable");
}

#[tokio::test]
async fn test_provider_failure_is_redacted() {
    let provider = StubProvider {
        fetch_error: Some(ProviderError::Failure("connect to 10.1.2.3 refused".to_string())),
        ..StubProvider::default()
    };
    let (app, _) = app_with(Config::default(), provider);

    let response = app
        .oneshot(post_json("/api/transcript", serde_json::json!({"url": "https://youtu.be/ddcZnW1HKUY"})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let body = json_body(response).await;
    assert_eq!(body["error"], "provider_error");
    assert!(!body["message"].as_str().unwrap().contains("10.1.2.3"));
}

#[tokio::test]
async fn test_provider_failure_detail_when_enabled() {
    let provider = StubProvider {
        fetch_error: Some(ProviderError::Failure("connect refused".to_string())),
        ..StubProvider::default()
    };
    let config = Config {
        detailed_errors: true,
        ..Config::default()
    };
    let (app, _) = app_with(config, provider);

    let response = app
        .oneshot(post_json("/api/transcript", serde_json::json!({"url": "https://youtu.be/ddcZnW1HKUY"})))
        .await
        .unwrap();

    assert_eq!(json_body(response).await["message"], "connect refused");
}

#[tokio::test]
async fn test_languages() {
    let response = app()
        .oneshot(get("/api/languages?url=https://www.youtube.com/shorts/ddcZnW1HKUY"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], "success");
    assert_eq!(
        body["languages"],
        serde_json::json!([
            {"code": "de", "name": "German", "type": "manual"},
            {"code": "en", "name": "English (auto-generated)", "type": "generated"}
        ])
    );
}

#[tokio::test]
async fn test_languages_disabled() {
    let provider = StubProvider {
        list_error: Some(ProviderError::TranscriptsDisabled),
        ..StubProvider::default()
    };
    let (app, provider) = app_with(Config::default(), provider);

    let response = app
        .oneshot(post_json("/api/languages", serde_json::json!({"url": "https://youtu.be/ddcZnW1HKUY"})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(json_body(response).await["error"], "transcript_not_available");
    // No probe for a definitive answer.
    assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_languages_fallback_when_listing_fails() {
    let provider = StubProvider {
        list_error: Some(ProviderError::Failure("unexpected page layout".to_string())),
        ..StubProvider::default()
    };
    let (app, _) = app_with(Config::default(), provider);

    let response = app
        .oneshot(post_json("/api/languages", serde_json::json!({"url": "https://youtu.be/ddcZnW1HKUY"})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], "fallback");
    assert_eq!(body["languages"].as_array().unwrap().len(), 4);
    assert!(body["note"].is_string());
}

#[tokio::test]
async fn test_languages_failure_when_probe_fails() {
    let provider = StubProvider {
        list_error: Some(ProviderError::Failure("unexpected page layout".to_string())),
        fetch_error: Some(ProviderError::Failure("blocked".to_string())),
        ..StubProvider::default()
    };
    let (app, _) = app_with(Config::default(), provider);

    let response = app
        .oneshot(post_json("/api/languages", serde_json::json!({"url": "https://youtu.be/ddcZnW1HKUY"})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn test_diagnostic() {
    let provider = StubProvider {
        list_error: Some(ProviderError::Failure("layout".to_string())),
        ..StubProvider::default()
    };
    let (app, _) = app_with(Config::default(), provider);

    let response = app
        .oneshot(post_json("/api/diagnostic", serde_json::json!({"url": "https://youtu.be/ddcZnW1HKUY"})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["video_id"], "ddcZnW1HKUY");
    assert_eq!(body["list_transcripts_success"], false);
    assert_eq!(body["fetch_success"], true);
    assert_eq!(body["entry_count"], 2);
    assert_eq!(body["sample"], "[1:15] hello");
    assert_eq!(body["errors"], serde_json::json!(["provider_error"]));
}

#[tokio::test]
async fn test_rate_limit_exceeded() {
    let config = Config {
        rate_limit: 2,
        ..Config::default()
    };
    let (app, _) = app_with(config, StubProvider::default());

    for i in 0..3 {
        let request = Request::builder()
            .uri("/api/transcript?url=https://youtu.be/ddcZnW1HKUY")
            .header("x-forwarded-for", "203.0.113.9")
            .body(Body::empty())
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();

        if i < 2 {
            assert_eq!(response.status(), StatusCode::OK);
        } else {
            assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
            assert_eq!(response.headers().get("retry-after").unwrap(), "60");
            assert_eq!(json_body(response).await["error"], "rate_limit_exceeded");
        }
    }

    // Another client is unaffected.
    let request = Request::builder()
        .uri("/api/transcript?url=https://youtu.be/ddcZnW1HKUY")
        .header("x-forwarded-for", "203.0.113.10")
        .body(Body::empty())
        .unwrap();
    assert_eq!(app.clone().oneshot(request).await.unwrap().status(), StatusCode::OK);

    let metrics = json_body(app.oneshot(get("/metrics")).await.unwrap()).await;
    assert_eq!(metrics["rate_limit"]["limited_requests"], 1);
    assert_eq!(metrics["rate_limit"]["total_requests"], 4);
}

#[tokio::test]
async fn test_api_key_required() {
    let config = Config {
        verify_api_key: true,
        api_key: Some("secret".to_string()),
        ..Config::default()
    };
    let (app, provider) = app_with(config, StubProvider::default());

    let response = app
        .clone()
        .oneshot(post_json("/api/transcript", serde_json::json!({"url": "https://youtu.be/ddcZnW1HKUY"})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(provider.calls.load(Ordering::SeqCst), 0);

    let mut request = post_json("/api/transcript", serde_json::json!({"url": "https://youtu.be/ddcZnW1HKUY"}));
    request.headers_mut().insert("x-api-key", "secret".parse().unwrap());
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_referrer_allowlist() {
    let config = Config {
        allowed_referrers: "*.vercel.app,localhost:3002".to_string(),
        ..Config::default()
    };
    let (app, _) = app_with(config, StubProvider::default());

    let mut request = get("/api/languages?url=https://youtu.be/ddcZnW1HKUY");
    request
        .headers_mut()
        .insert("referer", "https://evil.example.com/".parse().unwrap());
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(json_body(response).await["error"], "forbidden");

    let mut request = get("/api/languages?url=https://youtu.be/ddcZnW1HKUY");
    request
        .headers_mut()
        .insert("referer", "https://demo.vercel.app/".parse().unwrap());
    assert_eq!(app.oneshot(request).await.unwrap().status(), StatusCode::OK);
}

#[tokio::test]
async fn test_cors_preflight() {
    let request = Request::builder()
        .method("OPTIONS")
        .uri("/api/transcript")
        .header("origin", "https://example.com")
        .header("access-control-request-method", "POST")
        .header("access-control-request-headers", "content-type,x-api-key")
        .body(Body::empty())
        .unwrap();

    let response = app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("access-control-allow-origin").unwrap(),
        "*"
    );
}

#[tokio::test]
async fn test_index_and_health_endpoints() {
    let app = app();

    let body = json_body(app.clone().oneshot(get("/")).await.unwrap()).await;
    assert_eq!(body["status"], "success");
    assert_eq!(body["environment"], "development");

    let response = app.clone().oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], "healthy");

    let response = app.oneshot(get("/ready")).await.unwrap();
    assert_eq!(json_body(response).await["status"], "ready");
}

#[tokio::test]
async fn test_empty_language_selects_default_track() {
    let response = app()
        .oneshot(post_json(
            "/api/transcript",
            serde_json::json!({"url": "https://youtu.be/ddcZnW1HKUY", "language": ""}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert!(body["language"].is_null());
    assert_eq!(body["transcript"], "[1:15] hello\n[0:05] world");

    let response = app()
        .oneshot(get("/api/transcript?url=https://youtu.be/ddcZnW1HKUY&language="))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_referrer_query_cannot_spoof_wildcard() {
    let config = Config {
        allowed_referrers: "*.vercel.app".to_string(),
        ..Config::default()
    };
    let (app, provider) = app_with(config, StubProvider::default());

    let mut request = get("/api/languages?url=https://youtu.be/ddcZnW1HKUY");
    request
        .headers_mut()
        .insert("referer", "https://evil.example.com?.vercel.app".parse().unwrap());
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
}
