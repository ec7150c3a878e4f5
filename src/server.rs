use axum::http::{HeaderName, HeaderValue, Method};
use axum::routing::{get, post};
use axum::{middleware, Router};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::config_validator::ConfigValidator;
use crate::error::ApiError;
use crate::handlers::{
    diagnostic, get_languages, get_transcript, health_check, index, metrics, post_languages,
    post_transcript, readiness_check, AppState, SharedState,
};
use crate::middleware::{access_middleware, logging_middleware, rate_limit_middleware};
use crate::provider::CaptionProvider;
use crate::youtube::InnerTubeProvider;

/// Build the application router around shared state
pub fn create_app(state: SharedState) -> Router {
    let cors = cors_layer(&state.config);

    // Guards run outermost first: rate limit, then access checks.
    let api = Router::new()
        .route("/transcript", get(get_transcript).post(post_transcript))
        .route("/languages", get(get_languages).post(post_languages))
        .route("/diagnostic", post(diagnostic))
        .route_layer(middleware::from_fn_with_state(state.clone(), access_middleware))
        .route_layer(middleware::from_fn_with_state(state.clone(), rate_limit_middleware));

    Router::new()
        .route("/", get(index))
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
        .route("/metrics", get(metrics))
        .nest("/api", api)
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors)
                .layer(middleware::from_fn(logging_middleware)),
        )
}

fn cors_layer(config: &Config) -> CorsLayer {
    let origins = config.cors_origins();
    let layer = if origins.is_empty() || origins.iter().any(|o| o == "*") {
        CorsLayer::new().allow_origin(Any)
    } else {
        CorsLayer::new().allow_origin(AllowOrigin::list(
            origins.iter().filter_map(|o| o.parse::<HeaderValue>().ok()),
        ))
    };

    let methods = config.cors_methods();
    let layer = if methods.iter().any(|m| m == "*") {
        layer.allow_methods(Any)
    } else {
        layer.allow_methods(
            methods
                .iter()
                .filter_map(|m| m.to_uppercase().parse::<Method>().ok())
                .collect::<Vec<_>>(),
        )
    };

    let headers = config.cors_headers();
    if headers.iter().any(|h| h == "*") {
        layer.allow_headers(Any)
    } else {
        layer.allow_headers(
            headers
                .iter()
                .filter_map(|h| h.parse::<HeaderName>().ok())
                .collect::<Vec<_>>(),
        )
    }
}

pub struct Server {
    app: Router,
    addr: SocketAddr,
}

impl Server {
    /// Validate the configuration and wire up the YouTube provider
    pub fn new(config: Config) -> Result<Self, ApiError> {
        ConfigValidator::validate(&config)?;
        let provider = InnerTubeProvider::new(config.provider_timeout())
            .map_err(|e| ApiError::ConfigurationError(e.to_string()))?;
        Ok(Self::with_provider(config, Arc::new(provider)))
    }

    pub fn with_provider(config: Config, provider: Arc<dyn CaptionProvider>) -> Self {
        let addr = config.bind_addr;
        let state = Arc::new(AppState::new(config, provider));
        Self {
            app: create_app(state),
            addr,
        }
    }

    pub async fn run(self) -> Result<(), Box<dyn std::error::Error>> {
        let listener = tokio::net::TcpListener::bind(self.addr).await?;

        tracing::info!("Transcript API server listening on {}", self.addr);
        tracing::info!("Health check available at /health");
        tracing::info!("Transcript endpoint available at /api/transcript");

        // Run server with graceful shutdown
        axum::serve(
            listener,
            self.app
                .into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown_signal())
        .await?;

        Ok(())
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Received terminate signal, initiating graceful shutdown");
        },
    }
}
