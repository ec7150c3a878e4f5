pub mod captions;
pub mod cli;
pub mod config;
pub mod config_validator;
pub mod error;
pub mod handlers;
pub mod health;
pub mod languages;
pub mod metrics;
pub mod middleware;
pub mod provider;
pub mod rate_limiter;
pub mod response;
pub mod server;
pub mod validation;
pub mod video_id;
pub mod youtube;

pub use captions::{format_captions, CaptionEntry};
pub use config::Config;
pub use error::{ApiError, Result};
pub use languages::{list_languages, TranscriptKind, TranscriptLanguage};
pub use provider::{CaptionProvider, ProviderError};
pub use rate_limiter::{RateDecision, RateLimiter};
pub use server::create_app;
pub use video_id::{extract_video_id, VideoId};
