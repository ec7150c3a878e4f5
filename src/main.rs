use anyhow::{Context, Result};
use clap::Parser;
use transcript_api::cli::{Cli, Command};
use transcript_api::config::Config;
use transcript_api::provider::CaptionProvider;
use transcript_api::server::Server;
use transcript_api::youtube::InnerTubeProvider;
use transcript_api::{extract_video_id, format_captions, list_languages};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load environment variables from .env file
    dotenv::dotenv().ok();

    // Load configuration from environment
    let config = Config::from_env()
        .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?;

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("transcript_api={},tower_http=debug", config.log_level).into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match cli.command() {
        Command::Serve => serve(config).await,
        Command::Transcript { url, language, json } => {
            let provider = InnerTubeProvider::new(config.provider_timeout())?;
            let video_id = extract_video_id(&url)?;
            let entries = provider
                .fetch_captions(&video_id, language.as_deref())
                .await
                .with_context(|| format!("Failed to fetch transcript for {}", video_id))?;

            if json {
                let body = serde_json::json!({
                    "video_id": video_id,
                    "language": language,
                    "transcript": format_captions(&entries),
                });
                println!("{}", serde_json::to_string_pretty(&body)?);
            } else {
                println!("{}", format_captions(&entries));
            }
            Ok(())
        }
        Command::Languages { url, json } => {
            let provider = InnerTubeProvider::new(config.provider_timeout())?;
            let video_id = extract_video_id(&url)?;
            let catalog = provider
                .list_transcripts(&video_id)
                .await
                .with_context(|| format!("Failed to list transcripts for {}", video_id))?;
            let languages = list_languages(&catalog);

            if json {
                println!("{}", serde_json::to_string_pretty(&languages)?);
            } else {
                for language in languages {
                    println!("{}\t{}\t{:?}", language.code, language.name, language.kind);
                }
            }
            Ok(())
        }
    }
}

async fn serve(config: Config) -> Result<()> {
    tracing::info!("Starting transcript API service");
    tracing::info!(
        "Configuration: bind_addr={}, environment={}, rate_limit={}, verify_api_key={}",
        config.bind_addr,
        config.environment,
        config.rate_limit,
        config.verify_api_key
    );

    // Create and run the server
    let server = Server::new(config)
        .map_err(|e| anyhow::anyhow!("Failed to create server: {}", e))?;

    server
        .run()
        .await
        .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;

    Ok(())
}
