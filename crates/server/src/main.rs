use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mediaconv_core::{
    load_config, load_config_or_default, validate_config, Config, Engine, FfmpegEngine,
    ImageToVideo, VideoToAudio,
};

use mediaconv_server::api::create_router;
use mediaconv_server::state::AppState;

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Environment variable naming the configuration file.
const CONFIG_ENV: &str = "MEDIACONV_CONFIG";

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let config = load();
    init_logging(config.as_ref().is_ok_and(|c| c.logging.json));
    let config = config?;

    validate_config(&config)?;

    info!(version = VERSION, "Configuration loaded successfully");
    match &config.engine.assets {
        Some(assets) => info!("Engine assets fetched from {}", assets.base_url),
        None => info!(
            "Engine binaries: {:?}, {:?}",
            config.engine.ffmpeg_path, config.engine.ffprobe_path
        ),
    }

    // One engine per workflow, each with its own scratch directory
    let image_to_video = ImageToVideo::new(create_engine(&config)?);
    let video_to_audio = VideoToAudio::new(create_engine(&config)?);

    let state = Arc::new(AppState::new(config.clone(), image_to_video, video_to_audio));

    // Create router
    let app = create_router(Arc::clone(&state));

    // Start server
    let addr = SocketAddr::new(config.server.host, config.server.port);
    info!("Starting server on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutting down...");

    // Dropping the workflows drops their engines, which removes the scratch
    // directories. A conversion still running holds its own reference.
    if Arc::strong_count(&state) > 1 {
        warn!("A conversion is still running; its scratch directory is removed when it ends");
    }
    drop(state);

    Ok(())
}

/// Loads the configuration file named by `MEDIACONV_CONFIG`, or `config.toml`
/// if present.
fn load() -> Result<Config> {
    match std::env::var(CONFIG_ENV) {
        Ok(path) => {
            let path = PathBuf::from(path);
            load_config(&path).with_context(|| format!("Failed to load config from {:?}", path))
        }
        Err(_) => {
            let path = PathBuf::from("config.toml");
            load_config_or_default(&path)
                .with_context(|| format!("Failed to load config from {:?}", path))
        }
    }
}

fn init_logging(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,tower_http=debug".into());
    let registry = tracing_subscriber::registry().with(filter);

    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

fn create_engine(config: &Config) -> Result<Arc<dyn Engine>> {
    let engine = FfmpegEngine::new(config.engine.clone())
        .context("Failed to create engine scratch directory")?;
    Ok(Arc::new(engine))
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
