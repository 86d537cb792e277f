//! coverframe control server.
//!
//! Accepts search terms over HTTP, resolves them to artwork through the
//! fetch pipeline, and publishes the result for the display process.
//! Logging goes to stderr; set `COVERFRAME_LOG_JSON=1` for JSON lines.

mod api;
mod config_update;
mod error;
mod state;

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use coverframe_client::providers::itunes::ItunesConfig;
use coverframe_client::providers::spotify::SpotifyConfig;
use coverframe_client::{ArtworkFetcher, FetchConfig, FetchPipeline, ItunesClient, PipelineConfig, Provider, SpotifyClient};
use coverframe_core::{AppConfig, ArtworkCache, DisplayStatus, Publisher};

use api::create_router;
use state::AppState;

#[tokio::main]
async fn main() {
    init_tracing();
    if let Err(e) = run().await {
        error!("Fatal error: {e:#}");
        std::process::exit(1);
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr);

    if std::env::var("COVERFRAME_LOG_JSON").is_ok_and(|v| v == "1") {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn build_providers(config: &AppConfig) -> Result<Vec<Arc<dyn Provider>>> {
    let mut providers: Vec<Arc<dyn Provider>> = Vec::new();

    if config.music.itunes.enabled {
        let itunes = ItunesClient::new(ItunesConfig {
            timeout: config.search_timeout(),
            target_size: config.target_size(),
            ..Default::default()
        })
        .context("Failed to build iTunes client")?;
        providers.push(Arc::new(itunes));
    }

    if let Some((id, secret)) = config.spotify_credentials()? {
        let spotify = SpotifyClient::new(SpotifyConfig { timeout: config.search_timeout(), ..SpotifyConfig::new(id, secret) })
            .context("Failed to build Spotify client")?;
        providers.push(Arc::new(spotify));
    }

    if providers.is_empty() {
        warn!("No music providers enabled, only cached artwork can be shown");
    }
    Ok(providers)
}

async fn run() -> Result<()> {
    let config_path = AppConfig::config_path();
    info!("Loading configuration from {:?}", config_path);
    let config = AppConfig::load_from(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    info!(platform = %config.platform(), cache_dir = ?config.cache_dir(), "Configuration loaded");

    let cache = ArtworkCache::open(config.cache_dir(), config.max_cache_bytes(), config.eviction_target())
        .await
        .context("Failed to open artwork cache")?;
    match cache.db().purge_expired_search().await {
        Ok(0) => {}
        Ok(purged) => info!(purged, "Purged expired search answers"),
        Err(e) => warn!(error = %e, "Failed to purge expired search answers"),
    }

    let publisher = Publisher::from_paths(&config.paths);
    let providers = build_providers(&config)?;
    let downloader = ArtworkFetcher::new(FetchConfig {
        timeout: config.download_timeout(),
        max_bytes: config.performance.max_download_bytes,
        ..Default::default()
    })
    .context("Failed to build artwork downloader")?;

    let pipeline =
        FetchPipeline::new(cache, publisher.clone(), providers, Arc::new(downloader), PipelineConfig::from_app(&config));

    publisher.publish_status(DisplayStatus::Running).context("Failed to publish initial status")?;

    let state = Arc::new(AppState::new(pipeline, config_path));
    let app = create_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutting down");
    Ok(())
}

/// Wait for Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {e}");
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
                error!("Failed to install SIGTERM handler: {e}");
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
