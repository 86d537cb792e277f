//! coverframe display process.
//!
//! Watches the files published by the control server and renders them at a
//! fixed frame rate with transitions. Two concurrent units: the loader task
//! on the tokio runtime and the render loop on its own thread, joined by a
//! latest-wins slot.

mod colors;
mod compositor;
mod error;
mod loader;
mod overlay;
mod renderer;
mod sink;
mod slot;
mod transition;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Context, Result, anyhow};
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use coverframe_core::{AppConfig, Publisher};

use loader::{Loader, StatusCell, fallback_artwork};
use renderer::{RenderSettings, Renderer};
use slot::Slot;

#[tokio::main]
async fn main() {
    init_tracing();
    if let Err(e) = run().await {
        error!("Fatal error: {e:#}");
        std::process::exit(1);
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr);

    if std::env::var("COVERFRAME_LOG_JSON").is_ok_and(|v| v == "1") {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn run() -> Result<()> {
    let config_path = AppConfig::config_path();
    let config = AppConfig::load_from(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    let platform = config.platform();
    let settings = RenderSettings::from_config(&config);
    let (width, height) = settings.size;
    info!(%platform, width, height, fps = settings.fps, effect = ?settings.effect, "Starting display");

    let sink = sink::open_sink(config.display.output, platform, &config.display.framebuffer)
        .context("Failed to open frame sink")?;

    let fallback_path = config.display.fallback_image.clone();
    let initial = tokio::task::spawn_blocking(move || fallback_artwork(&fallback_path, width, height)).await?;

    let slot = Arc::new(Slot::new());
    let status = Arc::new(StatusCell::new(Publisher::from_paths(&config.paths).read_status()));
    let shutdown = Arc::new(AtomicBool::new(false));

    let loader = Loader::from_config(&config, Arc::clone(&slot), Arc::clone(&status));
    let loader_handle = tokio::spawn(loader.run(Arc::clone(&shutdown)));

    let renderer = Renderer::new(settings, initial, slot, status, sink);
    let render_shutdown = Arc::clone(&shutdown);
    let render_thread = std::thread::Builder::new()
        .name("coverframe-render".into())
        .spawn(move || renderer.run(&render_shutdown))
        .context("Failed to start render thread")?;

    let mut render_done = tokio::task::spawn_blocking(move || render_thread.join());
    let joined = tokio::select! {
        _ = shutdown_signal() => {
            info!("Shutting down");
            shutdown.store(true, Ordering::Release);
            render_done.await
        }
        joined = &mut render_done => joined,
    };
    shutdown.store(true, Ordering::Release);

    let frames = joined?
        .map_err(|_| anyhow!("render thread panicked"))?
        .context("Render loop failed")?;
    loader_handle.await.context("Loader task failed")?;

    info!(frames, "Display stopped");
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
