use std::path::{Path, PathBuf};

use tokio::sync::Mutex;

use coverframe_client::FetchPipeline;
use coverframe_core::{ArtworkCache, Publisher};

/// Shared application state
pub struct AppState {
    pipeline: FetchPipeline,
    config_path: PathBuf,
    /// Serializes read-modify-write cycles on the config file.
    config_lock: Mutex<()>,
}

impl AppState {
    pub fn new(pipeline: FetchPipeline, config_path: impl Into<PathBuf>) -> Self {
        Self { pipeline, config_path: config_path.into(), config_lock: Mutex::new(()) }
    }

    pub fn pipeline(&self) -> &FetchPipeline {
        &self.pipeline
    }

    pub fn cache(&self) -> &ArtworkCache {
        self.pipeline.cache()
    }

    pub fn publisher(&self) -> &Publisher {
        self.pipeline.publisher()
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn config_lock(&self) -> &Mutex<()> {
        &self.config_lock
    }
}
