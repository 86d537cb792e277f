//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (COVERFRAME_*, `__` separates nested keys)
//! 2. TOML config file (COVERFRAME_CONFIG_FILE, default `coverframe.toml`)
//! 3. Built-in defaults
//!
//! The rest of the workspace reads configuration through the typed accessors
//! on [`AppConfig`] rather than by key path.

use std::path::{Path, PathBuf};
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

use crate::retry::RetryPolicy;

mod platform;
mod validation;

pub use platform::Platform;
pub use validation::ConfigError;

/// Environment variable naming the TOML config file.
pub const CONFIG_FILE_ENV: &str = "COVERFRAME_CONFIG_FILE";

/// Config file used when [`CONFIG_FILE_ENV`] is unset.
pub const DEFAULT_CONFIG_FILE: &str = "coverframe.toml";

/// Target size used when `image.target_size` is 0.
pub const DEFAULT_TARGET_SIZE: u32 = 720;

/// Seconds as a `Duration`, or `fallback` when the value does not fit.
fn seconds(value: f64, fallback: Duration) -> Duration {
    Duration::try_from_secs_f64(value).unwrap_or(fallback)
}

/// Application configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub display: DisplayConfig,
    pub image: ImageConfig,
    pub transitions: TransitionConfig,
    pub effects: EffectsConfig,
    pub overlays: OverlaysConfig,
    pub music: MusicConfig,
    pub server: ServerConfig,
    pub performance: PerformanceConfig,
    pub platform: PlatformConfig,
    pub paths: PathsConfig,
}

/// Screen geometry and output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Width in pixels, 0 to use the image target size.
    pub width: u32,
    /// Height in pixels, 0 to use the image target size.
    pub height: u32,
    pub fps: u32,
    /// Image shown before any content is published.
    pub fallback_image: PathBuf,
    /// Linux framebuffer device used by the framebuffer output.
    pub framebuffer: PathBuf,
    pub output: OutputKind,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            width: 0,
            height: 0,
            fps: 60,
            fallback_image: PathBuf::from("default_art.jpg"),
            framebuffer: PathBuf::from("/dev/fb0"),
            output: OutputKind::Auto,
        }
    }
}

/// Where rendered frames go.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputKind {
    /// Framebuffer when the platform has one, headless otherwise.
    #[default]
    Auto,
    Framebuffer,
    Headless,
}

/// Image normalization and artwork cache bounds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageConfig {
    /// Square edge in pixels, 0 for the built-in default.
    pub target_size: u32,
    pub jpeg_quality: u8,
    pub cache_dir: PathBuf,
    pub max_cache_size_mb: u64,
    /// Fraction of the budget eviction shrinks the cache down to.
    pub eviction_target: f64,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            target_size: 0,
            jpeg_quality: 95,
            cache_dir: PathBuf::from("image_cache"),
            max_cache_size_mb: 500,
            eviction_target: 0.8,
        }
    }
}

/// Transition effect between two pieces of artwork.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransitionEffect {
    #[default]
    Fade,
    Slide,
    Zoom,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransitionConfig {
    pub effect: TransitionEffect,
    /// Seconds.
    pub duration: f64,
}

impl Default for TransitionConfig {
    fn default() -> Self {
        Self { effect: TransitionEffect::Fade, duration: 1.0 }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EffectsConfig {
    pub ambient_light: AmbientLightConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AmbientLightConfig {
    pub enabled: bool,
    pub intensity: f32,
}

impl Default for AmbientLightConfig {
    fn default() -> Self {
        Self { enabled: true, intensity: 0.3 }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlaysConfig {
    pub metadata: MetadataOverlayConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverlayPosition {
    Top,
    #[default]
    Bottom,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetadataOverlayConfig {
    pub enabled: bool,
    pub position: OverlayPosition,
    /// Band height in pixels.
    pub height: u32,
}

impl Default for MetadataOverlayConfig {
    fn default() -> Self {
        Self { enabled: true, position: OverlayPosition::Bottom, height: 120 }
    }
}

/// Provider credentials and toggles.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MusicConfig {
    pub itunes: ItunesConfig,
    pub spotify: SpotifyConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ItunesConfig {
    pub enabled: bool,
}

impl Default for ItunesConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpotifyConfig {
    pub enabled: bool,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
}

/// Control server bind address and short-term response cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Seconds a provider response stays in the short-term cache.
    pub cache_duration: u64,
    /// Entries kept in the short-term cache before the oldest is dropped.
    pub search_cache_capacity: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: "0.0.0.0".into(), port: 5000, cache_duration: 3600, search_cache_capacity: 100 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PerformanceConfig {
    /// Seconds between polls of the published image.
    pub file_check_interval: f64,
    pub retry: RetryConfig,
    pub search_timeout_ms: u64,
    pub download_timeout_ms: u64,
    pub max_download_bytes: usize,
}

impl Default for PerformanceConfig {
    fn default() -> Self {
        Self {
            file_check_interval: 0.1,
            retry: RetryConfig::default(),
            search_timeout_ms: 10_000,
            download_timeout_ms: 15_000,
            max_download_bytes: 20 * 1024 * 1024,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_attempts: u32,
    /// Seconds.
    pub initial_delay: f64,
    pub exponential_backoff: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self { max_attempts: 4, initial_delay: 2.0, exponential_backoff: true }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlatformConfig {
    pub auto_detect: bool,
    /// Forces a platform (`macos`, `raspberry_pi`, `linux`) when non-empty.
    #[serde(rename = "override")]
    pub override_platform: String,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self { auto_detect: true, override_platform: String::new() }
    }
}

/// Locations of the published files shared with the renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub image: PathBuf,
    pub metadata: PathBuf,
    pub status: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            image: PathBuf::from("current_album_art.jpg"),
            metadata: PathBuf::from("current_metadata.json"),
            status: PathBuf::from("display_status.txt"),
        }
    }
}

impl AppConfig {
    /// Path of the TOML document: `COVERFRAME_CONFIG_FILE` or the default.
    pub fn config_path() -> PathBuf {
        std::env::var(CONFIG_FILE_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_FILE))
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file or environment cannot be parsed
    /// or validation fails after loading.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::config_path())
    }

    /// Load with an explicit TOML file. A missing file is not an error.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let figment = Figment::from(Serialized::defaults(Self::default()))
            .merge(Toml::file(path))
            .merge(
                Env::prefixed("COVERFRAME_")
                    .ignore(&["config_file"])
                    .map(|key| key.as_str().to_lowercase().into())
                    .split("__"),
            );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Build from a TOML document alone (defaults underneath, no environment).
    pub fn from_toml_str(document: &str) -> Result<Self, ConfigError> {
        let config: Self = Figment::from(Serialized::defaults(Self::default()))
            .merge(Toml::string(document))
            .extract()
            .map_err(|e| ConfigError::LoadFailed(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn cache_dir(&self) -> &Path {
        &self.image.cache_dir
    }

    pub fn max_cache_bytes(&self) -> u64 {
        self.image.max_cache_size_mb.saturating_mul(1024 * 1024)
    }

    pub fn eviction_target(&self) -> f64 {
        self.image.eviction_target
    }

    pub fn target_size(&self) -> u32 {
        if self.image.target_size > 0 { self.image.target_size } else { DEFAULT_TARGET_SIZE }
    }

    pub fn jpeg_quality(&self) -> u8 {
        self.image.jpeg_quality
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        let retry = &self.performance.retry;
        RetryPolicy {
            max_attempts: retry.max_attempts,
            initial_delay: seconds(retry.initial_delay.max(0.0), Duration::from_secs(2)),
            exponential: retry.exponential_backoff,
        }
    }

    pub fn file_check_interval(&self) -> Duration {
        seconds(self.performance.file_check_interval.max(0.001), Duration::from_millis(100))
    }

    pub fn search_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.server.cache_duration)
    }

    pub fn search_timeout(&self) -> Duration {
        Duration::from_millis(self.performance.search_timeout_ms)
    }

    pub fn download_timeout(&self) -> Duration {
        Duration::from_millis(self.performance.download_timeout_ms)
    }

    pub fn transition_duration(&self) -> Duration {
        seconds(self.transitions.duration.max(0.0), Duration::from_secs(1))
    }

    /// Display size, falling back to the square image size per axis.
    pub fn display_size(&self) -> (u32, u32) {
        let fallback = self.target_size();
        let width = if self.display.width > 0 { self.display.width } else { fallback };
        let height = if self.display.height > 0 { self.display.height } else { fallback };
        (width, height)
    }

    pub fn platform(&self) -> Platform {
        Platform::detect(&self.platform)
    }

    /// Spotify credentials when the provider is enabled.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` when Spotify is enabled without both
    /// client id and secret.
    pub fn spotify_credentials(&self) -> Result<Option<(&str, &str)>, ConfigError> {
        let spotify = &self.music.spotify;
        if !spotify.enabled {
            return Ok(None);
        }
        match (spotify.client_id.as_deref(), spotify.client_secret.as_deref()) {
            (Some(id), Some(secret)) if !id.is_empty() && !secret.is_empty() => Ok(Some((id, secret))),
            _ => Err(ConfigError::Missing {
                field: "music.spotify.client_id/client_secret".into(),
                hint: "Set COVERFRAME_MUSIC__SPOTIFY__CLIENT_ID and COVERFRAME_MUSIC__SPOTIFY__CLIENT_SECRET".into(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.display.fps, 60);
        assert_eq!(config.image.jpeg_quality, 95);
        assert_eq!(config.image.cache_dir, PathBuf::from("image_cache"));
        assert_eq!(config.image.max_cache_size_mb, 500);
        assert_eq!(config.transitions.effect, TransitionEffect::Fade);
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.server.cache_duration, 3600);
        assert_eq!(config.server.search_cache_capacity, 100);
        assert!(config.music.itunes.enabled);
        assert!(!config.music.spotify.enabled);
        assert_eq!(config.paths.status, PathBuf::from("display_status.txt"));
    }

    #[test]
    fn test_typed_accessors() {
        let config = AppConfig::default();
        assert_eq!(config.target_size(), 720);
        assert_eq!(config.max_cache_bytes(), 500 * 1024 * 1024);
        assert_eq!(config.file_check_interval(), Duration::from_millis(100));
        assert_eq!(config.search_cache_ttl(), Duration::from_secs(3600));
        assert_eq!(config.search_timeout(), Duration::from_secs(10));
        assert_eq!(config.download_timeout(), Duration::from_secs(15));
        assert_eq!(config.display_size(), (720, 720));

        let retry = config.retry_policy();
        assert_eq!(retry.max_attempts, 4);
        assert_eq!(retry.initial_delay, Duration::from_secs(2));
        assert!(retry.exponential);
    }

    #[test]
    fn test_from_toml_str_merges_over_defaults() {
        let config = AppConfig::from_toml_str(
            r#"
            [image]
            target_size = 600
            jpeg_quality = 80

            [transitions]
            effect = "zoom"
            duration = 0.5

            [display]
            width = 1024
            "#,
        )
        .unwrap();

        assert_eq!(config.target_size(), 600);
        assert_eq!(config.jpeg_quality(), 80);
        assert_eq!(config.transitions.effect, TransitionEffect::Zoom);
        assert_eq!(config.display_size(), (1024, 600));
        assert_eq!(config.image.max_cache_size_mb, 500);
    }

    #[test]
    fn test_duration_accessors_survive_infinite_values() {
        let mut config = AppConfig::default();
        config.performance.retry.initial_delay = f64::INFINITY;
        config.transitions.duration = f64::INFINITY;
        config.performance.file_check_interval = f64::INFINITY;

        assert_eq!(config.retry_policy().initial_delay, Duration::from_secs(2));
        assert_eq!(config.transition_duration(), Duration::from_secs(1));
        assert_eq!(config.file_check_interval(), Duration::from_millis(100));
    }

    #[test]
    fn test_from_toml_str_rejects_infinite_durations() {
        let result = AppConfig::from_toml_str("[performance.retry]\ninitial_delay = inf\n");
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "performance.retry.initial_delay"));

        let result = AppConfig::from_toml_str("[transitions]\nduration = inf\n");
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "transitions.duration"));
    }

    #[test]
    fn test_from_toml_str_rejects_unknown_effect() {
        let result = AppConfig::from_toml_str("[transitions]\neffect = \"wipe\"\n");
        assert!(matches!(result, Err(ConfigError::LoadFailed(_))));
    }

    #[test]
    fn test_load_from_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::load_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.image, ImageConfig::default());
    }

    #[test]
    fn test_spotify_credentials() {
        let mut config = AppConfig::default();
        assert!(config.spotify_credentials().unwrap().is_none());

        config.music.spotify.enabled = true;
        assert!(matches!(config.spotify_credentials(), Err(ConfigError::Missing { .. })));

        config.music.spotify.client_id = Some("id".into());
        config.music.spotify.client_secret = Some("secret".into());
        assert_eq!(config.spotify_credentials().unwrap(), Some(("id", "secret")));
    }
}
