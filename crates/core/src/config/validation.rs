//! Configuration validation rules.
//!
//! Checks `AppConfig` values after they have been merged from environment,
//! file, and defaults. Enum-valued settings (transition effect, output kind)
//! are already rejected during extraction.

use crate::config::AppConfig;
use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },

    #[error("missing required configuration: {field} ({hint})")]
    Missing { field: String, hint: String },

    #[error("failed to persist configuration: {0}")]
    Persist(String),
}

fn invalid(field: &str, reason: &str) -> ConfigError {
    ConfigError::Invalid { field: field.into(), reason: reason.into() }
}

impl AppConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - `image.jpeg_quality` is outside 1..=100
    /// - `image.max_cache_size_mb` is 0
    /// - `image.eviction_target` is outside (0, 1]
    /// - `display.fps` is 0 or above 240
    /// - `transitions.duration` is not a finite positive number
    /// - `performance.retry.max_attempts` is 0
    /// - `performance.retry.initial_delay` is negative or not finite
    /// - `performance.file_check_interval` is not a finite positive number
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=100).contains(&self.image.jpeg_quality) {
            return Err(invalid("image.jpeg_quality", "must be between 1 and 100"));
        }
        if self.image.max_cache_size_mb == 0 {
            return Err(invalid("image.max_cache_size_mb", "must be greater than 0"));
        }
        let target = self.image.eviction_target;
        if target.is_nan() || target <= 0.0 || target > 1.0 {
            return Err(invalid("image.eviction_target", "must be in (0, 1]"));
        }

        if self.display.fps == 0 || self.display.fps > 240 {
            return Err(invalid("display.fps", "must be between 1 and 240"));
        }
        if !self.transitions.duration.is_finite() || self.transitions.duration <= 0.0 {
            return Err(invalid("transitions.duration", "must be greater than 0"));
        }

        if self.performance.retry.max_attempts == 0 {
            return Err(invalid("performance.retry.max_attempts", "must be at least 1"));
        }
        let delay = self.performance.retry.initial_delay;
        if !delay.is_finite() || delay < 0.0 {
            return Err(invalid("performance.retry.initial_delay", "must be a finite, non-negative number"));
        }
        if !self.performance.file_check_interval.is_finite() || self.performance.file_check_interval <= 0.0 {
            return Err(invalid("performance.file_check_interval", "must be greater than 0"));
        }

        if !(0.0..=1.0).contains(&self.effects.ambient_light.intensity) {
            tracing::warn!(
                intensity = self.effects.ambient_light.intensity,
                "effects.ambient_light.intensity outside 0..=1 will be clamped"
            );
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field_of(result: Result<(), ConfigError>) -> String {
        match result {
            Err(ConfigError::Invalid { field, .. }) => field,
            other => panic!("expected Invalid, got {other:?}"),
        }
    }

    #[test]
    fn test_validate_default_config() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_jpeg_quality_bounds() {
        let mut config = AppConfig::default();
        config.image.jpeg_quality = 0;
        assert_eq!(field_of(config.validate()), "image.jpeg_quality");

        config.image.jpeg_quality = 101;
        assert_eq!(field_of(config.validate()), "image.jpeg_quality");

        config.image.jpeg_quality = 100;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_cache_size_zero() {
        let mut config = AppConfig::default();
        config.image.max_cache_size_mb = 0;
        assert_eq!(field_of(config.validate()), "image.max_cache_size_mb");
    }

    #[test]
    fn test_validate_eviction_target() {
        let mut config = AppConfig::default();
        config.image.eviction_target = 0.0;
        assert_eq!(field_of(config.validate()), "image.eviction_target");

        config.image.eviction_target = 1.5;
        assert_eq!(field_of(config.validate()), "image.eviction_target");

        config.image.eviction_target = 1.0;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_fps() {
        let mut config = AppConfig::default();
        config.display.fps = 0;
        assert_eq!(field_of(config.validate()), "display.fps");

        config.display.fps = 241;
        assert_eq!(field_of(config.validate()), "display.fps");
    }

    #[test]
    fn test_validate_durations() {
        let mut config = AppConfig::default();
        config.transitions.duration = 0.0;
        assert_eq!(field_of(config.validate()), "transitions.duration");

        let mut config = AppConfig::default();
        config.performance.file_check_interval = -0.1;
        assert_eq!(field_of(config.validate()), "performance.file_check_interval");
    }

    #[test]
    fn test_validate_rejects_non_finite_seconds() {
        let mut config = AppConfig::default();
        config.transitions.duration = f64::INFINITY;
        assert_eq!(field_of(config.validate()), "transitions.duration");

        let mut config = AppConfig::default();
        config.performance.file_check_interval = f64::INFINITY;
        assert_eq!(field_of(config.validate()), "performance.file_check_interval");

        let mut config = AppConfig::default();
        config.performance.retry.initial_delay = f64::INFINITY;
        assert_eq!(field_of(config.validate()), "performance.retry.initial_delay");

        config.performance.retry.initial_delay = f64::NAN;
        assert_eq!(field_of(config.validate()), "performance.retry.initial_delay");
    }

    #[test]
    fn test_validate_retry_attempts() {
        let mut config = AppConfig::default();
        config.performance.retry.max_attempts = 0;
        assert_eq!(field_of(config.validate()), "performance.retry.max_attempts");
    }
}
