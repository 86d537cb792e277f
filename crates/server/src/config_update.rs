//! Dot-path edits of the persisted TOML configuration.
//!
//! Updates are merged into the document on disk, the merged document is
//! extracted as a full `AppConfig` to validate it, and only then is it
//! written back atomically. Running components keep the configuration they
//! started with; changes apply on the next start.

use std::path::Path;

use coverframe_core::AppConfig;
use coverframe_core::config::ConfigError;
use coverframe_core::publish::atomic_write;

use crate::error::ApiError;

/// Set `key` (e.g. `transitions.effect`) to `value` in a TOML document.
///
/// Missing intermediate tables are created. Returns the new document text
/// after checking that it still yields a valid configuration.
pub fn merge_key(document: &str, key: &str, value: serde_json::Value) -> Result<String, ApiError> {
    let segments: Vec<&str> = key.split('.').map(str::trim).collect();
    if segments.iter().any(|s| s.is_empty()) {
        return Err(ApiError::BadRequest(format!("invalid config key '{key}'")));
    }

    let mut root: toml::Table = if document.trim().is_empty() {
        toml::Table::new()
    } else {
        document
            .parse()
            .map_err(|e| ConfigError::LoadFailed(format!("existing config is not valid TOML: {e}")))?
    };

    let value = toml::Value::try_from(value)
        .map_err(|e| ApiError::BadRequest(format!("value for '{key}' cannot be stored in TOML: {e}")))?;

    let (leaf, parents) = match segments.split_last() {
        Some(split) => split,
        None => return Err(ApiError::BadRequest("config key is required".into())),
    };

    let mut table = &mut root;
    for segment in parents {
        let entry = table
            .entry(segment.to_string())
            .or_insert_with(|| toml::Value::Table(toml::Table::new()));
        table = match entry {
            toml::Value::Table(inner) => inner,
            _ => return Err(ApiError::BadRequest(format!("'{segment}' in '{key}' is not a section"))),
        };
    }
    table.insert(leaf.to_string(), value);

    let updated = toml::to_string(&root).map_err(|e| ConfigError::Persist(e.to_string()))?;
    AppConfig::from_toml_str(&updated)?;
    Ok(updated)
}

/// Apply one update to the file at `path`. A missing file starts empty.
pub fn update_file(path: &Path, key: &str, value: serde_json::Value) -> Result<(), ApiError> {
    let current = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
        Err(e) => return Err(ConfigError::Persist(format!("{}: {e}", path.display())).into()),
    };

    let updated = merge_key(&current, key, value)?;
    atomic_write(path, updated.as_bytes())?;
    tracing::info!(key, path = %path.display(), "configuration updated");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_merge_into_existing_section() {
        let doc = "[image]\njpeg_quality = 90\n";
        let updated = merge_key(doc, "image.target_size", json!(600)).unwrap();
        let config = AppConfig::from_toml_str(&updated).unwrap();
        assert_eq!(config.image.jpeg_quality, 90);
        assert_eq!(config.image.target_size, 600);
    }

    #[test]
    fn test_merge_creates_missing_tables() {
        let updated = merge_key("", "performance.retry.max_attempts", json!(2)).unwrap();
        let config = AppConfig::from_toml_str(&updated).unwrap();
        assert_eq!(config.performance.retry.max_attempts, 2);
    }

    #[test]
    fn test_invalid_value_is_rejected() {
        let result = merge_key("", "image.jpeg_quality", json!(0));
        assert!(matches!(result, Err(ApiError::Config(ConfigError::Invalid { .. }))));

        let result = merge_key("", "transitions.effect", json!("wipe"));
        assert!(matches!(result, Err(ApiError::Config(ConfigError::LoadFailed(_)))));
    }

    #[test]
    fn test_bad_keys() {
        assert!(matches!(merge_key("", "image..size", json!(1)), Err(ApiError::BadRequest(_))));
        assert!(matches!(merge_key("", "", json!(1)), Err(ApiError::BadRequest(_))));
        assert!(matches!(
            merge_key("[display]\nfps = 30\n", "display.fps.max", json!(1)),
            Err(ApiError::BadRequest(_))
        ));
        assert!(matches!(merge_key("", "display.fps", json!(null)), Err(ApiError::BadRequest(_))));
    }

    #[test]
    fn test_update_file_leaves_invalid_edit_unapplied() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("coverframe.toml");
        std::fs::write(&path, "[display]\nfps = 30\n").unwrap();

        update_file(&path, "display.fps", json!(24)).unwrap();
        assert!(std::fs::read_to_string(&path).unwrap().contains("fps = 24"));

        assert!(update_file(&path, "display.fps", json!(0)).is_err());
        assert!(std::fs::read_to_string(&path).unwrap().contains("fps = 24"));
    }
}
