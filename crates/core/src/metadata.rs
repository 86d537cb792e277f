//! Track metadata record shared by the cache, the publisher, and the renderer.

use serde::{Deserialize, Serialize};

/// Metadata published alongside the current artwork.
///
/// Serialized as `current_metadata.json`. Exactly one of `itunes_url` /
/// `spotify_url` is normally present, depending on which provider matched.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TrackMetadata {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub artist: String,
    #[serde(default)]
    pub album: String,
    #[serde(default)]
    pub genre: String,
    #[serde(default)]
    pub release_date: String,
    /// Duration rendered as `M:SS`, empty when unknown.
    #[serde(default)]
    pub track_time: String,
    #[serde(default)]
    pub preview_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub itunes_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spotify_url: Option<String>,
}

impl TrackMetadata {
    /// Record shown by the renderer before anything has been published.
    pub fn placeholder() -> Self {
        Self {
            title: "Ready".into(),
            artist: "Waiting for remote command...".into(),
            ..Default::default()
        }
    }

    /// Link to the track page on whichever provider supplied it.
    pub fn source_url(&self) -> Option<&str> {
        self.itunes_url.as_deref().or(self.spotify_url.as_deref())
    }

    /// Replace empty identity fields with their "Unknown" labels.
    pub fn with_unknown_defaults(mut self) -> Self {
        if self.title.is_empty() {
            self.title = "Unknown Title".into();
        }
        if self.artist.is_empty() {
            self.artist = "Unknown Artist".into();
        }
        if self.album.is_empty() {
            self.album = "Unknown Album".into();
        }
        self
    }
}

/// Format a duration in milliseconds as `M:SS`.
///
/// Zero or missing durations render as an empty string.
pub fn format_track_time(millis: Option<u64>) -> String {
    match millis {
        None | Some(0) => String::new(),
        Some(ms) => {
            let seconds = ms / 1000;
            format!("{}:{:02}", seconds / 60, seconds % 60)
        }
    }
}

/// Keep only the `YYYY-MM-DD` prefix of a provider release date.
pub fn truncate_release_date(raw: &str) -> String {
    raw.chars().take(10).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_track_time() {
        assert_eq!(format_track_time(Some(225_000)), "3:45");
        assert_eq!(format_track_time(Some(61_999)), "1:01");
        assert_eq!(format_track_time(Some(5_000)), "0:05");
        assert_eq!(format_track_time(Some(0)), "");
        assert_eq!(format_track_time(None), "");
    }

    #[test]
    fn test_truncate_release_date() {
        assert_eq!(truncate_release_date("1973-03-01T08:00:00Z"), "1973-03-01");
        assert_eq!(truncate_release_date("1973"), "1973");
        assert_eq!(truncate_release_date(""), "");
    }

    #[test]
    fn test_serialization_skips_absent_source() {
        let meta = TrackMetadata {
            title: "Time".into(),
            itunes_url: Some("https://music.apple.com/x".into()),
            ..Default::default()
        };
        let json = serde_json::to_value(&meta).unwrap();
        assert_eq!(json["itunes_url"], "https://music.apple.com/x");
        assert!(json.get("spotify_url").is_none());
        assert_eq!(meta.source_url(), Some("https://music.apple.com/x"));
    }

    #[test]
    fn test_deserialize_partial_record() {
        let meta: TrackMetadata = serde_json::from_str(r#"{"title":"Money","artist":"Pink Floyd"}"#).unwrap();
        assert_eq!(meta.title, "Money");
        assert!(meta.album.is_empty());
        assert!(meta.source_url().is_none());
    }

    #[test]
    fn test_unknown_defaults() {
        let meta = TrackMetadata { artist: "Can".into(), ..Default::default() }.with_unknown_defaults();
        assert_eq!(meta.title, "Unknown Title");
        assert_eq!(meta.artist, "Can");
        assert_eq!(meta.album, "Unknown Album");
    }
}
