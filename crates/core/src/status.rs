//! Display status token shared between the control surface and the renderer.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Whether the renderer should show artwork.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DisplayStatus {
    #[default]
    Running,
    Paused,
    Stopped,
}

/// Unrecognized status token.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown display status: {0:?}")]
pub struct ParseStatusError(pub String);

impl DisplayStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            DisplayStatus::Running => "RUNNING",
            DisplayStatus::Paused => "PAUSED",
            DisplayStatus::Stopped => "STOPPED",
        }
    }

    /// Compact encoding for lock-free sharing across threads.
    pub fn as_u8(self) -> u8 {
        match self {
            DisplayStatus::Running => 0,
            DisplayStatus::Paused => 1,
            DisplayStatus::Stopped => 2,
        }
    }

    pub fn from_u8(value: u8) -> Self {
        match value {
            1 => DisplayStatus::Paused,
            2 => DisplayStatus::Stopped,
            _ => DisplayStatus::Running,
        }
    }

    /// Read the persisted token.
    ///
    /// A missing file means nothing has paused the display yet, so it reads
    /// as `Running`. An unreadable or unknown token also falls back to
    /// `Running` after logging.
    pub fn read_from(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(raw) => raw.parse().unwrap_or_else(|e: ParseStatusError| {
                tracing::warn!(path = %path.display(), "{e}, treating as RUNNING");
                DisplayStatus::Running
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => DisplayStatus::Running,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "failed to read display status");
                DisplayStatus::Running
            }
        }
    }
}

impl fmt::Display for DisplayStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DisplayStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "RUNNING" => Ok(DisplayStatus::Running),
            "PAUSED" => Ok(DisplayStatus::Paused),
            "STOPPED" => Ok(DisplayStatus::Stopped),
            _ => Err(ParseStatusError(s.trim().to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_case_insensitive() {
        assert_eq!("paused".parse::<DisplayStatus>().unwrap(), DisplayStatus::Paused);
        assert_eq!(" Running\n".parse::<DisplayStatus>().unwrap(), DisplayStatus::Running);
        assert_eq!("STOPPED".parse::<DisplayStatus>().unwrap(), DisplayStatus::Stopped);
        assert!("sleeping".parse::<DisplayStatus>().is_err());
    }

    #[test]
    fn test_display_is_upper_case() {
        assert_eq!(DisplayStatus::Paused.to_string(), "PAUSED");
    }

    #[test]
    fn test_u8_encoding() {
        for status in [DisplayStatus::Running, DisplayStatus::Paused, DisplayStatus::Stopped] {
            assert_eq!(DisplayStatus::from_u8(status.as_u8()), status);
        }
    }

    #[test]
    fn test_read_missing_file_is_running() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(DisplayStatus::read_from(&dir.path().join("none.txt")), DisplayStatus::Running);
    }

    #[test]
    fn test_read_lower_case_token() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("display_status.txt");
        std::fs::write(&path, "stopped\n").unwrap();
        assert_eq!(DisplayStatus::read_from(&path), DisplayStatus::Stopped);
    }
}
