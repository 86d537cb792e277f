//! Host platform detection.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::PlatformConfig;

/// Host the renderer runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    MacOs,
    RaspberryPi,
    Linux,
    Other,
}

impl Platform {
    /// Resolve the platform: a non-empty override wins, otherwise the
    /// compile target decides.
    pub fn detect(config: &PlatformConfig) -> Self {
        let forced = config.override_platform.trim();
        if !forced.is_empty() {
            match Self::from_name(forced) {
                Some(platform) => return platform,
                None => tracing::warn!(value = forced, "unknown platform override, auto-detecting"),
            }
        }
        if !config.auto_detect {
            return Platform::Other;
        }
        Self::from_target(std::env::consts::OS, std::env::consts::ARCH)
    }

    fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "macos" | "darwin" => Some(Platform::MacOs),
            "raspberry_pi" | "raspberrypi" | "rpi" => Some(Platform::RaspberryPi),
            "linux" => Some(Platform::Linux),
            "other" => Some(Platform::Other),
            _ => None,
        }
    }

    fn from_target(os: &str, arch: &str) -> Self {
        match (os, arch) {
            ("macos", _) => Platform::MacOs,
            ("linux", "arm" | "aarch64") => Platform::RaspberryPi,
            ("linux", _) => Platform::Linux,
            _ => Platform::Other,
        }
    }

    /// Whether a Linux framebuffer device can be expected.
    pub fn has_framebuffer(self) -> bool {
        matches!(self, Platform::RaspberryPi | Platform::Linux)
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Platform::MacOs => "macos",
            Platform::RaspberryPi => "raspberry_pi",
            Platform::Linux => "linux",
            Platform::Other => "other",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_override_wins() {
        let config = PlatformConfig { auto_detect: true, override_platform: "raspberry_pi".into() };
        assert_eq!(Platform::detect(&config), Platform::RaspberryPi);

        let config = PlatformConfig { auto_detect: false, override_platform: "MacOS".into() };
        assert_eq!(Platform::detect(&config), Platform::MacOs);
    }

    #[test]
    fn test_from_target() {
        assert_eq!(Platform::from_target("macos", "aarch64"), Platform::MacOs);
        assert_eq!(Platform::from_target("linux", "aarch64"), Platform::RaspberryPi);
        assert_eq!(Platform::from_target("linux", "arm"), Platform::RaspberryPi);
        assert_eq!(Platform::from_target("linux", "x86_64"), Platform::Linux);
        assert_eq!(Platform::from_target("windows", "x86_64"), Platform::Other);
    }

    #[test]
    fn test_auto_detect_disabled() {
        let config = PlatformConfig { auto_detect: false, override_platform: String::new() };
        assert_eq!(Platform::detect(&config), Platform::Other);
    }

    #[test]
    fn test_framebuffer_platforms() {
        assert!(Platform::RaspberryPi.has_framebuffer());
        assert!(!Platform::MacOs.has_framebuffer());
    }
}
