//! Artwork download and normalization.
//!
//! ### Download gates
//! - Absolute `http`/`https` URLs only.
//! - Max redirects: 5.
//! - Max body bytes: 20MB (configurable), checked against
//!   `Content-Length` and again after the body is read.
//!
//! ### Normalization
//! Decode any format the `image` crate knows, drop alpha, resize to a square
//! of the target edge with Lanczos3, and re-encode as JPEG.

use std::io::Cursor;
use std::sync::{Arc, LazyLock};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use bytes::Bytes;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::ImageFormat;
use regex::Regex;
use reqwest::{Client, header};

use crate::providers::ProviderError;
use coverframe_core::Error;

static SIZE_TOKEN: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"\d+x\d+bb").ok());

/// Rewrite the `NNNxNNNbb` size token of a CDN artwork URL.
///
/// URLs without the token are returned unchanged.
pub fn upscale_artwork_url(url: &str, size: u32) -> String {
    match SIZE_TOKEN.as_ref() {
        Some(re) => re.replace(url, format!("{size}x{size}bb").as_str()).into_owned(),
        None => url.to_string(),
    }
}

/// Decode, flatten to RGB, resize to `size`x`size`, and encode as JPEG.
///
/// CPU-bound; call from a blocking context.
pub fn normalize_artwork(bytes: &[u8], size: u32, quality: u8) -> Result<Vec<u8>, Error> {
    let decoded = image::load_from_memory(bytes).map_err(|e| Error::Decode(format!("artwork: {e}")))?;
    let rgb = decoded.to_rgb8();
    let resized = image::imageops::resize(&rgb, size, size, FilterType::Lanczos3);

    let mut encoded = Vec::new();
    JpegEncoder::new_with_quality(&mut encoded, quality.clamp(1, 100))
        .encode_image(&resized)
        .map_err(|e| Error::Decode(format!("jpeg encode: {e}")))?;
    Ok(encoded)
}

/// Whether `bytes` start like a JPEG stream.
pub fn is_jpeg(bytes: &[u8]) -> bool {
    image::guess_format(bytes).is_ok_and(|f| f == ImageFormat::Jpeg)
}

/// Pixel dimensions of an encoded image without a full decode.
pub fn dimensions(bytes: &[u8]) -> Result<(u32, u32), Error> {
    image::ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| Error::Decode(e.to_string()))?
        .into_dimensions()
        .map_err(|e| Error::Decode(e.to_string()))
}

/// Something that can fetch artwork bytes by URL.
#[async_trait]
pub trait ArtworkSource: Send + Sync {
    async fn download(&self, url: &str) -> Result<Bytes, ProviderError>;
}

/// Configuration for the artwork fetcher.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// User agent string (default: "coverframe/0.1")
    pub user_agent: String,

    /// Maximum response body size in bytes (default: 20MB)
    pub max_bytes: usize,

    /// Request timeout (default: 15s)
    pub timeout: Duration,

    /// Maximum number of redirects to follow (default: 5)
    pub max_redirects: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: crate::providers::itunes::DEFAULT_USER_AGENT.to_string(),
            max_bytes: 20 * 1024 * 1024,
            timeout: Duration::from_millis(15_000),
            max_redirects: 5,
        }
    }
}

/// HTTP artwork downloader.
#[derive(Debug, Clone)]
pub struct ArtworkFetcher {
    http: Client,
    config: FetchConfig,
}

impl ArtworkFetcher {
    pub fn new(config: FetchConfig) -> Result<Self, ProviderError> {
        let http = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .use_rustls_tls()
            .build()
            .map_err(|e| ProviderError::Network(Arc::new(e)))?;

        Ok(Self { http, config })
    }

    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    fn validate_url(raw: &str) -> Result<url::Url, ProviderError> {
        let parsed = url::Url::parse(raw.trim()).map_err(|e| ProviderError::InvalidUrl(format!("{raw}: {e}")))?;
        match parsed.scheme() {
            "http" | "https" => Ok(parsed),
            other => Err(ProviderError::InvalidUrl(format!("{raw}: unsupported scheme {other}"))),
        }
    }
}

#[async_trait]
impl ArtworkSource for ArtworkFetcher {
    async fn download(&self, raw_url: &str) -> Result<Bytes, ProviderError> {
        let start = Instant::now();
        let url = Self::validate_url(raw_url)?;
        let limit = self.config.max_bytes;

        let response = self
            .http
            .get(url.as_str())
            .header(header::ACCEPT, "image/jpeg,image/png,image/*;q=0.8")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::from_status(status));
        }

        if let Some(len) = response.content_length()
            && len as usize > limit
        {
            return Err(ProviderError::TooLarge { size: len, limit });
        }

        let bytes = response.bytes().await?;
        if bytes.len() > limit {
            return Err(ProviderError::TooLarge { size: bytes.len() as u64, limit });
        }

        tracing::debug!(
            url = %url,
            bytes = bytes.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "downloaded artwork"
        );
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, Rgba, RgbaImage};

    fn png_with_alpha(width: u32, height: u32) -> Vec<u8> {
        let img = RgbaImage::from_pixel(width, height, Rgba([200, 40, 90, 128]));
        let mut out = Vec::new();
        DynamicImage::ImageRgba8(img).write_to(&mut Cursor::new(&mut out), ImageFormat::Png).unwrap();
        out
    }

    #[test]
    fn test_upscale_artwork_url() {
        assert_eq!(
            upscale_artwork_url("https://is1.mzstatic.com/image/thumb/x/100x100bb.jpg", 720),
            "https://is1.mzstatic.com/image/thumb/x/720x720bb.jpg"
        );
        assert_eq!(
            upscale_artwork_url("https://is1.mzstatic.com/image/thumb/x/60x60bb.jpg", 600),
            "https://is1.mzstatic.com/image/thumb/x/600x600bb.jpg"
        );
        assert_eq!(upscale_artwork_url("https://i.scdn.co/image/abc", 720), "https://i.scdn.co/image/abc");
    }

    #[test]
    fn test_normalize_resizes_and_strips_alpha() {
        let jpeg = normalize_artwork(&png_with_alpha(50, 30), 64, 90).unwrap();
        assert!(is_jpeg(&jpeg));
        assert_eq!(dimensions(&jpeg).unwrap(), (64, 64));

        let decoded = image::load_from_memory(&jpeg).unwrap();
        assert!(!decoded.color().has_alpha());
    }

    #[test]
    fn test_normalize_rejects_garbage() {
        let result = normalize_artwork(b"definitely not an image", 64, 90);
        assert!(matches!(result, Err(Error::Decode(_))));
    }

    #[test]
    fn test_fetch_config_default() {
        let config = FetchConfig::default();
        assert_eq!(config.max_bytes, 20 * 1024 * 1024);
        assert_eq!(config.timeout, Duration::from_secs(15));
        assert_eq!(config.max_redirects, 5);
    }

    #[test]
    fn test_validate_url() {
        assert!(ArtworkFetcher::validate_url("https://cdn.example/a.jpg").is_ok());
        assert!(matches!(ArtworkFetcher::validate_url("file:///etc/passwd"), Err(ProviderError::InvalidUrl(_))));
        assert!(matches!(ArtworkFetcher::validate_url("not a url"), Err(ProviderError::InvalidUrl(_))));
    }
}
