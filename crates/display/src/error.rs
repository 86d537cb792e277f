//! Errors raised on the render side.

/// Display process errors.
#[derive(Debug, thiserror::Error)]
pub enum DisplayError {
    #[error("DECODE_ERROR: {0}")]
    Decode(#[from] image::ImageError),

    #[error("STORAGE_ERROR: {0}")]
    Io(#[from] std::io::Error),

    /// The frame sink could not be opened or written.
    #[error("SINK_ERROR: {0}")]
    Sink(String),

    #[error("background task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}
