//! Error types for inspection operations.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for inspection operations.
pub type VisionResult<T> = Result<T, VisionError>;

/// Errors that can occur during detection, tracking or scoring.
///
/// Individual malformed detections never produce an error; they are skipped
/// or treated as zero-area records. Only invalid whole inputs fail.
#[derive(Debug, Error)]
pub enum VisionError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid image: {0}")]
    InvalidImage(String),

    #[error("Frame {frame_id} is not after the last tracked frame {last_frame_id}")]
    OutOfOrderFrame { frame_id: u64, last_frame_id: u64 },

    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl VisionError {
    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create an invalid image error.
    pub fn invalid_image(message: impl Into<String>) -> Self {
        Self::InvalidImage(message.into())
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }
}
