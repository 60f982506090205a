use std::path::PathBuf;
use thiserror::Error;

// Main Application Error Type

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration Error: {0}")]
    Config(String),
    #[error("Failed to load configuration: {0}")]
    ConfigSource(#[from] config::ConfigError),
    #[error("Failed to read frame source {0}: {1}")]
    Capture(PathBuf, std::io::Error),
    #[error("Image Error: {0}")]
    Image(#[from] image::ImageError),
    #[error("Pipeline Error: {0}")]
    Pipeline(String),
}

// Upload / identification failures. None of these reach the user; the
// dispatcher logs them and drops the result.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecognitionError {
    #[error("Failed to encode frame: {0}")]
    Encode(String),
    #[error("Upload transport failed: {0}")]
    Transport(String),
    #[error("Upload endpoint returned status {0}")]
    Status(u16),
    #[error("Upload timed out")]
    Timeout,
    #[error("Recognition service failed: {0}")]
    Service(String),
}

#[derive(Error, Debug)]
pub enum ClassifierError {
    #[error("Frame could not be classified: {0}")]
    Unprocessable(String),
}
