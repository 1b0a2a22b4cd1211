//! Error types for the stockcap captioning pipeline.
//!
//! Errors are organized by stage to provide clear, actionable error messages
//! that include relevant context (file paths, stage names, specific issues).

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for stockcap operations.
#[derive(Error, Debug)]
pub enum StockcapError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Pipeline processing errors
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// General I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the config file from disk
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse TOML configuration
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Configuration values are invalid
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Pipeline processing errors, organized by stage.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Image decoding failed
    #[error("Decode error for {path}: {message}")]
    Decode { path: PathBuf, message: String },

    /// Caption generation failed
    #[error("Captioning failed for {path}: {message}")]
    Caption { path: PathBuf, message: String },

    /// Part-of-speech tagging or keyword extraction failed
    #[error("Keyword extraction failed for {path}: {message}")]
    Keywords { path: PathBuf, message: String },

    /// Model files missing or unusable
    #[error("Model error: {message}")]
    Model { message: String },

    /// Operation timed out
    #[error("Timeout in {stage} stage for {path} after {timeout_ms}ms")]
    Timeout {
        path: PathBuf,
        stage: String,
        timeout_ms: u64,
    },

    /// File exceeds size limit
    #[error("File too large: {path} ({size_mb}MB > {max_mb}MB)")]
    FileTooLarge {
        path: PathBuf,
        size_mb: u64,
        max_mb: u64,
    },

    /// Image dimensions exceed limit
    #[error("Image too large: {path} ({width}x{height} > {max_dim})")]
    ImageTooLarge {
        path: PathBuf,
        width: u32,
        height: u32,
        max_dim: u32,
    },

    /// Unsupported image format
    #[error("Unsupported format for {path}: {format}")]
    UnsupportedFormat { path: PathBuf, format: String },

    /// File not found
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),
}

/// Convenience type alias for stockcap results.
pub type Result<T> = std::result::Result<T, StockcapError>;

/// Convenience type alias for pipeline-specific results.
pub type PipelineResult<T> = std::result::Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_message_names_stage_and_path() {
        let err = PipelineError::Timeout {
            path: PathBuf::from("beach.jpg"),
            stage: "caption".to_string(),
            timeout_ms: 1500,
        };
        let msg = err.to_string();
        assert!(msg.contains("caption"));
        assert!(msg.contains("beach.jpg"));
        assert!(msg.contains("1500ms"));
    }

    #[test]
    fn pipeline_error_converts_to_top_level() {
        let err: StockcapError = PipelineError::FileNotFound(PathBuf::from("gone.png")).into();
        assert!(err.to_string().starts_with("Pipeline error:"));
    }
}
