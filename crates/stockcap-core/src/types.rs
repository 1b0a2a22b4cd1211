//! Core data types for the stockcap captioning pipeline.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Analysis result for one image.
///
/// Failed images still produce a record: description and title carry the
/// placeholder text, keywords are empty and `error` holds the reason.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageAnalysis {
    /// Path to the source file
    pub file_path: PathBuf,

    /// Just the filename portion, as written to the manifest
    pub file_name: String,

    /// Caption produced by the captioning model
    pub description: String,

    /// Caption shortened for the title field
    pub title: String,

    /// Keywords derived from the caption
    pub keywords: Vec<String>,

    /// Image width in pixels
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,

    /// Image height in pixels
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,

    /// Detected format ("jpeg", "png", ...)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,

    /// Why the image could not be analyzed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ImageAnalysis {
    /// Record for an image that failed at any stage.
    pub fn placeholder(path: &Path, placeholder: &str, error: impl Into<String>) -> Self {
        Self {
            file_path: path.to_path_buf(),
            file_name: file_name_of(path),
            description: placeholder.to_string(),
            title: placeholder.to_string(),
            keywords: vec![],
            width: None,
            height: None,
            format: None,
            error: Some(error.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    /// Keywords joined the way the manifest lists them.
    pub fn keywords_line(&self) -> String {
        self.keywords.join(", ")
    }
}

/// File name component of a path, falling back to the full path.
pub fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Processing statistics for a batch run.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ProcessingStats {
    /// Images analyzed successfully
    pub succeeded: usize,

    /// Images replaced by the placeholder record
    pub failed: usize,

    /// Processing rate in images per second
    pub images_per_second: f64,

    /// Total processing time in seconds
    pub total_seconds: f64,
}

impl ProcessingStats {
    pub fn total(&self) -> usize {
        self.succeeded + self.failed
    }
}
