//! Sub-configuration structs with their defaults.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// General settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Directory where models are stored
    pub model_dir: PathBuf,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            model_dir: PathBuf::from("~/.stockcap/models"),
        }
    }
}

/// Processing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingConfig {
    /// Number of images analyzed concurrently
    pub parallel_workers: usize,

    /// Supported input extensions (matched case-insensitively)
    pub supported_formats: Vec<String>,

    /// Descend into sub-folders when discovering images
    pub recursive: bool,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            parallel_workers: 4,
            supported_formats: vec![
                "png".to_string(),
                "jpg".to_string(),
                "jpeg".to_string(),
                "gif".to_string(),
                "bmp".to_string(),
            ],
            recursive: false,
        }
    }
}

/// Resource limits to protect against problematic inputs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum file size in megabytes
    pub max_file_size_mb: u64,

    /// Maximum image dimension (width or height)
    pub max_image_dimension: u32,

    /// Decode timeout in milliseconds
    pub decode_timeout_ms: u64,

    /// Caption generation timeout in milliseconds (beam search is slow on CPU)
    pub caption_timeout_ms: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_file_size_mb: 100,
            max_image_dimension: 10000,
            decode_timeout_ms: 5000,
            caption_timeout_ms: 300_000,
        }
    }
}

/// Captioning model settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptioningConfig {
    /// Model directory name under `general.model_dir`
    pub model: String,

    /// Square input resolution expected by the vision encoder
    pub image_size: u32,

    /// Maximum generated sequence length, BOS included
    pub max_length: usize,

    /// Beam width; 1 means greedy decoding
    pub num_beams: usize,

    /// Exponent applied to the hypothesis length when ranking finished beams
    pub length_penalty: f32,

    /// Decoder start token (`[DEC]` for BLIP)
    pub bos_token_id: i64,

    /// End-of-caption token (`[SEP]` for BLIP)
    pub eos_token_id: i64,
}

impl Default for CaptioningConfig {
    fn default() -> Self {
        Self {
            model: "blip-image-captioning-base".to_string(),
            image_size: 384,
            max_length: 300,
            num_beams: 10,
            length_penalty: 1.0,
            bos_token_id: 30522,
            eos_token_id: 102,
        }
    }
}

/// Keyword extraction settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KeywordsConfig {
    /// POS tagger model directory name under `general.model_dir`
    pub model: String,

    /// Maximum number of keywords per image
    pub max_keywords: usize,

    /// Minimum characters for a single-word keyword
    pub min_length: usize,

    /// Token limit fed to the tagger (captions are short)
    pub max_sequence_length: usize,
}

impl Default for KeywordsConfig {
    fn default() -> Self {
        Self {
            model: "bert-english-pos".to_string(),
            max_keywords: 20,
            min_length: 2,
            max_sequence_length: 128,
        }
    }
}

/// Upload manifest settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ManifestConfig {
    /// Manifest file name written into the output directory
    pub file_name: String,

    /// Captions longer than this are cut and suffixed with `...` for the title
    pub title_max_words: usize,

    /// Word appended to every image title
    pub title_suffix: String,

    /// Description written for images that could not be analyzed
    pub placeholder_description: String,

    /// Constant license-tier fields
    pub license: LicenseConfig,
}

impl Default for ManifestConfig {
    fn default() -> Self {
        Self {
            file_name: "dreamstime_upload.txt".to_string(),
            title_max_words: 12,
            title_suffix: "generated".to_string(),
            placeholder_description: "Error in description".to_string(),
            license: LicenseConfig::default(),
        }
    }
}

/// License-tier fields appended to the manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LicenseConfig {
    pub free: u32,
    pub w_el: u32,
    pub p_el: u32,
    pub sr_el: u32,
    pub sr_price: u32,
}

impl Default for LicenseConfig {
    fn default() -> Self {
        Self {
            free: 0,
            w_el: 1,
            p_el: 1,
            sr_el: 1,
            sr_price: 100,
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: error, warn, info, debug, trace
    pub level: String,

    /// Log format: "pretty" or "json"
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}
