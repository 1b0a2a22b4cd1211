//! Configuration management for stockcap.
//!
//! Configuration is loaded from the platform config directory with sensible
//! defaults. Every section falls back to `Default` when omitted.

mod types;
mod validate;

pub use types::*;

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Root configuration structure for stockcap.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Processing settings
    pub processing: ProcessingConfig,

    /// Resource limits
    pub limits: LimitsConfig,

    /// Captioning model settings
    pub captioning: CaptioningConfig,

    /// Keyword extraction settings
    pub keywords: KeywordsConfig,

    /// Manifest layout settings
    pub manifest: ManifestConfig,

    /// Logging settings
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from the default location.
    ///
    /// Returns default configuration if the file doesn't exist.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default config file path.
    ///
    /// Uses platform-appropriate directories:
    /// - macOS: ~/Library/Application Support/com.stockcap.stockcap/config.toml
    /// - Linux: ~/.config/stockcap/config.toml
    /// - Windows: C:\Users\<User>\AppData\Roaming\stockcap\config\config.toml
    ///
    /// Falls back to ~/.stockcap/config.toml if directory detection fails.
    pub fn default_path() -> PathBuf {
        directories::ProjectDirs::from("com", "stockcap", "stockcap")
            .map(|dirs| dirs.config_dir().to_path_buf().join("config.toml"))
            .unwrap_or_else(|| {
                let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
                PathBuf::from(home).join(".stockcap").join("config.toml")
            })
    }

    /// Get the resolved model directory path (with ~ expansion).
    pub fn model_dir(&self) -> PathBuf {
        let path_str = self.general.model_dir.to_string_lossy();
        let expanded = shellexpand::tilde(&path_str);
        PathBuf::from(expanded.into_owned())
    }

    /// Directory holding the captioning model files.
    pub fn caption_model_dir(&self) -> PathBuf {
        self.model_dir().join(&self.captioning.model)
    }

    /// Directory holding the POS tagger model files.
    pub fn tagger_model_dir(&self) -> PathBuf {
        self.model_dir().join(&self.keywords.model)
    }

    /// Serialize the config to a pretty TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::ValidationError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.processing.parallel_workers, 4);
        assert_eq!(config.captioning.num_beams, 10);
        assert_eq!(config.captioning.max_length, 300);
        assert_eq!(config.keywords.max_keywords, 20);
        assert_eq!(config.manifest.file_name, "dreamstime_upload.txt");
    }

    #[test]
    fn test_config_to_toml() {
        let config = Config::default();
        let toml = config.to_toml().unwrap();
        assert!(toml.contains("[general]"));
        assert!(toml.contains("[captioning]"));
        assert!(toml.contains("[manifest.license]"));
    }

    #[test]
    fn test_captioning_section_lists_only_used_keys() {
        let toml = Config::default().to_toml().unwrap();
        assert!(toml.contains("eos_token_id = 102"));
        assert!(!toml.contains("pad_token_id"));

        // Older files that still carry the key keep loading.
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[captioning]\nnum_beams = 3\npad_token_id = 0\n").unwrap();
        assert_eq!(Config::load_from(&path).unwrap().captioning.num_beams, 3);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[processing]\nparallel_workers = 8\n\n[manifest.license]\nsr_price = 250\n",
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.processing.parallel_workers, 8);
        assert_eq!(config.manifest.license.sr_price, 250);
        assert_eq!(config.manifest.license.w_el, 1);
        assert_eq!(config.captioning.image_size, 384);
    }

    #[test]
    fn test_load_from_rejects_invalid_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[captioning]\nnum_beams = 0\n").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(err.to_string().contains("num_beams"));
    }

    #[test]
    fn test_model_dirs_are_nested_under_model_dir() {
        let mut config = Config::default();
        config.general.model_dir = PathBuf::from("/opt/models");
        assert_eq!(
            config.caption_model_dir(),
            PathBuf::from("/opt/models/blip-image-captioning-base")
        );
        assert_eq!(
            config.tagger_model_dir(),
            PathBuf::from("/opt/models/bert-english-pos")
        );
    }
}
