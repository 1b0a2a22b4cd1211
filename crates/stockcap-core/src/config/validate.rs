//! Configuration validation with range checks.

use crate::error::ConfigError;

use super::Config;

impl Config {
    /// Validate configuration values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.processing.parallel_workers == 0 {
            return Err(ConfigError::ValidationError(
                "processing.parallel_workers must be > 0".into(),
            ));
        }
        if self.limits.max_file_size_mb == 0 {
            return Err(ConfigError::ValidationError(
                "limits.max_file_size_mb must be > 0".into(),
            ));
        }
        if self.limits.max_image_dimension == 0 {
            return Err(ConfigError::ValidationError(
                "limits.max_image_dimension must be > 0".into(),
            ));
        }
        if self.limits.decode_timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "limits.decode_timeout_ms must be > 0".into(),
            ));
        }
        if self.limits.caption_timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "limits.caption_timeout_ms must be > 0".into(),
            ));
        }
        if self.captioning.image_size == 0 {
            return Err(ConfigError::ValidationError(
                "captioning.image_size must be > 0".into(),
            ));
        }
        if self.captioning.num_beams == 0 {
            return Err(ConfigError::ValidationError(
                "captioning.num_beams must be > 0".into(),
            ));
        }
        if self.captioning.max_length < 2 {
            return Err(ConfigError::ValidationError(
                "captioning.max_length must be >= 2".into(),
            ));
        }
        if self.keywords.max_keywords == 0 {
            return Err(ConfigError::ValidationError(
                "keywords.max_keywords must be > 0".into(),
            ));
        }
        if self.keywords.min_length == 0 {
            return Err(ConfigError::ValidationError(
                "keywords.min_length must be > 0".into(),
            ));
        }
        if self.manifest.title_max_words == 0 {
            return Err(ConfigError::ValidationError(
                "manifest.title_max_words must be > 0".into(),
            ));
        }
        if self.manifest.file_name.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "manifest.file_name must not be empty".into(),
            ));
        }
        Ok(())
    }
}
