//! Stockcap Core - caption an image folder and build a stock upload manifest.
//!
//! Every image in a folder is captioned by a pretrained vision-language model,
//! the caption is turned into keywords by a part-of-speech tagger, and the
//! results for the whole folder go into one flat-file manifest.
//!
//! # Architecture
//!
//! ```text
//! Discover → [Validate → Decode → Caption (BLIP) → Keywords (POS)] × N → Manifest
//! ```
//!
//! The bracketed stages run per image on a bounded worker pool. A failing
//! image never stops the batch; it gets a placeholder record instead.
//!
//! # Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use stockcap_core::{BatchRunner, Categories, Config, ImageProcessor, ManifestWriter};
//!
//! #[tokio::main]
//! async fn main() -> stockcap_core::Result<()> {
//!     let config = Config::load()?;
//!     let mut processor = ImageProcessor::new(&config);
//!     processor.load_models(&config)?;
//!
//!     let files = processor.discover("./photos".as_ref());
//!     let runner = BatchRunner::new(Arc::new(processor), config.processing.parallel_workers);
//!     let report = runner.run(&files, |_| {}).await;
//!
//!     let manifest = ManifestWriter::new(config.manifest.clone());
//!     manifest.write_file(
//!         "dreamstime_upload.txt".as_ref(),
//!         &report.results,
//!         &Categories::new(["Nature"]),
//!     )?;
//!     Ok(())
//! }
//! ```

// Module declarations
pub mod caption;
pub mod config;
pub mod error;
pub mod keywords;
pub mod manifest;
pub mod output;
pub mod pipeline;
pub mod types;

// Re-exports for convenient access
pub use caption::{BlipCaptioner, Captioner};
pub use config::Config;
pub use error::{ConfigError, PipelineError, PipelineResult, Result, StockcapError};
pub use keywords::{extract_keywords, KeywordExtractor, OnnxPosTagger, PosTag, PosTagger};
pub use manifest::{Categories, ManifestWriter};
pub use output::{OutputFormat, OutputWriter};
pub use pipeline::{BatchReport, BatchRunner, DiscoveredFile, ImageProcessor};
pub use types::{ImageAnalysis, ProcessingStats};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
