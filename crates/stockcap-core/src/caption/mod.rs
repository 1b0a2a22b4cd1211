//! Image captioning with BLIP.
//!
//! Turns a decoded image into a one-sentence English description using a
//! BLIP vision encoder and text decoder exported to ONNX, decoded with beam
//! search.
//!
//! # Usage
//!
//! ```rust,ignore
//! use stockcap_core::caption::{BlipCaptioner, Captioner};
//! use stockcap_core::Config;
//!
//! let config = Config::default();
//! let captioner = BlipCaptioner::load(&config.captioning, &config.caption_model_dir())?;
//! let caption = captioner.caption(&decoded.image, &path)?;
//! ```

pub mod beam;
pub(crate) mod blip;
pub mod preprocess;

use std::path::{Path, PathBuf};

use image::DynamicImage;

use crate::config::CaptioningConfig;
use crate::error::PipelineError;

use self::beam::BeamSearch;
use self::blip::{TextDecoder, VisionEncoder};
use self::preprocess::preprocess;

pub const VISION_MODEL_FILENAME: &str = "vision_model.onnx";
pub const DECODER_MODEL_FILENAME: &str = "text_decoder_model.onnx";
pub const TOKENIZER_FILENAME: &str = "tokenizer.json";

/// Anything that can describe an image in one sentence.
///
/// Implementations are called from blocking worker threads and must be
/// shareable across them.
pub trait Captioner: Send + Sync {
    fn caption(&self, image: &DynamicImage, path: &Path) -> Result<String, PipelineError>;
}

/// BLIP captioner running on ONNX Runtime.
pub struct BlipCaptioner {
    vision: VisionEncoder,
    decoder: TextDecoder,
    tokenizer: tokenizers::Tokenizer,
    search: BeamSearch,
    image_size: u32,
}

impl BlipCaptioner {
    /// Load the BLIP model files from `model_dir`.
    pub fn load(config: &CaptioningConfig, model_dir: &Path) -> Result<Self, PipelineError> {
        let tokenizer_path = model_dir.join(TOKENIZER_FILENAME);
        if !tokenizer_path.exists() {
            return Err(PipelineError::Model {
                message: format!(
                    "Tokenizer not found at {:?}. Run `stockcap models download` first.",
                    tokenizer_path
                ),
            });
        }

        tracing::info!("Loading BLIP captioning model from {:?}", model_dir);
        let vision = VisionEncoder::load(&model_dir.join(VISION_MODEL_FILENAME))?;
        let decoder = TextDecoder::load(&model_dir.join(DECODER_MODEL_FILENAME))?;
        let tokenizer = tokenizers::Tokenizer::from_file(&tokenizer_path).map_err(|e| {
            PipelineError::Model {
                message: format!("Failed to load tokenizer: {e}"),
            }
        })?;
        tracing::info!("BLIP captioning model loaded");

        Ok(Self {
            vision,
            decoder,
            tokenizer,
            search: BeamSearch {
                num_beams: config.num_beams,
                max_length: config.max_length,
                length_penalty: config.length_penalty,
                bos_token_id: config.bos_token_id,
                eos_token_id: config.eos_token_id,
            },
            image_size: config.image_size,
        })
    }

    /// Check whether all model files exist on disk.
    pub fn model_exists(model_dir: &Path) -> bool {
        Self::model_files(model_dir).iter().all(|p| p.exists())
    }

    /// Expected model file paths.
    pub fn model_files(model_dir: &Path) -> Vec<PathBuf> {
        [
            VISION_MODEL_FILENAME,
            DECODER_MODEL_FILENAME,
            TOKENIZER_FILENAME,
        ]
        .iter()
        .map(|name| model_dir.join(name))
        .collect()
    }

    fn decode_tokens(&self, tokens: &[i64], path: &Path) -> Result<String, PipelineError> {
        let ids: Vec<u32> = tokens
            .iter()
            .filter(|&&t| t >= 0)
            .map(|&t| t as u32)
            .collect();
        let text = self
            .tokenizer
            .decode(&ids, true)
            .map_err(|e| PipelineError::Caption {
                path: path.to_path_buf(),
                message: format!("Failed to decode caption tokens: {e}"),
            })?;
        Ok(normalize_caption(&text))
    }
}

impl Captioner for BlipCaptioner {
    fn caption(&self, image: &DynamicImage, path: &Path) -> Result<String, PipelineError> {
        let start = std::time::Instant::now();
        let pixel_values = preprocess(image, self.image_size);
        let features = self.vision.encode(&pixel_values, path)?;

        let tokens = self.search.run(|sequences| {
            self.decoder
                .next_token_logits(sequences, &features, path)
        })?;

        let caption = self.decode_tokens(&tokens, path)?;
        tracing::debug!(
            "Captioned {:?} in {:?} ({} tokens)",
            path,
            start.elapsed(),
            tokens.len()
        );
        Ok(caption)
    }
}

/// Collapse runs of whitespace and trim the ends.
pub fn normalize_caption(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
