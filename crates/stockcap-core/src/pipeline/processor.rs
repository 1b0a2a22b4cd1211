//! Pipeline orchestration - wires together all processing stages.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;

use crate::caption::{BlipCaptioner, Captioner};
use crate::config::Config;
use crate::error::{PipelineError, PipelineResult};
use crate::keywords::{KeywordExtractor, OnnxPosTagger};
use crate::types::{file_name_of, ImageAnalysis};

use super::decode::{format_to_string, ImageDecoder};
use super::discovery::{DiscoveredFile, FileDiscovery};
use super::validate::Validator;

/// Shorten a caption for the title field.
///
/// Keeps the first `max_words` whitespace-separated words and appends `...`
/// when the caption had more; shorter captions are returned unchanged.
pub fn summarize_title(description: &str, max_words: usize) -> String {
    let words: Vec<&str> = description.split_whitespace().collect();
    if words.len() > max_words {
        format!("{}...", words[..max_words].join(" "))
    } else {
        description.to_string()
    }
}

/// The main image processor that orchestrates the full pipeline.
pub struct ImageProcessor {
    decoder: ImageDecoder,
    validator: Validator,
    discovery: FileDiscovery,
    captioner: Option<Arc<dyn Captioner>>,
    keywords: Option<Arc<KeywordExtractor>>,
    /// Blocking inference jobs allowed at once. A permit lives until the
    /// job returns, even when the caller has already timed out.
    inference_slots: Arc<Semaphore>,
    caption_timeout_ms: u64,
    title_max_words: usize,
    placeholder: String,
}

impl ImageProcessor {
    /// Create a new image processor with the given configuration.
    ///
    /// Models are not loaded yet; see [`ImageProcessor::load_models`].
    pub fn new(config: &Config) -> Self {
        Self {
            decoder: ImageDecoder::new(config.limits.clone()),
            validator: Validator::new(config.limits.clone()),
            discovery: FileDiscovery::new(config.processing.clone()),
            captioner: None,
            keywords: None,
            inference_slots: Arc::new(Semaphore::new(config.processing.parallel_workers.max(1))),
            caption_timeout_ms: config.limits.caption_timeout_ms,
            title_max_words: config.manifest.title_max_words,
            placeholder: config.manifest.placeholder_description.clone(),
        }
    }

    /// Load the BLIP captioner and the POS tagger from the model directory.
    pub fn load_models(&mut self, config: &Config) -> PipelineResult<()> {
        let captioner = BlipCaptioner::load(&config.captioning, &config.caption_model_dir())?;
        let tagger = OnnxPosTagger::load(&config.keywords, &config.tagger_model_dir())?;
        self.captioner = Some(Arc::new(captioner));
        self.keywords = Some(Arc::new(KeywordExtractor::new(
            Arc::new(tagger),
            &config.keywords,
        )));
        Ok(())
    }

    /// Use an already-constructed captioner.
    pub fn with_captioner(mut self, captioner: Arc<dyn Captioner>) -> Self {
        self.captioner = Some(captioner);
        self
    }

    /// Use an already-constructed keyword extractor.
    pub fn with_keyword_extractor(mut self, extractor: Arc<KeywordExtractor>) -> Self {
        self.keywords = Some(extractor);
        self
    }

    /// Check whether both models are loaded.
    pub fn has_models(&self) -> bool {
        self.captioner.is_some() && self.keywords.is_some()
    }

    /// Description written for images that could not be analyzed.
    pub fn placeholder(&self) -> &str {
        &self.placeholder
    }

    /// Analyze a single image.
    ///
    /// Never fails: any error is logged and replaced by the placeholder record.
    pub async fn analyze(&self, path: &Path) -> ImageAnalysis {
        match self.try_analyze(path).await {
            Ok(analysis) => analysis,
            Err(e) => {
                tracing::error!("Failed to analyze {:?}: {e}", path);
                ImageAnalysis::placeholder(path, &self.placeholder, e.to_string())
            }
        }
    }

    /// Analyze a single image, surfacing the first error.
    pub async fn try_analyze(&self, path: &Path) -> PipelineResult<ImageAnalysis> {
        let start = std::time::Instant::now();
        tracing::debug!("Processing: {:?}", path);

        let (captioner, extractor) = match (&self.captioner, &self.keywords) {
            (Some(c), Some(k)) => (c.clone(), k.clone()),
            _ => {
                return Err(PipelineError::Model {
                    message: "Captioning and keyword models are not loaded".to_string(),
                })
            }
        };

        // Validate
        self.validator.validate(path)?;
        tracing::trace!("  Validate: {:?}", start.elapsed());

        // Decode
        let decode_start = std::time::Instant::now();
        let decoded = self.decoder.decode(path).await?;
        tracing::trace!("  Decode: {:?}", decode_start.elapsed());

        let width = decoded.width;
        let height = decoded.height;
        let format = format_to_string(decoded.format);
        let image = decoded.image;

        // Caption + keywords on a blocking thread
        let infer_start = std::time::Instant::now();
        let path_owned = path.to_path_buf();
        let slot = self
            .inference_slots
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| PipelineError::Caption {
                path: path.to_path_buf(),
                message: "Inference pool closed".to_string(),
            })?;
        let inference = tokio::task::spawn_blocking(move || {
            let _slot = slot;
            let caption = captioner.caption(&image, &path_owned)?;
            let keywords = extractor.extract(&caption, &path_owned)?;
            Ok::<_, PipelineError>((caption, keywords))
        });

        let (description, keywords) = match tokio::time::timeout(
            Duration::from_millis(self.caption_timeout_ms),
            inference,
        )
        .await
        {
            Ok(Ok(result)) => result?,
            Ok(Err(e)) => {
                return Err(PipelineError::Caption {
                    path: path.to_path_buf(),
                    message: format!("Inference task failed: {e}"),
                })
            }
            Err(_) => {
                return Err(PipelineError::Timeout {
                    path: path.to_path_buf(),
                    stage: "caption".to_string(),
                    timeout_ms: self.caption_timeout_ms,
                })
            }
        };
        tracing::trace!("  Caption + keywords: {:?}", infer_start.elapsed());

        let title = summarize_title(&description, self.title_max_words);

        tracing::debug!(
            "Processed {:?} in {:?}: {:?}",
            path,
            start.elapsed(),
            description
        );

        Ok(ImageAnalysis {
            file_path: path.to_path_buf(),
            file_name: file_name_of(path),
            description,
            title,
            keywords,
            width: Some(width),
            height: Some(height),
            format: Some(format),
            error: None,
        })
    }

    /// Discover all image files at a path.
    pub fn discover(&self, path: &Path) -> Vec<DiscoveredFile> {
        self.discovery.discover(path)
    }

    #[cfg(test)]
    pub(crate) fn inference_slots_available(&self) -> usize {
        self.inference_slots.available_permits()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::config::KeywordsConfig;
    use crate::keywords::tests::LookupTagger;
    use image::{DynamicImage, ImageFormat, Rgb, RgbImage};

    /// Captioner that always returns the same sentence.
    pub(crate) struct FixedCaptioner(pub &'static str);

    impl Captioner for FixedCaptioner {
        fn caption(&self, _image: &DynamicImage, _path: &Path) -> PipelineResult<String> {
            Ok(self.0.to_string())
        }
    }

    pub(crate) fn test_processor(caption: &'static str) -> ImageProcessor {
        ImageProcessor::new(&Config::default())
            .with_captioner(Arc::new(FixedCaptioner(caption)))
            .with_keyword_extractor(Arc::new(KeywordExtractor::new(
                Arc::new(LookupTagger),
                &KeywordsConfig::default(),
            )))
    }

    pub(crate) fn write_png(path: &Path) {
        let img = RgbImage::from_pixel(8, 6, Rgb([200, 20, 20]));
        DynamicImage::ImageRgb8(img)
            .save_with_format(path, ImageFormat::Png)
            .unwrap();
    }

    #[test]
    fn test_summarize_title_short_caption_unchanged() {
        assert_eq!(summarize_title("a red apple", 12), "a red apple");
    }

    #[test]
    fn test_summarize_title_long_caption_cut() {
        let caption = "one two three four five six seven eight nine ten eleven twelve thirteen";
        assert_eq!(
            summarize_title(caption, 12),
            "one two three four five six seven eight nine ten eleven twelve..."
        );
    }

    #[test]
    fn test_summarize_title_exact_length_not_cut() {
        assert_eq!(summarize_title("a b c", 3), "a b c");
    }

    #[tokio::test]
    async fn test_analyze_success() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("apple.png");
        write_png(&path);

        let processor = test_processor("a red apple on a wooden table");
        let analysis = processor.analyze(&path).await;

        assert!(analysis.is_success());
        assert_eq!(analysis.file_name, "apple.png");
        assert_eq!(analysis.description, "a red apple on a wooden table");
        assert_eq!(analysis.title, "a red apple on a wooden table");
        assert_eq!(analysis.format.as_deref(), Some("png"));
        assert_eq!((analysis.width, analysis.height), (Some(8), Some(6)));
        assert_eq!(
            analysis.keywords,
            vec!["red", "apple", "wooden", "table", "red apple", "wooden table"]
        );
    }

    #[tokio::test]
    async fn test_corrupt_image_yields_placeholder() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("corrupt.jpg");
        std::fs::write(&path, b"\xFF\xD8\xFF\xE0 truncated jpeg body").unwrap();

        let processor = test_processor("never used");
        let analysis = processor.analyze(&path).await;

        assert!(!analysis.is_success());
        assert_eq!(analysis.description, "Error in description");
        assert_eq!(analysis.title, "Error in description");
        assert!(analysis.keywords.is_empty());
        assert_eq!(analysis.file_name, "corrupt.jpg");
    }

    #[tokio::test]
    async fn test_caption_error_yields_placeholder() {
        struct Failing;
        impl Captioner for Failing {
            fn caption(&self, _image: &DynamicImage, path: &Path) -> PipelineResult<String> {
                Err(PipelineError::Caption {
                    path: path.to_path_buf(),
                    message: "decoder exploded".to_string(),
                })
            }
        }

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ok.png");
        write_png(&path);

        let processor = test_processor("unused").with_captioner(Arc::new(Failing));
        let analysis = processor.analyze(&path).await;
        assert_eq!(analysis.description, "Error in description");
        assert!(analysis.error.unwrap().contains("decoder exploded"));
    }

    #[tokio::test]
    async fn test_panicking_captioner_yields_placeholder() {
        struct Panicking;
        impl Captioner for Panicking {
            fn caption(&self, _image: &DynamicImage, _path: &Path) -> PipelineResult<String> {
                panic!("session state corrupted");
            }
        }

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ok.png");
        write_png(&path);

        let processor = test_processor("unused").with_captioner(Arc::new(Panicking));
        let analysis = processor.analyze(&path).await;

        assert!(!analysis.is_success());
        assert_eq!(analysis.description, "Error in description");
        assert!(analysis.keywords.is_empty());
        assert!(analysis.error.unwrap().contains("Inference task failed"));
        assert_eq!(processor.inference_slots_available(), 4);
    }

    #[tokio::test]
    async fn test_timed_out_inference_keeps_its_slot() {
        struct Slow;
        impl Captioner for Slow {
            fn caption(&self, _image: &DynamicImage, _path: &Path) -> PipelineResult<String> {
                std::thread::sleep(Duration::from_millis(300));
                Ok("a slow cat".to_string())
            }
        }

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ok.png");
        write_png(&path);

        let mut config = Config::default();
        config.processing.parallel_workers = 1;
        config.limits.caption_timeout_ms = 20;
        let processor = ImageProcessor::new(&config)
            .with_captioner(Arc::new(Slow))
            .with_keyword_extractor(Arc::new(KeywordExtractor::new(
                Arc::new(LookupTagger),
                &KeywordsConfig::default(),
            )));

        let err = processor.try_analyze(&path).await.unwrap_err();
        assert!(matches!(err, PipelineError::Timeout { .. }));
        // The abandoned job is still running on the blocking pool.
        assert_eq!(processor.inference_slots_available(), 0);

        tokio::time::sleep(Duration::from_millis(600)).await;
        assert_eq!(processor.inference_slots_available(), 1);
    }

    #[tokio::test]
    async fn test_missing_models_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ok.png");
        write_png(&path);

        let processor = ImageProcessor::new(&Config::default());
        assert!(!processor.has_models());
        let err = processor.try_analyze(&path).await.unwrap_err();
        assert!(matches!(err, PipelineError::Model { .. }));
    }
}
