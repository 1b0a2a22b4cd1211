//! Processor setup: config overrides, category parsing, model loading.

use std::path::PathBuf;

use stockcap_core::{Categories, Config, ImageProcessor, ManifestWriter};

use crate::cli::models::check_installed;

use super::{ProcessArgs, ProcessContext};

/// Validate input, load config/models, and assemble everything needed for processing.
pub(crate) fn setup_processor(args: &ProcessArgs) -> anyhow::Result<ProcessContext> {
    // Validate input path exists
    if !args.input.exists() {
        anyhow::bail!(
            "Input path does not exist: {:?}\n\n  Hint: Check the folder path and try again.",
            args.input
        );
    }

    let mut config = Config::load()?;
    apply_overrides(&mut config, args)?;

    let categories = parse_categories(&args.categories);

    let status = check_installed(&config);
    if !status.can_process() {
        anyhow::bail!(
            "Models not found in {}\n\n  Hint: Run `stockcap models download` first.",
            config.model_dir().display()
        );
    }

    let mut processor = ImageProcessor::new(&config);
    processor.load_models(&config)?;
    tracing::info!("Captioning and tagging models loaded");

    let manifest_path = match &args.output {
        Some(path) => path.clone(),
        None => ManifestWriter::new(config.manifest.clone())
            .default_path(&std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))),
    };

    Ok(ProcessContext {
        processor,
        categories,
        manifest_path,
        config,
    })
}

/// Apply CLI overrides on top of the loaded config and re-validate.
fn apply_overrides(config: &mut Config, args: &ProcessArgs) -> anyhow::Result<()> {
    if let Some(parallel) = args.parallel {
        config.processing.parallel_workers = parallel;
    }
    if let Some(beams) = args.beams {
        config.captioning.num_beams = beams;
    }
    if let Some(max_keywords) = args.max_keywords {
        config.keywords.max_keywords = max_keywords;
    }
    config.validate()?;
    Ok(())
}

/// Build the manifest categories, warning about entries that will be dropped.
fn parse_categories(raw: &[String]) -> Categories {
    let categories = Categories::new(raw);
    if raw.len() > categories.len() {
        tracing::warn!(
            "Only the first {} non-blank categories are used; ignoring {:?}",
            Categories::MAX,
            &raw[categories.len()..]
        );
    }
    categories
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overrides_replace_config_values() {
        let mut config = Config::default();
        let args = ProcessArgs {
            parallel: Some(2),
            beams: Some(1),
            max_keywords: Some(5),
            ..ProcessArgs::default()
        };
        apply_overrides(&mut config, &args).unwrap();
        assert_eq!(config.processing.parallel_workers, 2);
        assert_eq!(config.captioning.num_beams, 1);
        assert_eq!(config.keywords.max_keywords, 5);
    }

    #[test]
    fn zero_workers_rejected() {
        let mut config = Config::default();
        let args = ProcessArgs {
            parallel: Some(0),
            ..ProcessArgs::default()
        };
        let err = apply_overrides(&mut config, &args).unwrap_err();
        assert!(err.to_string().contains("parallel_workers"));
    }

    #[test]
    fn extra_categories_dropped() {
        let raw: Vec<String> = ["a", "b", "c", "d"].iter().map(|s| s.to_string()).collect();
        let categories = parse_categories(&raw);
        assert_eq!(categories.len(), 3);
        assert_eq!(categories.get(2), "c");
    }

    #[test]
    fn missing_input_is_reported() {
        let args = ProcessArgs {
            input: PathBuf::from("/nonexistent/photos"),
            ..ProcessArgs::default()
        };
        let err = setup_processor(&args).err().unwrap();
        assert!(err.to_string().contains("does not exist"));
    }
}
