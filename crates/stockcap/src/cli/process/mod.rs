//! The `stockcap process` command: caption a folder and write the manifest.

mod run;
mod setup;
pub mod types;

pub use types::RecordsFormat;

use clap::Args;
use std::path::PathBuf;
use stockcap_core::{Categories, Config, ImageProcessor};

use run::run_batch;
use setup::setup_processor;

/// Arguments for the `process` command.
#[derive(Args, Debug)]
pub struct ProcessArgs {
    /// Folder of images (a single image file also works)
    #[arg(required = true)]
    pub input: PathBuf,

    /// Category for every image in the manifest (repeat up to three times)
    #[arg(short, long = "category", value_name = "CAT")]
    pub categories: Vec<String>,

    /// Number of images analyzed concurrently [default: from config]
    #[arg(short, long)]
    pub parallel: Option<usize>,

    /// Manifest path [default: ./<manifest.file_name>]
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Also write per-image analysis records to this file
    #[arg(long, value_name = "FILE")]
    pub records: Option<PathBuf>,

    /// Format of the records file
    #[arg(long, value_enum, default_value = "json")]
    pub records_format: RecordsFormat,

    /// Beam width for caption generation (1 = greedy) [default: from config]
    #[arg(long)]
    pub beams: Option<usize>,

    /// Maximum keywords per image [default: from config]
    #[arg(long)]
    pub max_keywords: Option<usize>,
}

/// Manual Default impl for constructing ProcessArgs outside of clap.
///
/// Used by the interactive module to build ProcessArgs field-by-field.
impl Default for ProcessArgs {
    fn default() -> Self {
        Self {
            input: PathBuf::new(),
            categories: Vec::new(),
            parallel: None,
            output: None,
            records: None,
            records_format: RecordsFormat::Json,
            beams: None,
            max_keywords: None,
        }
    }
}

/// Processing context assembled by setup_processor().
pub(crate) struct ProcessContext {
    pub processor: ImageProcessor,
    pub categories: Categories,
    pub manifest_path: PathBuf,
    pub config: Config,
}

/// Execute the process command.
pub async fn execute(args: ProcessArgs) -> anyhow::Result<()> {
    let ctx = setup_processor(&args)?;

    let files = ctx.processor.discover(&args.input);
    if files.is_empty() {
        // The manifest is still written, with empty per-image lines.
        tracing::warn!("No supported image files found at {:?}", args.input);
    } else {
        tracing::info!("Found {} image(s) to process", files.len());
    }

    run_batch(ctx, &args, files).await
}
