//! Batch run: worker-pool fan-out with progress, then manifest and records.

use std::path::Path;
use std::sync::Arc;

use stockcap_core::output::write_records;
use stockcap_core::{
    BatchRunner, Categories, Config, DiscoveredFile, ImageAnalysis, ManifestWriter,
    ProcessingStats,
};

use super::{ProcessArgs, ProcessContext};

/// Caption every discovered file and write the manifest.
pub(crate) async fn run_batch(
    ctx: ProcessContext,
    args: &ProcessArgs,
    files: Vec<DiscoveredFile>,
) -> anyhow::Result<()> {
    let ProcessContext {
        processor,
        categories,
        manifest_path,
        config,
    } = ctx;

    let total_bytes = stockcap_core::pipeline::FileDiscovery::total_size(&files);
    let progress = create_progress_bar(files.len() as u64);

    let runner = BatchRunner::new(Arc::new(processor), config.processing.parallel_workers);
    let pb = progress.clone();
    let report = runner
        .run(&files, move |analysis| {
            pb.set_message(analysis.file_name.clone());
            pb.inc(1);
        })
        .await;
    progress.finish_with_message("done");

    write_outputs(&config, &manifest_path, &categories, &report.results, args)?;

    print_summary(&report.stats, total_bytes);
    eprintln!("  Manifest: {}", manifest_path.display());

    Ok(())
}

/// Write the manifest, plus the records file when one was requested.
///
/// An empty `results` slice still produces a complete manifest.
fn write_outputs(
    config: &Config,
    manifest_path: &Path,
    categories: &Categories,
    results: &[ImageAnalysis],
    args: &ProcessArgs,
) -> anyhow::Result<()> {
    let writer = ManifestWriter::new(config.manifest.clone());
    writer.write_file(manifest_path, results, categories)?;

    if let Some(ref records_path) = args.records {
        write_records(records_path, results, args.records_format.into())?;
    }
    Ok(())
}

/// Create a progress bar for batch processing.
fn create_progress_bar(total: u64) -> indicatif::ProgressBar {
    use indicatif::{ProgressBar, ProgressStyle};

    let pb = ProgressBar::new(total);
    let style = ProgressStyle::default_bar()
        .template(
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("##-");
    pb.set_style(style);
    pb.set_message("captioning...");
    pb
}

/// Print a formatted summary table after batch processing.
fn print_summary(stats: &ProcessingStats, total_bytes: u64) {
    let mb_processed = total_bytes as f64 / 1_000_000.0;
    let throughput = if stats.total_seconds > 0.0 {
        mb_processed / stats.total_seconds
    } else {
        0.0
    };

    eprintln!();
    eprintln!("  ====================================");
    eprintln!("               Summary");
    eprintln!("  ====================================");
    eprintln!("    Succeeded:    {:>8}", stats.succeeded);
    if stats.failed > 0 {
        eprintln!("    Failed:       {:>8}", stats.failed);
    }
    eprintln!("  ------------------------------------");
    eprintln!("    Total:        {:>8}", stats.total());
    eprintln!("    Duration:     {:>7.1}s", stats.total_seconds);
    eprintln!("    Rate:         {:>7.2} img/sec", stats.images_per_second);
    eprintln!("    Throughput:   {:>7.1} MB/sec", throughput);
    eprintln!("  ====================================");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_batch_still_writes_full_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let manifest_path = dir.path().join("out").join("dreamstime_upload.txt");
        let records_path = dir.path().join("records.json");
        let args = ProcessArgs {
            input: dir.path().to_path_buf(),
            records: Some(records_path.clone()),
            ..ProcessArgs::default()
        };
        let categories = Categories::new(["Nature"]);

        write_outputs(&Config::default(), &manifest_path, &categories, &[], &args).unwrap();

        let text = std::fs::read_to_string(&manifest_path).unwrap();
        assert!(text.starts_with("Filename: \nImage Name: \nDescriptions: \n"));
        assert!(text.contains("Category 1: Nature\n"));
        assert!(text.ends_with("SR-Price: 100\n"));
        assert!(records_path.exists());
    }
}
