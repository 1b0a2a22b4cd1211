//! Bounded fan-out over a list of discovered files.
//!
//! Each file is an independent job. At most `parallel` jobs run at once; the
//! callback fires as each one finishes, and results come back in the order
//! the files were given.

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::Semaphore;

use crate::types::{ImageAnalysis, ProcessingStats};

use super::discovery::DiscoveredFile;
use super::processor::ImageProcessor;

/// Results and statistics for one batch.
#[derive(Debug, Clone)]
pub struct BatchReport {
    /// One record per input file, in input order
    pub results: Vec<ImageAnalysis>,
    pub stats: ProcessingStats,
}

/// Runs [`ImageProcessor::analyze`] over many files concurrently.
pub struct BatchRunner {
    processor: Arc<ImageProcessor>,
    parallel: usize,
}

impl BatchRunner {
    pub fn new(processor: Arc<ImageProcessor>, parallel: usize) -> Self {
        Self {
            processor,
            parallel: parallel.max(1),
        }
    }

    /// Analyze every file, calling `on_result` as each one completes.
    pub async fn run<F>(&self, files: &[DiscoveredFile], on_result: F) -> BatchReport
    where
        F: Fn(&ImageAnalysis) + Send + Sync + 'static,
    {
        let start = Instant::now();
        let semaphore = Arc::new(Semaphore::new(self.parallel));
        let on_result = Arc::new(on_result);
        let mut handles = Vec::with_capacity(files.len());

        for file in files {
            let semaphore = semaphore.clone();
            let processor = self.processor.clone();
            let on_result = on_result.clone();
            let path = file.path.clone();

            let handle = tokio::spawn(async move {
                let analysis = match semaphore.acquire_owned().await {
                    Ok(permit) => {
                        let analysis = processor.analyze(&path).await;
                        drop(permit); // Release before the callback
                        analysis
                    }
                    Err(_) => ImageAnalysis::placeholder(
                        &path,
                        processor.placeholder(),
                        "Worker pool closed unexpectedly",
                    ),
                };
                on_result(&analysis);
                analysis
            });
            handles.push((file.path.clone(), handle));
        }

        let mut results = Vec::with_capacity(handles.len());
        for (path, handle) in handles {
            match handle.await {
                Ok(analysis) => results.push(analysis),
                Err(e) => {
                    tracing::error!("Worker for {:?} panicked: {e}", path);
                    let analysis = ImageAnalysis::placeholder(
                        &path,
                        self.processor.placeholder(),
                        format!("Worker panicked: {e}"),
                    );
                    on_result(&analysis);
                    results.push(analysis);
                }
            }
        }

        let elapsed = start.elapsed().as_secs_f64();
        let succeeded = results.iter().filter(|r| r.is_success()).count();
        let failed = results.len() - succeeded;
        let stats = ProcessingStats {
            succeeded,
            failed,
            images_per_second: if elapsed > 0.0 {
                results.len() as f64 / elapsed
            } else {
                0.0
            },
            total_seconds: elapsed,
        };

        BatchReport { results, stats }
    }
}
