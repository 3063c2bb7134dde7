use crate::error::Result;
use crate::extractor::{DocumentKind, ExtractionOutcome, Extractor, OutputWriter};
use crate::scanner::SourceFile;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FileStatus {
    Extracted,
    Failed,
    Unsupported,
    WriteError,
}

impl FileStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileStatus::Extracted => "extracted",
            FileStatus::Failed => "failed",
            FileStatus::Unsupported => "unsupported",
            FileStatus::WriteError => "write error",
        }
    }

    pub fn is_problem(&self) -> bool {
        matches!(self, FileStatus::Failed | FileStatus::WriteError)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FileResult {
    pub relative_path: String,
    pub kind: DocumentKind,
    pub status: FileStatus,
    pub output: Option<PathBuf>,
    pub message: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ExtractionProgress {
    pub files_processed: usize,
    pub total_files: usize,
    pub extracted: usize,
    pub failed: usize,
    pub unsupported: usize,
    pub current_file: Option<String>,
    pub start_time: Instant,
    pub errors: Vec<String>,
    pub results: Vec<FileResult>,
}

impl ExtractionProgress {
    pub fn new(total_files: usize) -> Self {
        Self {
            files_processed: 0,
            total_files,
            extracted: 0,
            failed: 0,
            unsupported: 0,
            current_file: None,
            start_time: Instant::now(),
            errors: Vec::new(),
            results: Vec::new(),
        }
    }

    pub fn begin_file(&mut self, display_path: String) {
        self.current_file = Some(display_path);
    }

    pub fn record(&mut self, result: FileResult) {
        self.files_processed += 1;
        match result.status {
            FileStatus::Extracted => self.extracted += 1,
            FileStatus::Failed => self.failed += 1,
            FileStatus::Unsupported => self.unsupported += 1,
            FileStatus::WriteError => {
                let message = result.message.as_deref().unwrap_or("unknown error");
                self.add_error(format!(
                    "Failed to write output for {}: {}",
                    result.relative_path, message
                ));
            }
        }
        self.results.push(result);
    }

    pub fn add_error<S: Into<String>>(&mut self, error: S) {
        self.errors.push(error.into());
    }

    pub fn last_result(&self) -> Option<&FileResult> {
        self.results.last()
    }

    pub fn written(&self) -> usize {
        self.files_processed - self.errors.len()
    }

    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    pub fn estimated_remaining(&self) -> Duration {
        if self.files_processed == 0 {
            return Duration::from_secs(0);
        }

        let elapsed = self.elapsed();
        let rate = self.files_processed as f64 / elapsed.as_secs_f64();
        let remaining_files = self.total_files.saturating_sub(self.files_processed);

        if rate > 0.0 {
            Duration::from_secs_f64(remaining_files as f64 / rate)
        } else {
            Duration::from_secs(0)
        }
    }
}

/// Extracts a list of files and writes one artifact per file, in list order.
///
/// Per-file problems are recorded in [`ExtractionProgress`]; only
/// cancellation aborts the batch.
pub struct BatchExtractor {
    extractor: Extractor,
    writer: OutputWriter,
    workers: usize,
}

impl BatchExtractor {
    pub fn new(extractor: Extractor, writer: OutputWriter) -> Self {
        Self {
            extractor,
            writer,
            workers: 1,
        }
    }

    /// Worker threads used when built with the `parallel` feature; 0 means one per CPU.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = if workers == 0 { num_cpus::get() } else { workers };
        self
    }

    /// Files extracted at once; always 1 without the `parallel` feature.
    pub fn workers(&self) -> usize {
        if cfg!(feature = "parallel") {
            self.workers
        } else {
            1
        }
    }

    pub fn run(
        &self,
        files: &[SourceFile],
        progress_callback: Option<&dyn Fn(&ExtractionProgress)>,
        check_continue: &dyn Fn() -> Result<()>,
    ) -> Result<ExtractionProgress> {
        let mut progress = ExtractionProgress::new(files.len());
        info!("Extracting {} files with {} worker(s)", files.len(), self.workers());

        self.run_files(files, &mut progress, progress_callback, check_continue)?;

        info!(
            "Extraction finished: {} extracted, {} failed, {} unsupported, {} write errors",
            progress.extracted,
            progress.failed,
            progress.unsupported,
            progress.errors.len()
        );
        Ok(progress)
    }

    #[cfg(not(feature = "parallel"))]
    fn run_files(
        &self,
        files: &[SourceFile],
        progress: &mut ExtractionProgress,
        progress_callback: Option<&dyn Fn(&ExtractionProgress)>,
        check_continue: &dyn Fn() -> Result<()>,
    ) -> Result<()> {
        for file in files {
            check_continue()?;
            progress.begin_file(file.display_path());

            let outcome = self.extractor.extract_as(file.kind(), &file.source_path);
            progress.record(self.persist(file, outcome));

            if let Some(callback) = progress_callback {
                callback(progress);
            }
        }
        Ok(())
    }

    /// Extraction runs `workers` files at a time; writes and callbacks stay in list order.
    #[cfg(feature = "parallel")]
    fn run_files(
        &self,
        files: &[SourceFile],
        progress: &mut ExtractionProgress,
        progress_callback: Option<&dyn Fn(&ExtractionProgress)>,
        check_continue: &dyn Fn() -> Result<()>,
    ) -> Result<()> {
        use rayon::prelude::*;

        let workers = self.workers.max(1);
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .build()
            .map_err(|e| crate::error::CorpusKitError::Config {
                message: format!("Cannot start {} extraction workers: {}", workers, e),
            })?;

        for chunk in files.chunks(workers) {
            check_continue()?;

            let outcomes: Vec<ExtractionOutcome> = pool.install(|| {
                chunk
                    .par_iter()
                    .map(|file| self.extractor.extract_as(file.kind(), &file.source_path))
                    .collect()
            });

            for (file, outcome) in chunk.iter().zip(outcomes) {
                progress.begin_file(file.display_path());
                progress.record(self.persist(file, outcome));

                if let Some(callback) = progress_callback {
                    callback(progress);
                }
            }
        }
        Ok(())
    }

    fn persist(&self, file: &SourceFile, outcome: ExtractionOutcome) -> FileResult {
        let (status, message) = match outcome {
            ExtractionOutcome::Extracted(_) => (FileStatus::Extracted, None),
            ExtractionOutcome::Failed(ref failure) => (FileStatus::Failed, Some(failure.to_string())),
            ExtractionOutcome::Unsupported => (FileStatus::Unsupported, None),
        };

        let mut result = FileResult {
            relative_path: file.display_path(),
            kind: file.kind(),
            status,
            output: None,
            message,
        };

        match self.writer.write(&file.source_path, &outcome.render()) {
            Ok(output) => result.output = Some(output),
            Err(e) => {
                warn!("Cannot write output for {}: {}", file.source_path.display(), e);
                result.status = FileStatus::WriteError;
                result.message = Some(e.to_string());
            }
        }

        result
    }
}

/// Machine-readable summary of an extraction run.
#[derive(Debug, Clone, Serialize)]
pub struct ExtractionReport {
    pub root: String,
    pub extraction_time: DateTime<Utc>,
    pub duration_ms: u128,
    pub total_files: usize,
    pub extracted: usize,
    pub failed: usize,
    pub unsupported: usize,
    pub write_errors: usize,
    pub files: Vec<FileResult>,
}

impl ExtractionReport {
    pub fn from_progress(root: &Path, progress: &ExtractionProgress) -> Self {
        Self {
            root: root.display().to_string(),
            extraction_time: Utc::now(),
            duration_ms: progress.elapsed().as_millis(),
            total_files: progress.total_files,
            extracted: progress.extracted,
            failed: progress.failed,
            unsupported: progress.unsupported,
            write_errors: progress.errors.len(),
            files: progress.results.clone(),
        }
    }
}
