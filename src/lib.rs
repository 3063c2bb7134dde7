pub mod audio;
pub mod cli;
pub mod config;
pub mod error;
pub mod extractor;
pub mod json_tools;
pub mod report;
pub mod scanner;
pub mod ui;

// Public API re-exports
pub use cli::{Cli, Command, OutputFormat};
pub use config::{CliOverrides, Config};
pub use error::{CorpusKitError, Result, UserFriendlyError};

// Core functionality re-exports
pub use audio::WavReport;
pub use extractor::{
    BatchExtractor, DocumentKind, ExtractionOutcome, ExtractionProgress, ExtractionReport,
    Extractor, HwpTool, OutputWriter,
};
pub use json_tools::{CountSummary, KeyRenamer, RenameOutcome, RenameSummary, ValueCounter};
pub use scanner::{FileFilter, FileScanner, SourceFile};
pub use ui::{GracefulShutdown, OutputFormatter, OutputMode, ProgressAwareOutput, ProgressManager};

use report::{report_timestamp, resolve_report_dir};
use std::path::{Path, PathBuf};

/// Main library interface: one method per tool.
pub struct CorpusKit {
    config: Config,
    output_formatter: OutputFormatter,
    progress_manager: ProgressManager,
    shutdown: GracefulShutdown,
}

impl CorpusKit {
    pub fn new(config: Config, output_mode: OutputMode, verbose: u8, quiet: bool) -> Result<Self> {
        Ok(Self::with_shutdown(
            config,
            output_mode,
            verbose,
            quiet,
            GracefulShutdown::new()?,
        ))
    }

    /// Use a caller-provided shutdown flag instead of installing a Ctrl+C handler.
    pub fn with_shutdown(
        config: Config,
        output_mode: OutputMode,
        verbose: u8,
        quiet: bool,
        shutdown: GracefulShutdown,
    ) -> Self {
        // JSON output must stay parseable, so no bars there.
        let show_progress = !quiet && output_mode != OutputMode::Json;

        Self {
            config,
            output_formatter: OutputFormatter::new(output_mode, verbose, quiet),
            progress_manager: ProgressManager::new(show_progress),
            shutdown,
        }
    }

    pub fn from_cli(cli_args: &Cli) -> Result<Self> {
        let config = cli_args.load_config()?;
        let output_mode = match cli_args.output_format {
            OutputFormat::Human => OutputMode::Human,
            OutputFormat::Json => OutputMode::Json,
            OutputFormat::Plain => OutputMode::Plain,
        };

        Self::new(config, output_mode, cli_args.verbose, cli_args.quiet)
    }

    /// Extracts every matching document under `root` into its sibling output folder.
    pub fn extract_documents(&self, root: &Path) -> Result<ExtractionReport> {
        self.shutdown.check_shutdown()?;
        self.output_formatter
            .start_operation("Scanning for documents");

        let scanner = FileScanner::new(FileFilter::new(self.config.normalized_extensions()));
        let files = self.scan(&scanner, root)?;

        if files.is_empty() {
            return Err(CorpusKitError::NoFilesFound {
                root: root.display().to_string(),
                extensions: scanner.filter().get_extensions().clone(),
            });
        }

        self.output_formatter
            .info(&format!("Found {} documents", files.len()));
        self.output_formatter
            .debug(&scanner.get_statistics(&files).display_summary());

        let hwp = HwpTool::detect(self.config.tools.hwp5txt.as_deref());
        if !hwp.is_available()
            && files.iter().any(|f| f.kind() == DocumentKind::HwpDocument)
        {
            self.output_formatter.warning(
                "hwp5txt was not found; HWP files will contain an error message instead of text",
            );
        }

        let extract_config = &self.config.extract;
        let batch = BatchExtractor::new(
            Extractor::new(hwp),
            OutputWriter::new(
                extract_config.output_dir_name.as_str(),
                extract_config.output_suffix.as_str(),
            ),
        )
        .with_workers(extract_config.workers);

        self.output_formatter.start_operation("Extracting text");

        let file_progress = self
            .progress_manager
            .create_file_progress(files.len() as u64, "files");
        let output = ProgressAwareOutput::new(&self.output_formatter, Some(&self.progress_manager));

        let on_progress = |progress: &ExtractionProgress| {
            ui::progress::update_file_progress(&file_progress, progress);
            if let Some(result) = progress.last_result() {
                let detail = result.message.as_deref().and_then(|m| m.lines().next());
                output.file_status(
                    progress.files_processed,
                    progress.total_files,
                    result.status.as_str(),
                    &result.relative_path,
                    detail,
                );
            }
        };
        let progress_callback: &dyn Fn(&ExtractionProgress) = &on_progress;

        let progress = match batch.run(&files, Some(progress_callback), &|| {
            self.shutdown.check_shutdown()
        }) {
            Ok(progress) => progress,
            Err(e) => {
                file_progress.abandon();
                return Err(e);
            }
        };

        ui::progress::finish_progress_with_summary(
            &file_progress,
            &format!("Extracted {} files", progress.extracted),
            progress.elapsed(),
        );
        self.progress_manager.clear();
        self.output_formatter.print_extraction_summary(&progress);

        Ok(ExtractionReport::from_progress(root, &progress))
    }

    /// Renames the configured key in every JSON file under `root` and writes the CSV reports.
    pub fn rename_keys(&self, root: &Path) -> Result<RenameSummary> {
        let renamer = KeyRenamer::new(
            self.config.rename.old_key.as_str(),
            self.config.rename.new_key.as_str(),
        )?;

        self.output_formatter.start_operation(&format!(
            "Renaming key \"{}\" to \"{}\"",
            renamer.old_key(),
            renamer.new_key()
        ));

        let files = self.scan(&FileScanner::new(FileFilter::new(["json"])), root)?;
        let mut summary = RenameSummary::new(files.len());

        if files.is_empty() {
            self.output_formatter
                .warning(&format!("No JSON files found in {}", root.display()));
            return Ok(summary);
        }

        let total = files.len();
        let file_progress = self
            .progress_manager
            .create_file_progress(total as u64, "JSON files");
        let output = ProgressAwareOutput::new(&self.output_formatter, Some(&self.progress_manager));

        for (index, file) in files.iter().enumerate() {
            if let Err(e) = self.shutdown.check_shutdown() {
                file_progress.abandon();
                return Err(e);
            }
            file_progress.set_message(file.display_path());

            let outcome = renamer.process_file(&file.source_path);
            let path = file.source_path.display().to_string();
            match outcome {
                RenameOutcome::Modified { changes, method } => {
                    let detail = format!("{} keys, {}", changes, method.as_str());
                    output.file_status(index + 1, total, "modified", &path, Some(&detail));
                }
                RenameOutcome::Unchanged => {
                    output.file_status(index + 1, total, "unchanged", &path, None);
                }
                RenameOutcome::Error { ref message } => {
                    output.warning(&format!("[{}/{}] error: {} ({})", index + 1, total, path, message));
                }
            }
            summary.record(&file.source_path, &outcome);
            file_progress.inc(1);
        }

        file_progress.finish_and_clear();

        let report_dir = self.report_dir();
        let (report, error_report) = summary.write_reports(&report_dir, &report_timestamp())?;
        self.output_formatter
            .print_rename_summary(&summary, &report, error_report.as_ref());

        Ok(summary)
    }

    /// Counts the configured key's string values in every JSON file under `root`.
    pub fn count_values(&self, root: &Path) -> Result<CountSummary> {
        let counter = ValueCounter::new(self.config.count.value_key.as_str());
        self.output_formatter.start_operation(&format!(
            "Counting \"{}\" values",
            counter.key()
        ));

        let files = self.scan(&FileScanner::new(FileFilter::new(["json"])), root)?;
        let mut summary = CountSummary::default();

        if files.is_empty() {
            self.output_formatter
                .warning(&format!("No JSON files found in {}", root.display()));
            return Ok(summary);
        }

        let total = files.len();
        let file_progress = self
            .progress_manager
            .create_file_progress(total as u64, "JSON files");
        let output = ProgressAwareOutput::new(&self.output_formatter, Some(&self.progress_manager));

        for (index, file) in files.iter().enumerate() {
            if let Err(e) = self.shutdown.check_shutdown() {
                file_progress.abandon();
                return Err(e);
            }
            file_progress.set_message(file.display_path());

            let file_count = counter.count_file(&file.source_path);
            let path = file.source_path.display().to_string();
            match file_count.error {
                Some(ref error) => {
                    output.warning(&format!("JSON parse failed: {} ({})", path, error))
                }
                None => {
                    let detail = format!("{} values", file_count.counts.values);
                    output.file_status(index + 1, total, "counted", &path, Some(&detail));
                }
            }
            summary.push(file_count);
            file_progress.inc(1);
        }

        file_progress.finish_and_clear();

        let report_path = summary.write_report(&self.report_dir(), &report_timestamp())?;
        self.output_formatter.print_count_summary(&summary, &report_path);

        Ok(summary)
    }

    /// Measures `.wav` files below folders containing the segment marker.
    pub fn wav_durations(&self, root: &Path) -> Result<WavReport> {
        let marker = self.config.wav.segment_marker.as_str();
        self.output_formatter.start_operation(&format!(
            "Measuring WAV files in \"{}\" folders",
            marker
        ));

        let scanner = FileScanner::new(FileFilter::new(["wav"]).with_directory_marker(marker));
        let files = self.scan(&scanner, root)?;
        let mut report = WavReport::default();

        if files.is_empty() {
            self.output_formatter.warning(&format!(
                "No .wav files found in folders containing \"{}\"",
                marker
            ));
            return Ok(report);
        }

        let total = files.len();
        let file_progress = self
            .progress_manager
            .create_file_progress(total as u64, "recordings");
        let output = ProgressAwareOutput::new(&self.output_formatter, Some(&self.progress_manager));

        for (index, file) in files.iter().enumerate() {
            if let Err(e) = self.shutdown.check_shutdown() {
                file_progress.abandon();
                return Err(e);
            }
            file_progress.set_message(file.display_path());

            match report.add(&file.source_path) {
                Ok(seconds) => {
                    let detail = format!("{} s", seconds);
                    output.file_status(index + 1, total, "measured", &file.display_path(), Some(&detail));
                }
                Err(reason) => output.warning(&format!(
                    "Skipping invalid WAV file {}: {}",
                    file.display_path(),
                    reason
                )),
            }
            file_progress.inc(1);
        }

        file_progress.finish_and_clear();

        let csv_path = report.write_csv(&self.report_dir())?;
        self.output_formatter.print_wav_summary(&report, &csv_path);

        Ok(report)
    }

    fn scan(&self, scanner: &FileScanner, root: &Path) -> Result<Vec<SourceFile>> {
        let spinner = self
            .progress_manager
            .create_spinner(&format!("Scanning {}", root.display()));
        let files = scanner.scan_directory(root);
        spinner.finish_and_clear();
        files
    }

    fn report_dir(&self) -> PathBuf {
        resolve_report_dir(self.config.reports.directory.as_deref())
    }

    /// Writes the default configuration, every key spelled out, to `output_path`.
    pub fn generate_sample_config<P: AsRef<Path>>(output_path: P) -> Result<()> {
        Config::default().save_to_file(output_path)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn output_formatter(&self) -> &OutputFormatter {
        &self.output_formatter
    }

    pub fn progress_manager(&self) -> &ProgressManager {
        &self.progress_manager
    }

    pub fn is_running(&self) -> bool {
        self.shutdown.is_running()
    }

    pub fn request_shutdown(&self) {
        self.shutdown.request_shutdown();
    }

    /// Handle error with user-friendly output
    pub fn handle_error(&self, error: &CorpusKitError) {
        self.output_formatter.print_user_friendly_error(error);
    }
}

pub fn version_info() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
