use crate::audio::WavReport;
use crate::error::{CorpusKitError, UserFriendlyError};
use crate::extractor::{ExtractionProgress, ExtractionReport};
use crate::json_tools::{CountSummary, RenameSummary};
use crate::ui::progress::format_duration;
use console::{style, Emoji, Term};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OutputMode {
    Human,
    Json,
    Plain,
}

impl OutputMode {
    pub fn from_string(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => OutputMode::Json,
            "plain" => OutputMode::Plain,
            _ => OutputMode::Human,
        }
    }
}

// Emojis with text fallbacks
static CHECKMARK: Emoji = Emoji("✅ ", "✓ ");
static CROSS: Emoji = Emoji("❌ ", "✗ ");
static INFO: Emoji = Emoji("ℹ️  ", "i ");
static WARNING: Emoji = Emoji("⚠️  ", "! ");
static ROCKET: Emoji = Emoji("🚀 ", "> ");
static SPARKLES: Emoji = Emoji("✨ ", "* ");
static FOLDER: Emoji = Emoji("📁 ", "");

pub struct OutputFormatter {
    #[allow(dead_code)]
    term: Term,
    mode: OutputMode,
    use_colors: bool,
    verbose_level: u8,
    quiet: bool,
}

impl OutputFormatter {
    pub fn new(mode: OutputMode, verbose: u8, quiet: bool) -> Self {
        let term = Term::stdout();
        let use_colors = match mode {
            OutputMode::Human => term.features().colors_supported() && !quiet,
            _ => false,
        };

        Self {
            term,
            mode,
            use_colors,
            verbose_level: if quiet { 0 } else { verbose },
            quiet,
        }
    }

    pub fn mode(&self) -> OutputMode {
        self.mode
    }

    // Core messaging methods
    pub fn success(&self, message: &str) {
        if self.quiet {
            return;
        }
        match self.mode {
            OutputMode::Human => self.print_human_message(MessageType::Success, message),
            OutputMode::Json => self.print_json_message("success", message),
            OutputMode::Plain => println!("SUCCESS: {}", message),
        }
    }

    pub fn error(&self, message: &str) {
        match self.mode {
            OutputMode::Human => self.print_human_message(MessageType::Error, message),
            OutputMode::Json => self.print_json_message("error", message),
            OutputMode::Plain => eprintln!("ERROR: {}", message),
        }
    }

    /// Shown unless `--quiet`; used for per-file problems the user must see.
    pub fn warning(&self, message: &str) {
        if self.should_show_message(0) {
            match self.mode {
                OutputMode::Human => self.print_human_message(MessageType::Warning, message),
                OutputMode::Json => self.print_json_message("warning", message),
                OutputMode::Plain => println!("WARNING: {}", message),
            }
        }
    }

    pub fn info(&self, message: &str) {
        if self.should_show_message(1) {
            match self.mode {
                OutputMode::Human => self.print_human_message(MessageType::Info, message),
                OutputMode::Json => self.print_json_message("info", message),
                OutputMode::Plain => println!("INFO: {}", message),
            }
        }
    }

    pub fn debug(&self, message: &str) {
        if self.should_show_message(2) {
            match self.mode {
                OutputMode::Human => {
                    if self.use_colors {
                        println!("  {}", style(message).dim());
                    } else {
                        println!("  DEBUG: {}", message);
                    }
                }
                OutputMode::Json => self.print_json_message("debug", message),
                OutputMode::Plain => println!("DEBUG: {}", message),
            }
        }
    }

    pub fn start_operation(&self, operation: &str) {
        if self.should_show_message(0) {
            match self.mode {
                OutputMode::Human => {
                    if self.use_colors {
                        println!("{}{}", ROCKET, style(operation).bold());
                    } else {
                        println!("> {}", operation);
                    }
                }
                OutputMode::Json => self.print_json_message("operation_start", operation),
                OutputMode::Plain => println!("STARTING: {}", operation),
            }
        }
    }

    /// One `[i/n] status: path (detail)` line per processed file, at `-v` and above.
    pub fn file_status(
        &self,
        index: usize,
        total: usize,
        status: &str,
        path: &str,
        detail: Option<&str>,
    ) {
        if !self.should_show_message(1) {
            return;
        }

        match self.mode {
            OutputMode::Json => self.print_json_object(&serde_json::json!({
                "type": "file",
                "index": index,
                "total": total,
                "status": status,
                "path": path,
                "detail": detail,
            })),
            _ => {
                let counter = format!("[{}/{}]", index, total);
                let counter = if self.use_colors {
                    style(counter).dim().to_string()
                } else {
                    counter
                };
                match detail {
                    Some(detail) => println!("{} {}: {} ({})", counter, status, path, detail),
                    None => println!("{} {}: {}", counter, status, path),
                }
            }
        }
    }

    // User-friendly error handling
    pub fn print_user_friendly_error(&self, error: &CorpusKitError) {
        let user_message = error.user_message();
        self.error(&user_message);

        if let Some(suggestion) = error.suggestion() {
            match self.mode {
                OutputMode::Human => {
                    eprintln!();
                    if self.use_colors {
                        eprintln!(
                            "{}{}",
                            INFO,
                            style(&format!("Suggestion: {}", suggestion)).cyan()
                        );
                    } else {
                        eprintln!("Suggestion: {}", suggestion);
                    }
                }
                OutputMode::Json => {
                    self.print_json_object(&serde_json::json!({
                        "type": "suggestion",
                        "message": suggestion
                    }));
                }
                OutputMode::Plain => {
                    eprintln!("SUGGESTION: {}", suggestion);
                }
            }
        }
    }

    // Summary and reporting
    pub fn print_extraction_summary(&self, progress: &ExtractionProgress) {
        if self.quiet {
            return;
        }

        match self.mode {
            OutputMode::Human => self.print_human_summary(progress),
            OutputMode::Json => {}
            OutputMode::Plain => self.print_plain_summary(progress),
        }
    }

    /// Full per-file report in JSON mode; the list of failed files otherwise.
    pub fn print_extraction_report(&self, report: &ExtractionReport) {
        match self.mode {
            OutputMode::Json => {
                let json_output =
                    serde_json::to_string_pretty(report).unwrap_or_else(|_| "{}".to_string());
                println!("{}", json_output);
            }
            _ => {
                if self.quiet {
                    return;
                }
                let problems: Vec<_> = report
                    .files
                    .iter()
                    .filter(|f| f.status.is_problem())
                    .collect();
                if problems.is_empty() {
                    return;
                }

                println!("Files with problems:");
                for file in problems {
                    let first_line = file
                        .message
                        .as_deref()
                        .and_then(|m| m.lines().next())
                        .unwrap_or("");
                    println!("  - {}: {}", file.relative_path, first_line);
                }
            }
        }
    }

    pub fn print_rename_summary(
        &self,
        summary: &RenameSummary,
        report: &Path,
        error_report: Option<&PathBuf>,
    ) {
        match self.mode {
            OutputMode::Json => self.print_json_object(&serde_json::json!({
                "type": "summary",
                "total_files": summary.total_files,
                "modified": summary.modified.len(),
                "unchanged": summary.unchanged,
                "errors": summary.errors.len(),
                "report": report,
                "error_report": error_report,
            })),
            _ => {
                if self.quiet {
                    return;
                }
                self.print_report_location("Modified-files report", report);
                if let Some(path) = error_report {
                    self.print_report_location("Error report", path);
                }
                println!();
                self.print_separator();
                println!("  Total JSON files: {}", self.highlight(summary.total_files));
                println!("  Modified files:   {}", self.highlight(summary.modified.len()));
                println!("  Files with errors: {}", self.highlight(summary.errors.len()));
                self.print_separator();
            }
        }
    }

    pub fn print_count_summary(&self, summary: &CountSummary, report: &Path) {
        match self.mode {
            OutputMode::Json => {
                let average = summary.average();
                self.print_json_object(&serde_json::json!({
                    "type": "summary",
                    "files": summary.files,
                    "total": summary.total(),
                    "average": {
                        "values": average[0],
                        "chars_without_spaces": average[1],
                        "chars_with_spaces": average[2],
                        "words": average[3],
                    },
                    "report": report,
                }));
            }
            _ => {
                if self.quiet {
                    return;
                }
                print!("{}", summary.render_table());
                println!();
                self.print_report_location("Saved summary", report);
            }
        }
    }

    pub fn print_wav_summary(&self, report: &WavReport, csv_path: &Path) {
        match self.mode {
            OutputMode::Json => self.print_json_object(&serde_json::json!({
                "type": "summary",
                "files": report.rows,
                "skipped": report.skipped.len(),
                "total_seconds": report.total_seconds(),
                "report": csv_path,
            })),
            _ => {
                if self.quiet {
                    return;
                }
                println!(
                    "  WAV files: {} ({} skipped), total {} s",
                    self.highlight(report.rows.len()),
                    report.skipped.len(),
                    report.total_seconds()
                );
                self.print_report_location("Saved", csv_path);
            }
        }
    }

    // Specialized output methods
    pub fn print_header(&self, title: &str) {
        if self.quiet {
            return;
        }

        match self.mode {
            OutputMode::Human => {
                println!();
                if self.use_colors {
                    println!("{} {}", SPARKLES, style(title).bold().cyan());
                } else {
                    println!("=== {} ===", title);
                }
                println!();
            }
            OutputMode::Json => {
                self.print_json_object(&serde_json::json!({
                    "type": "header",
                    "title": title
                }));
            }
            OutputMode::Plain => {
                println!("=== {} ===", title);
            }
        }
    }

    pub fn print_separator(&self) {
        if self.quiet {
            return;
        }

        match self.mode {
            OutputMode::Human => {
                if self.use_colors {
                    println!("{}", style("─".repeat(60)).dim());
                } else {
                    println!("{}", "-".repeat(60));
                }
            }
            OutputMode::Plain => {
                println!("{}", "-".repeat(60));
            }
            OutputMode::Json => {}
        }
    }

    // Private helper methods
    fn should_show_message(&self, min_verbose_level: u8) -> bool {
        !self.quiet && self.verbose_level >= min_verbose_level
    }

    fn highlight<T: ToString>(&self, value: T) -> String {
        if self.use_colors {
            style(value.to_string()).cyan().bold().to_string()
        } else {
            value.to_string()
        }
    }

    fn print_report_location(&self, label: &str, path: &Path) {
        match self.mode {
            OutputMode::Human if self.use_colors => {
                println!("{}{}: {}", FOLDER, label, style(path.display()).underlined())
            }
            _ => println!("{}: {}", label, path.display()),
        }
    }

    fn print_human_message(&self, msg_type: MessageType, message: &str) {
        #[allow(clippy::type_complexity)]
        let (emoji, color_fn): (Emoji, Box<dyn Fn(&str) -> console::StyledObject<&str>>) =
            match msg_type {
                MessageType::Success => (CHECKMARK, Box::new(|msg| style(msg).green().bold())),
                MessageType::Error => (CROSS, Box::new(|msg| style(msg).red().bold())),
                MessageType::Warning => (WARNING, Box::new(|msg| style(msg).yellow().bold())),
                MessageType::Info => (INFO, Box::new(|msg| style(msg).cyan())),
            };

        if self.use_colors {
            match msg_type {
                MessageType::Error => eprintln!("{}{}", emoji, color_fn(message)),
                _ => println!("{}{}", emoji, color_fn(message)),
            }
        } else {
            let prefix = match msg_type {
                MessageType::Success => "✓",
                MessageType::Error => "✗",
                MessageType::Warning => "!",
                MessageType::Info => "i",
            };

            match msg_type {
                MessageType::Error => eprintln!("{} {}", prefix, message),
                _ => println!("{} {}", prefix, message),
            }
        }
    }

    fn print_json_message(&self, level: &str, message: &str) {
        self.print_json_object(&serde_json::json!({
            "type": "message",
            "level": level,
            "message": message,
            "timestamp": chrono::Utc::now().to_rfc3339()
        }));
    }

    fn print_json_object(&self, obj: &serde_json::Value) {
        println!(
            "{}",
            serde_json::to_string(obj).unwrap_or_else(|_| "{}".to_string())
        );
    }

    fn print_human_summary(&self, progress: &ExtractionProgress) {
        println!();
        self.print_separator();

        if self.use_colors {
            println!(
                "{} {}",
                style("Text extraction completed!").green().bold(),
                CHECKMARK
            );
        } else {
            println!("✓ Text extraction completed!");
        }

        println!();
        println!("  Files processed: {}", self.highlight(progress.files_processed));
        println!("  Extracted:       {}", self.highlight(progress.extracted));
        println!("  Written:         {}", self.highlight(progress.written()));
        if progress.failed > 0 {
            println!("  Failed:          {}", progress.failed);
        }
        if progress.unsupported > 0 {
            println!("  Unsupported:     {}", progress.unsupported);
        }
        println!(
            "  Time taken:      {}",
            self.highlight(format_duration(progress.elapsed()))
        );

        if !progress.errors.is_empty() {
            println!("  Write errors:    {}", progress.errors.len());
        }

        self.print_separator();
    }

    fn print_plain_summary(&self, progress: &ExtractionProgress) {
        println!("COMPLETED: Text extraction");
        println!("Files processed: {}", progress.files_processed);
        println!("Extracted: {}", progress.extracted);
        println!("Written: {}", progress.written());
        println!("Failed: {}", progress.failed);
        println!("Unsupported: {}", progress.unsupported);
        println!("Duration: {:?}", progress.elapsed());
        if !progress.errors.is_empty() {
            println!("Write errors: {}", progress.errors.len());
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum MessageType {
    Success,
    Error,
    Warning,
    Info,
}

// Progress-aware output wrapper
pub struct ProgressAwareOutput<'a> {
    formatter: &'a OutputFormatter,
    progress_manager: Option<&'a crate::ui::ProgressManager>,
}

impl<'a> ProgressAwareOutput<'a> {
    pub fn new(
        formatter: &'a OutputFormatter,
        progress_manager: Option<&'a crate::ui::ProgressManager>,
    ) -> Self {
        Self {
            formatter,
            progress_manager,
        }
    }

    pub fn suspend_and_print<F>(&self, f: F)
    where
        F: FnOnce(&OutputFormatter),
    {
        if let Some(pm) = self.progress_manager {
            pm.suspend(|| f(self.formatter));
        } else {
            f(self.formatter);
        }
    }

    pub fn warning(&self, message: &str) {
        self.suspend_and_print(|f| f.warning(message));
    }

    pub fn file_status(
        &self,
        index: usize,
        total: usize,
        status: &str,
        path: &str,
        detail: Option<&str>,
    ) {
        self.suspend_and_print(|f| f.file_status(index, total, status, path, detail));
    }
}
