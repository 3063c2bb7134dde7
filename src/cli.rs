use crate::config::{CliOverrides, Config};
use crate::error::Result;
use crate::scanner::validate_root;
use crate::ui::{clean_path_input, prompt_directory, InvalidInput};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "corpuskit")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Folder-walking utilities for preparing and auditing text corpora")]
#[command(
    long_about = "CorpusKit extracts plain text from office documents (xlsx, xls, pptx, pdf, docx, hwp) \
                  into a \"txt output\" folder next to each file, and bundles small JSON and WAV \
                  auditing tools that write CSV reports."
)]
#[command(before_help = "📚 CorpusKit - Corpus Preparation Tools")]
#[command(after_help = "EXAMPLES:\n  \
    corpuskit extract ./documents\n  \
    corpuskit extract ./documents --hwp5txt /opt/pyhwp/bin/hwp5txt -v\n  \
    corpuskit rename-key ./dialogs --old-key meassages --new-key messages\n  \
    corpuskit count-values ./dialogs --report-dir ./reports\n  \
    corpuskit wav-durations ./recordings --marker 02_segment\n  \
    corpuskit --generate-config --config corpuskit.toml\n\n\
    When PATH is omitted the folder is asked for on the terminal.")]
#[command(arg_required_else_help = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Configuration file path
    #[arg(short, long, global = true, help = "Path to TOML configuration file")]
    pub config: Option<PathBuf>,

    /// Output format for results
    #[arg(long, value_enum, global = true, default_value_t = OutputFormat::Human)]
    pub output_format: OutputFormat,

    /// Verbose output level (-v, -vv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (suppress non-essential output)
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Directory for CSV reports
    #[arg(
        long,
        global = true,
        help = "Directory for CSV reports (default: desktop, then home)"
    )]
    pub report_dir: Option<PathBuf>,

    /// Generate sample configuration file
    #[arg(long, help = "Generate a sample configuration file")]
    pub generate_config: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Extract text from documents into "txt output" folders
    Extract {
        /// Root folder to scan
        path: Option<PathBuf>,

        /// Path to the hwp5txt executable
        #[arg(long)]
        hwp5txt: Option<PathBuf>,
    },

    /// Rename a key in every JSON file, in place
    RenameKey {
        /// Root folder to scan
        path: Option<PathBuf>,

        /// Key to replace
        #[arg(long)]
        old_key: Option<String>,

        /// Replacement key
        #[arg(long)]
        new_key: Option<String>,
    },

    /// Count characters and words of string values in JSON files
    CountValues {
        /// Root folder to scan
        path: Option<PathBuf>,

        /// Key whose string values are counted
        #[arg(long)]
        key: Option<String>,
    },

    /// Report durations of WAV files below segment folders
    WavDurations {
        /// Root folder to scan
        path: Option<PathBuf>,

        /// Only folders whose path contains this marker are considered
        #[arg(long)]
        marker: Option<String>,
    },
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable colored output
    Human,
    /// JSON formatted output
    Json,
    /// Plain text output
    Plain,
}

impl Command {
    pub fn path(&self) -> Option<&Path> {
        match self {
            Command::Extract { path, .. }
            | Command::RenameKey { path, .. }
            | Command::CountValues { path, .. }
            | Command::WavDurations { path, .. } => path.as_deref(),
        }
    }

    fn prompt_message(&self) -> &'static str {
        match self {
            Command::Extract { .. } => "Folder containing the documents",
            Command::RenameKey { .. } | Command::CountValues { .. } => {
                "Folder containing the JSON files"
            }
            Command::WavDurations { .. } => "Folder containing the WAV files",
        }
    }

    /// Extraction and renaming modify files, so a wrong answer ends the run.
    fn on_invalid_input(&self) -> InvalidInput {
        match self {
            Command::Extract { .. } | Command::RenameKey { .. } => InvalidInput::Fail,
            Command::CountValues { .. } | Command::WavDurations { .. } => InvalidInput::Retry,
        }
    }

    /// The PATH argument if given, otherwise a prompted folder.
    pub fn resolve_root(&self) -> Result<PathBuf> {
        match self.path() {
            Some(path) => {
                let cleaned = PathBuf::from(clean_path_input(&path.to_string_lossy()));
                validate_root(&cleaned)?;
                Ok(cleaned)
            }
            None => prompt_directory(self.prompt_message(), self.on_invalid_input()),
        }
    }
}

impl Cli {
    pub fn load_config(&self) -> Result<Config> {
        let mut config = Config::load_with_defaults(self.config.as_ref())?;

        let overrides = self.create_cli_overrides();
        config.merge_with_cli_args(&overrides);
        config.validate()?;

        Ok(config)
    }

    pub fn create_cli_overrides(&self) -> CliOverrides {
        let overrides = CliOverrides::new().with_report_dir(self.report_dir.clone());

        match self.command {
            Some(Command::Extract { ref hwp5txt, .. }) => overrides.with_hwp5txt(hwp5txt.clone()),
            Some(Command::RenameKey {
                ref old_key,
                ref new_key,
                ..
            }) => overrides.with_rename_keys(old_key.clone(), new_key.clone()),
            Some(Command::CountValues { ref key, .. }) => overrides.with_value_key(key.clone()),
            Some(Command::WavDurations { ref marker, .. }) => {
                overrides.with_segment_marker(marker.clone())
            }
            None => overrides,
        }
    }

    pub fn verbosity_level(&self) -> u8 {
        if self.quiet {
            0
        } else {
            self.verbose
        }
    }

    /// Default `tracing` filter for the chosen verbosity; `RUST_LOG` takes precedence.
    pub fn log_filter(&self) -> &'static str {
        match self.verbosity_level() {
            _ if self.quiet => "corpuskit=error",
            0 => "corpuskit=warn",
            1 => "corpuskit=info",
            _ => "corpuskit=debug",
        }
    }
}
