use clap::{CommandFactory, Parser};
use corpuskit::{
    Cli, Command, CorpusKit, CorpusKitError, OutputFormatter, OutputMode, UserFriendlyError,
};
use std::io::{self, Write};
use std::process;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() {
    let exit_code = run();
    process::exit(exit_code);
}

fn run() -> i32 {
    let cli = Cli::parse();
    setup_logging(&cli);

    // Handle special commands first
    if cli.generate_config {
        return handle_generate_config(&cli);
    }

    let Some(command) = cli.command.clone() else {
        return print_usage(&mut io::stdout());
    };

    let corpuskit = match CorpusKit::from_cli(&cli) {
        Ok(corpuskit) => corpuskit,
        Err(e) => {
            print_startup_error(&e);
            return exit_code_for(&e);
        }
    };

    let root = match command.resolve_root() {
        Ok(root) => root,
        Err(e) => {
            corpuskit.handle_error(&e);
            return exit_code_for(&e);
        }
    };

    let outcome = match command {
        Command::Extract { .. } => corpuskit.extract_documents(&root).map(|report| {
            corpuskit.output_formatter().print_extraction_report(&report);
            report.failed + report.write_errors > 0
        }),
        Command::RenameKey { .. } => corpuskit
            .rename_keys(&root)
            .map(|summary| !summary.errors.is_empty()),
        Command::CountValues { .. } => corpuskit
            .count_values(&root)
            .map(|summary| summary.error_count() > 0),
        Command::WavDurations { .. } => corpuskit
            .wav_durations(&root)
            .map(|report| !report.skipped.is_empty()),
    };

    match outcome {
        Ok(false) => 0,
        // Finished, but some files could not be processed
        Ok(true) => 2,
        Err(e) => {
            corpuskit.handle_error(&e);
            exit_code_for(&e)
        }
    }
}

/// Help text for a run without a subcommand, which always exits with 1.
fn print_usage<W: Write>(out: &mut W) -> i32 {
    if let Err(e) = Cli::command().write_help(out) {
        tracing::warn!("Could not print usage: {}", e);
    }
    1
}

fn exit_code_for(error: &CorpusKitError) -> i32 {
    match error {
        CorpusKitError::Cancelled => 130, // Interrupted (SIGINT)
        CorpusKitError::InvalidPath { .. } => 3,
        CorpusKitError::NoFilesFound { .. } => 4,
        CorpusKitError::Config { .. } => 5,
        _ => 1, // General error
    }
}

fn handle_generate_config(cli: &Cli) -> i32 {
    let config_path = cli
        .config
        .as_ref()
        .map(|p| p.to_string_lossy().to_string())
        .unwrap_or_else(|| "corpuskit.toml".to_string());

    match CorpusKit::generate_sample_config(&config_path) {
        Ok(()) => {
            println!("Generated sample configuration file: {}", config_path);
            println!("\nTo use this configuration:");
            println!("  corpuskit --config {} extract <folder>", config_path);
            println!("\nEdit the file to customize settings for your needs.");
            0
        }
        Err(e) => {
            eprintln!(
                "Failed to generate configuration file: {}",
                e.user_message()
            );
            if let Some(suggestion) = e.suggestion() {
                eprintln!("Suggestion: {}", suggestion);
            }
            1
        }
    }
}

fn print_startup_error(error: &CorpusKitError) {
    // Create a basic formatter for startup errors
    let formatter = OutputFormatter::new(OutputMode::Human, 0, false);
    formatter.print_user_friendly_error(error);
}

/// Diagnostics go to stderr so they never interleave with reports on stdout.
fn setup_logging(cli: &Cli) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| cli.log_filter().into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_generate_config_command() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("test.toml");

        let cli = Cli::try_parse_from([
            "corpuskit",
            "--generate-config",
            "--config",
            config_path.to_str().unwrap(),
        ])
        .unwrap();

        let exit_code = handle_generate_config(&cli);
        assert_eq!(exit_code, 0);

        let content = fs::read_to_string(&config_path).unwrap();
        assert!(content.contains("[extract]"));
    }

    struct BrokenPipe;

    impl Write for BrokenPipe {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_usage_lists_subcommands() {
        let mut out = Vec::new();
        assert_eq!(print_usage(&mut out), 1);

        let help = String::from_utf8(out).unwrap();
        assert!(help.contains("extract"));
        assert!(help.contains("wav-durations"));
    }

    #[test]
    fn test_usage_write_failure_still_exits_with_one() {
        assert_eq!(print_usage(&mut BrokenPipe), 1);
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(exit_code_for(&CorpusKitError::Cancelled), 130);
        assert_eq!(
            exit_code_for(&CorpusKitError::InvalidPath {
                path: "x".to_string()
            }),
            3
        );
        assert_eq!(
            exit_code_for(&CorpusKitError::NoFilesFound {
                root: "x".to_string(),
                extensions: vec![]
            }),
            4
        );
        assert_eq!(
            exit_code_for(&CorpusKitError::Config {
                message: "bad".to_string()
            }),
            5
        );
        assert_eq!(exit_code_for(&CorpusKitError::Prompt), 1);
    }
}
