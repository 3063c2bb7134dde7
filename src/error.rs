use thiserror::Error;

#[derive(Error, Debug)]
pub enum CorpusKitError {
    #[error("IO operation failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Path validation failed: {path}")]
    InvalidPath { path: String },

    #[error("No matching files found under {root}")]
    NoFilesFound { root: String, extensions: Vec<String> },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Failed to write report {path}: {message}")]
    Report { path: String, message: String },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("No folder path was provided")]
    Prompt,

    #[error("Operation was cancelled by user")]
    Cancelled,
}

pub trait UserFriendlyError {
    fn user_message(&self) -> String;
    fn suggestion(&self) -> Option<String>;
}

impl UserFriendlyError for CorpusKitError {
    fn user_message(&self) -> String {
        match self {
            CorpusKitError::InvalidPath { path } => {
                format!("Not an existing folder: {}", path)
            }
            CorpusKitError::NoFilesFound { root, extensions } => {
                format!(
                    "No files with extensions [{}] found in {} or its subfolders",
                    extensions.join(", "),
                    root
                )
            }
            CorpusKitError::Config { message } => {
                format!("Configuration error: {}", message)
            }
            CorpusKitError::Report { path, message } => {
                format!("Could not save report {}: {}", path, message)
            }
            CorpusKitError::Prompt => "No folder path was entered".to_string(),
            CorpusKitError::Cancelled => "Operation was cancelled by user".to_string(),
            _ => self.to_string(),
        }
    }

    fn suggestion(&self) -> Option<String> {
        match self {
            CorpusKitError::InvalidPath { .. } => Some(
                "Pass an existing directory, e.g. `corpuskit extract ./documents`. Quotes around the path are stripped automatically.".to_string()
            ),
            CorpusKitError::NoFilesFound { .. } => Some(
                "Check the folder, or adjust `extract.extensions` in your configuration file.".to_string()
            ),
            CorpusKitError::Config { .. } => Some(
                "Check your configuration file syntax, or regenerate one with --generate-config.".to_string()
            ),
            CorpusKitError::Report { .. } => Some(
                "Choose a writable report directory with --report-dir.".to_string()
            ),
            _ => None,
        }
    }
}

impl From<toml::de::Error> for CorpusKitError {
    fn from(error: toml::de::Error) -> Self {
        CorpusKitError::Config {
            message: error.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, CorpusKitError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_friendly_messages() {
        let error = CorpusKitError::InvalidPath {
            path: "/no/such/dir".to_string(),
        };
        assert!(error.user_message().contains("/no/such/dir"));
        assert!(error.suggestion().is_some());
    }

    #[test]
    fn test_no_files_message_lists_extensions() {
        let error = CorpusKitError::NoFilesFound {
            root: "docs".to_string(),
            extensions: vec!["pdf".to_string(), "hwp".to_string()],
        };
        let message = error.user_message();
        assert!(message.contains("pdf, hwp"));
        assert!(message.contains("docs"));
    }

    #[test]
    fn test_toml_error_conversion() {
        let toml_error = toml::from_str::<toml::Value>("not = [valid").unwrap_err();
        let error = CorpusKitError::from(toml_error);
        assert!(matches!(error, CorpusKitError::Config { .. }));
    }
}
