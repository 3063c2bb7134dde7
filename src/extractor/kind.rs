use serde::Serialize;
use std::fmt;
use std::path::Path;
use thiserror::Error;

/// Closed set of formats the dispatcher knows how to handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    Spreadsheet,
    Presentation,
    Pdf,
    WordDocument,
    HwpDocument,
    Unsupported,
}

impl DocumentKind {
    /// Maps a lowercase or mixed-case extension (without the dot).
    pub fn from_extension(extension: &str) -> Self {
        match extension.to_lowercase().as_str() {
            "xlsx" | "xls" => DocumentKind::Spreadsheet,
            "pptx" => DocumentKind::Presentation,
            "pdf" => DocumentKind::Pdf,
            "docx" => DocumentKind::WordDocument,
            "hwp" => DocumentKind::HwpDocument,
            _ => DocumentKind::Unsupported,
        }
    }

    pub fn from_path(path: &Path) -> Self {
        path.extension()
            .and_then(|e| e.to_str())
            .map(Self::from_extension)
            .unwrap_or(DocumentKind::Unsupported)
    }

    /// Bracketed prefix used when a handler for this kind fails.
    pub fn error_tag(&self) -> &'static str {
        match self {
            DocumentKind::Spreadsheet => "[Excel error]",
            DocumentKind::Presentation => "[PPTX error]",
            DocumentKind::Pdf => "[PDF error]",
            DocumentKind::WordDocument => "[Word error]",
            DocumentKind::HwpDocument => "[HWP error]",
            DocumentKind::Unsupported => UNSUPPORTED_FORMAT,
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DocumentKind::Spreadsheet => "spreadsheet",
            DocumentKind::Presentation => "presentation",
            DocumentKind::Pdf => "pdf",
            DocumentKind::WordDocument => "word document",
            DocumentKind::HwpDocument => "hwp document",
            DocumentKind::Unsupported => "unsupported",
        };
        f.write_str(name)
    }
}

pub const UNSUPPORTED_FORMAT: &str = "[Unsupported file format]";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractionFailure {
    #[error("{tag} {message}", tag = .kind.error_tag())]
    Handler { kind: DocumentKind, message: String },

    #[error("[HWP error] hwp5txt executable not found. Install pyhwp or set tools.hwp5txt in the configuration.")]
    ToolNotFound,

    #[error("[hwp5txt no output]\n{stderr}")]
    ToolNoOutput { stderr: String },

    #[error("[hwp5txt execution error] {message}")]
    ToolLaunch { message: String },
}

/// Result of extracting one file. Only turned into text by [`ExtractionOutcome::render`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractionOutcome {
    Extracted(String),
    Failed(ExtractionFailure),
    Unsupported,
}

impl ExtractionOutcome {
    pub fn is_extracted(&self) -> bool {
        matches!(self, ExtractionOutcome::Extracted(_))
    }

    pub fn status(&self) -> &'static str {
        match self {
            ExtractionOutcome::Extracted(_) => "extracted",
            ExtractionOutcome::Failed(_) => "failed",
            ExtractionOutcome::Unsupported => "unsupported",
        }
    }

    /// The text written to the output artifact; failures become in-band diagnostics.
    pub fn render(&self) -> String {
        match self {
            ExtractionOutcome::Extracted(text) => text.clone(),
            ExtractionOutcome::Failed(failure) => failure.to_string(),
            ExtractionOutcome::Unsupported => UNSUPPORTED_FORMAT.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_from_extension() {
        assert_eq!(DocumentKind::from_extension("xlsx"), DocumentKind::Spreadsheet);
        assert_eq!(DocumentKind::from_extension("XLS"), DocumentKind::Spreadsheet);
        assert_eq!(DocumentKind::from_extension("pptx"), DocumentKind::Presentation);
        assert_eq!(DocumentKind::from_extension("Pdf"), DocumentKind::Pdf);
        assert_eq!(DocumentKind::from_extension("docx"), DocumentKind::WordDocument);
        assert_eq!(DocumentKind::from_extension("hwp"), DocumentKind::HwpDocument);
        assert_eq!(DocumentKind::from_extension("ppt"), DocumentKind::Unsupported);
        assert_eq!(DocumentKind::from_extension("txt"), DocumentKind::Unsupported);
    }

    #[test]
    fn test_kind_from_path() {
        assert_eq!(DocumentKind::from_path(Path::new("a/b/보고서.HWP")), DocumentKind::HwpDocument);
        assert_eq!(DocumentKind::from_path(Path::new("Makefile")), DocumentKind::Unsupported);
    }

    #[test]
    fn test_failure_rendering() {
        let failure = ExtractionFailure::Handler {
            kind: DocumentKind::Pdf,
            message: "broken xref".to_string(),
        };
        assert_eq!(failure.to_string(), "[PDF error] broken xref");

        let no_output = ExtractionFailure::ToolNoOutput {
            stderr: "unknown format".to_string(),
        };
        assert_eq!(no_output.to_string(), "[hwp5txt no output]\nunknown format");
    }

    #[test]
    fn test_outcome_render() {
        assert_eq!(ExtractionOutcome::Extracted("body".to_string()).render(), "body");
        assert_eq!(ExtractionOutcome::Unsupported.render(), "[Unsupported file format]");
        assert!(ExtractionOutcome::Failed(ExtractionFailure::ToolNotFound)
            .render()
            .starts_with("[HWP error]"));
    }
}
