use super::hwp::HwpTool;
use super::kind::{DocumentKind, ExtractionFailure, ExtractionOutcome};
use super::{pdf, presentation, spreadsheet, word};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use tracing::{debug, warn};

/// Routes a file to its format handler by extension.
///
/// Never fails: handler errors, and panics raised inside the parsing crates,
/// come back as [`ExtractionOutcome::Failed`] so the batch can continue.
#[derive(Debug, Clone)]
pub struct Extractor {
    hwp: HwpTool,
}

impl Extractor {
    pub fn new(hwp: HwpTool) -> Self {
        Self { hwp }
    }

    pub fn extract(&self, path: &Path) -> ExtractionOutcome {
        self.extract_as(DocumentKind::from_path(path), path)
    }

    pub fn extract_as(&self, kind: DocumentKind, path: &Path) -> ExtractionOutcome {
        debug!("Extracting {} as {}", path.display(), kind);

        let outcome = match kind {
            DocumentKind::Spreadsheet => guarded(kind, || spreadsheet::extract(path)),
            DocumentKind::Presentation => guarded(kind, || presentation::extract(path)),
            DocumentKind::Pdf => guarded(kind, || pdf::extract(path)),
            DocumentKind::WordDocument => guarded(kind, || word::extract(path)),
            DocumentKind::HwpDocument => match self.hwp.extract(path) {
                Ok(text) => ExtractionOutcome::Extracted(text),
                Err(failure) => ExtractionOutcome::Failed(failure),
            },
            DocumentKind::Unsupported => ExtractionOutcome::Unsupported,
        };

        if let ExtractionOutcome::Failed(ref failure) = outcome {
            warn!("{}: {}", path.display(), failure);
        }

        outcome
    }
}

fn guarded<F>(kind: DocumentKind, handler: F) -> ExtractionOutcome
where
    F: FnOnce() -> anyhow::Result<String>,
{
    match panic::catch_unwind(AssertUnwindSafe(handler)) {
        Ok(Ok(text)) => ExtractionOutcome::Extracted(text),
        Ok(Err(e)) => ExtractionOutcome::Failed(ExtractionFailure::Handler {
            kind,
            message: format!("{e:#}"),
        }),
        Err(payload) => ExtractionOutcome::Failed(ExtractionFailure::Handler {
            kind,
            message: format!("parser panicked: {}", panic_message(payload.as_ref())),
        }),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn extractor() -> Extractor {
        Extractor::new(HwpTool::Unavailable)
    }

    #[test]
    fn test_unsupported_extension() {
        let outcome = extractor().extract(Path::new("notes.txt"));
        assert_eq!(outcome, ExtractionOutcome::Unsupported);
        assert_eq!(outcome.render(), "[Unsupported file format]");
    }

    #[test]
    fn test_corrupt_files_become_tagged_diagnostics() {
        let temp_dir = TempDir::new().unwrap();
        let cases = [
            ("bad.xlsx", "[Excel error]"),
            ("bad.pptx", "[PPTX error]"),
            ("bad.docx", "[Word error]"),
        ];

        for (name, tag) in cases {
            let path = temp_dir.path().join(name);
            fs::write(&path, b"corrupted bytes").unwrap();

            let outcome = extractor().extract(&path);
            assert!(!outcome.is_extracted(), "{name} should fail");
            assert!(outcome.render().starts_with(tag), "{name}: {}", outcome.render());
        }
    }

    #[test]
    fn test_missing_hwp_tool() {
        let outcome = extractor().extract(Path::new("문서.hwp"));
        assert_eq!(
            outcome,
            ExtractionOutcome::Failed(ExtractionFailure::ToolNotFound)
        );
    }

    #[test]
    fn test_panics_are_contained() {
        let outcome = guarded(DocumentKind::Pdf, || panic!("bad xref table"));
        assert_eq!(
            outcome.render(),
            "[PDF error] parser panicked: bad xref table"
        );
    }

    #[test]
    fn test_handler_errors_keep_context() {
        let outcome = guarded(DocumentKind::WordDocument, || {
            Err(anyhow::anyhow!("inner").context("outer"))
        });
        assert_eq!(outcome.render(), "[Word error] outer: inner");
    }
}
