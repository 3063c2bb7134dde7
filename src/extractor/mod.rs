pub mod batch;
pub mod dispatcher;
pub mod hwp;
pub mod kind;
pub mod output_writer;
pub mod pdf;
pub mod presentation;
pub mod spreadsheet;
pub mod word;

pub use batch::{BatchExtractor, ExtractionProgress, ExtractionReport, FileResult, FileStatus};
pub use dispatcher::Extractor;
pub use hwp::HwpTool;
pub use kind::{DocumentKind, ExtractionFailure, ExtractionOutcome};
pub use output_writer::OutputWriter;

/// Collapses every whitespace run (newlines included) to a single space and trims.
pub(crate) fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
