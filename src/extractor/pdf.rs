use anyhow::{anyhow, Context, Result};
use lopdf::Document;
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

/// A PDF text backend producing one string per page, in page order.
pub trait PageTextSource {
    fn name(&self) -> &'static str;
    fn page_texts(&self, bytes: &[u8]) -> Result<Vec<String>>;
}

/// Layout-aware extraction through pdf-extract.
pub struct LayoutTextSource;

impl PageTextSource for LayoutTextSource {
    fn name(&self) -> &'static str {
        "pdf-extract"
    }

    fn page_texts(&self, bytes: &[u8]) -> Result<Vec<String>> {
        pdf_extract::extract_text_from_mem_by_pages(bytes).map_err(|e| anyhow!(e.to_string()))
    }
}

/// Content-stream extraction through lopdf; tolerates documents pdf-extract gives up on.
pub struct ObjectTextSource;

impl PageTextSource for ObjectTextSource {
    fn name(&self) -> &'static str {
        "lopdf"
    }

    fn page_texts(&self, bytes: &[u8]) -> Result<Vec<String>> {
        let doc = Document::load_mem(bytes).context("lopdf could not load document")?;

        let pages = doc
            .get_pages()
            .keys()
            .map(|&page_num| match doc.extract_text(&[page_num]) {
                Ok(text) => text,
                Err(e) => {
                    debug!("lopdf: no text on page {}: {}", page_num, e);
                    String::new()
                }
            })
            .collect();

        Ok(pages)
    }
}

pub fn extract(path: &Path) -> Result<String> {
    let bytes = fs::read(path).with_context(|| format!("cannot read {}", path.display()))?;
    extract_with(&bytes, &LayoutTextSource, &ObjectTextSource)
}

/// Runs `primary`; only when every page it returns is blank is the whole
/// document retried with `fallback`. Errors from `primary` are not retried.
pub fn extract_with(
    bytes: &[u8],
    primary: &dyn PageTextSource,
    fallback: &dyn PageTextSource,
) -> Result<String> {
    let pages = primary.page_texts(bytes)?;
    if !all_blank(&pages) {
        return Ok(render_pages(&pages));
    }

    debug!(
        "{} found no text in {} page(s), retrying with {}",
        primary.name(),
        pages.len(),
        fallback.name()
    );

    let retry = fallback
        .page_texts(bytes)
        .with_context(|| format!("{} fallback failed", fallback.name()))?;

    if all_blank(&retry) {
        warn!("No extractable text in PDF ({} pages)", pages.len());
        Ok(render_pages(&pages))
    } else {
        Ok(render_pages(&retry))
    }
}

fn all_blank(pages: &[String]) -> bool {
    pages.iter().all(|page| page.trim().is_empty())
}

fn render_pages(pages: &[String]) -> String {
    let mut text = String::new();
    for (idx, page) in pages.iter().enumerate() {
        text.push_str(&format!("\n=== Page {} ===\n", idx + 1));
        if !page.is_empty() {
            text.push_str(page);
            text.push('\n');
        }
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::content::{Content, Operation};
    use lopdf::{dictionary, Object, Stream};
    use std::cell::Cell;
    use tempfile::TempDir;

    /// One Courier text line per page.
    fn build_pdf(lines: &[&str]) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });

        let kids: Vec<Object> = lines
            .iter()
            .map(|line| {
                let content = Content {
                    operations: vec![
                        Operation::new("BT", vec![]),
                        Operation::new("Tf", vec!["F1".into(), 24.into()]),
                        Operation::new("Td", vec![100.into(), 600.into()]),
                        Operation::new("Tj", vec![Object::string_literal(*line)]),
                        Operation::new("ET", vec![]),
                    ],
                };
                let content_id =
                    doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
                doc.add_object(dictionary! {
                    "Type" => "Page",
                    "Parent" => pages_id,
                    "Contents" => content_id,
                    "Resources" => resources_id,
                })
                .into()
            })
            .collect();

        let pages = dictionary! {
            "Type" => "Pages",
            "Count" => kids.len() as i64,
            "Kids" => kids,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        };
        doc.objects.insert(pages_id, Object::Dictionary(pages));
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).unwrap();
        bytes
    }

    struct FakeSource {
        pages: Option<Vec<&'static str>>,
        calls: Cell<usize>,
    }

    impl FakeSource {
        fn returning(pages: Vec<&'static str>) -> Self {
            Self {
                pages: Some(pages),
                calls: Cell::new(0),
            }
        }

        fn failing() -> Self {
            Self {
                pages: None,
                calls: Cell::new(0),
            }
        }
    }

    impl PageTextSource for FakeSource {
        fn name(&self) -> &'static str {
            "fake"
        }

        fn page_texts(&self, _bytes: &[u8]) -> Result<Vec<String>> {
            self.calls.set(self.calls.get() + 1);
            match self.pages {
                Some(ref pages) => Ok(pages.iter().map(|p| p.to_string()).collect()),
                None => Err(anyhow!("unreadable")),
            }
        }
    }

    #[test]
    fn test_primary_text_is_used() {
        let primary = FakeSource::returning(vec!["first", "", "third"]);
        let fallback = FakeSource::returning(vec!["never"]);

        let text = extract_with(b"", &primary, &fallback).unwrap();
        assert_eq!(
            text,
            "\n=== Page 1 ===\nfirst\n\n=== Page 2 ===\n\n=== Page 3 ===\nthird\n"
        );
        assert_eq!(fallback.calls.get(), 0);
    }

    #[test]
    fn test_fallback_on_total_emptiness() {
        let primary = FakeSource::returning(vec!["  ", "\n"]);
        let fallback = FakeSource::returning(vec!["recovered", ""]);

        let text = extract_with(b"", &primary, &fallback).unwrap();
        assert_eq!(text, "\n=== Page 1 ===\nrecovered\n\n=== Page 2 ===\n");
        assert_eq!(fallback.calls.get(), 1);
    }

    #[test]
    fn test_no_fallback_when_one_page_has_text() {
        let primary = FakeSource::returning(vec!["", "only page two"]);
        let fallback = FakeSource::returning(vec!["a", "b"]);

        let text = extract_with(b"", &primary, &fallback).unwrap();
        assert!(text.contains("only page two"));
        assert_eq!(fallback.calls.get(), 0);
    }

    #[test]
    fn test_both_empty_returns_markers() {
        let primary = FakeSource::returning(vec!["", ""]);
        let fallback = FakeSource::returning(vec!["", ""]);

        let text = extract_with(b"", &primary, &fallback).unwrap();
        assert_eq!(text, "\n=== Page 1 ===\n\n=== Page 2 ===\n");
    }

    #[test]
    fn test_primary_error_is_not_retried() {
        let primary = FakeSource::failing();
        let fallback = FakeSource::returning(vec!["text"]);

        assert!(extract_with(b"", &primary, &fallback).is_err());
        assert_eq!(fallback.calls.get(), 0);
    }

    #[test]
    fn test_fallback_error_propagates() {
        let primary = FakeSource::returning(vec![""]);
        let fallback = FakeSource::failing();

        let err = extract_with(b"", &primary, &fallback).unwrap_err();
        assert!(format!("{err:#}").contains("fallback failed"));
    }

    #[test]
    fn test_object_source_rejects_garbage() {
        assert!(ObjectTextSource.page_texts(b"not a pdf at all").is_err());
    }

    #[test]
    fn test_object_source_reads_each_page() {
        let bytes = build_pdf(&["Alpha", "Bravo"]);

        let pages = ObjectTextSource.page_texts(&bytes).unwrap();
        assert_eq!(pages.len(), 2);
        assert!(pages[0].contains("Alpha"));
        assert!(pages[1].contains("Bravo"));
    }

    #[test]
    fn test_extract_generated_pdf() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("two_pages.pdf");
        fs::write(&path, build_pdf(&["Alpha", "Bravo"])).unwrap();

        let text = extract(&path).unwrap();
        let page_one = text.find("=== Page 1 ===").unwrap();
        let alpha = text.find("Alpha").unwrap();
        let page_two = text.find("=== Page 2 ===").unwrap();
        let bravo = text.find("Bravo").unwrap();
        assert!(page_one < alpha && alpha < page_two && page_two < bravo);
        assert!(!text.contains("=== Page 3 ==="));
    }
}
