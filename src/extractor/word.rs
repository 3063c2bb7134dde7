use super::collapse_whitespace;
use anyhow::{anyhow, Context, Result};
use docx_rs::{
    DocumentChild, Paragraph, ParagraphChild, RunChild, Styles, Table, TableCellContent,
};
use std::fs;
use std::path::Path;

const CELL_SEPARATOR: &str = " | ";

/// Paragraphs first, in document order, then every top-level table.
pub fn extract(path: &Path) -> Result<String> {
    let bytes = fs::read(path).with_context(|| format!("cannot read {}", path.display()))?;
    extract_from_bytes(&bytes)
}

pub fn extract_from_bytes(bytes: &[u8]) -> Result<String> {
    let docx = docx_rs::read_docx(bytes).map_err(|e| anyhow!("DOCX parse error: {e}"))?;
    let children = &docx.document.children;

    let mut text = String::new();

    for child in children {
        if let DocumentChild::Paragraph(paragraph) = child {
            let para_text = paragraph_text(paragraph);
            if is_heading(paragraph, &docx.styles) {
                text.push_str(&format!("\n=== {} ===\n", para_text));
            } else if !para_text.trim().is_empty() {
                text.push_str(&collapse_whitespace(&para_text));
                text.push('\n');
            }
        }
    }

    for child in children {
        if let DocumentChild::Table(table) = child {
            text.push_str("\n=== Table ===\n");
            for row in table_rows(table) {
                text.push_str(&row.join(CELL_SEPARATOR));
                text.push('\n');
            }
        }
    }

    Ok(text)
}

/// Tests the style *name*: localized Word writes built-in headings with ids
/// like `1` but names like `heading 1`. An unknown id is not a heading.
fn is_heading(paragraph: &Paragraph, styles: &Styles) -> bool {
    paragraph
        .property
        .style
        .as_ref()
        .and_then(|style| styles.find_style_by_id(&style.val))
        .is_some_and(|style| style.name.is_heading())
}

fn paragraph_text(paragraph: &Paragraph) -> String {
    let mut content = String::new();
    push_children_text(&paragraph.children, &mut content);
    content
}

fn push_children_text(children: &[ParagraphChild], content: &mut String) {
    for child in children {
        match child {
            ParagraphChild::Run(run) => {
                for run_child in &run.children {
                    match run_child {
                        RunChild::Text(text) => content.push_str(&text.text),
                        RunChild::Tab(_) => content.push('\t'),
                        RunChild::Break(_) => content.push('\n'),
                        _ => {}
                    }
                }
            }
            ParagraphChild::Hyperlink(link) => push_children_text(&link.children, content),
            _ => {}
        }
    }
}

/// Each row as its stripped cell texts; a cell's paragraphs are joined by newlines.
fn table_rows(table: &Table) -> Vec<Vec<String>> {
    let mut rows = Vec::new();

    for table_child in &table.rows {
        let docx_rs::TableChild::TableRow(row) = table_child;
        let mut cells = Vec::new();
        for row_child in &row.cells {
            let docx_rs::TableRowChild::TableCell(cell) = row_child;
            let paragraphs: Vec<String> = cell
                .children
                .iter()
                .filter_map(|content| match content {
                    TableCellContent::Paragraph(para) => Some(paragraph_text(para)),
                    _ => None,
                })
                .collect();
            cells.push(paragraphs.join("\n").trim().to_string());
        }
        rows.push(cells);
    }

    rows
}
