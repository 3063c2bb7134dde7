use anyhow::{Context, Result};
use calamine::{open_workbook_auto, Data, Reader};
use std::path::Path;
use tracing::debug;

/// Cells longer than this are cut and suffixed with `...`.
const MAX_CELL_CHARS: usize = 100;
const COLUMN_GAP: &str = "  ";

/// Renders every sheet of an `.xlsx`/`.xls` workbook as an aligned text table.
///
/// Each sheet is introduced by `=== <name> ===`. Any sheet that cannot be
/// read fails the whole workbook.
pub fn extract(path: &Path) -> Result<String> {
    let mut workbook = open_workbook_auto(path)
        .with_context(|| format!("cannot open workbook {}", path.display()))?;

    let mut text = String::new();
    for name in workbook.sheet_names() {
        let range = workbook
            .worksheet_range(&name)
            .with_context(|| format!("cannot read sheet {name:?}"))?;

        let (rows, cols) = range.get_size();
        debug!("Sheet {:?}: {} rows x {} columns", name, rows, cols);

        // Rows are relative to the used range, which need not start at A1.
        let table: Vec<Vec<String>> = range
            .rows()
            .map(|row| row.iter().map(format_cell_value).collect())
            .collect();

        text.push_str(&format!("\n=== {} ===\n", name));
        text.push_str(&render_table(&table));
        text.push_str("\n\n");
    }

    Ok(text)
}

fn format_cell_value(cell: &Data) -> String {
    match cell {
        Data::String(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => {
            let s = format!("{f}");
            if s.contains('.') {
                s.trim_end_matches('0').trim_end_matches('.').to_string()
            } else {
                s
            }
        }
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => dt.to_string(),
        Data::DateTimeIso(dt) => dt.to_string(),
        Data::DurationIso(d) => d.to_string(),
        Data::Error(e) => format!("#{e:?}"),
        _ => String::new(),
    }
}

fn truncate_cell(cell: &str) -> String {
    if cell.chars().count() > MAX_CELL_CHARS {
        let kept: String = cell.chars().take(MAX_CELL_CHARS - 3).collect();
        format!("{kept}...")
    } else {
        cell.to_string()
    }
}

/// Right-justifies every column to its widest cell.
fn render_table(rows: &[Vec<String>]) -> String {
    let rows: Vec<Vec<String>> = rows
        .iter()
        .map(|row| row.iter().map(|c| truncate_cell(c)).collect())
        .collect();

    let columns = rows.iter().map(Vec::len).max().unwrap_or(0);
    let mut widths = vec![0usize; columns];
    for row in &rows {
        for (idx, cell) in row.iter().enumerate() {
            widths[idx] = widths[idx].max(cell.chars().count());
        }
    }

    rows.iter()
        .map(|row| {
            row.iter()
                .enumerate()
                .map(|(idx, cell)| format!("{:>width$}", cell, width = widths[idx]))
                .collect::<Vec<_>>()
                .join(COLUMN_GAP)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::io::Write;
    use tempfile::TempDir;
    use zip::write::SimpleFileOptions;
    use zip::ZipWriter;

    /// Minimal workbook; each sheet is a list of `(cell reference, value)` pairs.
    /// Numeric values are written as numbers, anything else as an inline string.
    fn write_xlsx(path: &Path, sheets: &[(&str, &[(&str, &str)])]) {
        let mut writer = ZipWriter::new(fs::File::create(path).unwrap());
        let options = SimpleFileOptions::default();

        let mut workbook = String::from(
            r#"<?xml version="1.0" encoding="UTF-8"?><workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets>"#,
        );
        let mut rels = String::from(
            r#"<?xml version="1.0" encoding="UTF-8"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
        );
        for (i, (name, _)) in sheets.iter().enumerate() {
            let n = i + 1;
            workbook.push_str(&format!(r#"<sheet name="{name}" sheetId="{n}" r:id="rId{n}"/>"#));
            rels.push_str(&format!(
                r#"<Relationship Id="rId{n}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet{n}.xml"/>"#
            ));
        }
        workbook.push_str("</sheets></workbook>");
        rels.push_str("</Relationships>");

        writer.start_file("xl/workbook.xml", options).unwrap();
        writer.write_all(workbook.as_bytes()).unwrap();
        writer.start_file("xl/_rels/workbook.xml.rels", options).unwrap();
        writer.write_all(rels.as_bytes()).unwrap();

        for (i, (_, cells)) in sheets.iter().enumerate() {
            let mut xml = String::from(
                r#"<?xml version="1.0" encoding="UTF-8"?><worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData>"#,
            );
            let mut current_row = String::new();
            for (reference, value) in cells.iter() {
                let row: String = reference.chars().filter(char::is_ascii_digit).collect();
                if row != current_row {
                    if !current_row.is_empty() {
                        xml.push_str("</row>");
                    }
                    xml.push_str(&format!(r#"<row r="{row}">"#));
                    current_row = row;
                }
                if value.parse::<f64>().is_ok() {
                    xml.push_str(&format!(r#"<c r="{reference}"><v>{value}</v></c>"#));
                } else {
                    xml.push_str(&format!(
                        r#"<c r="{reference}" t="inlineStr"><is><t>{value}</t></is></c>"#
                    ));
                }
            }
            if !current_row.is_empty() {
                xml.push_str("</row>");
            }
            xml.push_str("</sheetData></worksheet>");

            writer
                .start_file(format!("xl/worksheets/sheet{}.xml", i + 1), options)
                .unwrap();
            writer.write_all(xml.as_bytes()).unwrap();
        }

        writer.finish().unwrap();
    }

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn test_render_table_right_justifies() {
        let table = vec![row(&["name", "qty"]), row(&["apple", "3"])];
        assert_eq!(render_table(&table), " name  qty\napple    3");
    }

    #[test]
    fn test_long_cells_are_truncated() {
        let long = "x".repeat(150);
        let cell = truncate_cell(&long);
        assert_eq!(cell.chars().count(), MAX_CELL_CHARS);
        assert!(cell.ends_with("..."));
        assert_eq!(truncate_cell("short"), "short");
    }

    #[test]
    fn test_truncation_counts_characters() {
        let hangul = "가".repeat(120);
        let cell = truncate_cell(&hangul);
        assert_eq!(cell.chars().count(), MAX_CELL_CHARS);
    }

    #[test]
    fn test_cell_formatting() {
        assert_eq!(format_cell_value(&Data::Float(2.50)), "2.5");
        assert_eq!(format_cell_value(&Data::Float(3.0)), "3");
        assert_eq!(format_cell_value(&Data::Int(7)), "7");
        assert_eq!(format_cell_value(&Data::Empty), "");
    }

    #[test]
    fn test_corrupt_workbook_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("broken.xlsx");
        fs::write(&path, b"definitely not a zip archive").unwrap();

        assert!(extract(&path).is_err());
    }

    #[test]
    fn test_offset_range_and_sheet_order() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("book.xlsx");
        write_xlsx(
            &path,
            &[
                (
                    "Data",
                    &[("C3", "name"), ("D3", "qty"), ("C4", "apple"), ("D4", "3")],
                ),
                ("Notes", &[("A1", "hello")]),
            ],
        );

        let text = extract(&path).unwrap();
        assert_eq!(
            text,
            "\n=== Data ===\n name  qty\napple    3\n\n\n=== Notes ===\nhello\n\n"
        );
    }

    #[test]
    fn test_empty_sheet_emits_only_marker() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("empty.xlsx");
        write_xlsx(&path, &[("Blank", &[]), ("Filled", &[("B2", "x")])]);

        let text = extract(&path).unwrap();
        assert_eq!(text, "\n=== Blank ===\n\n\n\n=== Filled ===\nx\n\n");
    }
}
