use crate::error::Result;
use crate::report::CsvReport;
use serde::Serialize;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

const REPORT_HEADER: [&str; 5] = [
    "file_path",
    "value_count",
    "chars_without_spaces",
    "chars_with_spaces",
    "words",
];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TextCounts {
    pub values: usize,
    pub chars_without_spaces: usize,
    pub chars_with_spaces: usize,
    pub words: usize,
}

impl TextCounts {
    /// Counts for a single string value.
    pub fn of_str(text: &str) -> Self {
        Self {
            values: 1,
            chars_without_spaces: text.chars().filter(|c| !c.is_whitespace()).count(),
            chars_with_spaces: text.chars().count(),
            words: text.split_whitespace().count(),
        }
    }

    pub fn add(&mut self, other: &TextCounts) {
        self.values += other.values;
        self.chars_without_spaces += other.chars_without_spaces;
        self.chars_with_spaces += other.chars_with_spaces;
        self.words += other.words;
    }

    fn as_row(&self) -> [usize; 4] {
        [
            self.values,
            self.chars_without_spaces,
            self.chars_with_spaces,
            self.words,
        ]
    }
}

/// Every string stored under `key` at any depth, in document order.
pub fn collect_values<'a>(value: &'a Value, key: &str, out: &mut Vec<&'a str>) {
    match value {
        Value::Object(map) => {
            for (k, child) in map {
                if k == key {
                    if let Value::String(s) = child {
                        out.push(s);
                    }
                }
                collect_values(child, key, out);
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_values(item, key, out);
            }
        }
        _ => {}
    }
}

pub struct ValueCounter {
    key: String,
}

impl ValueCounter {
    pub fn new<S: Into<String>>(key: S) -> Self {
        Self { key: key.into() }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn count_value(&self, value: &Value) -> TextCounts {
        let mut strings = Vec::new();
        collect_values(value, &self.key, &mut strings);

        let mut counts = TextCounts::default();
        for s in strings {
            counts.add(&TextCounts::of_str(s));
        }
        counts
    }

    /// Unreadable or unparseable files give an all-zero row and a warning.
    pub fn count_file(&self, path: &Path) -> FileCount {
        let parsed = fs::read(path)
            .map_err(|e| e.to_string())
            .and_then(|bytes| {
                let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(&bytes);
                serde_json::from_slice::<Value>(bytes).map_err(|e| e.to_string())
            });

        match parsed {
            Ok(value) => FileCount {
                path: path.to_path_buf(),
                counts: self.count_value(&value),
                error: None,
            },
            Err(e) => {
                warn!("JSON parse failed: {} ({})", path.display(), e);
                FileCount {
                    path: path.to_path_buf(),
                    counts: TextCounts::default(),
                    error: Some(e),
                }
            }
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FileCount {
    pub path: PathBuf,
    #[serde(flatten)]
    pub counts: TextCounts,
    pub error: Option<String>,
}

#[derive(Debug, Default, Serialize)]
pub struct CountSummary {
    pub files: Vec<FileCount>,
}

impl CountSummary {
    pub fn push(&mut self, file: FileCount) {
        self.files.push(file);
    }

    pub fn total(&self) -> TextCounts {
        let mut total = TextCounts::default();
        for file in &self.files {
            total.add(&file.counts);
        }
        total
    }

    /// Per-file means of each column; zeros when there are no files.
    pub fn average(&self) -> [f64; 4] {
        let file_count = self.files.len();
        let total = self.total().as_row();
        if file_count == 0 {
            return [0.0; 4];
        }
        total.map(|n| n as f64 / file_count as f64)
    }

    pub fn error_count(&self) -> usize {
        self.files.iter().filter(|f| f.error.is_some()).count()
    }

    /// Fixed-width console table with a closing TOTAL row.
    pub fn render_table(&self) -> String {
        let rule = "-".repeat(105);
        let mut out = format!(
            "{:<60} | {:>8} | {:>10} | {:>10} | {:>8}\n{}\n",
            "file_path", "values", "no_spaces", "with_spaces", "words", rule
        );

        for file in &self.files {
            out.push_str(&table_line(&file.path.display().to_string(), &file.counts));
        }

        out.push_str(&rule);
        out.push('\n');
        out.push_str(&table_line("TOTAL", &self.total()));
        out
    }

    /// `value_count_summary_<timestamp>.csv`: rows, a blank row, TOTAL and AVERAGE.
    pub fn write_report(&self, report_dir: &Path, timestamp: &str) -> Result<PathBuf> {
        let mut rows: Vec<Vec<String>> = self
            .files
            .iter()
            .map(|file| {
                let mut row = vec![file.path.display().to_string()];
                row.extend(file.counts.as_row().iter().map(|n| n.to_string()));
                row
            })
            .collect();

        rows.push(vec![String::new(); REPORT_HEADER.len()]);

        let mut total_row = vec!["TOTAL".to_string()];
        total_row.extend(self.total().as_row().iter().map(|n| n.to_string()));
        rows.push(total_row);

        let mut average_row = vec!["AVERAGE".to_string()];
        average_row.extend(self.average().iter().map(|n| format!("{n:.2}")));
        rows.push(average_row);

        CsvReport::new(report_dir.join(format!("value_count_summary_{timestamp}.csv")))
            .with_bom(true)
            .write(&REPORT_HEADER, rows)
    }
}

fn table_line(label: &str, counts: &TextCounts) -> String {
    format!(
        "{:<60} | {:>8} | {:>10} | {:>10} | {:>8}\n",
        label, counts.values, counts.chars_without_spaces, counts.chars_with_spaces, counts.words
    )
}
