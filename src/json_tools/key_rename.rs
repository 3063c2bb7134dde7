use crate::error::{CorpusKitError, Result};
use crate::report::CsvReport;
use encoding_rs::{EUC_KR, WINDOWS_1252};
use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RenameMethod {
    /// Parsed, rewritten and pretty-printed.
    Json,
    /// Text substitution on a file that does not parse.
    Regex,
}

impl RenameMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            RenameMethod::Json => "json",
            RenameMethod::Regex => "regex fallback",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RenameOutcome {
    Modified { changes: usize, method: RenameMethod },
    Unchanged,
    Error { message: String },
}

/// Renames one object key throughout JSON files.
pub struct KeyRenamer {
    old_key: String,
    new_key: String,
    key_pattern: Regex,
}

impl KeyRenamer {
    pub fn new<O: Into<String>, N: Into<String>>(old_key: O, new_key: N) -> Result<Self> {
        let old_key = old_key.into();
        let escaped = regex::escape(&old_key);
        // No backreferences in `regex`, so each quote style gets its own branch.
        let key_pattern = Regex::new(&format!(r#"(?:"{escaped}"|'{escaped}')\s*:"#)).map_err(
            |e| CorpusKitError::Config {
                message: format!("Cannot build key pattern for {:?}: {}", old_key, e),
            },
        )?;

        Ok(Self {
            old_key,
            new_key: new_key.into(),
            key_pattern,
        })
    }

    pub fn old_key(&self) -> &str {
        &self.old_key
    }

    pub fn new_key(&self) -> &str {
        &self.new_key
    }

    /// Renames matching keys at every depth, returning the count.
    pub fn rename_in_value(&self, value: Value) -> (Value, usize) {
        let mut count = 0;
        let renamed = self.rename_recursive(value, &mut count);
        (renamed, count)
    }

    fn rename_recursive(&self, value: Value, count: &mut usize) -> Value {
        match value {
            Value::Object(map) => {
                let mut renamed = Map::with_capacity(map.len());
                for (key, child) in map {
                    let child = self.rename_recursive(child, count);
                    let key = if key == self.old_key {
                        *count += 1;
                        self.new_key.clone()
                    } else {
                        key
                    };
                    renamed.insert(key, child);
                }
                Value::Object(renamed)
            }
            Value::Array(items) => Value::Array(
                items
                    .into_iter()
                    .map(|item| self.rename_recursive(item, count))
                    .collect(),
            ),
            other => other,
        }
    }

    /// Key-position substitution for text that is not valid JSON; string values are left alone.
    pub fn rename_in_text(&self, text: &str) -> (String, usize) {
        let count = self.key_pattern.find_iter(text).count();
        if count == 0 {
            return (text.to_string(), 0);
        }

        let replaced = self
            .key_pattern
            .replace_all(text, |caps: &regex::Captures<'_>| {
                let quote = &caps[0][..1];
                format!("{quote}{}{quote}:", self.new_key)
            })
            .into_owned();

        (replaced, count)
    }

    pub fn process_file(&self, path: &Path) -> RenameOutcome {
        let text = match fs::read(path) {
            Ok(bytes) => decode_best_effort(&bytes),
            Err(e) => {
                return RenameOutcome::Error {
                    message: format!("READ_ERROR: {e}"),
                }
            }
        };

        match serde_json::from_str::<Value>(&text) {
            Ok(value) => {
                let (renamed, changes) = self.rename_in_value(value);
                if changes == 0 {
                    return RenameOutcome::Unchanged;
                }

                let written = serde_json::to_string_pretty(&renamed)
                    .map_err(|e| e.to_string())
                    .and_then(|json| fs::write(path, json).map_err(|e| e.to_string()));

                match written {
                    Ok(()) => RenameOutcome::Modified {
                        changes,
                        method: RenameMethod::Json,
                    },
                    Err(e) => RenameOutcome::Error {
                        message: format!("WRITE_ERROR(JSON_DUMP): {e}"),
                    },
                }
            }
            Err(parse_error) => {
                debug!(
                    "{} is not valid JSON ({}), using text substitution",
                    path.display(),
                    parse_error
                );

                let (replaced, changes) = self.rename_in_text(&text);
                if changes == 0 {
                    return RenameOutcome::Unchanged;
                }

                match fs::write(path, replaced) {
                    Ok(()) => RenameOutcome::Modified {
                        changes,
                        method: RenameMethod::Regex,
                    },
                    Err(e) => RenameOutcome::Error {
                        message: format!("WRITE_ERROR(REGEX): {e}"),
                    },
                }
            }
        }
    }
}

/// UTF-8 (BOM stripped), then EUC-KR/CP949, then Windows-1252, which accepts any input.
pub fn decode_best_effort(bytes: &[u8]) -> String {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);

    if let Ok(text) = std::str::from_utf8(bytes) {
        return text.to_string();
    }

    if let Some(text) = EUC_KR.decode_without_bom_handling_and_without_replacement(bytes) {
        debug!("Decoded as EUC-KR");
        return text.into_owned();
    }

    WINDOWS_1252.decode_without_bom_handling(bytes).0.into_owned()
}

#[derive(Debug, Default)]
pub struct RenameSummary {
    pub total_files: usize,
    pub modified: Vec<(PathBuf, usize)>,
    pub unchanged: usize,
    pub errors: Vec<(PathBuf, String)>,
}

impl RenameSummary {
    pub fn new(total_files: usize) -> Self {
        Self {
            total_files,
            ..Default::default()
        }
    }

    pub fn record(&mut self, path: &Path, outcome: &RenameOutcome) {
        match outcome {
            RenameOutcome::Modified { changes, .. } => {
                self.modified.push((path.to_path_buf(), *changes))
            }
            RenameOutcome::Unchanged => self.unchanged += 1,
            RenameOutcome::Error { message } => {
                warn!("{}: {}", path.display(), message);
                self.errors.push((path.to_path_buf(), message.clone()));
            }
        }
    }

    /// Writes the modified-files report, and the error report when there were errors.
    pub fn write_reports(
        &self,
        report_dir: &Path,
        timestamp: &str,
    ) -> Result<(PathBuf, Option<PathBuf>)> {
        let report = CsvReport::new(report_dir.join(format!("json_key_fix_report_{timestamp}.csv")))
            .with_bom(true)
            .write(
                &["file_path", "changed_key_count"],
                self.modified
                    .iter()
                    .map(|(path, changes)| vec![path.display().to_string(), changes.to_string()]),
            )?;

        let errors = if self.errors.is_empty() {
            None
        } else {
            let path = CsvReport::new(report_dir.join(format!("json_key_fix_errors_{timestamp}.csv")))
                .with_bom(true)
                .write(
                    &["file_path", "error"],
                    self.errors
                        .iter()
                        .map(|(path, error)| vec![path.display().to_string(), error.clone()]),
                )?;
            Some(path)
        };

        Ok((report, errors))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn renamer() -> KeyRenamer {
        KeyRenamer::new("meassages", "messages").unwrap()
    }

    #[test]
    fn test_rename_nested_keys() {
        let value = json!({
            "meassages": [{"meassages": "keep value meassages"}],
            "other": {"deep": {"meassages": 1}}
        });

        let (renamed, count) = renamer().rename_in_value(value);
        assert_eq!(count, 3);
        assert_eq!(
            renamed,
            json!({
                "messages": [{"messages": "keep value meassages"}],
                "other": {"deep": {"messages": 1}}
            })
        );
    }

    #[test]
    fn test_rename_preserves_key_order() {
        let value: Value = serde_json::from_str(r#"{"z": 1, "meassages": 2, "a": 3}"#).unwrap();
        let (renamed, _) = renamer().rename_in_value(value);
        assert_eq!(
            serde_json::to_string(&renamed).unwrap(),
            r#"{"z":1,"messages":2,"a":3}"#
        );
    }

    #[test]
    fn test_regex_fallback_only_touches_keys() {
        let text = r#"{"meassages" : "x", 'meassages': 1, "note": "meassages", trailing,}"#;
        let (replaced, count) = renamer().rename_in_text(text);
        assert_eq!(count, 2);
        assert_eq!(
            replaced,
            r#"{"messages": "x", 'messages': 1, "note": "meassages", trailing,}"#
        );
    }

    #[test]
    fn test_key_with_regex_metacharacters() {
        let renamer = KeyRenamer::new("a.b", "ab").unwrap();
        let (replaced, count) = renamer.rename_in_text(r#"{"a.b": 1, "axb": 2,"#);
        assert_eq!(count, 1);
        assert_eq!(replaced, r#"{"ab": 1, "axb": 2,"#);
    }

    #[test]
    fn test_rewrite_keeps_large_numbers_verbatim() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("ids.json");
        fs::write(
            &path,
            r#"{"meassages": [], "id": 123456789012345678901234, "ratio": 0.10}"#,
        )
        .unwrap();

        let outcome = renamer().process_file(&path);
        assert_eq!(
            outcome,
            RenameOutcome::Modified {
                changes: 1,
                method: RenameMethod::Json
            }
        );
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "{\n  \"messages\": [],\n  \"id\": 123456789012345678901234,\n  \"ratio\": 0.10\n}"
        );
    }

    #[test]
    fn test_process_valid_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("a.json");
        fs::write(&path, r#"{"meassages": [1, 2], "title": "한글"}"#).unwrap();

        let outcome = renamer().process_file(&path);
        assert_eq!(
            outcome,
            RenameOutcome::Modified {
                changes: 1,
                method: RenameMethod::Json
            }
        );
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "{\n  \"messages\": [\n    1,\n    2\n  ],\n  \"title\": \"한글\"\n}"
        );
    }

    #[test]
    fn test_process_invalid_json_uses_regex() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("broken.json");
        fs::write(&path, "{\"meassages\": [1, 2],}").unwrap();

        let outcome = renamer().process_file(&path);
        assert_eq!(
            outcome,
            RenameOutcome::Modified {
                changes: 1,
                method: RenameMethod::Regex
            }
        );
        assert_eq!(fs::read_to_string(&path).unwrap(), "{\"messages\": [1, 2],}");
    }

    #[test]
    fn test_unchanged_file_is_not_rewritten() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("same.json");
        let original = "{\"messages\":   [1]}";
        fs::write(&path, original).unwrap();

        assert_eq!(renamer().process_file(&path), RenameOutcome::Unchanged);
        assert_eq!(fs::read_to_string(&path).unwrap(), original);
    }

    #[test]
    fn test_missing_file_is_read_error() {
        let temp_dir = TempDir::new().unwrap();
        match renamer().process_file(&temp_dir.path().join("gone.json")) {
            RenameOutcome::Error { message } => assert!(message.starts_with("READ_ERROR")),
            other => panic!("unexpected outcome {other:?}"),
        }
    }

    #[test]
    fn test_decode_best_effort() {
        assert_eq!(decode_best_effort(b"\xEF\xBB\xBF{}"), "{}");
        let (euc_kr, _, _) = EUC_KR.encode("{\"제목\": 1}");
        assert_eq!(decode_best_effort(&euc_kr), "{\"제목\": 1}");
        assert_eq!(decode_best_effort(b"caf\xE9"), "caf\u{e9}");
    }

    #[test]
    fn test_reports() {
        let temp_dir = TempDir::new().unwrap();
        let mut summary = RenameSummary::new(3);
        summary.record(
            Path::new("a.json"),
            &RenameOutcome::Modified {
                changes: 2,
                method: RenameMethod::Json,
            },
        );
        summary.record(Path::new("b.json"), &RenameOutcome::Unchanged);

        let (report, errors) = summary.write_reports(temp_dir.path(), "20250101_120000").unwrap();
        assert!(errors.is_none());
        assert_eq!(
            report.file_name().unwrap(),
            "json_key_fix_report_20250101_120000.csv"
        );
        let content = fs::read_to_string(&report).unwrap();
        assert!(content.contains("a.json,2"));

        summary.record(
            Path::new("c.json"),
            &RenameOutcome::Error {
                message: "READ_ERROR: denied".to_string(),
            },
        );
        let (_, errors) = summary.write_reports(temp_dir.path(), "20250101_120001").unwrap();
        let errors = errors.unwrap();
        assert!(fs::read_to_string(errors).unwrap().contains("c.json,READ_ERROR: denied"));
    }
}
