use crate::error::{CorpusKitError, Result};
use chrono::Local;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Configured directory, else the desktop if it exists, else the home directory.
pub fn resolve_report_dir(configured: Option<&Path>) -> PathBuf {
    if let Some(dir) = configured {
        return dir.to_path_buf();
    }

    dirs::desktop_dir()
        .filter(|dir| dir.is_dir())
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Local time as `YYYYMMDD_HHMMSS`, used to keep report names unique per run.
pub fn report_timestamp() -> String {
    Local::now().format("%Y%m%d_%H%M%S").to_string()
}

/// A CSV file written in one go: header, then rows.
pub struct CsvReport {
    path: PathBuf,
    with_bom: bool,
}

impl CsvReport {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            path: path.into(),
            with_bom: false,
        }
    }

    /// Prefix the file with a UTF-8 byte order mark so spreadsheet apps pick the right encoding.
    pub fn with_bom(mut self, with_bom: bool) -> Self {
        self.with_bom = with_bom;
        self
    }

    pub fn write<H, R, I>(&self, header: &[H], rows: I) -> Result<PathBuf>
    where
        H: AsRef<str>,
        R: IntoIterator,
        R::Item: AsRef<str>,
        I: IntoIterator<Item = R>,
    {
        self.write_inner(header, rows).map_err(|e| CorpusKitError::Report {
            path: self.path.display().to_string(),
            message: e.to_string(),
        })?;

        debug!("Wrote report {}", self.path.display());
        Ok(self.path.clone())
    }

    fn write_inner<H, R, I>(&self, header: &[H], rows: I) -> Result<()>
    where
        H: AsRef<str>,
        R: IntoIterator,
        R::Item: AsRef<str>,
        I: IntoIterator<Item = R>,
    {
        let mut file = BufWriter::new(File::create(&self.path)?);
        if self.with_bom {
            file.write_all(UTF8_BOM)?;
        }

        let mut writer = csv::WriterBuilder::new()
            .flexible(true)
            .terminator(csv::Terminator::CRLF)
            .from_writer(file);
        writer.write_record(header.iter().map(|h| h.as_ref()))?;
        for row in rows {
            writer.write_record(row.into_iter().map(|f| f.as_ref().to_string()))?;
        }
        writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_configured_dir_wins() {
        let temp_dir = TempDir::new().unwrap();
        assert_eq!(resolve_report_dir(Some(temp_dir.path())), temp_dir.path());
    }

    #[test]
    fn test_timestamp_shape() {
        let ts = report_timestamp();
        assert_eq!(ts.len(), 15);
        assert_eq!(&ts[8..9], "_");
        assert!(ts.chars().filter(|c| *c != '_').all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn test_write_with_bom() {
        let temp_dir = TempDir::new().unwrap();
        let report = CsvReport::new(temp_dir.path().join("r.csv")).with_bom(true);

        let path = report
            .write(&["file_path", "count"], vec![vec!["a, b.json", "2"]])
            .unwrap();

        let bytes = fs::read(path).unwrap();
        assert!(bytes.starts_with(UTF8_BOM));
        let text = String::from_utf8(bytes[3..].to_vec()).unwrap();
        assert_eq!(text, "file_path,count\r\n\"a, b.json\",2\r\n");
    }

    #[test]
    fn test_blank_separator_row() {
        let temp_dir = TempDir::new().unwrap();
        let report = CsvReport::new(temp_dir.path().join("r.csv"));

        let rows: Vec<Vec<String>> = vec![
            vec!["x".into(), "1".into()],
            vec![String::new(), String::new()],
            vec!["TOTAL".into(), "1".into()],
        ];
        let path = report.write(&["name", "n"], rows).unwrap();

        assert_eq!(
            fs::read_to_string(path).unwrap(),
            "name,n\r\nx,1\r\n,\r\nTOTAL,1\r\n"
        );
    }

    #[test]
    fn test_unwritable_location() {
        let temp_dir = TempDir::new().unwrap();
        let report = CsvReport::new(temp_dir.path().join("missing").join("r.csv"));
        let result = report.write(&["a"], Vec::<Vec<String>>::new());
        assert!(matches!(result, Err(CorpusKitError::Report { .. })));
    }
}
