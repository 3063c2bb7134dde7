use crate::error::{CorpusKitError, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Places `<stem><suffix>.txt` in a sibling folder of each source file.
#[derive(Debug, Clone)]
pub struct OutputWriter {
    dir_name: String,
    suffix: String,
}

impl OutputWriter {
    pub fn new<D: Into<String>, S: Into<String>>(dir_name: D, suffix: S) -> Self {
        Self {
            dir_name: dir_name.into(),
            suffix: suffix.into(),
        }
    }

    /// `a/b/report.pdf` becomes `a/b/<dir_name>/report<suffix>.txt`.
    pub fn output_path(&self, source: &Path) -> PathBuf {
        let parent = source.parent().unwrap_or_else(|| Path::new(""));
        let stem = source
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();

        parent
            .join(&self.dir_name)
            .join(format!("{}{}.txt", stem, self.suffix))
    }

    /// Creates the output folder if needed and overwrites any previous artifact.
    pub fn write(&self, source: &Path, text: &str) -> Result<PathBuf> {
        let output_path = self.output_path(source);

        if let Some(dir) = output_path.parent() {
            fs::create_dir_all(dir).map_err(CorpusKitError::Io)?;
        }
        fs::write(&output_path, text.as_bytes()).map_err(CorpusKitError::Io)?;

        Ok(output_path)
    }
}

impl Default for OutputWriter {
    fn default() -> Self {
        Self::new("txt output", "_extracted")
    }
}
