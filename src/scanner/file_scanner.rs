use crate::error::{CorpusKitError, Result};
use crate::extractor::DocumentKind;
use crate::scanner::file_filter::FileFilter;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

#[derive(Debug, Clone)]
pub struct SourceFile {
    pub source_path: PathBuf,
    pub relative_path: PathBuf,
    pub filename: String,
    pub extension: String,
    pub size: u64,
}

impl SourceFile {
    pub fn new(source_path: PathBuf, relative_path: PathBuf, size: u64) -> Self {
        let filename = source_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        let extension = source_path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();

        Self {
            source_path,
            relative_path,
            filename,
            extension,
            size,
        }
    }

    pub fn kind(&self) -> DocumentKind {
        DocumentKind::from_extension(&self.extension)
    }

    pub fn display_path(&self) -> String {
        self.relative_path.display().to_string()
    }
}

pub struct FileScanner {
    filter: FileFilter,
}

impl FileScanner {
    pub fn new(filter: FileFilter) -> Self {
        Self { filter }
    }

    pub fn filter(&self) -> &FileFilter {
        &self.filter
    }

    /// Recursively collects matching files, sorted by relative path.
    ///
    /// Unreadable entries are logged and skipped. An empty result is not an
    /// error here; each tool decides what "nothing found" means.
    pub fn scan_directory<P: AsRef<Path>>(&self, root: P) -> Result<Vec<SourceFile>> {
        let root_path = root.as_ref();
        validate_root(root_path)?;

        let mut files = Vec::new();

        let walker = WalkDir::new(root_path)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter();

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    warn!("Skipping unreadable entry: {}", err);
                    continue;
                }
            };

            if !entry.file_type().is_file() || !self.filter.matches(entry.path()) {
                continue;
            }

            match self.process_file(&entry, root_path) {
                Ok(file) => files.push(file),
                Err(err) => warn!("Error processing {}: {}", entry.path().display(), err),
            }
        }

        files.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));
        debug!(
            "Found {} matching files under {}",
            files.len(),
            root_path.display()
        );

        Ok(files)
    }

    fn process_file(&self, entry: &DirEntry, root_path: &Path) -> Result<SourceFile> {
        let path = entry.path();
        let metadata = entry
            .metadata()
            .map_err(|e| CorpusKitError::Io(e.into()))?;

        let relative_path = path
            .strip_prefix(root_path)
            .map_err(|_| CorpusKitError::InvalidPath {
                path: format!(
                    "Cannot calculate relative path for {} from root {}",
                    path.display(),
                    root_path.display()
                ),
            })?
            .to_path_buf();

        Ok(SourceFile::new(path.to_path_buf(), relative_path, metadata.len()))
    }

    pub fn get_statistics(&self, files: &[SourceFile]) -> ScanStatistics {
        let mut files_by_extension = BTreeMap::new();
        for file in files {
            *files_by_extension.entry(file.extension.clone()).or_insert(0) += 1;
        }

        ScanStatistics {
            total_files: files.len(),
            total_size: files.iter().map(|f| f.size).sum(),
            files_by_extension,
        }
    }
}

/// Fails unless `root` is an existing directory.
pub fn validate_root(root: &Path) -> Result<()> {
    if !root.is_dir() {
        return Err(CorpusKitError::InvalidPath {
            path: root.display().to_string(),
        });
    }
    Ok(())
}

#[derive(Debug, Default)]
pub struct ScanStatistics {
    pub total_files: usize,
    pub total_size: u64,
    pub files_by_extension: BTreeMap<String, usize>,
}

impl ScanStatistics {
    pub fn display_summary(&self) -> String {
        let mut summary = format!(
            "Scan Results:\n  Total files: {}\n  Total size: {}\n",
            self.total_files,
            format_bytes(self.total_size)
        );

        if !self.files_by_extension.is_empty() {
            summary.push_str("  Files by type:\n");
            let mut extensions: Vec<_> = self.files_by_extension.iter().collect();
            extensions.sort_by(|a, b| b.1.cmp(a.1));

            for (ext, count) in extensions {
                summary.push_str(&format!("    {}: {} files\n", ext, count));
            }
        }

        summary
    }
}

pub(crate) fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB"];
    let mut size = bytes as f64;
    let mut unit_index = 0;

    while size >= 1024.0 && unit_index < UNITS.len() - 1 {
        size /= 1024.0;
        unit_index += 1;
    }

    if unit_index == 0 {
        format!("{} {}", bytes, UNITS[unit_index])
    } else {
        format!("{:.1} {}", size, UNITS[unit_index])
    }
}
