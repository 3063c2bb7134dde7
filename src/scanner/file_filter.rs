use std::path::Path;

/// Extension-based file selection, case-insensitive.
pub struct FileFilter {
    extensions: Vec<String>,
    directory_marker: Option<String>,
}

impl FileFilter {
    pub fn new<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut filter = Self {
            extensions: Vec::new(),
            directory_marker: None,
        };
        for ext in extensions {
            filter.add_extension(ext.as_ref());
        }
        filter
    }

    /// Only accept files whose parent directory path contains `marker`.
    pub fn with_directory_marker<S: Into<String>>(mut self, marker: S) -> Self {
        self.directory_marker = Some(marker.into());
        self
    }

    pub fn matches(&self, path: &Path) -> bool {
        let extension_ok = path
            .extension()
            .and_then(|s| s.to_str())
            .is_some_and(|ext| self.extensions.contains(&ext.to_lowercase()));

        if !extension_ok {
            return false;
        }

        match self.directory_marker {
            Some(ref marker) => path
                .parent()
                .is_some_and(|dir| dir.to_string_lossy().contains(marker.as_str())),
            None => true,
        }
    }

    pub fn get_extensions(&self) -> &Vec<String> {
        &self.extensions
    }

    pub fn add_extension<S: AsRef<str>>(&mut self, extension: S) {
        let ext = extension
            .as_ref()
            .trim()
            .trim_start_matches('.')
            .to_lowercase();
        if !ext.is_empty() && !self.extensions.contains(&ext) {
            self.extensions.push(ext);
        }
    }
}
