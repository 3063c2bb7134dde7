use crate::error::{CorpusKitError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub extract: ExtractConfig,
    pub tools: ToolsConfig,
    pub rename: RenameConfig,
    pub count: CountConfig,
    pub wav: WavConfig,
    pub reports: ReportsConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ExtractConfig {
    pub extensions: Vec<String>,
    pub output_dir_name: String,
    pub output_suffix: String,
    /// Worker threads for the `parallel` feature; 0 means one per CPU.
    pub workers: usize,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ToolsConfig {
    pub hwp5txt: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RenameConfig {
    pub old_key: String,
    pub new_key: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CountConfig {
    pub value_key: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WavConfig {
    pub segment_marker: String,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ReportsConfig {
    /// Where CSV reports go; the desktop (or home) directory when unset.
    pub directory: Option<PathBuf>,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            extensions: vec![
                "xlsx".to_string(),
                "xls".to_string(),
                "pptx".to_string(),
                "pdf".to_string(),
                "docx".to_string(),
                "hwp".to_string(),
            ],
            output_dir_name: "txt output".to_string(),
            output_suffix: "_extracted".to_string(),
            workers: 0,
        }
    }
}

impl Default for RenameConfig {
    fn default() -> Self {
        Self {
            old_key: "meassages".to_string(),
            new_key: "messages".to_string(),
        }
    }
}

impl Default for CountConfig {
    fn default() -> Self {
        Self {
            value_key: "value".to_string(),
        }
    }
}

impl Default for WavConfig {
    fn default() -> Self {
        Self {
            segment_marker: "02_segment".to_string(),
        }
    }
}

impl Config {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(CorpusKitError::Config {
                message: format!("Configuration file not found: {}", path.display()),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| CorpusKitError::Config {
            message: format!("Failed to read config file {}: {}", path.display(), e),
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| CorpusKitError::Config {
            message: format!("Failed to parse config file {}: {}", path.display(), e),
        })?;

        Ok(config)
    }

    pub fn load_with_defaults<P: AsRef<Path>>(config_path: Option<P>) -> Result<Self> {
        match config_path {
            Some(path) => Self::load_from_file(path),
            None => {
                let default_paths = ["corpuskit.toml", ".corpuskit.toml"];

                for default_path in &default_paths {
                    if Path::new(default_path).exists() {
                        return Self::load_from_file(default_path);
                    }
                }

                Ok(Self::default())
            }
        }
    }

    pub fn merge_with_cli_args(&mut self, cli_args: &CliOverrides) {
        if let Some(ref hwp5txt) = cli_args.hwp5txt {
            self.tools.hwp5txt = Some(hwp5txt.clone());
        }

        if let Some(ref old_key) = cli_args.old_key {
            self.rename.old_key = old_key.clone();
        }

        if let Some(ref new_key) = cli_args.new_key {
            self.rename.new_key = new_key.clone();
        }

        if let Some(ref value_key) = cli_args.value_key {
            self.count.value_key = value_key.clone();
        }

        if let Some(ref marker) = cli_args.segment_marker {
            self.wav.segment_marker = marker.clone();
        }

        if let Some(ref report_dir) = cli_args.report_dir {
            self.reports.directory = Some(report_dir.clone());
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.extract.extensions.is_empty() {
            return Err(CorpusKitError::Config {
                message: "At least one extraction extension must be specified".to_string(),
            });
        }

        let name = self.extract.output_dir_name.trim();
        if name.is_empty() || name.contains('/') || name.contains('\\') || name == ".." {
            return Err(CorpusKitError::Config {
                message: format!(
                    "Output directory name must be a single folder name: {:?}",
                    self.extract.output_dir_name
                ),
            });
        }

        if self.rename.old_key.is_empty() || self.rename.new_key.is_empty() {
            return Err(CorpusKitError::Config {
                message: "Rename keys must not be empty".to_string(),
            });
        }

        if self.rename.old_key == self.rename.new_key {
            return Err(CorpusKitError::Config {
                message: format!(
                    "Old and new key are identical: {:?}",
                    self.rename.old_key
                ),
            });
        }

        if self.count.value_key.is_empty() {
            return Err(CorpusKitError::Config {
                message: "Value key must not be empty".to_string(),
            });
        }

        if self.wav.segment_marker.is_empty() {
            return Err(CorpusKitError::Config {
                message: "WAV segment marker must not be empty".to_string(),
            });
        }

        if let Some(ref dir) = self.reports.directory {
            if !dir.is_dir() {
                return Err(CorpusKitError::Config {
                    message: format!("Report directory does not exist: {}", dir.display()),
                });
            }
        }

        Ok(())
    }

    /// Extensions as lowercase strings without a leading dot.
    pub fn normalized_extensions(&self) -> Vec<String> {
        self.extract
            .extensions
            .iter()
            .map(|e| e.trim().trim_start_matches('.').to_lowercase())
            .filter(|e| !e.is_empty())
            .collect()
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let content = toml::to_string_pretty(self).map_err(|e| CorpusKitError::Config {
            message: format!("Failed to serialize config: {}", e),
        })?;

        std::fs::write(path, content).map_err(|e| CorpusKitError::Config {
            message: format!("Failed to write config file {}: {}", path.display(), e),
        })?;

        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct CliOverrides {
    pub hwp5txt: Option<PathBuf>,
    pub old_key: Option<String>,
    pub new_key: Option<String>,
    pub value_key: Option<String>,
    pub segment_marker: Option<String>,
    pub report_dir: Option<PathBuf>,
}

impl CliOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_hwp5txt(mut self, path: Option<PathBuf>) -> Self {
        self.hwp5txt = path;
        self
    }

    pub fn with_rename_keys(mut self, old_key: Option<String>, new_key: Option<String>) -> Self {
        self.old_key = old_key;
        self.new_key = new_key;
        self
    }

    pub fn with_value_key(mut self, key: Option<String>) -> Self {
        self.value_key = key;
        self
    }

    pub fn with_segment_marker(mut self, marker: Option<String>) -> Self {
        self.segment_marker = marker;
        self
    }

    pub fn with_report_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.report_dir = dir;
        self
    }
}
