use super::ExtractionFailure;
use chardetng::EncodingDetector;
use encoding_rs::UTF_8;
use std::env;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::{debug, info, warn};

/// Executable names probed, in order.
pub const HWP5TXT_NAMES: [&str; 2] = ["hwp5txt.exe", "hwp5txt"];

/// The external `hwp5txt` converter, resolved once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HwpTool {
    Available(PathBuf),
    Unavailable,
}

impl HwpTool {
    /// Configured path first, then the directory of the running binary, then `PATH`.
    pub fn detect(configured: Option<&Path>) -> Self {
        if let Some(path) = configured {
            if path.is_file() {
                info!("Using configured hwp5txt at {}", path.display());
                return HwpTool::Available(path.to_path_buf());
            }
            warn!(
                "Configured hwp5txt {} does not exist, falling back to discovery",
                path.display()
            );
        }

        let exe_dir = env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(Path::to_path_buf));
        let search_path = env::var_os("PATH");

        let tool = Self::detect_in(exe_dir.as_deref(), search_path.as_deref());
        match tool {
            HwpTool::Available(ref path) => info!("Found hwp5txt at {}", path.display()),
            HwpTool::Unavailable => warn!("hwp5txt not found; .hwp files will get a diagnostic"),
        }
        tool
    }

    pub fn detect_in(exe_dir: Option<&Path>, search_path: Option<&OsStr>) -> Self {
        if let Some(dir) = exe_dir {
            for name in HWP5TXT_NAMES {
                let candidate = dir.join(name);
                if candidate.is_file() {
                    return HwpTool::Available(candidate);
                }
            }
        }

        if let Some(paths) = search_path {
            for name in HWP5TXT_NAMES {
                for dir in env::split_paths(paths) {
                    let candidate = dir.join(name);
                    if is_executable(&candidate) {
                        return HwpTool::Available(candidate);
                    }
                }
            }
        }

        HwpTool::Unavailable
    }

    pub fn is_available(&self) -> bool {
        matches!(self, HwpTool::Available(_))
    }

    /// Runs the tool with `path` as its only argument. The exit status is ignored;
    /// blank stdout is reported together with whatever the tool wrote to stderr.
    pub fn extract(&self, path: &Path) -> Result<String, ExtractionFailure> {
        let tool = match self {
            HwpTool::Available(tool) => tool,
            HwpTool::Unavailable => return Err(ExtractionFailure::ToolNotFound),
        };

        debug!("Running {} {}", tool.display(), path.display());
        let output = Command::new(tool)
            .arg(path)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| ExtractionFailure::ToolLaunch {
                message: e.to_string(),
            })?;

        if !output.status.success() {
            debug!("hwp5txt exited with {}", output.status);
        }

        let text = decode_output(&output.stdout);
        if text.trim().is_empty() {
            return Err(ExtractionFailure::ToolNoOutput {
                stderr: drop_replacements(&String::from_utf8_lossy(&output.stderr)),
            });
        }

        Ok(text)
    }
}

/// Guesses the encoding of the tool's stdout; undecodable bytes are dropped.
pub fn decode_output(bytes: &[u8]) -> String {
    let encoding = if bytes.is_ascii() {
        UTF_8
    } else {
        let mut detector = EncodingDetector::new();
        detector.feed(bytes, true);
        detector.guess(None, true)
    };

    let (decoded, actual, had_errors) = encoding.decode(bytes);
    debug!("Decoded hwp5txt output as {}", actual.name());

    if had_errors {
        drop_replacements(&decoded)
    } else {
        decoded.into_owned()
    }
}

fn drop_replacements(text: &str) -> String {
    text.chars().filter(|&c| c != char::REPLACEMENT_CHARACTER).collect()
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

#[cfg(test)]
mod tests {
    use super::*;
    use encoding_rs::EUC_KR;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_unavailable_tool_reports_not_found() {
        let result = HwpTool::Unavailable.extract(Path::new("doc.hwp"));
        assert_eq!(result, Err(ExtractionFailure::ToolNotFound));
    }

    #[test]
    fn test_detect_prefers_exe_dir() {
        let exe_dir = TempDir::new().unwrap();
        fs::write(exe_dir.path().join("hwp5txt"), "").unwrap();

        let tool = HwpTool::detect_in(Some(exe_dir.path()), None);
        assert_eq!(tool, HwpTool::Available(exe_dir.path().join("hwp5txt")));
    }

    #[test]
    fn test_detect_nothing() {
        let empty = TempDir::new().unwrap();
        let search = env::join_paths([empty.path()]).unwrap();
        assert_eq!(
            HwpTool::detect_in(Some(empty.path()), Some(&search)),
            HwpTool::Unavailable
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_detect_on_search_path_requires_executable() {
        use std::os::unix::fs::PermissionsExt;

        let bin = TempDir::new().unwrap();
        let tool_path = bin.path().join("hwp5txt");
        fs::write(&tool_path, "#!/bin/sh\n").unwrap();
        let search = env::join_paths([bin.path()]).unwrap();

        assert_eq!(HwpTool::detect_in(None, Some(&search)), HwpTool::Unavailable);

        fs::set_permissions(&tool_path, fs::Permissions::from_mode(0o755)).unwrap();
        assert_eq!(
            HwpTool::detect_in(None, Some(&search)),
            HwpTool::Available(tool_path)
        );
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_extract_captures_stdout() {
        let tool = HwpTool::Available(PathBuf::from("/bin/echo"));
        let text = tool.extract(Path::new("report.hwp")).unwrap();
        assert_eq!(text, "report.hwp\n");
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_blank_output_is_a_diagnostic() {
        let tool = HwpTool::Available(PathBuf::from("/bin/true"));
        let result = tool.extract(Path::new("report.hwp"));
        assert!(matches!(result, Err(ExtractionFailure::ToolNoOutput { .. })));
    }

    #[test]
    fn test_launch_failure_is_a_diagnostic() {
        let tool = HwpTool::Available(PathBuf::from("/definitely/not/here/hwp5txt"));
        let result = tool.extract(Path::new("report.hwp"));
        assert!(matches!(result, Err(ExtractionFailure::ToolLaunch { .. })));
    }

    #[test]
    fn test_decode_utf8_and_ascii() {
        assert_eq!(decode_output(b"plain"), "plain");
        assert_eq!(decode_output("한글 문서".as_bytes()), "한글 문서");
    }

    #[test]
    fn test_decode_legacy_korean() {
        let sample = "한국어 문서의 본문입니다. 이 문장은 인코딩 감지를 위한 충분한 길이를 가지고 있습니다.";
        let (bytes, _, _) = EUC_KR.encode(sample);
        assert_eq!(decode_output(&bytes), sample);
    }

    #[test]
    fn test_drop_replacements() {
        assert_eq!(drop_replacements("a\u{FFFD}b"), "ab");
    }
}
