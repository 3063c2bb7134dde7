pub mod file_filter;
pub mod file_scanner;

pub use file_filter::FileFilter;
pub use file_scanner::{validate_root, FileScanner, ScanStatistics, SourceFile};
