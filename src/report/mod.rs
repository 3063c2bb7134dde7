pub mod csv_report;

pub use csv_report::{report_timestamp, resolve_report_dir, CsvReport};
