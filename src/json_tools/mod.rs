pub mod key_rename;
pub mod value_count;

pub use key_rename::{decode_best_effort, KeyRenamer, RenameMethod, RenameOutcome, RenameSummary};
pub use value_count::{CountSummary, FileCount, TextCounts, ValueCounter};
