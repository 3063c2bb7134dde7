pub mod output;
pub mod progress;
pub mod prompt;
pub mod signals;

pub use output::{OutputFormatter, OutputMode, ProgressAwareOutput};
pub use progress::ProgressManager;
pub use prompt::{clean_path_input, prompt_directory, InvalidInput};
pub use signals::GracefulShutdown;
