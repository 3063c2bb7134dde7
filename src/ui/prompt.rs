use crate::error::{CorpusKitError, Result};
use console::Term;
use std::io::{BufRead, Write};
use std::path::PathBuf;

/// What to do when the entered path is not an existing directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidInput {
    Fail,
    Retry,
}

/// Drops surrounding whitespace and one pair of matching quotes, as pasted from a file manager.
pub fn clean_path_input(raw: &str) -> String {
    let trimmed = raw.trim();
    for quote in ['"', '\''] {
        if let Some(inner) = trimmed
            .strip_prefix(quote)
            .and_then(|rest| rest.strip_suffix(quote))
        {
            return inner.trim().to_string();
        }
    }
    trimmed.to_string()
}

/// Asks for a directory on `input`, writing the prompt to `output`. EOF aborts with `Prompt`.
pub fn read_directory<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    message: &str,
    on_invalid: InvalidInput,
) -> Result<PathBuf> {
    loop {
        write!(output, "{}: ", message)?;
        output.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            writeln!(output)?;
            return Err(CorpusKitError::Prompt);
        }

        let cleaned = clean_path_input(&line);
        let path = PathBuf::from(&cleaned);
        if !cleaned.is_empty() && path.is_dir() {
            return Ok(path);
        }

        match on_invalid {
            InvalidInput::Fail => return Err(CorpusKitError::InvalidPath { path: cleaned }),
            InvalidInput::Retry => {
                writeln!(output, "Not an existing folder, please try again.")?;
            }
        }
    }
}

/// Prompt on the terminal: question on stderr, answer from stdin.
pub fn prompt_directory(message: &str, on_invalid: InvalidInput) -> Result<PathBuf> {
    let stdin = std::io::stdin();
    let mut input = stdin.lock();
    let mut output = Term::stderr();
    read_directory(&mut input, &mut output, message, on_invalid)
}
