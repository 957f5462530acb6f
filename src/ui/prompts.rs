//! ui::prompts
//!
//! Credential prompts.
//!
//! # Design
//!
//! The password is read without echo when a terminal is attached. In
//! non-interactive mode the caller must pipe it on stdin
//! (`--password-stdin`); prompting fails with a clear error instead of
//! blocking.

use std::io::BufRead;

use thiserror::Error;

/// Errors from prompts.
#[derive(Debug, Error)]
pub enum PromptError {
    #[error("no password provided")]
    Empty,

    #[error("not in interactive mode, use --password-stdin")]
    NotInteractive,

    #[error("IO error: {0}")]
    IoError(String),
}

/// Prompt for masked input (e.g., passwords, tokens).
///
/// The input is not echoed to the terminal.
pub fn password(message: &str, interactive: bool) -> Result<String, PromptError> {
    if !interactive {
        return Err(PromptError::NotInteractive);
    }
    let value =
        rpassword::prompt_password(message).map_err(|e| PromptError::IoError(e.to_string()))?;
    non_empty(value)
}

/// Read a password from the first line of `reader`.
///
/// Trailing `\r\n` is stripped; other whitespace is kept.
pub fn read_secret<R: BufRead>(mut reader: R) -> Result<String, PromptError> {
    let mut line = String::new();
    reader
        .read_line(&mut line)
        .map_err(|e| PromptError::IoError(e.to_string()))?;
    let trimmed = line.trim_end_matches(['\n', '\r']).to_string();
    non_empty(trimmed)
}

fn non_empty(value: String) -> Result<String, PromptError> {
    if value.is_empty() {
        Err(PromptError::Empty)
    } else {
        Ok(value)
    }
}
