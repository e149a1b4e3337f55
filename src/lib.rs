//! Spark - slash commands and inline chats embedded in plain-text notes.
//!
//! This library provides the protocol engine behind the `spark` CLI:
//! detecting command invocations and inline-chat blocks in a document,
//! and writing results back into the same file once they are ready.

pub mod cli;
pub mod commands;
pub mod config;
pub mod models;
pub mod parser;
pub mod writer;

use std::path::PathBuf;

/// Library-level error type for Spark operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid line {line}: document has {line_count} lines")]
    InvalidLine { line: usize, line_count: usize },

    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("Inline chat not found: {0}")]
    ChatNotFound(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl Error {
    /// Stable machine-readable code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            Error::Io(_) => "IO_ERROR",
            Error::Json(_) => "JSON_ERROR",
            Error::InvalidLine { .. } => "INVALID_LINE",
            Error::FileNotFound(_) => "FILE_NOT_FOUND",
            Error::ChatNotFound(_) => "CHAT_NOT_FOUND",
            Error::Config(_) => "CONFIG_ERROR",
            Error::InvalidInput(_) => "INVALID_INPUT",
        }
    }
}

/// Result type alias for Spark operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes_are_stable() {
        let err = Error::InvalidLine {
            line: 8,
            line_count: 3,
        };
        assert_eq!(err.code(), "INVALID_LINE");
        assert_eq!(err.to_string(), "Invalid line 8: document has 3 lines");

        let err = Error::FileNotFound(PathBuf::from("/vault/missing.md"));
        assert_eq!(err.code(), "FILE_NOT_FOUND");
        assert!(err.to_string().contains("/vault/missing.md"));
    }
}
