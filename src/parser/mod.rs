//! Document parsing.
//!
//! Detection is a pure function of document text:
//! - `frontmatter` - leading `---` header
//! - `region` - code-fence / inline-chat exclusion zones
//! - `command` - slash commands with status decorations
//! - `inline_chat` - marker-delimited chat turns
//! - `mentions` - typed reference tokens
//! - `markers` - the comment-marker grammar shared with the writers
//!
//! Nothing here fails: malformed text simply produces no match.

pub mod command;
pub mod frontmatter;
pub mod inline_chat;
pub mod markers;
pub mod mentions;
pub mod region;

use crate::models::ParsedFile;
use crate::{Error, Result};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Parse document text into commands, inline chats, and frontmatter.
pub fn parse_file(path: impl Into<PathBuf>, text: &str) -> ParsedFile {
    let (frontmatter, frontmatter_end_line) = frontmatter::extract(text);

    let lines: Vec<&str> = text.lines().collect();
    let classes = region::classify_lines(&lines);

    ParsedFile {
        path: path.into(),
        frontmatter,
        frontmatter_end_line,
        commands: command::detect_with_classes(&lines, &classes),
        inline_chats: inline_chat::detect_with_classes(&lines, &classes),
    }
}

/// Read a document from disk and parse it.
pub fn parse_path(path: &Path) -> Result<ParsedFile> {
    let text = fs::read_to_string(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => Error::FileNotFound(path.to_path_buf()),
        _ => Error::Io(e),
    })?;
    Ok(parse_file(path, &text))
}
