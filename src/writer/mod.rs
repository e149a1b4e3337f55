//! Write-back into documents.
//!
//! - `result` - command results, status decorations, inline-chat responses
//! - `error_report` - error report files for failed requests
//! - `notifications` - append-only notification log
//!
//! Every write re-reads the document immediately before changing it and
//! addresses lines against that fresh content. Rewrites go through a temp
//! file in the same directory that is then renamed over the original, so a
//! failed write leaves the document untouched.

pub mod error_report;
pub mod notifications;
pub mod result;

use crate::{Error, Result};
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::Path;

/// Line terminator used when rendering a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineEnding {
    Lf,
    CrLf,
}

impl LineEnding {
    pub fn as_str(&self) -> &'static str {
        match self {
            LineEnding::Lf => "\n",
            LineEnding::CrLf => "\r\n",
        }
    }
}

/// A document as a list of lines, addressed 1-based.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    lines: Vec<String>,
    line_ending: LineEnding,
    trailing_newline: bool,
}

impl Document {
    /// Split text into lines, remembering how it was terminated.
    pub fn parse(text: &str) -> Self {
        Self {
            lines: text.lines().map(str::to_string).collect(),
            line_ending: if text.contains("\r\n") {
                LineEnding::CrLf
            } else {
                LineEnding::Lf
            },
            trailing_newline: text.ends_with('\n'),
        }
    }

    /// Read a document from disk.
    pub fn read(path: &Path) -> Result<Self> {
        match fs::read_to_string(path) {
            Ok(text) => Ok(Self::parse(&text)),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(Error::FileNotFound(path.to_path_buf())),
            Err(e) => Err(Error::Io(e)),
        }
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Line at a 1-based position.
    pub fn line(&self, number: usize) -> Option<&str> {
        number
            .checked_sub(1)
            .and_then(|idx| self.lines.get(idx))
            .map(String::as_str)
    }

    /// Fail with `InvalidLine` unless `1 <= number <= line_count`.
    pub fn check_line(&self, number: usize) -> Result<()> {
        if number == 0 || number > self.lines.len() {
            return Err(Error::InvalidLine {
                line: number,
                line_count: self.lines.len(),
            });
        }
        Ok(())
    }

    /// Replace the line at a 1-based position. Out-of-range positions are ignored.
    pub fn replace_line(&mut self, number: usize, text: impl Into<String>) {
        if let Some(line) = number.checked_sub(1).and_then(|idx| self.lines.get_mut(idx)) {
            *line = text.into();
        }
    }

    /// Insert lines directly after a 1-based position (0 inserts at the top).
    pub fn insert_after(&mut self, number: usize, new_lines: Vec<String>) {
        let at = number.min(self.lines.len());
        self.lines.splice(at..at, new_lines);
    }

    /// Replace the inclusive 1-based range `[start, end]` with new lines.
    pub fn splice(&mut self, start: usize, end: usize, new_lines: Vec<String>) -> Result<()> {
        self.check_line(start)?;
        self.check_line(end)?;
        if start > end {
            return Err(Error::InvalidLine {
                line: start,
                line_count: self.lines.len(),
            });
        }
        self.lines.splice(start - 1..end, new_lines);
        Ok(())
    }

    /// Join the lines back into text with the original terminator style.
    pub fn render(&self) -> String {
        if self.lines.is_empty() {
            return String::new();
        }
        let newline = self.line_ending.as_str();
        let mut text = self.lines.join(newline);
        if self.trailing_newline {
            text.push_str(newline);
        }
        text
    }

    /// Atomically replace the file at `path` with this document.
    pub fn write(&self, path: &Path) -> Result<()> {
        write_atomic(path, &self.render())
    }
}

/// Write through a sibling temp file, keeping the target's permissions.
pub fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));

    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(contents.as_bytes())?;
    tmp.as_file().sync_all()?;

    if let Ok(metadata) = fs::metadata(path) {
        fs::set_permissions(tmp.path(), metadata.permissions())?;
    }

    tmp.persist(path).map_err(|e| Error::Io(e.error))?;
    Ok(())
}
