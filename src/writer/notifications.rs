//! Notification log.
//!
//! An append-only JSONL file with one entry per user-visible event. Writing
//! never fails the caller: problems are logged with `tracing` and dropped.

use crate::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::{BufRead, BufReader, ErrorKind, Write};
use std::path::Path;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Error,
    Success,
}

/// A single notification log entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationEntry {
    #[serde(rename = "type")]
    pub kind: NotificationKind,

    pub message: String,

    /// Document the event is about, as given by the caller
    pub file: String,

    /// 1-based line of the command involved
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,

    /// Report path relative to the vault
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,

    pub timestamp: DateTime<Utc>,
}

impl NotificationEntry {
    pub fn new(kind: NotificationKind, message: impl Into<String>, file: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            file: file.into(),
            line: None,
            link: None,
            timestamp: Utc::now(),
        }
    }

    pub fn error(message: impl Into<String>, file: impl Into<String>) -> Self {
        Self::new(NotificationKind::Error, message, file)
    }

    pub fn success(message: impl Into<String>, file: impl Into<String>) -> Self {
        Self::new(NotificationKind::Success, message, file)
    }

    pub fn with_line(mut self, line: Option<usize>) -> Self {
        self.line = line;
        self
    }

    pub fn with_link(mut self, link: Option<String>) -> Self {
        self.link = link;
        self
    }
}

/// Append one entry, creating the file and its parent directories.
pub fn append(path: &Path, entry: &NotificationEntry) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let json = serde_json::to_string(entry)?;
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    writeln!(file, "{}", json)?;

    Ok(())
}

/// Append an entry, logging instead of failing.
pub fn log_notification(path: &Path, entry: &NotificationEntry) {
    match append(path, entry) {
        Ok(()) => debug!(path = %path.display(), "appended notification"),
        Err(e) => warn!(path = %path.display(), error = %e, "failed to write notification"),
    }
}

/// The most recent `limit` entries, oldest first.
///
/// A missing log reads as empty. Lines that do not parse are skipped.
pub fn read_recent(path: &Path, limit: usize) -> Result<Vec<NotificationEntry>> {
    let file = match fs::File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };

    let mut entries = Vec::new();
    for line in BufReader::new(file).lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<NotificationEntry>(&line) {
            Ok(entry) => entries.push(entry),
            Err(e) => debug!(error = %e, "skipping malformed notification"),
        }
    }

    let skip = entries.len().saturating_sub(limit);
    Ok(entries.split_off(skip))
}
