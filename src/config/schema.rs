//! KDL schema for config.kdl.
//!
//! This module provides:
//! - The `SparkConfig` struct mirroring the file
//! - Parsing from KDL documents
//! - Validation

use kdl::{KdlDocument, KdlEntry, KdlValue};
use serde::{Deserialize, Serialize};

pub const ADD_BLANK_LINES_KEY: &str = "add-blank-lines";
pub const LOG_DIR_KEY: &str = "log-dir";
pub const NOTIFICATIONS_FILE_KEY: &str = "notifications-file";

/// Default log directory, relative to the vault.
pub const DEFAULT_LOG_DIR: &str = ".spark/logs";

/// Default notification log, relative to the vault.
pub const DEFAULT_NOTIFICATIONS_FILE: &str = ".spark/notifications.jsonl";

/// Preferences stored in config.kdl.
///
/// # KDL Schema
///
/// ```kdl
/// add-blank-lines #false
/// log-dir ".spark/logs"
/// notifications-file ".spark/notifications.jsonl"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SparkConfig {
    /// Surround result blocks with blank lines
    pub add_blank_lines: Option<bool>,

    /// Error report directory, relative to the vault
    pub log_dir: Option<String>,

    /// Notification log file, relative to the vault
    pub notifications_file: Option<String>,
}

impl SparkConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate the config values.
    ///
    /// Returns an error message if any value is invalid.
    pub fn validate(&self) -> Result<(), String> {
        for (key, value) in [
            (LOG_DIR_KEY, &self.log_dir),
            (NOTIFICATIONS_FILE_KEY, &self.notifications_file),
        ] {
            if let Some(path) = value
                && path.trim().is_empty()
            {
                return Err(format!("{} must not be empty", key));
            }
        }
        Ok(())
    }

    /// Parse config from a KDL document. Unknown nodes are ignored.
    pub fn from_kdl(doc: &KdlDocument) -> Self {
        Self {
            add_blank_lines: first_value(doc, ADD_BLANK_LINES_KEY).and_then(as_bool),
            log_dir: first_value(doc, LOG_DIR_KEY)
                .and_then(KdlValue::as_string)
                .map(str::to_string),
            notifications_file: first_value(doc, NOTIFICATIONS_FILE_KEY)
                .and_then(KdlValue::as_string)
                .map(str::to_string),
        }
    }
}

fn first_value<'a>(doc: &'a KdlDocument, key: &str) -> Option<&'a KdlValue> {
    doc.get(key)
        .and_then(|node| node.entries().first())
        .map(KdlEntry::value)
}

/// Accept KDL booleans as well as the strings "true"/"false".
fn as_bool(value: &KdlValue) -> Option<bool> {
    match value {
        KdlValue::Bool(b) => Some(*b),
        KdlValue::String(s) => match s.to_lowercase().as_str() {
            "true" | "yes" | "1" => Some(true),
            "false" | "no" | "0" => Some(false),
            _ => None,
        },
        _ => None,
    }
}
