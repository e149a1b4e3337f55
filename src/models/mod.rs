//! Data models for Spark parse results.
//!
//! This module defines the structures produced by the detectors:
//! - `Mention` - A typed reference token (`/command`, `@agent`, `@file.md`, `@folder/`, `$service`)
//! - `DetectedCommand` - A slash-command line with its status decoration
//! - `InlineChatBlock` - One chat turn delimited by a marker pair
//! - `ParsedFile` - Everything detected in one document
//!
//! All of these are derived from document text and never persisted.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

/// Kind of reference a mention points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MentionType {
    Command,
    File,
    Folder,
    Agent,
    Service,
}

impl MentionType {
    /// Convert to string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            MentionType::Command => "command",
            MentionType::File => "file",
            MentionType::Folder => "folder",
            MentionType::Agent => "agent",
            MentionType::Service => "service",
        }
    }
}

impl fmt::Display for MentionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A typed reference token found in a command line or chat message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mention {
    #[serde(rename = "type")]
    pub kind: MentionType,

    /// Token without its sigil (and without the trailing `/` for folders)
    pub value: String,

    /// Token exactly as written, sigil included
    #[serde(rename = "rawToken")]
    pub raw: String,
}

impl Mention {
    pub fn new(kind: MentionType, value: impl Into<String>, raw: impl Into<String>) -> Self {
        Self {
            kind,
            value: value.into(),
            raw: raw.into(),
        }
    }
}

/// Processing state of a slash command, encoded as a decoration before the `/`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
    Failed,
}

impl CommandStatus {
    /// Parse from string, case-insensitive. Accepts `in-progress` as well.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Some(CommandStatus::Pending),
            "in_progress" | "in-progress" => Some(CommandStatus::InProgress),
            "completed" => Some(CommandStatus::Completed),
            "failed" => Some(CommandStatus::Failed),
            _ => None,
        }
    }

    /// Convert to string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            CommandStatus::Pending => "pending",
            CommandStatus::InProgress => "in_progress",
            CommandStatus::Completed => "completed",
            CommandStatus::Failed => "failed",
        }
    }

    /// Canonical decoration written for this status. Pending lines are bare.
    pub fn emoji(&self) -> Option<&'static str> {
        match self {
            CommandStatus::Pending => None,
            CommandStatus::InProgress => Some("⏳"),
            CommandStatus::Completed => Some("✅"),
            CommandStatus::Failed => Some("❌"),
        }
    }
}

impl fmt::Display for CommandStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A slash-command invocation found on a single line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectedCommand {
    /// Command name without the leading `/`
    pub command: String,

    pub status: CommandStatus,

    /// Decoration exactly as written (e.g. "✓", "[x]"); absent for pending commands
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_emoji: Option<String>,

    /// The full original line
    pub raw: String,

    /// Trimmed line with the decoration removed, starting at the `/`
    pub text: String,

    /// 1-based line number at detection time
    pub line: usize,

    /// Mention chain, left to right. Only populated while pending.
    pub mentions: Vec<Mention>,
}

impl DetectedCommand {
    pub fn is_pending(&self) -> bool {
        self.status == CommandStatus::Pending
    }
}

/// Processing state of an inline chat, stored in its opening marker.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InlineChatStatus {
    #[default]
    Pending,
    Processing,
    Complete,
    Error,
}

impl InlineChatStatus {
    /// Parse from the marker's status field. Exact, lowercase.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(InlineChatStatus::Pending),
            "processing" => Some(InlineChatStatus::Processing),
            "complete" => Some(InlineChatStatus::Complete),
            "error" => Some(InlineChatStatus::Error),
            _ => None,
        }
    }

    /// Convert to string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            InlineChatStatus::Pending => "pending",
            InlineChatStatus::Processing => "processing",
            InlineChatStatus::Complete => "complete",
            InlineChatStatus::Error => "error",
        }
    }
}

impl fmt::Display for InlineChatStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One inline chat turn: an opening marker, body lines, and the closing marker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineChatBlock {
    pub id: String,

    pub status: InlineChatStatus,

    /// 1-based line of the opening marker
    pub start_line: usize,

    /// 1-based line of the closing marker (inclusive)
    pub end_line: usize,

    /// Agent named in the extended opening marker
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent: Option<String>,

    /// Question asked; absent once the chat is complete
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_message: Option<String>,

    /// Body of a complete chat, verbatim
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ai_response: Option<String>,

    /// Mention chain of the user message; only computed while pending
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mentions: Option<Vec<Mention>>,

    /// Lines from opener through closer, joined with `\n`
    pub raw: String,
}

impl InlineChatBlock {
    pub fn is_pending(&self) -> bool {
        self.status == InlineChatStatus::Pending
    }

    /// Whether a 1-based line falls within this block's markers.
    pub fn contains_line(&self, line: usize) -> bool {
        (self.start_line..=self.end_line).contains(&line)
    }
}

/// Flat key/value mapping from a document's `---` header.
pub type Frontmatter = BTreeMap<String, serde_json::Value>;

/// Everything detected in one document. Recomputed on every read.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedFile {
    pub path: PathBuf,

    pub frontmatter: Frontmatter,

    /// 1-based line of the closing `---`, or 0 when there is no frontmatter
    pub frontmatter_end_line: usize,

    pub commands: Vec<DetectedCommand>,

    pub inline_chats: Vec<InlineChatBlock>,
}

impl ParsedFile {
    pub fn has_pending_commands(&self) -> bool {
        self.commands.iter().any(DetectedCommand::is_pending)
    }

    pub fn has_pending_inline_chats(&self) -> bool {
        self.inline_chats.iter().any(InlineChatBlock::is_pending)
    }

    pub fn pending_commands(&self) -> impl Iterator<Item = &DetectedCommand> {
        self.commands.iter().filter(|c| c.is_pending())
    }

    pub fn pending_inline_chats(&self) -> impl Iterator<Item = &InlineChatBlock> {
        self.inline_chats.iter().filter(|c| c.is_pending())
    }
}
