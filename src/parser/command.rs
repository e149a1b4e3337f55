//! Slash-command detection.
//!
//! A command is a line of the form `[decoration] /name [text]` that lies
//! outside fenced code and inline-chat blocks. The decoration encodes the
//! command's status:
//!
//! | Decoration | Status |
//! |---|---|
//! | (none) | pending |
//! | `✅` `✓` `[x]` | completed |
//! | `❌` `✗` | failed |
//! | `⏳` `🔄` | in_progress |
//!
//! Any other leading text means the line is prose, not a command.

use super::mentions::{extract_mentions, identifier};
use super::region::{LineClass, classify_lines};
use crate::models::{CommandStatus, DetectedCommand};

/// Recognized decorations, in match order.
const DECORATIONS: &[(&str, CommandStatus)] = &[
    ("✅", CommandStatus::Completed),
    ("✓", CommandStatus::Completed),
    ("[x]", CommandStatus::Completed),
    ("[X]", CommandStatus::Completed),
    ("❌", CommandStatus::Failed),
    ("✗", CommandStatus::Failed),
    ("⏳", CommandStatus::InProgress),
    ("🔄", CommandStatus::InProgress),
];

/// Emoji presentation selector some editors append to decorations.
const VARIATION_SELECTOR: char = '\u{FE0F}';

/// Leading status decoration of a trimmed line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decoration<'a> {
    /// Line starts directly with `/`
    Bare,
    /// A recognized decoration, as written
    Status {
        status: CommandStatus,
        token: &'a str,
    },
    /// Anything else: the line is plain text
    Unknown,
}

impl<'a> Decoration<'a> {
    /// Split a trimmed line into its decoration and the remainder.
    pub fn split(trimmed: &'a str) -> (Self, &'a str) {
        for &(token, status) in DECORATIONS {
            if let Some(rest) = trimmed.strip_prefix(token) {
                let token_len = token.len()
                    + rest
                        .strip_prefix(VARIATION_SELECTOR)
                        .map_or(0, |_| VARIATION_SELECTOR.len_utf8());
                let (token, rest) = trimmed.split_at(token_len);
                return (Decoration::Status { status, token }, rest.trim_start());
            }
        }
        if trimmed.starts_with('/') {
            (Decoration::Bare, trimmed)
        } else {
            (Decoration::Unknown, trimmed)
        }
    }

    /// Status this decoration encodes, if it is a command decoration at all.
    pub fn status(&self) -> Option<CommandStatus> {
        match self {
            Decoration::Bare => Some(CommandStatus::Pending),
            Decoration::Status { status, .. } => Some(*status),
            Decoration::Unknown => None,
        }
    }
}

/// Trim a line and remove its status decoration, if it has one.
///
/// Lines with unknown leading text come back trimmed but otherwise unchanged.
pub fn strip_decoration(line: &str) -> &str {
    let (decoration, rest) = Decoration::split(line.trim());
    match decoration {
        Decoration::Unknown => line.trim(),
        _ => rest,
    }
}

/// Detect every command in a document, in line order.
pub fn detect(text: &str) -> Vec<DetectedCommand> {
    let lines: Vec<&str> = text.lines().collect();
    let classes = classify_lines(&lines);
    detect_with_classes(&lines, &classes)
}

pub(crate) fn detect_with_classes(lines: &[&str], classes: &[LineClass]) -> Vec<DetectedCommand> {
    lines
        .iter()
        .zip(classes)
        .enumerate()
        .filter(|(_, (_, class))| class.is_text())
        .filter_map(|(idx, (line, _))| parse_command_line(line, idx + 1))
        .collect()
}

/// Parse one line as a command, ignoring exclusion zones.
pub fn parse_command_line(line: &str, line_number: usize) -> Option<DetectedCommand> {
    let (decoration, rest) = Decoration::split(line.trim());
    let status = decoration.status()?;

    let name = identifier(rest.strip_prefix('/')?)?;
    let after = &rest[1 + name.len()..];
    if after.starts_with(|c: char| !c.is_whitespace()) {
        return None;
    }

    let status_emoji = match decoration {
        Decoration::Status { token, .. } => Some(token.to_string()),
        _ => None,
    };
    let mentions = if status == CommandStatus::Pending {
        extract_mentions(rest)
    } else {
        Vec::new()
    };

    Some(DetectedCommand {
        command: name.to_string(),
        status,
        status_emoji,
        raw: line.to_string(),
        text: rest.to_string(),
        line: line_number,
        mentions,
    })
}
