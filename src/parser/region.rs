//! Exclusion-zone tracking for a single left-to-right scan.
//!
//! Every line of a document is classified by a three-state machine:
//!
//! ```text
//! Normal ──fence──▶ InCodeFence ──fence──▶ Normal
//! Normal ──opener─▶ InChatBlock ──closer─▶ Normal
//! ```
//!
//! Only lines classified as [`LineClass::Text`] are eligible for command
//! detection. Chat markers inside a code fence are fenced text, and fence
//! lines inside a chat block are chat body.
//!
//! An opener that never sees its closer does not hide the rest of the
//! document: [`classify_lines`] demotes it to plain text and keeps scanning
//! in `Normal` state.

use super::markers::{self, OpenMarker};
use tracing::debug;

/// Scanner state between lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ScanState {
    #[default]
    Normal,
    InCodeFence,
    InChatBlock,
}

/// What a single line is, given the state it was scanned in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineClass {
    /// Ordinary text outside every exclusion zone
    Text,
    /// A ```` ``` ```` line opening or closing a fence
    FenceDelimiter,
    /// Text inside a fenced code block
    Fenced,
    /// Inline-chat opening marker
    ChatOpen(OpenMarker),
    /// Text between chat markers
    ChatBody,
    /// Inline-chat closing marker
    ChatClose,
}

impl LineClass {
    /// Whether the line lies outside every exclusion zone.
    pub fn is_text(&self) -> bool {
        matches!(self, LineClass::Text)
    }
}

/// Line-at-a-time state machine.
#[derive(Debug, Default)]
pub struct RegionScanner {
    state: ScanState,
}

impl RegionScanner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> ScanState {
        self.state
    }

    /// Classify one line and advance the state.
    pub fn step(&mut self, line: &str) -> LineClass {
        match self.state {
            ScanState::Normal => {
                if markers::is_fence_line(line) {
                    self.state = ScanState::InCodeFence;
                    LineClass::FenceDelimiter
                } else if let Some(marker) = markers::parse_open_marker(line) {
                    self.state = ScanState::InChatBlock;
                    LineClass::ChatOpen(marker)
                } else {
                    LineClass::Text
                }
            }
            ScanState::InCodeFence => {
                if markers::is_fence_line(line) {
                    self.state = ScanState::Normal;
                    LineClass::FenceDelimiter
                } else {
                    LineClass::Fenced
                }
            }
            ScanState::InChatBlock => {
                if markers::is_close_marker(line) {
                    self.state = ScanState::Normal;
                    LineClass::ChatClose
                } else {
                    LineClass::ChatBody
                }
            }
        }
    }
}

/// Classify every line of a document.
///
/// The result has exactly one entry per line, and every `ChatOpen` in it
/// is followed by a matching `ChatClose`.
pub fn classify_lines(lines: &[&str]) -> Vec<LineClass> {
    // Inside a chat block only a closer ends the state, so an opener closes
    // iff some closer follows it anywhere in the document.
    let last_close = lines.iter().rposition(|line| markers::is_close_marker(line));
    let mut scanner = RegionScanner::new();

    lines
        .iter()
        .enumerate()
        .map(|(idx, line)| match scanner.step(line) {
            LineClass::ChatOpen(_) if last_close.is_none_or(|close| close < idx) => {
                debug!(line = idx + 1, "unclosed inline chat opener treated as text");
                scanner = RegionScanner::new();
                LineClass::Text
            }
            class => class,
        })
        .collect()
}
