//! Inline-chat block detection.
//!
//! A block is an opening marker, any number of body lines, and the closing
//! marker. What a block exposes depends on its status:
//!
//! - `pending`: `user_message` and `mentions`
//! - `processing` / `error`: `user_message` only
//! - `complete`: the whole body as `ai_response`

use super::markers::OpenMarker;
use super::mentions::extract_mentions;
use super::region::{LineClass, classify_lines};
use crate::models::{InlineChatBlock, InlineChatStatus, Mention, MentionType};

/// Prefix marking the question line in legacy blocks.
const USER_PREFIX: &str = "User:";

/// Detect every closed inline-chat block in a document, in line order.
pub fn detect_in_file(text: &str) -> Vec<InlineChatBlock> {
    let lines: Vec<&str> = text.lines().collect();
    let classes = classify_lines(&lines);
    detect_with_classes(&lines, &classes)
}

pub(crate) fn detect_with_classes(lines: &[&str], classes: &[LineClass]) -> Vec<InlineChatBlock> {
    let mut blocks = Vec::new();
    let mut open: Option<(usize, &OpenMarker)> = None;
    let mut body: Vec<&str> = Vec::new();

    for (idx, class) in classes.iter().enumerate() {
        match class {
            LineClass::ChatOpen(marker) => {
                open = Some((idx, marker));
                body.clear();
            }
            LineClass::ChatBody => body.push(lines[idx]),
            LineClass::ChatClose => {
                if let Some((start, marker)) = open.take() {
                    blocks.push(build_block(marker, start, idx, &body, lines));
                }
                body.clear();
            }
            _ => {}
        }
    }

    blocks
}

fn build_block(
    marker: &OpenMarker,
    start: usize,
    end: usize,
    body: &[&str],
    lines: &[&str],
) -> InlineChatBlock {
    let mut block = InlineChatBlock {
        id: marker.id.clone(),
        status: marker.status,
        start_line: start + 1,
        end_line: end + 1,
        agent: marker.agent.clone(),
        user_message: None,
        ai_response: None,
        mentions: None,
        raw: lines[start..=end].join("\n"),
    };

    match marker.status {
        InlineChatStatus::Complete => {
            block.ai_response = Some(body.join("\n"));
        }
        InlineChatStatus::Pending => {
            block.mentions = Some(message_mentions(marker, body));
            block.user_message = Some(user_message(marker, body));
        }
        InlineChatStatus::Processing | InlineChatStatus::Error => {
            block.user_message = Some(user_message(marker, body));
        }
    }

    block
}

/// Reconstruct the question asked in a block.
fn user_message(marker: &OpenMarker, body: &[&str]) -> String {
    match (&marker.agent, &marker.message) {
        (Some(agent), Some(message)) if !message.is_empty() => format!("@{} {}", agent, message),
        (Some(agent), _) => format!("@{}", agent),
        (None, Some(message)) if !message.is_empty() => message.clone(),
        _ => legacy_message(body),
    }
}

/// Legacy blocks keep the question in the body: prefer a `User:` line,
/// else the first body line.
fn legacy_message(body: &[&str]) -> String {
    body.iter()
        .find_map(|line| line.trim().strip_prefix(USER_PREFIX))
        .or_else(|| body.first().copied())
        .map(|message| message.trim().to_string())
        .unwrap_or_default()
}

fn message_mentions(marker: &OpenMarker, body: &[&str]) -> Vec<Mention> {
    match &marker.agent {
        Some(agent) => {
            let mut mentions = vec![Mention::new(
                MentionType::Agent,
                agent.clone(),
                format!("@{}", agent),
            )];
            if let Some(message) = &marker.message {
                mentions.extend(extract_mentions(message));
            }
            mentions
        }
        None => extract_mentions(&user_message(marker, body)),
    }
}

/// Whether a document has at least one pending inline chat.
pub fn has_pending_inline_chats(text: &str) -> bool {
    detect_in_file(text).iter().any(InlineChatBlock::is_pending)
}

/// All pending inline chats of a document.
pub fn get_pending_inline_chats(text: &str) -> Vec<InlineChatBlock> {
    detect_in_file(text)
        .into_iter()
        .filter(InlineChatBlock::is_pending)
        .collect()
}

/// Whether a 1-based line falls within any detected block, markers included.
pub fn is_inside_inline_chat(text: &str, line: usize) -> bool {
    detect_in_file(text)
        .iter()
        .any(|block| block.contains_line(line))
}
