//! Result write-back for commands and inline chats.
//!
//! | Operation | On bad line / missing file |
//! |---|---|
//! | [`write_inline`] | error |
//! | [`update_status`] | silent no-op |
//! | [`update_inline_chat_status`] | error |
//! | [`write_inline_chat_response`] | error |
//!
//! Callers are expected to keep at most one request in flight per file;
//! nothing here locks the document.

use super::Document;
use crate::models::{CommandStatus, InlineChatStatus};
use crate::parser::command::{detect, strip_decoration};
use crate::parser::inline_chat::detect_in_file;
use crate::parser::markers::{self, RESULT_END, RESULT_START};
use crate::{Error, Result};
use serde::Serialize;
use std::path::PathBuf;
use tracing::{debug, info};

/// Write a command's result below its line and mark it completed.
#[derive(Debug, Clone)]
pub struct InlineResultRequest {
    pub file_path: PathBuf,
    pub command_line: usize,
    pub command_text: String,
    pub result: String,
    pub add_blank_lines: bool,
}

/// Change the status decoration of a command line.
#[derive(Debug, Clone)]
pub struct StatusUpdateRequest {
    pub file_path: PathBuf,
    pub command_line: usize,
    pub command_text: String,
    pub status: CommandStatus,
}

/// Change the status field of an inline chat's opening marker.
#[derive(Debug, Clone)]
pub struct ChatStatusRequest {
    pub file_path: PathBuf,
    pub chat_id: String,
    pub start_line: usize,
    pub end_line: usize,
    pub status: InlineChatStatus,
}

/// Replace an inline chat block, markers included, with a response.
#[derive(Debug, Clone)]
pub struct ChatResponseRequest {
    pub file_path: PathBuf,
    pub chat_id: String,
    pub start_line: usize,
    pub end_line: usize,
    pub response: String,
}

/// Line counts around a write, for callers tracking shifted positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WriteOutcome {
    /// 1-based line the edit was anchored at after relocation
    pub line: usize,
    pub lines_before: usize,
    pub lines_after: usize,
}

impl WriteOutcome {
    /// How far content below the edit moved.
    pub fn shift(&self) -> isize {
        self.lines_after as isize - self.lines_before as isize
    }
}

/// Mark a command completed and insert its result block after it.
///
/// The command line becomes `✅ <command>` whatever its previous decoration.
/// A result block already sitting under the command is replaced rather than
/// duplicated.
pub fn write_inline(request: &InlineResultRequest) -> Result<WriteOutcome> {
    let mut doc = Document::read(&request.file_path)?;
    let lines_before = doc.line_count();
    doc.check_line(request.command_line)?;

    let target = apply_inline_result(&mut doc, request);
    doc.write(&request.file_path)?;

    info!(
        file = %request.file_path.display(),
        line = target,
        "wrote command result"
    );
    Ok(WriteOutcome {
        line: target,
        lines_before,
        lines_after: doc.line_count(),
    })
}

fn apply_inline_result(doc: &mut Document, request: &InlineResultRequest) -> usize {
    let current = doc.line(request.command_line).unwrap_or_default();
    let body = match strip_decoration(&request.command_text) {
        "" => strip_decoration(current).to_string(),
        text => text.to_string(),
    };
    let target = locate_command(doc, request.command_line, &body).unwrap_or(request.command_line);

    let indent = leading_whitespace(doc.line(target).unwrap_or_default()).to_string();
    let decoration = CommandStatus::Completed.emoji().unwrap_or_default();
    doc.replace_line(target, format!("{}{} {}", indent, decoration, body));

    let block = result_block(&request.result, request.add_blank_lines);
    match existing_result_block(doc, target) {
        Some((start, end)) => {
            debug!(start, end, "replacing existing result block");
            // Bounds come from the document itself.
            let _ = doc.splice(start, end, block);
        }
        None => doc.insert_after(target, block),
    }
    target
}

fn result_block(result: &str, add_blank_lines: bool) -> Vec<String> {
    let mut block = Vec::new();
    if add_blank_lines {
        block.push(String::new());
    }
    block.push(RESULT_START.to_string());
    block.extend(result.lines().map(str::to_string));
    block.push(RESULT_END.to_string());
    if add_blank_lines {
        block.push(String::new());
    }
    block
}

/// Range of a result block directly under `command_line`, including the
/// blank lines that wrap it.
fn existing_result_block(doc: &Document, command_line: usize) -> Option<(usize, usize)> {
    let mut start = command_line + 1;
    let leading_blank = doc.line(start).is_some_and(|l| l.trim().is_empty());
    if leading_blank {
        start += 1;
    }
    if !doc.line(start).is_some_and(markers::is_result_start) {
        return None;
    }

    let mut end = (start + 1..=doc.line_count()).find(|&n| doc.line(n).is_some_and(markers::is_result_end))?;
    if leading_blank && doc.line(end + 1).is_some_and(|l| l.trim().is_empty()) {
        end += 1;
    }
    Some((command_line + 1, end))
}

/// Rewrite only the status decoration of a command line.
///
/// Best-effort: returns `false` without touching the file when it is missing,
/// the line is out of range, or no matching command line can be found.
pub fn update_status(request: &StatusUpdateRequest) -> bool {
    let mut doc = match Document::read(&request.file_path) {
        Ok(doc) => doc,
        Err(e) => {
            debug!(error = %e, "skipping status update");
            return false;
        }
    };
    if let Err(e) = doc.check_line(request.command_line) {
        debug!(error = %e, "skipping status update");
        return false;
    }

    if !apply_status(&mut doc, request) {
        return false;
    }
    match doc.write(&request.file_path) {
        Ok(()) => true,
        Err(e) => {
            debug!(error = %e, "status update write failed");
            false
        }
    }
}

fn apply_status(doc: &mut Document, request: &StatusUpdateRequest) -> bool {
    let body = strip_decoration(&request.command_text);
    let target = if body.is_empty() {
        detect(&doc.render())
            .iter()
            .any(|c| c.line == request.command_line)
            .then_some(request.command_line)
    } else {
        locate_command(doc, request.command_line, body)
    };
    let Some(target) = target else {
        debug!(line = request.command_line, "command not found for status update");
        return false;
    };

    let current = doc.line(target).unwrap_or_default();
    let indent = leading_whitespace(current);
    let rest = strip_decoration(current);
    let updated = match request.status.emoji() {
        Some(emoji) => format!("{}{} {}", indent, emoji, rest),
        None => format!("{}{}", indent, rest),
    };
    doc.replace_line(target, updated);
    true
}

/// Rewrite the status field of an inline chat's opening marker.
///
/// The id, agent, and message fields are kept as written.
pub fn update_inline_chat_status(request: &ChatStatusRequest) -> Result<()> {
    let mut doc = Document::read(&request.file_path)?;
    doc.check_line(request.start_line)?;

    let target = locate_chat_opener(&doc, request.start_line, &request.chat_id)
        .ok_or_else(|| Error::ChatNotFound(request.chat_id.clone()))?;
    let current = doc.line(target).unwrap_or_default();
    let Some(marker) = markers::parse_open_marker(current) else {
        return Err(Error::ChatNotFound(request.chat_id.clone()));
    };
    if marker.status == request.status {
        return Ok(());
    }

    let indent = leading_whitespace(current).to_string();
    doc.replace_line(
        target,
        format!(
            "{}{}",
            indent,
            markers::render_open_marker(request.status, &marker.payload)
        ),
    );
    doc.write(&request.file_path)?;

    info!(
        file = %request.file_path.display(),
        chat = %request.chat_id,
        status = %request.status,
        "updated inline chat status"
    );
    Ok(())
}

/// Replace an inline chat block, both markers included, with `response`.
pub fn write_inline_chat_response(request: &ChatResponseRequest) -> Result<WriteOutcome> {
    let mut doc = Document::read(&request.file_path)?;
    let lines_before = doc.line_count();
    check_range(&doc, request.start_line, request.end_line)?;

    let (start, end) = locate_chat_block(&doc, request);
    let response = request.response.lines().map(str::to_string).collect();
    doc.splice(start, end, response)?;
    doc.write(&request.file_path)?;

    info!(
        file = %request.file_path.display(),
        chat = %request.chat_id,
        start,
        end,
        "wrote inline chat response"
    );
    Ok(WriteOutcome {
        line: start,
        lines_before,
        lines_after: doc.line_count(),
    })
}

fn check_range(doc: &Document, start: usize, end: usize) -> Result<()> {
    doc.check_line(start)?;
    doc.check_line(end)?;
    if start > end {
        return Err(Error::InvalidLine {
            line: end,
            line_count: doc.line_count(),
        });
    }
    Ok(())
}

/// Find the detected command whose text matches `body`, preferring `hint`
/// and then the nearest match. Fenced and chat-body lines never match.
fn locate_command(doc: &Document, hint: usize, body: &str) -> Option<usize> {
    let candidates: Vec<usize> = detect(&doc.render())
        .into_iter()
        .filter(|c| c.text == body)
        .map(|c| c.line)
        .collect();
    if candidates.contains(&hint) {
        return Some(hint);
    }
    let found = candidates.into_iter().min_by_key(|&n| n.abs_diff(hint));
    if let Some(line) = found {
        debug!(from = hint, to = line, "relocated command line");
    }
    found
}

/// Start line of the detected chat block with `chat_id`, preferring `hint`.
fn locate_chat_opener(doc: &Document, hint: usize, chat_id: &str) -> Option<usize> {
    let found = detect_in_file(&doc.render())
        .into_iter()
        .filter(|block| block.id == chat_id)
        .map(|block| block.start_line)
        .min_by_key(|&n| n.abs_diff(hint));
    if let Some(line) = found
        && line != hint
    {
        debug!(from = hint, to = line, chat = chat_id, "relocated inline chat");
    }
    found
}

/// Current bounds of the chat block, falling back to the requested range.
fn locate_chat_block(doc: &Document, request: &ChatResponseRequest) -> (usize, usize) {
    let requested = (request.start_line, request.end_line);
    let found = detect_in_file(&doc.render())
        .into_iter()
        .filter(|b| b.id == request.chat_id)
        .map(|b| (b.start_line, b.end_line))
        .min_by_key(|&(start, _)| start.abs_diff(request.start_line));

    match found {
        Some(bounds) if bounds == requested => requested,
        Some(bounds) => {
            debug!(
                from = request.start_line,
                to = bounds.0,
                chat = %request.chat_id,
                "relocated inline chat block"
            );
            bounds
        }
        None => {
            debug!(
                start = request.start_line,
                end = request.end_line,
                chat = %request.chat_id,
                "inline chat not found, replacing requested range"
            );
            requested
        }
    }
}

fn leading_whitespace(line: &str) -> &str {
    &line[..line.len() - line.trim_start().len()]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn write_doc(dir: &TempDir, text: &str) -> PathBuf {
        let path = dir.path().join("note.md");
        fs::write(&path, text).unwrap();
        path
    }

    fn read(path: &Path) -> String {
        fs::read_to_string(path).unwrap()
    }

    fn inline_request(path: &Path, line: usize, command: &str, result: &str) -> InlineResultRequest {
        InlineResultRequest {
            file_path: path.to_path_buf(),
            command_line: line,
            command_text: command.to_string(),
            result: result.to_string(),
            add_blank_lines: true,
        }
    }

    // === write_inline ===

    #[test]
    fn test_write_inline_inserts_result_block() {
        let dir = TempDir::new().unwrap();
        let path = write_doc(&dir, "# Notes\n/summarize this\nafter\n");

        let outcome =
            write_inline(&inline_request(&path, 2, "/summarize this", "Line one\nLine two")).unwrap();

        assert_eq!(
            read(&path),
            "# Notes\n✅ /summarize this\n\n<!-- spark-result-start -->\nLine one\nLine two\n<!-- spark-result-end -->\n\nafter\n"
        );
        assert_eq!(outcome.line, 2);
        assert_eq!(outcome.lines_before, 3);
        assert_eq!(outcome.lines_after, 9);
        assert_eq!(outcome.shift(), 6);
    }

    #[test]
    fn test_write_inline_without_blank_lines() {
        let dir = TempDir::new().unwrap();
        let path = write_doc(&dir, "/summarize\nafter");

        let mut request = inline_request(&path, 1, "/summarize", "done");
        request.add_blank_lines = false;
        write_inline(&request).unwrap();

        assert_eq!(
            read(&path),
            "✅ /summarize\n<!-- spark-result-start -->\ndone\n<!-- spark-result-end -->\nafter"
        );
    }

    #[test]
    fn test_write_inline_strips_existing_decoration() {
        let dir = TempDir::new().unwrap();
        let path = write_doc(&dir, "⏳ /summarize it\n");

        write_inline(&inline_request(&path, 1, "⏳ /summarize it", "ok")).unwrap();

        let text = read(&path);
        assert!(text.starts_with("✅ /summarize it\n"));
        assert!(!text.contains('⏳'));
    }

    #[test]
    fn test_write_inline_is_stable_on_repeat() {
        let dir = TempDir::new().unwrap();
        let path = write_doc(&dir, "intro\n/summarize\noutro\n");
        let request = inline_request(&path, 2, "/summarize", "result");

        write_inline(&request).unwrap();
        let first = read(&path);
        write_inline(&request).unwrap();
        assert_eq!(read(&path), first);
    }

    #[test]
    fn test_write_inline_is_deterministic_from_reset_document() {
        let dir = TempDir::new().unwrap();
        let original = "a\n/summarize\nb\n";
        let path = write_doc(&dir, original);
        let request = inline_request(&path, 2, "/summarize", "r1\nr2");

        write_inline(&request).unwrap();
        let first = read(&path);
        fs::write(&path, original).unwrap();
        write_inline(&request).unwrap();
        assert_eq!(read(&path), first);
    }

    #[test]
    fn test_write_inline_replaces_previous_result() {
        let dir = TempDir::new().unwrap();
        let path = write_doc(&dir, "/summarize\nafter\n");

        write_inline(&inline_request(&path, 1, "/summarize", "old")).unwrap();
        write_inline(&inline_request(&path, 1, "/summarize", "new")).unwrap();

        let text = read(&path);
        assert!(text.contains("\nnew\n"));
        assert!(!text.contains("old"));
        assert_eq!(text.matches(RESULT_START).count(), 1);
    }

    #[test]
    fn test_write_inline_invalid_line_leaves_document() {
        let dir = TempDir::new().unwrap();
        let original = "one\ntwo\nthree\n";
        let path = write_doc(&dir, original);

        let err = write_inline(&inline_request(&path, 8, "/summarize", "x")).unwrap_err();

        assert!(matches!(err, Error::InvalidLine { line: 8, line_count: 3 }));
        assert_eq!(read(&path), original);

        let err = write_inline(&inline_request(&path, 0, "/summarize", "x")).unwrap_err();
        assert_eq!(err.code(), "INVALID_LINE");
    }

    #[test]
    fn test_write_inline_missing_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing.md");
        let err = write_inline(&inline_request(&path, 1, "/summarize", "x")).unwrap_err();
        assert!(matches!(err, Error::FileNotFound(_)));
    }

    #[test]
    fn test_write_inline_relocates_shifted_command() {
        let dir = TempDir::new().unwrap();
        let path = write_doc(&dir, "new first line\nintro\n/summarize\n");

        let outcome = write_inline(&inline_request(&path, 2, "/summarize", "x")).unwrap();

        assert_eq!(outcome.line, 3);
        assert!(read(&path).starts_with("new first line\nintro\n✅ /summarize\n"));
    }

    #[test]
    fn test_write_inline_preserves_content_before_and_after() {
        let dir = TempDir::new().unwrap();
        let path = write_doc(&dir, "a\nb\n/run\nc\nd");

        write_inline(&inline_request(&path, 3, "/run", "x")).unwrap();

        let text = read(&path);
        assert!(text.starts_with("a\nb\n"));
        assert!(text.ends_with("\nc\nd"));
    }

    #[test]
    fn test_write_inline_skips_fenced_copy() {
        let dir = TempDir::new().unwrap();
        let path = write_doc(&dir, "intro\nprose replaced the command\n```\n/summarize\n```\n");

        let outcome = write_inline(&inline_request(&path, 2, "/summarize", "R")).unwrap();

        assert_eq!(outcome.line, 2);
        let text = read(&path);
        assert!(text.contains("```\n/summarize\n```"));
        assert!(text.ends_with("<!-- spark-result-end -->\n\n```\n/summarize\n```\n"));
    }

    #[test]
    fn test_write_inline_prefers_live_command_over_nearer_fenced_copy() {
        let dir = TempDir::new().unwrap();
        let path = write_doc(&dir, "moved\n```\n/summarize\n```\na\nb\n/summarize\n");

        let outcome = write_inline(&inline_request(&path, 1, "/summarize", "R")).unwrap();

        assert_eq!(outcome.line, 7);
        let text = read(&path);
        assert!(text.starts_with("moved\n```\n/summarize\n```\na\nb\n✅ /summarize\n"));
    }

    // === update_status ===

    #[test]
    fn test_update_status_leaves_fenced_copy_alone() {
        let dir = TempDir::new().unwrap();
        let original = "intro\nprose replaced the command\n```\n/summarize\n```\n";
        let path = write_doc(&dir, original);

        let mut request = StatusUpdateRequest {
            file_path: path.clone(),
            command_line: 2,
            command_text: "/summarize".to_string(),
            status: CommandStatus::InProgress,
        };
        assert!(!update_status(&request));

        request.command_line = 4;
        request.command_text = String::new();
        assert!(!update_status(&request));
        assert_eq!(read(&path), original);
    }

    #[test]
    fn test_update_status_skips_chat_body_copy() {
        let dir = TempDir::new().unwrap();
        let path = write_doc(
            &dir,
            "<!-- spark-inline-chat:pending:c1 -->\n/summarize\n<!-- /spark-inline-chat -->\nx\ny\n/summarize\n",
        );

        assert!(update_status(&StatusUpdateRequest {
            file_path: path.clone(),
            command_line: 1,
            command_text: "/summarize".to_string(),
            status: CommandStatus::Failed,
        }));
        assert_eq!(
            read(&path),
            "<!-- spark-inline-chat:pending:c1 -->\n/summarize\n<!-- /spark-inline-chat -->\nx\ny\n❌ /summarize\n"
        );
    }

    #[test]
    fn test_update_status_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = write_doc(&dir, "intro\n/summarize @betty\n");
        let before = detect(&read(&path));

        for status in [
            CommandStatus::InProgress,
            CommandStatus::Failed,
            CommandStatus::Completed,
            CommandStatus::Pending,
        ] {
            assert!(update_status(&StatusUpdateRequest {
                file_path: path.clone(),
                command_line: 2,
                command_text: before[0].text.clone(),
                status,
            }));
            let after = detect(&read(&path));
            assert_eq!(after.len(), 1);
            assert_eq!(after[0].line, 2);
            assert_eq!(after[0].status, status);
            assert_eq!(after[0].text, before[0].text);
        }
        assert_eq!(read(&path), "intro\n/summarize @betty\n");
    }

    #[test]
    fn test_update_status_keeps_indentation() {
        let dir = TempDir::new().unwrap();
        let path = write_doc(&dir, "  [x] /summarize\n");
        assert!(update_status(&StatusUpdateRequest {
            file_path: path.clone(),
            command_line: 1,
            command_text: "/summarize".to_string(),
            status: CommandStatus::InProgress,
        }));
        assert_eq!(read(&path), "  ⏳ /summarize\n");
    }

    #[test]
    fn test_update_status_is_silent_on_bad_input() {
        let dir = TempDir::new().unwrap();
        let original = "/summarize\n";
        let path = write_doc(&dir, original);

        let mut request = StatusUpdateRequest {
            file_path: path.clone(),
            command_line: 5,
            command_text: "/summarize".to_string(),
            status: CommandStatus::Completed,
        };
        assert!(!update_status(&request));

        request.command_line = 1;
        request.command_text = "/other".to_string();
        assert!(!update_status(&request));
        assert_eq!(read(&path), original);

        request.file_path = dir.path().join("missing.md");
        assert!(!update_status(&request));
    }

    #[test]
    fn test_update_status_ignores_prose_lines() {
        let dir = TempDir::new().unwrap();
        let path = write_doc(&dir, "just prose\n");
        assert!(!update_status(&StatusUpdateRequest {
            file_path: path.clone(),
            command_line: 1,
            command_text: String::new(),
            status: CommandStatus::Completed,
        }));
        assert_eq!(read(&path), "just prose\n");
    }

    // === inline chats ===

    const CHAT_DOC: &str = "intro\n<!-- spark-inline-chat:pending:abc-123:betty:Tell me: about @finance\\nplease -->\n<!-- /spark-inline-chat -->\noutro\n";

    fn chat_status(path: &Path, start: usize, status: InlineChatStatus) -> ChatStatusRequest {
        ChatStatusRequest {
            file_path: path.to_path_buf(),
            chat_id: "abc-123".to_string(),
            start_line: start,
            end_line: start + 1,
            status,
        }
    }

    #[test]
    fn test_update_inline_chat_status_keeps_payload() {
        let dir = TempDir::new().unwrap();
        let path = write_doc(&dir, CHAT_DOC);

        update_inline_chat_status(&chat_status(&path, 2, InlineChatStatus::Processing)).unwrap();

        assert_eq!(
            read(&path),
            CHAT_DOC.replace(":pending:abc-123", ":processing:abc-123")
        );
        let blocks = detect_in_file(&read(&path));
        assert_eq!(blocks[0].status, InlineChatStatus::Processing);
        assert_eq!(
            blocks[0].user_message.as_deref(),
            Some("@betty Tell me: about @finance\nplease")
        );
    }

    #[test]
    fn test_update_inline_chat_status_relocates_by_id() {
        let dir = TempDir::new().unwrap();
        let path = write_doc(&dir, &format!("inserted\n{}", CHAT_DOC));

        update_inline_chat_status(&chat_status(&path, 2, InlineChatStatus::Error)).unwrap();

        assert_eq!(detect_in_file(&read(&path))[0].status, InlineChatStatus::Error);
    }

    #[test]
    fn test_update_inline_chat_status_errors() {
        let dir = TempDir::new().unwrap();
        let path = write_doc(&dir, CHAT_DOC);

        let mut request = chat_status(&path, 2, InlineChatStatus::Complete);
        request.chat_id = "nope".to_string();
        assert!(matches!(
            update_inline_chat_status(&request),
            Err(Error::ChatNotFound(_))
        ));

        let request = chat_status(&path, 40, InlineChatStatus::Complete);
        assert!(matches!(
            update_inline_chat_status(&request),
            Err(Error::InvalidLine { .. })
        ));

        let request = chat_status(&dir.path().join("gone.md"), 2, InlineChatStatus::Complete);
        assert!(matches!(
            update_inline_chat_status(&request),
            Err(Error::FileNotFound(_))
        ));
        assert_eq!(read(&path), CHAT_DOC);
    }

    #[test]
    fn test_update_inline_chat_status_skips_fenced_marker() {
        let dir = TempDir::new().unwrap();
        let fenced = "```\n<!-- spark-inline-chat:pending:abc-123 -->\n<!-- /spark-inline-chat -->\n```\n";
        let path = write_doc(&dir, &format!("{}{}", fenced, CHAT_DOC));

        update_inline_chat_status(&chat_status(&path, 2, InlineChatStatus::Processing)).unwrap();

        let text = read(&path);
        assert!(text.starts_with(fenced));
        assert!(text.contains("<!-- spark-inline-chat:processing:abc-123:betty:"));
    }

    #[test]
    fn test_update_inline_chat_status_fenced_marker_only() {
        let dir = TempDir::new().unwrap();
        let original = "```\n<!-- spark-inline-chat:pending:abc-123 -->\n<!-- /spark-inline-chat -->\n```\n";
        let path = write_doc(&dir, original);

        let err = update_inline_chat_status(&chat_status(&path, 2, InlineChatStatus::Complete))
            .unwrap_err();
        assert!(matches!(err, Error::ChatNotFound(_)));
        assert_eq!(read(&path), original);
    }

    fn chat_response(path: &Path, start: usize, end: usize, response: &str) -> ChatResponseRequest {
        ChatResponseRequest {
            file_path: path.to_path_buf(),
            chat_id: "abc-123".to_string(),
            start_line: start,
            end_line: end,
            response: response.to_string(),
        }
    }

    #[test]
    fn test_write_inline_chat_response_replaces_block() {
        let dir = TempDir::new().unwrap();
        let path = write_doc(&dir, CHAT_DOC);

        let outcome =
            write_inline_chat_response(&chat_response(&path, 2, 3, "Finance is fine.\n\n- Cash: ok"))
                .unwrap();

        assert_eq!(
            read(&path),
            "intro\nFinance is fine.\n\n- Cash: ok\noutro\n"
        );
        // original - (end - start + 1) + response lines
        assert_eq!(outcome.lines_after, 4 - 2 + 3);
        assert!(detect_in_file(&read(&path)).is_empty());
    }

    #[test]
    fn test_write_inline_chat_response_empty_response() {
        let dir = TempDir::new().unwrap();
        let path = write_doc(&dir, CHAT_DOC);

        write_inline_chat_response(&chat_response(&path, 2, 3, "")).unwrap();

        assert_eq!(read(&path), "intro\noutro\n");
    }

    #[test]
    fn test_write_inline_chat_response_invalid_bounds() {
        let dir = TempDir::new().unwrap();
        let path = write_doc(&dir, CHAT_DOC);

        for (start, end) in [(0, 2), (3, 2), (2, 9)] {
            let err = write_inline_chat_response(&chat_response(&path, start, end, "x")).unwrap_err();
            assert!(matches!(err, Error::InvalidLine { .. }));
        }
        assert_eq!(read(&path), CHAT_DOC);

        let err = write_inline_chat_response(&chat_response(&dir.path().join("gone.md"), 1, 1, "x"))
            .unwrap_err();
        assert!(matches!(err, Error::FileNotFound(_)));
    }

    #[test]
    fn test_write_inline_chat_response_relocates_block() {
        let dir = TempDir::new().unwrap();
        let path = write_doc(&dir, &format!("one\ntwo\n{}", CHAT_DOC));

        let outcome = write_inline_chat_response(&chat_response(&path, 2, 3, "answer")).unwrap();

        assert_eq!(outcome.line, 4);
        assert_eq!(read(&path), "one\ntwo\nintro\nanswer\noutro\n");
    }

    #[test]
    fn test_write_inline_chat_response_skips_fenced_marker() {
        let dir = TempDir::new().unwrap();
        let fenced = "```\n<!-- spark-inline-chat:pending:abc-123 -->\n<!-- /spark-inline-chat -->\n```\n";
        let path = write_doc(&dir, &format!("{}{}", fenced, CHAT_DOC));

        let outcome = write_inline_chat_response(&chat_response(&path, 2, 3, "answer")).unwrap();

        assert_eq!(outcome.line, 6);
        assert_eq!(read(&path), format!("{}intro\nanswer\noutro\n", fenced));
    }

    #[test]
    fn test_write_inline_chat_response_unknown_id_uses_requested_range() {
        let dir = TempDir::new().unwrap();
        let path = write_doc(&dir, "a\nb\nc\n");

        let mut request = chat_response(&path, 2, 2, "answer");
        request.chat_id = "already-answered".to_string();
        let outcome = write_inline_chat_response(&request).unwrap();

        assert_eq!(outcome.line, 2);
        assert_eq!(read(&path), "a\nanswer\nc\n");
    }
}
