//! Marker grammar embedded in documents.
//!
//! ```text
//! <!-- spark-inline-chat:<status>:<id> -->                      legacy opener
//! <!-- spark-inline-chat:<status>:<id>:<agent>:<message> -->    extended opener
//! <!-- /spark-inline-chat -->                                   closer
//! <!-- spark-result-start --> ... <!-- spark-result-end -->     result block
//! ```
//!
//! Reading tolerates whitespace around the comment delimiters and the
//! colon-separated fields. Writing always emits the canonical form.

use crate::models::InlineChatStatus;

/// Name shared by inline-chat opening and closing markers.
pub const INLINE_CHAT_MARKER: &str = "spark-inline-chat";

/// Canonical closing marker.
pub const INLINE_CHAT_CLOSE: &str = "<!-- /spark-inline-chat -->";

/// Result block sentinels.
pub const RESULT_START: &str = "<!-- spark-result-start -->";
pub const RESULT_END: &str = "<!-- spark-result-end -->";

/// A parsed inline-chat opening marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenMarker {
    pub status: InlineChatStatus,
    pub id: String,
    /// Agent field of the extended form
    pub agent: Option<String>,
    /// Message field of the extended form, unescaped
    pub message: Option<String>,
    /// Everything after the status field, as written (trimmed)
    pub payload: String,
}

/// Whether a line opens or closes a fenced code block.
pub fn is_fence_line(line: &str) -> bool {
    line.trim_start().starts_with("```")
}

/// Inner text of a single-line HTML comment, trimmed.
fn comment_inner(line: &str) -> Option<&str> {
    let inner = line.trim().strip_prefix("<!--")?.strip_suffix("-->")?;
    Some(inner.trim())
}

/// Parse an inline-chat opening marker. Returns `None` for anything else,
/// including markers with an unknown status or an empty id.
pub fn parse_open_marker(line: &str) -> Option<OpenMarker> {
    let inner = comment_inner(line)?;
    let fields = inner
        .strip_prefix(INLINE_CHAT_MARKER)?
        .trim_start()
        .strip_prefix(':')?;

    let (status, payload) = fields.split_once(':')?;
    let status = InlineChatStatus::parse(status.trim())?;

    let mut parts = payload.splitn(3, ':');
    let id = parts.next()?.trim();
    if id.is_empty() {
        return None;
    }
    let agent = parts
        .next()
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .map(str::to_string);
    let message = parts.next().map(|m| unescape_message(m.trim()));

    Some(OpenMarker {
        status,
        id: id.to_string(),
        agent,
        message,
        payload: payload.trim().to_string(),
    })
}

/// Whether a line is the inline-chat closing marker.
pub fn is_close_marker(line: &str) -> bool {
    comment_inner(line)
        .and_then(|inner| inner.strip_prefix('/'))
        .is_some_and(|name| name.trim() == INLINE_CHAT_MARKER)
}

/// Render an opening marker with a new status and an unchanged payload.
pub fn render_open_marker(status: InlineChatStatus, payload: &str) -> String {
    format!("<!-- {}:{}:{} -->", INLINE_CHAT_MARKER, status, payload)
}

/// Whether a line is the result-block start sentinel.
pub fn is_result_start(line: &str) -> bool {
    line.trim() == RESULT_START
}

/// Whether a line is the result-block end sentinel.
pub fn is_result_end(line: &str) -> bool {
    line.trim() == RESULT_END
}

/// Undo the escaping applied to extended-marker messages (`\n`, `\\`).
pub fn unescape_message(message: &str) -> String {
    let mut out = String::with_capacity(message.len());
    let mut chars = message.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('\\') => out.push('\\'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}
