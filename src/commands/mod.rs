//! Command implementations for the Spark CLI.
//!
//! Each command takes the resolved configuration, does its work through
//! the `parser` and `writer` modules, and returns a result type that can
//! be printed as JSON or human text.

use crate::config::{Resolved, ResolvedConfig};
use crate::models::{CommandStatus, InlineChatStatus, ParsedFile};
use crate::parser;
use crate::writer::error_report::{ErrorReportRequest, ErrorWriter, ReportedError};
use crate::writer::notifications::{self, NotificationEntry, NotificationKind};
use crate::writer::result::{
    self, ChatResponseRequest, ChatStatusRequest, InlineResultRequest, StatusUpdateRequest,
    WriteOutcome,
};
use crate::{Error, Result};
use serde::Serialize;
use std::fmt::Write as _;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Command results that can be serialized to JSON or formatted for humans.
pub trait Output {
    /// Serialize to JSON string.
    fn to_json(&self) -> String;

    /// Format for human-readable output.
    fn to_human(&self) -> String;
}

fn to_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|e| format!(r#"{{"error": "{}"}}"#, e))
}

/// Resolve a document argument against the vault root.
pub fn document_path(config: &ResolvedConfig, file: &Path) -> PathBuf {
    if file.is_absolute() {
        file.to_path_buf()
    } else {
        config.vault_root.join(file)
    }
}

/// Inline text, or the contents of a file.
pub fn read_text_source(text: Option<String>, file: Option<PathBuf>) -> Result<String> {
    match (text, file) {
        (Some(text), _) => Ok(text),
        (None, Some(path)) => fs::read_to_string(&path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => Error::FileNotFound(path),
            _ => Error::Io(e),
        }),
        (None, None) => Err(Error::InvalidInput(
            "either inline text or a text file is required".to_string(),
        )),
    }
}

// === parse ===

#[derive(Serialize)]
#[serde(transparent)]
pub struct ParseResult(pub ParsedFile);

impl Output for ParseResult {
    fn to_json(&self) -> String {
        to_json(&self.0)
    }

    fn to_human(&self) -> String {
        let parsed = &self.0;
        let mut out = format!("{}\n", parsed.path.display());

        if !parsed.frontmatter.is_empty() {
            let _ = writeln!(out, "  frontmatter: {} keys", parsed.frontmatter.len());
        }

        if parsed.commands.is_empty() {
            out.push_str("  no commands\n");
        }
        for cmd in &parsed.commands {
            let _ = writeln!(out, "  {:>4}  [{}] /{}", cmd.line, cmd.status, cmd.command);
            for mention in &cmd.mentions {
                let _ = writeln!(out, "          {} {}", mention.kind, mention.raw);
            }
        }

        if parsed.inline_chats.is_empty() {
            out.push_str("  no inline chats\n");
        }
        for chat in &parsed.inline_chats {
            let _ = writeln!(
                out,
                "  {:>4}-{}  chat {} [{}]",
                chat.start_line, chat.end_line, chat.id, chat.status
            );
            if let Some(message) = &chat.user_message {
                let _ = writeln!(out, "          {}", message.replace('\n', " "));
            }
        }

        out.trim_end().to_string()
    }
}

pub fn parse(config: &ResolvedConfig, file: &Path) -> Result<ParseResult> {
    let path = document_path(config, file);
    Ok(ParseResult(parser::parse_path(&path)?))
}

// === pending ===

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingFile {
    pub file: PathBuf,
    pub pending_commands: usize,
    pub pending_inline_chats: usize,
}

#[derive(Serialize)]
pub struct PendingResult {
    pub files: Vec<PendingFile>,
}

impl Output for PendingResult {
    fn to_json(&self) -> String {
        to_json(self)
    }

    fn to_human(&self) -> String {
        self.files
            .iter()
            .map(|f| {
                format!(
                    "{}: {} pending commands, {} pending chats",
                    f.file.display(),
                    f.pending_commands,
                    f.pending_inline_chats
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

pub fn pending(config: &ResolvedConfig, files: &[PathBuf]) -> Result<PendingResult> {
    let files = files
        .iter()
        .map(|file| {
            let parsed = parser::parse_path(&document_path(config, file))?;
            Ok(PendingFile {
                file: file.clone(),
                pending_commands: parsed.pending_commands().count(),
                pending_inline_chats: parsed.pending_inline_chats().count(),
            })
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(PendingResult { files })
}

// === write-result / chat-respond ===

#[derive(Serialize)]
pub struct WriteResult {
    pub file: PathBuf,
    #[serde(flatten)]
    pub outcome: WriteOutcome,
}

impl Output for WriteResult {
    fn to_json(&self) -> String {
        to_json(self)
    }

    fn to_human(&self) -> String {
        format!(
            "Wrote {} at line {} ({} -> {} lines)",
            self.file.display(),
            self.outcome.line,
            self.outcome.lines_before,
            self.outcome.lines_after
        )
    }
}

pub fn write_result(
    config: &ResolvedConfig,
    file: &Path,
    line: usize,
    command: &str,
    result_text: String,
) -> Result<WriteResult> {
    let path = document_path(config, file);
    let outcome = result::write_inline(&InlineResultRequest {
        file_path: path.clone(),
        command_line: line,
        command_text: command.to_string(),
        result: result_text,
        add_blank_lines: config.add_blank_lines(),
    })?;

    log_success(config, &path, format!("Completed {}", command.trim()), Some(outcome.line));
    Ok(WriteResult { file: path, outcome })
}

pub fn chat_respond(
    config: &ResolvedConfig,
    file: &Path,
    chat_id: &str,
    start: usize,
    end: usize,
    response: String,
) -> Result<WriteResult> {
    let path = document_path(config, file);
    let outcome = result::write_inline_chat_response(&ChatResponseRequest {
        file_path: path.clone(),
        chat_id: chat_id.to_string(),
        start_line: start,
        end_line: end,
        response,
    })?;

    log_success(config, &path, format!("Answered chat {}", chat_id), Some(outcome.line));
    Ok(WriteResult { file: path, outcome })
}

fn log_success(config: &ResolvedConfig, path: &Path, message: String, line: Option<usize>) {
    let file = path.strip_prefix(&config.vault_root).unwrap_or(path);
    let entry = NotificationEntry::success(message, file.display().to_string()).with_line(line);
    notifications::log_notification(&config.notifications_path(), &entry);
}

// === status ===

#[derive(Serialize)]
pub struct StatusResult {
    pub file: PathBuf,
    pub status: CommandStatus,
    pub updated: bool,
}

impl Output for StatusResult {
    fn to_json(&self) -> String {
        to_json(self)
    }

    fn to_human(&self) -> String {
        if self.updated {
            format!("Marked command {} in {}", self.status, self.file.display())
        } else {
            format!("No matching command in {}; nothing changed", self.file.display())
        }
    }
}

/// Best-effort: a missing command is reported, never an error.
pub fn status(
    config: &ResolvedConfig,
    file: &Path,
    line: usize,
    command: &str,
    status: CommandStatus,
) -> StatusResult {
    let path = document_path(config, file);
    let updated = result::update_status(&StatusUpdateRequest {
        file_path: path.clone(),
        command_line: line,
        command_text: command.to_string(),
        status,
    });
    StatusResult {
        file: path,
        status,
        updated,
    }
}

// === chat-status ===

#[derive(Serialize)]
pub struct ChatStatusResult {
    pub file: PathBuf,
    pub id: String,
    pub status: InlineChatStatus,
}

impl Output for ChatStatusResult {
    fn to_json(&self) -> String {
        to_json(self)
    }

    fn to_human(&self) -> String {
        format!(
            "Marked chat {} {} in {}",
            self.id,
            self.status,
            self.file.display()
        )
    }
}

pub fn chat_status(
    config: &ResolvedConfig,
    file: &Path,
    chat_id: &str,
    start: usize,
    end: usize,
    status: InlineChatStatus,
) -> Result<ChatStatusResult> {
    let path = document_path(config, file);
    result::update_inline_chat_status(&ChatStatusRequest {
        file_path: path.clone(),
        chat_id: chat_id.to_string(),
        start_line: start,
        end_line: end,
        status,
    })?;
    Ok(ChatStatusResult {
        file: path,
        id: chat_id.to_string(),
        status,
    })
}

// === report-error ===

#[derive(Serialize)]
pub struct ReportErrorResult {
    pub report: Option<PathBuf>,
}

impl Output for ReportErrorResult {
    fn to_json(&self) -> String {
        to_json(self)
    }

    fn to_human(&self) -> String {
        match &self.report {
            Some(path) => format!("Wrote error report {}", path.display()),
            None => "Error recorded; no report file could be written".to_string(),
        }
    }
}

/// Never fails: the worst case is a missing report file.
pub fn report_error(
    config: &ResolvedConfig,
    file: &Path,
    message: String,
    code: Option<String>,
    line: Option<usize>,
    command: Option<String>,
    context: Option<String>,
) -> ReportErrorResult {
    let error = match code {
        Some(code) => ReportedError::Structured {
            code,
            message,
            details: serde_json::Value::Null,
        },
        None => ReportedError::Message(message),
    };
    let request = ErrorReportRequest {
        error,
        file_path: document_path(config, file),
        command_line: line,
        command_text: command,
        context,
    };
    ReportErrorResult {
        report: ErrorWriter::from_config(config).write_error(&request),
    }
}

// === notifications ===

#[derive(Serialize)]
pub struct NotificationsResult {
    pub notifications: Vec<NotificationEntry>,
}

impl Output for NotificationsResult {
    fn to_json(&self) -> String {
        to_json(self)
    }

    fn to_human(&self) -> String {
        if self.notifications.is_empty() {
            return "No notifications".to_string();
        }
        self.notifications
            .iter()
            .map(|n| {
                let kind = match n.kind {
                    NotificationKind::Error => "error",
                    NotificationKind::Success => "ok",
                };
                let mut line = format!(
                    "{} [{}] {}",
                    n.timestamp.format("%Y-%m-%d %H:%M:%S"),
                    kind,
                    n.file
                );
                if let Some(l) = n.line {
                    let _ = write!(line, ":{}", l);
                }
                let _ = write!(line, " {}", n.message);
                if let Some(link) = &n.link {
                    let _ = write!(line, " ({})", link);
                }
                line
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

pub fn notifications(config: &ResolvedConfig, limit: usize) -> Result<NotificationsResult> {
    Ok(NotificationsResult {
        notifications: notifications::read_recent(&config.notifications_path(), limit)?,
    })
}

// === config show ===

#[derive(Serialize)]
pub struct ConfigValue {
    pub value: serde_json::Value,
    pub source: String,
}

impl<T: Serialize> From<&Resolved<T>> for ConfigValue {
    fn from(resolved: &Resolved<T>) -> Self {
        Self {
            value: serde_json::to_value(&resolved.value).unwrap_or(serde_json::Value::Null),
            source: resolved.source.to_string(),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct ConfigShowResult {
    pub vault: PathBuf,
    pub add_blank_lines: ConfigValue,
    pub log_dir: ConfigValue,
    pub notifications_file: ConfigValue,
}

impl Output for ConfigShowResult {
    fn to_json(&self) -> String {
        to_json(self)
    }

    fn to_human(&self) -> String {
        let mut out = format!("vault: {}\n", self.vault.display());
        for (key, entry) in [
            ("add-blank-lines", &self.add_blank_lines),
            ("log-dir", &self.log_dir),
            ("notifications-file", &self.notifications_file),
        ] {
            let _ = writeln!(out, "{} = {} ({})", key, entry.value, entry.source);
        }
        out.trim_end().to_string()
    }
}

pub fn config_show(config: &ResolvedConfig) -> ConfigShowResult {
    ConfigShowResult {
        vault: config.vault_root.clone(),
        add_blank_lines: (&config.add_blank_lines).into(),
        log_dir: (&config.log_dir).into(),
        notifications_file: (&config.notifications_file).into(),
    }
}
