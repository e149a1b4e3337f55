//! Error reports for failed commands and chats.
//!
//! [`ErrorWriter::write_error`] renders a markdown report into the vault's
//! log directory and appends an error entry to the notification log. It
//! never fails: when the report cannot be written the notification is still
//! attempted, and the caller just gets `None` back.

use super::notifications::{self, NotificationEntry};
use crate::config::ResolvedConfig;
use chrono::{DateTime, Local};
use serde_json::Value;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// An error as handed to the writer.
#[derive(Debug, Clone, PartialEq)]
pub enum ReportedError {
    /// A Rust error and its `source()` chain, outermost first
    Native { message: String, chain: Vec<String> },
    /// A provider-style payload with a machine-readable code
    Structured {
        code: String,
        message: String,
        details: Value,
    },
    /// Just a message
    Message(String),
}

impl ReportedError {
    /// Capture an error together with its source chain.
    pub fn from_error(err: &(dyn std::error::Error + 'static)) -> Self {
        let mut chain = Vec::new();
        let mut source = err.source();
        while let Some(cause) = source {
            chain.push(cause.to_string());
            source = cause.source();
        }
        ReportedError::Native {
            message: err.to_string(),
            chain,
        }
    }

    pub fn code(&self) -> Option<&str> {
        match self {
            ReportedError::Structured { code, .. } => Some(code),
            _ => None,
        }
    }

    /// Message as written in the report: trimmed, without a leading
    /// `Error:` prefix, never empty.
    pub fn normalized_message(&self) -> String {
        let raw = match self {
            ReportedError::Native { message, .. }
            | ReportedError::Structured { message, .. }
            | ReportedError::Message(message) => message,
        };
        normalize_message(raw)
    }

    pub fn kind(&self) -> ErrorKind {
        self.code()
            .and_then(ErrorKind::from_code)
            .unwrap_or_else(|| ErrorKind::classify_message(&self.normalized_message()))
    }
}

impl From<&crate::Error> for ReportedError {
    fn from(err: &crate::Error) -> Self {
        ReportedError::Structured {
            code: err.code().to_string(),
            message: err.to_string(),
            details: Value::Null,
        }
    }
}

impl From<String> for ReportedError {
    fn from(message: String) -> Self {
        ReportedError::Message(message)
    }
}

impl From<&str> for ReportedError {
    fn from(message: &str) -> Self {
        ReportedError::Message(message.to_string())
    }
}

pub fn normalize_message(message: &str) -> String {
    let message = message.replace("\r\n", "\n");
    let mut message = message.trim();
    if let Some(rest) = message.strip_prefix("Error:") {
        message = rest.trim_start();
    }
    if message.is_empty() {
        "Unknown error".to_string()
    } else {
        message.to_string()
    }
}

/// Known failure families, each with canned remediation steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    MissingCredential,
    MalformedConfig,
    Network,
    Upstream,
    Unknown,
}

impl ErrorKind {
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_uppercase().as_str() {
            "API_KEY_NOT_SET" | "MISSING_API_KEY" | "AUTH_ERROR" => Some(ErrorKind::MissingCredential),
            "INVALID_CONFIG" | "CONFIG_ERROR" | "CONFIG_PARSE_ERROR" => Some(ErrorKind::MalformedConfig),
            "NETWORK_ERROR" | "TIMEOUT" => Some(ErrorKind::Network),
            "API_ERROR" | "PROVIDER_ERROR" | "RATE_LIMIT" | "SERVER_ERROR" => Some(ErrorKind::Upstream),
            _ => None,
        }
    }

    /// Keyword classification for errors that carry no code.
    pub fn classify_message(message: &str) -> Self {
        let lower = message.to_lowercase();

        if lower.contains("api key")
            || lower.contains("api_key")
            || lower.contains("unauthorized")
            || lower.contains("authentication failed")
            || lower.contains("credential")
        {
            return ErrorKind::MissingCredential;
        }

        if lower.contains("config") || lower.contains("yaml") || lower.contains("kdl") {
            return ErrorKind::MalformedConfig;
        }

        if lower.contains("network")
            || lower.contains("timeout")
            || lower.contains("timed out")
            || lower.contains("connection refused")
            || lower.contains("econnrefused")
            || lower.contains("etimedout")
            || lower.contains("dns")
        {
            return ErrorKind::Network;
        }

        if lower.contains("rate limit")
            || lower.contains("too many requests")
            || lower.contains("overloaded")
            || lower.contains("internal server error")
            || lower.contains("service unavailable")
            || lower.contains("api error")
        {
            return ErrorKind::Upstream;
        }

        ErrorKind::Unknown
    }

    pub fn suggestions(&self) -> &'static [&'static str] {
        match self {
            ErrorKind::MissingCredential => &[
                "Check that the provider's API key is set in the environment or vault config",
                "Verify the key has not expired or been revoked",
                "Restart the daemon after changing credentials",
            ],
            ErrorKind::MalformedConfig => &[
                "Open the vault config and check it for syntax errors",
                "Compare the failing section against a known-good configuration",
                "Remove recently added keys to isolate the problem",
            ],
            ErrorKind::Network => &[
                "Check your internet connection",
                "Verify the provider endpoint is reachable",
                "Retry the command in a few moments",
            ],
            ErrorKind::Upstream => &[
                "The provider returned an error; retry after a short wait",
                "Check the provider's status page for outages",
                "Reduce request size or frequency if rate limited",
            ],
            ErrorKind::Unknown => &[],
        }
    }
}

/// Everything needed to describe one failure.
#[derive(Debug, Clone)]
pub struct ErrorReportRequest {
    pub error: ReportedError,
    /// Document the failure belongs to
    pub file_path: PathBuf,
    pub command_line: Option<usize>,
    pub command_text: Option<String>,
    pub context: Option<String>,
}

impl ErrorReportRequest {
    pub fn new(error: impl Into<ReportedError>, file_path: impl Into<PathBuf>) -> Self {
        Self {
            error: error.into(),
            file_path: file_path.into(),
            command_line: None,
            command_text: None,
            context: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ErrorWriter {
    vault_root: PathBuf,
    log_dir: PathBuf,
    notifications_path: PathBuf,
}

impl ErrorWriter {
    pub fn new(
        vault_root: impl Into<PathBuf>,
        log_dir: impl Into<PathBuf>,
        notifications_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            vault_root: vault_root.into(),
            log_dir: log_dir.into(),
            notifications_path: notifications_path.into(),
        }
    }

    pub fn from_config(config: &ResolvedConfig) -> Self {
        Self::new(
            config.vault_root.clone(),
            config.log_dir_path(),
            config.notifications_path(),
        )
    }

    /// Write a report and a notification entry. Returns the report path,
    /// or `None` if the report could not be written.
    pub fn write_error(&self, request: &ErrorReportRequest) -> Option<PathBuf> {
        let now = Local::now();
        let report_path = self.write_report(request, now);

        let link = report_path.as_ref().map(|path| self.vault_relative(path));
        let entry = NotificationEntry::error(
            request.error.normalized_message(),
            self.vault_relative(&request.file_path),
        )
        .with_line(request.command_line)
        .with_link(link);
        notifications::log_notification(&self.notifications_path, &entry);

        report_path
    }

    fn write_report(&self, request: &ErrorReportRequest, now: DateTime<Local>) -> Option<PathBuf> {
        if let Err(e) = fs::create_dir_all(&self.log_dir) {
            warn!(dir = %self.log_dir.display(), error = %e, "cannot create error log directory");
            return None;
        }

        let id = report_id(now);
        let path = self.log_dir.join(format!("error-{}.md", id));
        let body = render_report(request, &self.vault_relative(&request.file_path), now);

        match fs::write(&path, body) {
            Ok(()) => {
                info!(report = %path.display(), "wrote error report");
                Some(path)
            }
            Err(e) => {
                warn!(report = %path.display(), error = %e, "cannot write error report");
                None
            }
        }
    }

    fn vault_relative(&self, path: &Path) -> String {
        path.strip_prefix(&self.vault_root)
            .unwrap_or(path)
            .display()
            .to_string()
    }
}

/// `YYYYMMDD-HHMMSS-<6 hex>`; the suffix keeps same-second reports apart.
pub fn report_id(now: DateTime<Local>) -> String {
    let suffix = uuid::Uuid::new_v4().simple().to_string();
    format!("{}-{}", now.format("%Y%m%d-%H%M%S"), &suffix[..6])
}

fn render_report(request: &ErrorReportRequest, file: &str, now: DateTime<Local>) -> String {
    let error = &request.error;
    let mut out = String::new();

    let _ = writeln!(out, "# Spark Error Report");
    let _ = writeln!(out);
    let _ = writeln!(out, "- **File:** {}", file);
    if let Some(line) = request.command_line {
        let _ = writeln!(out, "- **Line:** {}", line);
    }
    if let Some(command) = &request.command_text {
        let _ = writeln!(out, "- **Command:** `{}`", command.trim());
    }
    if let Some(code) = error.code() {
        let _ = writeln!(out, "- **Code:** {}", code);
    }
    let _ = writeln!(out, "- **Time:** {}", now.to_rfc3339());

    let _ = writeln!(out);
    let _ = writeln!(out, "## Error");
    let _ = writeln!(out);
    let _ = writeln!(out, "{}", error.normalized_message());

    let suggestions = error.kind().suggestions();
    if !suggestions.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "## Suggestions");
        let _ = writeln!(out);
        for suggestion in suggestions {
            let _ = writeln!(out, "- {}", suggestion);
        }
    }

    match error {
        ReportedError::Native { message, chain } => {
            let _ = writeln!(out);
            let _ = writeln!(out, "## Stack Trace");
            let _ = writeln!(out);
            let _ = writeln!(out, "```");
            let _ = writeln!(out, "{}", message.trim());
            for cause in chain {
                let _ = writeln!(out, "  caused by: {}", cause);
            }
            let _ = writeln!(out, "```");
        }
        ReportedError::Structured { details, .. } if !details.is_null() => {
            let pretty = serde_json::to_string_pretty(details).unwrap_or_else(|_| details.to_string());
            let _ = writeln!(out);
            let _ = writeln!(out, "## Details");
            let _ = writeln!(out);
            let _ = writeln!(out, "```json");
            let _ = writeln!(out, "{}", pretty);
            let _ = writeln!(out, "```");
        }
        _ => {}
    }

    if let Some(context) = request.context.as_deref().map(str::trim).filter(|c| !c.is_empty()) {
        let _ = writeln!(out);
        let _ = writeln!(out, "## Context");
        let _ = writeln!(out);
        let _ = writeln!(out, "{}", context);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::writer::notifications::{NotificationKind, read_recent};
    use serde_json::json;
    use std::io;
    use tempfile::TempDir;

    fn writer_for(vault: &Path) -> ErrorWriter {
        ErrorWriter::new(
            vault,
            vault.join(".spark/logs"),
            vault.join(".spark/notifications.jsonl"),
        )
    }

    #[test]
    fn test_normalize_message() {
        assert_eq!(normalize_message("  Error: API key not set \n"), "API key not set");
        assert_eq!(normalize_message("Error:"), "Unknown error");
        assert_eq!(normalize_message("   "), "Unknown error");
        assert_eq!(normalize_message("line one\r\nline two"), "line one\nline two");
        assert_eq!(normalize_message("Errors happen"), "Errors happen");
    }

    #[test]
    fn test_kind_from_code() {
        assert_eq!(ErrorKind::from_code("API_KEY_NOT_SET"), Some(ErrorKind::MissingCredential));
        assert_eq!(ErrorKind::from_code("config_parse_error"), Some(ErrorKind::MalformedConfig));
        assert_eq!(ErrorKind::from_code("TIMEOUT"), Some(ErrorKind::Network));
        assert_eq!(ErrorKind::from_code("RATE_LIMIT"), Some(ErrorKind::Upstream));
        assert_eq!(ErrorKind::from_code("SOMETHING_ELSE"), None);
    }

    #[test]
    fn test_kind_from_message() {
        assert_eq!(
            ErrorKind::classify_message("ANTHROPIC_API_KEY environment variable not set"),
            ErrorKind::MissingCredential
        );
        assert_eq!(
            ErrorKind::classify_message("Failed to parse config.yaml"),
            ErrorKind::MalformedConfig
        );
        assert_eq!(
            ErrorKind::classify_message("connection refused"),
            ErrorKind::Network
        );
        assert_eq!(
            ErrorKind::classify_message("Too Many Requests"),
            ErrorKind::Upstream
        );
        assert_eq!(ErrorKind::classify_message("boom"), ErrorKind::Unknown);
        assert!(ErrorKind::Unknown.suggestions().is_empty());
    }

    #[test]
    fn test_structured_code_wins_over_message() {
        let error = ReportedError::Structured {
            code: "NETWORK_ERROR".to_string(),
            message: "invalid api key".to_string(),
            details: Value::Null,
        };
        assert_eq!(error.kind(), ErrorKind::Network);
    }

    #[test]
    fn test_from_error_captures_chain() {
        let inner = io::Error::new(io::ErrorKind::PermissionDenied, "denied");
        let outer = crate::Error::Io(inner);
        let reported = ReportedError::from_error(&outer);
        match reported {
            ReportedError::Native { message, chain } => {
                assert_eq!(message, "IO error: denied");
                assert!(chain.is_empty() || chain[0] == "denied");
            }
            other => panic!("expected native error, got {:?}", other),
        }
    }

    #[test]
    fn test_crate_error_becomes_structured() {
        let err = crate::Error::Config("bad key".to_string());
        let reported = ReportedError::from(&err);
        assert_eq!(reported.code(), Some("CONFIG_ERROR"));
        assert_eq!(reported.kind(), ErrorKind::MalformedConfig);
    }

    #[test]
    fn test_report_id_format() {
        let id = report_id(Local::now());
        let parts: Vec<&str> = id.split('-').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0].len(), 8);
        assert_eq!(parts[1].len(), 6);
        assert_eq!(parts[2].len(), 6);
        assert!(parts[2].chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(id, report_id(Local::now()));
    }

    #[test]
    fn test_write_error_creates_report_and_notification() {
        let vault = TempDir::new().unwrap();
        let writer = writer_for(vault.path());
        let mut request = ErrorReportRequest::new(
            ReportedError::Structured {
                code: "API_KEY_NOT_SET".to_string(),
                message: "Error: API key not set".to_string(),
                details: json!({"provider": "anthropic"}),
            },
            vault.path().join("notes/q3.md"),
        );
        request.command_line = Some(7);
        request.command_text = Some("/summarize".to_string());
        request.context = Some("Triggered from the daemon".to_string());

        let path = writer.write_error(&request).unwrap();

        assert!(path.starts_with(vault.path().join(".spark/logs")));
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("error-") && name.ends_with(".md"));

        let report = fs::read_to_string(&path).unwrap();
        assert!(report.contains("- **File:** notes/q3.md"));
        assert!(report.contains("- **Line:** 7"));
        assert!(report.contains("## Error\n\nAPI key not set\n"));
        assert!(report.contains("## Suggestions"));
        assert!(report.contains("## Details"));
        assert!(report.contains("\"provider\": \"anthropic\""));
        assert!(report.contains("## Context\n\nTriggered from the daemon"));
        assert!(!report.contains("## Stack Trace"));

        let entries = read_recent(&vault.path().join(".spark/notifications.jsonl"), 10).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].kind, NotificationKind::Error);
        assert_eq!(entries[0].message, "API key not set");
        assert_eq!(entries[0].file, "notes/q3.md");
        assert_eq!(entries[0].line, Some(7));
        assert_eq!(
            entries[0].link.as_deref(),
            Some(format!(".spark/logs/{}", name).as_str())
        );
    }

    #[test]
    fn test_native_error_gets_stack_trace_and_no_suggestions() {
        let vault = TempDir::new().unwrap();
        let writer = writer_for(vault.path());
        let request = ErrorReportRequest {
            error: ReportedError::Native {
                message: "boom".to_string(),
                chain: vec!["inner cause".to_string()],
            },
            file_path: vault.path().join("a.md"),
            command_line: None,
            command_text: None,
            context: None,
        };

        let report = fs::read_to_string(writer.write_error(&request).unwrap()).unwrap();

        assert!(report.contains("## Stack Trace"));
        assert!(report.contains("caused by: inner cause"));
        assert!(!report.contains("## Suggestions"));
        assert!(!report.contains("- **Line:**"));
        assert!(!report.contains("## Context"));
    }

    #[test]
    fn test_write_error_survives_unwritable_log_dir() {
        let vault = TempDir::new().unwrap();
        let blocker = vault.path().join("blocked");
        fs::write(&blocker, "a file where the log dir should be").unwrap();

        let writer = ErrorWriter::new(
            vault.path(),
            blocker.join("logs"),
            vault.path().join("notifications.jsonl"),
        );
        let request = ErrorReportRequest::new("network timeout", vault.path().join("a.md"));

        assert_eq!(writer.write_error(&request), None);

        let entries = read_recent(&vault.path().join("notifications.jsonl"), 10).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].link, None);
    }

    #[test]
    fn test_write_error_survives_everything_failing() {
        let vault = TempDir::new().unwrap();
        let blocker = vault.path().join("blocked");
        fs::write(&blocker, "").unwrap();

        let writer = ErrorWriter::new(vault.path(), blocker.join("logs"), blocker.join("n.jsonl"));
        assert_eq!(
            writer.write_error(&ErrorReportRequest::new("", vault.path().join("a.md"))),
            None
        );
    }
}
