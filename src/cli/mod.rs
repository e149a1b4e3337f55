//! CLI argument definitions for Spark.

use crate::models::{CommandStatus, InlineChatStatus};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Spark - slash commands and inline chats in plain-text notes.
///
/// Detects pending work in a document and writes results back into it.
#[derive(Parser, Debug)]
#[command(name = "spark")]
#[command(author, version, about = "Detect slash commands and inline chats in notes, and write results back", long_about = None)]
pub struct Cli {
    /// Output in human-readable format instead of JSON
    #[arg(short = 'H', long = "human", global = true)]
    pub human_readable: bool,

    /// Vault root. Relative file arguments and config paths resolve against it.
    /// Can also be set via SPARK_VAULT environment variable.
    #[arg(short = 'C', long = "vault", global = true, env = "SPARK_VAULT")]
    pub vault_path: Option<PathBuf>,

    /// Error report directory, relative to the vault (overrides config.kdl)
    #[arg(long = "log-dir", global = true, value_name = "DIR")]
    pub log_dir: Option<String>,

    /// Notification log, relative to the vault (overrides config.kdl)
    #[arg(long = "notifications-file", global = true, value_name = "FILE")]
    pub notifications_file: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Parse a document: frontmatter, commands, and inline chats
    Parse {
        /// Document to parse
        file: PathBuf,
    },

    /// Count pending commands and inline chats per document
    Pending {
        /// Documents to check
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Write a command's result below it and mark it completed
    WriteResult {
        file: PathBuf,

        /// 1-based line of the command
        #[arg(long)]
        line: usize,

        /// Command text as detected (decoration optional)
        #[arg(long)]
        command: String,

        #[command(flatten)]
        result: ResultSource,

        /// Do not surround the result block with blank lines
        #[arg(long)]
        no_blank_lines: bool,
    },

    /// Change a command's status decoration (best-effort)
    Status {
        file: PathBuf,

        /// 1-based line of the command
        #[arg(long)]
        line: usize,

        /// Command text as detected (decoration optional)
        #[arg(long)]
        command: String,

        /// New status: pending, in_progress, completed, failed
        #[arg(long, value_parser = parse_command_status)]
        status: CommandStatus,
    },

    /// Change an inline chat's status
    ChatStatus {
        file: PathBuf,

        /// Chat id from the opening marker
        #[arg(long)]
        id: String,

        /// 1-based line of the opening marker
        #[arg(long)]
        start: usize,

        /// 1-based line of the closing marker
        #[arg(long)]
        end: usize,

        /// New status: pending, processing, complete, error
        #[arg(long, value_parser = parse_chat_status)]
        status: InlineChatStatus,
    },

    /// Replace an inline chat block with its response
    ChatRespond {
        file: PathBuf,

        /// Chat id from the opening marker
        #[arg(long)]
        id: String,

        /// 1-based line of the opening marker
        #[arg(long)]
        start: usize,

        /// 1-based line of the closing marker
        #[arg(long)]
        end: usize,

        #[command(flatten)]
        response: ResponseSource,
    },

    /// Write an error report and notification for a failed request
    ReportError {
        file: PathBuf,

        /// Error message
        #[arg(long)]
        message: String,

        /// Machine-readable error code (e.g. API_KEY_NOT_SET)
        #[arg(long)]
        code: Option<String>,

        /// 1-based line of the failed command
        #[arg(long)]
        line: Option<usize>,

        /// Text of the failed command
        #[arg(long)]
        command: Option<String>,

        /// Free-form context to include in the report
        #[arg(long)]
        context: Option<String>,
    },

    /// Show recent notifications
    Notifications {
        /// Maximum number of entries to show
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },

    /// Configuration commands
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

/// Configuration subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show resolved configuration and where each value came from
    Show,
}

#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
pub struct ResultSource {
    /// Result text
    #[arg(long)]
    pub result: Option<String>,

    /// Read the result text from a file
    #[arg(long)]
    pub result_file: Option<PathBuf>,
}

#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
pub struct ResponseSource {
    /// Response text
    #[arg(long)]
    pub response: Option<String>,

    /// Read the response text from a file
    #[arg(long)]
    pub response_file: Option<PathBuf>,
}

fn parse_command_status(s: &str) -> Result<CommandStatus, String> {
    CommandStatus::parse(s).ok_or_else(|| {
        format!(
            "invalid status '{}' (expected pending, in_progress, completed, failed)",
            s
        )
    })
}

fn parse_chat_status(s: &str) -> Result<InlineChatStatus, String> {
    InlineChatStatus::parse(s).ok_or_else(|| {
        format!(
            "invalid status '{}' (expected pending, processing, complete, error)",
            s
        )
    })
}
