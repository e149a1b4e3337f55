//! Spark CLI - slash commands and inline chats in plain-text notes.

use clap::Parser;
use spark::cli::{Cli, Commands, ConfigCommands};
use spark::commands::{self, Output};
use spark::config::{ConfigOverrides, ResolvedConfig, SparkConfig, resolve_config, resolver};
use std::env;
use std::path::PathBuf;
use std::process;
use tracing_subscriber::EnvFilter;

/// Environment variable controlling diagnostic log verbosity.
const LOG_ENV: &str = "SPARK_LOG";

fn main() {
    init_tracing();

    let cli = Cli::parse();
    let human = cli.human_readable;

    let vault_path = resolve_vault_path(cli.vault_path, human);
    let mut overrides = ConfigOverrides::new();
    if let Some(dir) = cli.log_dir {
        overrides = overrides.with_log_dir(dir);
    }
    if let Some(file) = cli.notifications_file {
        overrides = overrides.with_notifications_file(file);
    }
    let result = run_command(cli.command, vault_path, overrides, human);

    if let Err(e) = result {
        tracing::debug!(error = ?e, "command failed");
        if human {
            eprintln!("Error: {}", e);
        } else {
            let err = serde_json::json!({
                "error": e.to_string(),
                "code": e.code(),
            });
            eprintln!("{}", err);
        }
        process::exit(1);
    }
}

/// Diagnostics go to stderr so stdout stays machine-readable.
fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Priority: --vault flag > SPARK_VAULT env var > current working directory.
fn resolve_vault_path(explicit_path: Option<PathBuf>, human: bool) -> PathBuf {
    match explicit_path {
        Some(path) => {
            if !path.is_dir() {
                let message = format!("Specified vault path does not exist: {}", path.display());
                if human {
                    eprintln!("Error: {}", message);
                } else {
                    eprintln!(
                        "{}",
                        serde_json::json!({"error": message, "code": "INVALID_INPUT"})
                    );
                }
                process::exit(1);
            }
            path
        }
        None => env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    }
}

fn run_command(
    command: Commands,
    vault_path: PathBuf,
    mut overrides: ConfigOverrides,
    human: bool,
) -> Result<(), spark::Error> {
    if matches!(
        command,
        Commands::WriteResult {
            no_blank_lines: true,
            ..
        }
    ) {
        overrides = overrides.with_add_blank_lines(false);
    }
    let config = match resolve_config(&vault_path, &overrides) {
        Ok(config) => config,
        // These commands must not fail on a broken config file.
        Err(e) if matches!(command, Commands::ReportError { .. } | Commands::Status { .. }) => {
            tracing::warn!(error = %e, "ignoring unreadable config");
            let empty = SparkConfig::new();
            resolver::resolve_layers(&vault_path, &empty, &empty, &overrides)
        }
        Err(e) => return Err(e),
    };
    tracing::debug!(vault = %config.vault_root.display(), "resolved config");

    dispatch(command, &config, human)
}

fn dispatch(command: Commands, config: &ResolvedConfig, human: bool) -> Result<(), spark::Error> {
    match command {
        Commands::Parse { file } => output(&commands::parse(config, &file)?, human),
        Commands::Pending { files } => output(&commands::pending(config, &files)?, human),
        Commands::WriteResult {
            file,
            line,
            command,
            result,
            no_blank_lines: _,
        } => {
            let text = commands::read_text_source(result.result, result.result_file)?;
            output(
                &commands::write_result(config, &file, line, &command, text)?,
                human,
            )
        }
        Commands::Status {
            file,
            line,
            command,
            status,
        } => output(
            &commands::status(config, &file, line, &command, status),
            human,
        ),
        Commands::ChatStatus {
            file,
            id,
            start,
            end,
            status,
        } => output(
            &commands::chat_status(config, &file, &id, start, end, status)?,
            human,
        ),
        Commands::ChatRespond {
            file,
            id,
            start,
            end,
            response,
        } => {
            let text = commands::read_text_source(response.response, response.response_file)?;
            output(
                &commands::chat_respond(config, &file, &id, start, end, text)?,
                human,
            )
        }
        Commands::ReportError {
            file,
            message,
            code,
            line,
            command,
            context,
        } => output(
            &commands::report_error(config, &file, message, code, line, command, context),
            human,
        ),
        Commands::Notifications { limit } => {
            output(&commands::notifications(config, limit)?, human)
        }
        Commands::Config {
            command: ConfigCommands::Show,
        } => output(&commands::config_show(config), human),
    }
    Ok(())
}

fn output<T: Output>(result: &T, human: bool) {
    if human {
        println!("{}", result.to_human());
    } else {
        println!("{}", result.to_json());
    }
}
