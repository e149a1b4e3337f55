//! Configuration for Spark.
//!
//! Preferences live in `config.kdl`, located at:
//! - System: `~/.config/spark/config.kdl`
//! - Vault: `<vault>/.spark/config.kdl`
//!
//! Contains:
//! - `add-blank-lines` - Surround result blocks with blank lines (default `#true`)
//! - `log-dir` - Error report directory, relative to the vault
//! - `notifications-file` - Notification log, relative to the vault
//!
//! Precedence: CLI flag > vault config > system config > defaults.
//! Use the [`resolver`] module for resolution.

pub mod resolver;
pub mod schema;

pub use resolver::{
    ConfigOverrides, Resolved, ResolvedConfig, ValueSource, load_config_file, resolve_config,
};
pub use schema::SparkConfig;
