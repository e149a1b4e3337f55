//! Precedence resolution for configuration.
//!
//! ## Config Precedence (highest to lowest)
//!
//! 1. CLI flags (passed at runtime)
//! 2. Vault config.kdl (`<vault>/.spark/config.kdl`)
//! 3. System config.kdl (`~/.config/spark/config.kdl`)
//! 4. Built-in defaults

use super::schema::{DEFAULT_LOG_DIR, DEFAULT_NOTIFICATIONS_FILE, SparkConfig};
use crate::{Error, Result};
use kdl::KdlDocument;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Directory under the vault holding Spark's own files.
pub const VAULT_CONFIG_DIR: &str = ".spark";

pub const CONFIG_FILE_NAME: &str = "config.kdl";

/// Tracks where a resolved value came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueSource {
    /// Value from the vault's config.kdl
    Vault,
    /// Value from the user's config.kdl
    System,
    /// Value from CLI flag
    CliFlag,
    /// Built-in default value
    Default,
}

impl std::fmt::Display for ValueSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValueSource::Vault => write!(f, "vault"),
            ValueSource::System => write!(f, "system"),
            ValueSource::CliFlag => write!(f, "cli"),
            ValueSource::Default => write!(f, "default"),
        }
    }
}

/// A resolved value with its source.
#[derive(Debug, Clone)]
pub struct Resolved<T> {
    pub value: T,
    pub source: ValueSource,
}

impl<T> Resolved<T> {
    pub fn new(value: T, source: ValueSource) -> Self {
        Self { value, source }
    }
}

/// Fully resolved configuration with source tracking.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// Vault root all relative paths are resolved against
    pub vault_root: PathBuf,
    pub add_blank_lines: Resolved<bool>,
    pub log_dir: Resolved<String>,
    pub notifications_file: Resolved<String>,
}

impl ResolvedConfig {
    /// Defaults for a vault, before any file or flag is applied.
    pub fn defaults(vault_root: impl Into<PathBuf>) -> Self {
        Self {
            vault_root: vault_root.into(),
            add_blank_lines: Resolved::new(true, ValueSource::Default),
            log_dir: Resolved::new(DEFAULT_LOG_DIR.to_string(), ValueSource::Default),
            notifications_file: Resolved::new(
                DEFAULT_NOTIFICATIONS_FILE.to_string(),
                ValueSource::Default,
            ),
        }
    }

    pub fn add_blank_lines(&self) -> bool {
        self.add_blank_lines.value
    }

    /// Absolute error report directory.
    pub fn log_dir_path(&self) -> PathBuf {
        self.vault_root.join(&self.log_dir.value)
    }

    /// Absolute notification log path.
    pub fn notifications_path(&self) -> PathBuf {
        self.vault_root.join(&self.notifications_file.value)
    }
}

/// CLI overrides for configuration resolution.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub add_blank_lines: Option<bool>,
    pub log_dir: Option<String>,
    pub notifications_file: Option<String>,
}

impl ConfigOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_add_blank_lines(mut self, add: bool) -> Self {
        self.add_blank_lines = Some(add);
        self
    }

    pub fn with_log_dir(mut self, dir: impl Into<String>) -> Self {
        self.log_dir = Some(dir.into());
        self
    }

    pub fn with_notifications_file(mut self, file: impl Into<String>) -> Self {
        self.notifications_file = Some(file.into());
        self
    }
}

/// Path of the user's config.kdl, if a config directory exists.
pub fn system_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("spark").join(CONFIG_FILE_NAME))
}

/// Path of a vault's config.kdl.
pub fn vault_config_path(vault_root: &Path) -> PathBuf {
    vault_root.join(VAULT_CONFIG_DIR).join(CONFIG_FILE_NAME)
}

/// Load and validate one config file. A missing file reads as empty.
pub fn load_config_file(path: &Path) -> Result<SparkConfig> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(SparkConfig::new()),
        Err(e) => return Err(e.into()),
    };

    let doc: KdlDocument = text
        .parse()
        .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
    let config = SparkConfig::from_kdl(&doc);
    config
        .validate()
        .map_err(|msg| Error::Config(format!("{}: {}", path.display(), msg)))?;

    debug!(path = %path.display(), "loaded config");
    Ok(config)
}

/// Resolve configuration with the full precedence chain.
pub fn resolve_config(vault_root: &Path, overrides: &ConfigOverrides) -> Result<ResolvedConfig> {
    let system = match system_config_path() {
        Some(path) => load_config_file(&path)?,
        None => SparkConfig::new(),
    };
    let vault = load_config_file(&vault_config_path(vault_root))?;
    Ok(resolve_layers(vault_root, &system, &vault, overrides))
}

/// Apply the precedence chain to already-loaded layers.
pub fn resolve_layers(
    vault_root: &Path,
    system: &SparkConfig,
    vault: &SparkConfig,
    overrides: &ConfigOverrides,
) -> ResolvedConfig {
    let mut result = ResolvedConfig::defaults(vault_root);

    if let Some(add) = overrides.add_blank_lines {
        result.add_blank_lines = Resolved::new(add, ValueSource::CliFlag);
    } else if let Some(add) = vault.add_blank_lines {
        result.add_blank_lines = Resolved::new(add, ValueSource::Vault);
    } else if let Some(add) = system.add_blank_lines {
        result.add_blank_lines = Resolved::new(add, ValueSource::System);
    }

    if let Some(ref dir) = overrides.log_dir {
        result.log_dir = Resolved::new(dir.clone(), ValueSource::CliFlag);
    } else if let Some(ref dir) = vault.log_dir {
        result.log_dir = Resolved::new(dir.clone(), ValueSource::Vault);
    } else if let Some(ref dir) = system.log_dir {
        result.log_dir = Resolved::new(dir.clone(), ValueSource::System);
    }

    if let Some(ref file) = overrides.notifications_file {
        result.notifications_file = Resolved::new(file.clone(), ValueSource::CliFlag);
    } else if let Some(ref file) = vault.notifications_file {
        result.notifications_file = Resolved::new(file.clone(), ValueSource::Vault);
    } else if let Some(ref file) = system.notifications_file {
        result.notifications_file = Resolved::new(file.clone(), ValueSource::System);
    }

    result
}
