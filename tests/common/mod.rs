//! Common test utilities for Spark integration tests.
//!
//! Provides `TestEnv` for isolated vaults that don't read the user's
//! `~/.config/spark/` directory.

#![allow(dead_code)]

use assert_cmd::Command;
use std::fs;
use std::path::{Path, PathBuf};
pub use tempfile::TempDir;

/// A test environment with an isolated vault.
///
/// - `vault_dir`: the vault root, also the working directory
/// - `config_dir`: stands in for the user's config directory (via `XDG_CONFIG_HOME`)
pub struct TestEnv {
    pub vault_dir: TempDir,
    pub config_dir: TempDir,
}

impl TestEnv {
    pub fn new() -> Self {
        Self {
            vault_dir: TempDir::new().unwrap(),
            config_dir: TempDir::new().unwrap(),
        }
    }

    /// Get a Command for the spark binary pointed at this vault.
    pub fn spark(&self) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_spark"));
        cmd.current_dir(self.vault_dir.path());
        cmd.env("XDG_CONFIG_HOME", self.config_dir.path());
        cmd.env_remove("SPARK_VAULT");
        cmd.env_remove("SPARK_LOG");
        cmd
    }

    pub fn vault_path(&self) -> &Path {
        self.vault_dir.path()
    }

    /// Write a document into the vault, creating parent directories.
    pub fn write_note(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.vault_dir.path().join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, contents).unwrap();
        path
    }

    pub fn read_note(&self, name: &str) -> String {
        fs::read_to_string(self.vault_dir.path().join(name)).unwrap()
    }

    /// Write the vault's `.spark/config.kdl`.
    pub fn write_vault_config(&self, kdl: &str) {
        self.write_note(".spark/config.kdl", kdl);
    }
}

impl Default for TestEnv {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse a command's stdout as JSON.
pub fn stdout_json(output: &std::process::Output) -> serde_json::Value {
    serde_json::from_slice(&output.stdout).unwrap()
}
