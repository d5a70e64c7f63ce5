//! Configuration for the snapshot protocol
//!
//! `SnapConfig` is built once by the caller (from TOML, from defaults, or by
//! hand in tests) and handed to the orchestrator. Nothing in the protocol
//! reads ambient process state except through [`SnapConfig::apply_env`].

use crate::errors::{Result, SnapError};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Environment variable overriding the snapshot file name (not the full path)
pub const SNAPSHOT_FILE_ENV: &str = "SNAP_MIGRATION_SQL_FILE";

/// Default snapshot file name
pub const DEFAULT_SNAPSHOT_FILE: &str = "snap_migration.sql";

/// Default directory the snapshot file lives under
pub const DEFAULT_STORAGE_DIR: &str = "storage";

pub const DEFAULT_MIGRATIONS_DIR: &str = "migrations";
pub const DEFAULT_MIGRATION_EXTENSION: &str = "sql";
pub const DEFAULT_SEEDS_DIR: &str = "seeds";

/// The full configuration record of one named connection
///
/// Either a flat parameter set or a read/write split; see
/// [`crate::connection::ConnectionResolver`].
pub type RawConnectionConfig = serde_json::Map<String, serde_json::Value>;

/// Top-level configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SnapConfig {
    pub database: DatabaseConfig,
    pub snapshot: SnapshotSettings,
    pub migrations: MigrationSettings,
    pub commands: Option<CommandSettings>,
}

/// `database.default` and `database.connections.<name>`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub default: String,
    pub connections: BTreeMap<String, RawConnectionConfig>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SnapshotSettings {
    pub storage_dir: PathBuf,
    pub file_name: String,
}

impl Default for SnapshotSettings {
    fn default() -> Self {
        Self {
            storage_dir: PathBuf::from(DEFAULT_STORAGE_DIR),
            file_name: DEFAULT_SNAPSHOT_FILE.to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MigrationSettings {
    pub dir: PathBuf,
    pub extension: String,
    pub seeds_dir: PathBuf,
}

impl Default for MigrationSettings {
    fn default() -> Self {
        Self {
            dir: PathBuf::from(DEFAULT_MIGRATIONS_DIR),
            extension: DEFAULT_MIGRATION_EXTENSION.to_string(),
            seeds_dir: PathBuf::from(DEFAULT_SEEDS_DIR),
        }
    }
}

/// External migrate/seed commands, each an argv list
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CommandSettings {
    pub migrate: Vec<String>,
    pub seed: Vec<String>,
}

impl SnapConfig {
    /// Parse a TOML document
    pub fn from_toml_str(input: &str) -> Result<Self> {
        toml::from_str(input).map_err(|e| SnapError::config(e.to_string()))
    }

    /// Read and parse a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| SnapError::io("read_config", path, e))?;
        Self::from_toml_str(&content)
    }

    /// Layer process environment overrides on top of this configuration
    pub fn with_env(self) -> Self {
        self.apply_env(|key| std::env::var(key).ok())
    }

    /// Layer overrides from `lookup` on top of this configuration
    ///
    /// An empty value is treated as unset.
    pub fn apply_env<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(name) = lookup(SNAPSHOT_FILE_ENV).filter(|v| !v.is_empty()) {
            self.snapshot.file_name = name;
        }
        self
    }

    /// Where the snapshot file lives for this run
    pub fn snapshot_location(&self) -> PathBuf {
        self.snapshot.storage_dir.join(&self.snapshot.file_name)
    }
}
