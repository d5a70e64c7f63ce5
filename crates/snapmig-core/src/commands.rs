//! External migrate and seed commands
//!
//! The protocol treats "run all migrations from empty" and "run seeders" as
//! opaque steps that either succeed or fail fatally. Both receive the
//! connection parameters the snapshot will be written from, so a randomly
//! chosen write replica is the same for migrate, seed and dump.

use crate::config::CommandSettings;
use crate::connection::ConnectionParameters;
use crate::errors::{Result, SnapError};
use std::path::PathBuf;
use std::process::Command;

/// The two external steps the protocol invokes before writing a snapshot
pub trait MigrationCommands {
    /// Drop everything and apply every migration from an empty database
    fn migrate_fresh(&mut self, params: &ConnectionParameters) -> Result<()>;

    /// Populate baseline data
    fn seed(&mut self, params: &ConnectionParameters) -> Result<()>;
}

/// Environment variables carrying the target connection to child processes
pub const ENV_HOST: &str = "SNAPMIG_DB_HOST";
pub const ENV_USERNAME: &str = "SNAPMIG_DB_USERNAME";
pub const ENV_PASSWORD: &str = "SNAPMIG_DB_PASSWORD";
pub const ENV_DATABASE: &str = "SNAPMIG_DB_DATABASE";

/// Runs the configured argv lists as child processes
///
/// The resolved connection is exported through the `SNAPMIG_DB_*` variables;
/// unset fields are removed from the child's environment.
#[derive(Debug, Clone, Default)]
pub struct ShellCommands {
    migrate: Vec<String>,
    seed: Vec<String>,
    working_dir: Option<PathBuf>,
}

impl ShellCommands {
    pub fn new(migrate: Vec<String>, seed: Vec<String>) -> Self {
        Self {
            migrate,
            seed,
            working_dir: None,
        }
    }

    pub fn from_settings(settings: &CommandSettings) -> Self {
        Self::new(settings.migrate.clone(), settings.seed.clone())
    }

    /// Run the commands from `dir` instead of the current directory
    pub fn in_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    fn run(&self, label: &str, argv: &[String], params: &ConnectionParameters) -> Result<()> {
        let (program, args) = argv.split_first().ok_or_else(|| SnapError::Command {
            command: label.to_string(),
            message: "no command configured".to_string(),
        })?;
        let rendered = argv.join(" ");

        let mut command = Command::new(program);
        command.args(args);
        for (key, value) in [
            (ENV_HOST, params.host.as_ref()),
            (ENV_USERNAME, params.username.as_ref()),
            (ENV_PASSWORD, params.password.as_ref().map(|p| p.expose())),
            (ENV_DATABASE, params.database.as_ref()),
        ] {
            match value {
                Some(value) => command.env(key, value),
                None => command.env_remove(key),
            };
        }
        if let Some(dir) = &self.working_dir {
            command.current_dir(dir);
        }

        tracing::debug!(command = %rendered, "running {}", label);
        let output = command.output().map_err(|e| SnapError::Command {
            command: rendered.clone(),
            message: e.to_string(),
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(SnapError::Command {
                command: rendered,
                message: format!("{}: {}", output.status, stderr.trim()),
            });
        }
        Ok(())
    }
}

impl MigrationCommands for ShellCommands {
    fn migrate_fresh(&mut self, params: &ConnectionParameters) -> Result<()> {
        self.run("migrate", &self.migrate, params)
    }

    fn seed(&mut self, params: &ConnectionParameters) -> Result<()> {
        self.run("seed", &self.seed, params)
    }
}
