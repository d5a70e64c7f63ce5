//! Lifecycle Guard / Orchestrator
//!
//! Drives one bootstrap per test case:
//!
//! ```text
//! START -> GuardChecked -> Regenerate -> Written  -> DONE
//!                       \-> Restored             -> DONE
//! ```
//!
//! ## Logging Ownership
//!
//! `prepare_database` owns the `log_op_start!` / `log_op_end!` /
//! `log_op_error!` boundary. Collaborators log at debug level only.

use crate::capability::{ensure_compatible, TestFixture};
use crate::commands::MigrationCommands;
use crate::config::SnapConfig;
use crate::connection::{ChooseOne, ConnectionParameters, ConnectionResolver, UniformRandom};
use crate::errors::Result;
use crate::freshness::{self, Freshness, MigrationSource};
use crate::snapshot::{restore_snapshot, write_snapshot, DatabaseConnector};
use crate::{log_op_end, log_op_error, log_op_start};
use std::path::PathBuf;
use std::time::Instant;

/// Which branch a bootstrap took
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootstrapPath {
    /// Migrated (and maybe seeded) live, then wrote a new snapshot
    Regenerated,
    /// Reset the database from the existing snapshot
    Restored,
}

impl BootstrapPath {
    pub fn as_str(&self) -> &'static str {
        match self {
            BootstrapPath::Regenerated => "regenerated",
            BootstrapPath::Restored => "restored",
        }
    }
}

/// Snapshot-cached database bootstrap
pub struct SnapMigrations<D, M, C = UniformRandom> {
    config: SnapConfig,
    resolver: ConnectionResolver<C>,
    connector: D,
    commands: M,
}

impl<D, M> SnapMigrations<D, M>
where
    D: DatabaseConnector,
    M: MigrationCommands,
{
    pub fn new(config: SnapConfig, connector: D, commands: M) -> Self {
        Self {
            config,
            resolver: ConnectionResolver::new(),
            connector,
            commands,
        }
    }
}

impl<D, M, C> SnapMigrations<D, M, C>
where
    D: DatabaseConnector,
    M: MigrationCommands,
    C: ChooseOne,
{
    /// Replace the connection resolver (e.g. with a deterministic chooser)
    pub fn with_resolver<C2: ChooseOne>(
        self,
        resolver: ConnectionResolver<C2>,
    ) -> SnapMigrations<D, M, C2> {
        SnapMigrations {
            config: self.config,
            resolver,
            connector: self.connector,
            commands: self.commands,
        }
    }

    pub fn config(&self) -> &SnapConfig {
        &self.config
    }

    pub fn connector(&self) -> &D {
        &self.connector
    }

    pub fn commands(&self) -> &M {
        &self.commands
    }

    /// Snapshot path for this invocation
    pub fn snapshot_location(&self) -> PathBuf {
        self.config.snapshot_location()
    }

    pub fn migration_source(&self) -> MigrationSource {
        MigrationSource::from_settings(&self.config.migrations)
    }

    /// Freshness of the snapshot right now, without acting on it
    pub fn status(&self) -> Freshness {
        freshness::check(&self.snapshot_location(), &self.migration_source())
    }

    /// Effective connection parameters, resolved anew on every call
    pub fn resolve_parameters(&self) -> ConnectionParameters {
        self.resolver.resolve(&self.config.database)
    }

    /// Per-test hook: guard, framework setup, then [`Self::prepare_database`]
    ///
    /// # Errors
    ///
    /// `CapabilityConflict` before anything else runs if `fixture` also
    /// migrates fresh; otherwise whatever the framework setup or the
    /// bootstrap returns.
    pub fn set_up<F>(&mut self, fixture: &mut F, should_run_seed: bool) -> Result<BootstrapPath>
    where
        F: TestFixture + ?Sized,
    {
        ensure_compatible(fixture)?;
        fixture.framework_set_up()?;
        self.prepare_database(should_run_seed)
    }

    /// Bring the database to the "migrations applied (+ seed)" state
    ///
    /// A stale or missing snapshot triggers migrate, optional seed, and a
    /// fresh snapshot write, all against one resolved connection; the live
    /// database is then already correct and no restore runs. A fresh snapshot
    /// is restored directly.
    ///
    /// # Errors
    ///
    /// Any command, connection, I/O, dump or restore failure. Nothing is
    /// retried, and no snapshot is written if migrate or seed fails.
    pub fn prepare_database(&mut self, should_run_seed: bool) -> Result<BootstrapPath> {
        log_op_start!("prepare_database", should_run_seed = should_run_seed);
        let start = Instant::now();

        let path = self.prepare_database_impl(should_run_seed).map_err(|e| {
            log_op_error!(
                "prepare_database",
                &e,
                duration_ms = start.elapsed().as_millis() as u64
            );
            e
        })?;

        log_op_end!(
            "prepare_database",
            duration_ms = start.elapsed().as_millis() as u64,
            bootstrap_path = path.as_str()
        );
        Ok(path)
    }

    fn prepare_database_impl(&mut self, should_run_seed: bool) -> Result<BootstrapPath> {
        let location = self.snapshot_location();

        match freshness::check(&location, &self.migration_source()) {
            Freshness::Fresh => {
                let params = self.resolve_parameters();
                restore_snapshot(&self.connector, &location, &params)?;
                Ok(BootstrapPath::Restored)
            }
            reason => {
                tracing::debug!(
                    snapshot_path = %location.display(),
                    migration_count = self.migration_source().discover().len(),
                    reason = ?reason,
                    "regenerating snapshot"
                );
                // One resolution for the whole cycle: migrate, seed and dump
                // must all hit the same write replica.
                let params = self.resolve_parameters();
                self.commands.migrate_fresh(&params)?;
                if should_run_seed {
                    self.commands.seed(&params)?;
                }
                write_snapshot(&self.connector, &location, &params)?;
                Ok(BootstrapPath::Regenerated)
            }
        }
    }
}
