//! Migration runner
//!
//! `migrate_fresh` wipes the schema and applies every migration file from
//! scratch; each file runs in its own transaction together with its
//! `schema_version` row.

use crate::db;
use crate::dump::{drop_all_objects, without_foreign_keys};
use crate::errors::{io_error, migration_error, Result};
use crate::migrations::checksums::compute_checksum;
use rusqlite::{Connection, OptionalExtension};
use snapmig_core::{ConnectionParameters, MigrationCommands, MigrationSource};
use std::fs;
use std::path::{Path, PathBuf};

/// Apply the given migration files, in order, to `conn`
///
/// Files already recorded in `schema_version` are skipped.
pub fn apply_migrations(conn: &mut Connection, files: &[PathBuf]) -> Result<usize> {
    create_schema_version_table(conn)?;

    let mut applied = 0;
    for file in files {
        let sql = fs::read_to_string(file).map_err(|e| io_error("read_migration", file, e))?;
        if apply_migration(conn, &migration_id(file), &sql)? {
            applied += 1;
        }
    }
    Ok(applied)
}

fn migration_id(file: &Path) -> String {
    file.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| file.display().to_string())
}

fn create_schema_version_table(conn: &Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_version (
            id INTEGER PRIMARY KEY,
            migration_id TEXT NOT NULL UNIQUE,
            applied_at INTEGER NOT NULL,
            checksum TEXT
        )",
        [],
    )
    .map_err(|e| migration_error("schema_version", &e.to_string()))?;
    Ok(())
}

fn apply_migration(conn: &mut Connection, migration_id: &str, sql: &str) -> Result<bool> {
    let fail = |e: rusqlite::Error| migration_error(migration_id, &e.to_string());

    let already_applied = conn
        .query_row(
            "SELECT 1 FROM schema_version WHERE migration_id = ?",
            [migration_id],
            |_| Ok(()),
        )
        .optional()
        .map_err(fail)?
        .is_some();
    if already_applied {
        return Ok(false);
    }

    let tx = conn.transaction().map_err(fail)?;
    tx.execute_batch(sql).map_err(fail)?;
    tx.execute(
        "INSERT INTO schema_version (migration_id, applied_at, checksum) VALUES (?, ?, ?)",
        rusqlite::params![
            migration_id,
            chrono::Utc::now().timestamp(),
            compute_checksum(sql)
        ],
    )
    .map_err(fail)?;
    tx.commit().map_err(fail)?;

    tracing::debug!(migration_id = migration_id, "migration applied");
    Ok(true)
}

/// [`MigrationCommands`] backed by SQL files
///
/// The target database file is whichever `params.database` each call is
/// given, so migrate, seed and dump all land on the same file.
#[derive(Debug, Clone)]
pub struct SqlMigrator {
    migrations: MigrationSource,
    seeds: MigrationSource,
}

impl SqlMigrator {
    pub fn new(migrations_dir: impl Into<PathBuf>, seeds_dir: impl Into<PathBuf>) -> Self {
        Self {
            migrations: MigrationSource::new(migrations_dir, "sql"),
            seeds: MigrationSource::new(seeds_dir, "sql"),
        }
    }

    /// Match migration and seed files by `extension` instead of `sql`
    pub fn with_extension(mut self, extension: &str) -> Self {
        self.migrations = MigrationSource::new(self.migrations.dir(), extension);
        self.seeds = MigrationSource::new(self.seeds.dir(), extension);
        self
    }
}

impl MigrationCommands for SqlMigrator {
    fn migrate_fresh(&mut self, params: &ConnectionParameters) -> Result<()> {
        let mut conn = db::open_params(params)?;
        without_foreign_keys(&mut conn, |conn| {
            let tx = conn.transaction()?;
            drop_all_objects(&tx)?;
            tx.commit()
        })
        .map_err(|e| migration_error("migrate_fresh", &e.to_string()))?;

        let files = self.migrations.discover();
        let applied = apply_migrations(&mut conn, &files)?;
        tracing::debug!(applied = applied, "migrated from empty");
        Ok(())
    }

    fn seed(&mut self, params: &ConnectionParameters) -> Result<()> {
        let mut conn = db::open_params(params)?;

        for file in self.seeds.discover() {
            let id = format!("seed:{}", migration_id(&file));
            let sql =
                fs::read_to_string(&file).map_err(|e| io_error("read_seed", &file, e))?;
            let fail = |e: rusqlite::Error| migration_error(&id, &e.to_string());
            let tx = conn.transaction().map_err(fail)?;
            tx.execute_batch(&sql).map_err(fail)?;
            tx.commit().map_err(fail)?;
            tracing::debug!(seed = %id, "seed applied");
        }
        Ok(())
    }
}
