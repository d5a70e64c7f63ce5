//! SQLite sessions for snapshot dump and restore
//!
//! `ConnectionParameters.database` is the database file path. Host, username
//! and password have no meaning for SQLite and are ignored.

use crate::atomic::atomic_write;
use crate::dump;
use crate::errors::{connection_error, dump_error, io_error, restore_error, Result, SnapError};
use rusqlite::{Connection, OpenFlags};
use snapmig_core::{ConnectionParameters, DatabaseConnector, SnapshotSession};
use std::fs;
use std::path::Path;

/// Open a SQLite database, creating the file if needed
///
/// The parent directory must already exist.
pub fn open<P: AsRef<Path>>(path: P) -> Result<Connection> {
    let path = path.as_ref();
    let conn = Connection::open_with_flags(
        path,
        OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_CREATE
            | OpenFlags::SQLITE_OPEN_URI
            | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )
    .map_err(|e| connection_error(&path.display().to_string(), e))?;

    // Fails here, not mid-dump, when the file is not a database
    conn.query_row("SELECT COUNT(*) FROM sqlite_master", [], |row| {
        row.get::<_, i64>(0)
    })
    .map_err(|e| connection_error(&path.display().to_string(), e))?;

    Ok(conn)
}

/// Open the database file named by `params.database`
pub fn open_params(params: &ConnectionParameters) -> Result<Connection> {
    let database = params
        .database
        .as_deref()
        .filter(|d| !d.is_empty())
        .ok_or_else(|| SnapError::Connection {
            database: "<unset>".to_string(),
            message: "no database configured for the default connection".to_string(),
        })?;

    tracing::debug!(database = database, "opening sqlite session");
    open(database)
}

/// Opens [`SqliteSession`]s from resolved connection parameters
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteConnector;

impl DatabaseConnector for SqliteConnector {
    type Session = SqliteSession;

    fn connect(&self, params: &ConnectionParameters) -> Result<SqliteSession> {
        Ok(SqliteSession {
            conn: open_params(params)?,
        })
    }
}

/// One open SQLite connection able to dump and restore itself
pub struct SqliteSession {
    conn: Connection,
}

impl SqliteSession {
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

impl SnapshotSession for SqliteSession {
    fn save(&mut self, path: &Path) -> Result<()> {
        let script = dump::dump_sql(&self.conn).map_err(|e| dump_error(path, e))?;
        atomic_write(path, script.as_bytes())
    }

    fn load(&mut self, path: &Path) -> Result<()> {
        let script = fs::read_to_string(path).map_err(|e| io_error("read_snapshot", path, e))?;
        dump::load_sql(&mut self.conn, &script).map_err(|e| restore_error(path, e))
    }
}
