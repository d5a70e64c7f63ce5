//! Error helpers for snapmig-store
//!
//! Wraps `rusqlite` and I/O failures in the core `SnapError` taxonomy.

use std::path::Path;

pub use snapmig_core::errors::{Result, SnapError};

/// A session could not be opened against `database`
pub fn connection_error(database: &str, err: rusqlite::Error) -> SnapError {
    SnapError::Connection {
        database: database.to_string(),
        message: err.to_string(),
    }
}

/// Serializing the database to `path` failed
pub fn dump_error(path: &Path, err: rusqlite::Error) -> SnapError {
    SnapError::Dump {
        path: path.to_path_buf(),
        message: err.to_string(),
    }
}

/// Loading `path` into the database failed
pub fn restore_error(path: &Path, err: rusqlite::Error) -> SnapError {
    SnapError::Restore {
        path: path.to_path_buf(),
        message: err.to_string(),
    }
}

/// A migration or seed script failed
pub fn migration_error(migration_id: &str, reason: &str) -> SnapError {
    SnapError::Migration {
        migration_id: migration_id.to_string(),
        message: reason.to_string(),
    }
}

pub fn io_error(op: &str, path: &Path, err: std::io::Error) -> SnapError {
    SnapError::io(op, path, err)
}
