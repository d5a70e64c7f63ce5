//! Error facility for snapmig
//!
//! Every failure in the bootstrap protocol is fatal and propagates to the
//! caller unchanged. `SnapErrorKind` gives each variant a stable code so test
//! harnesses and the logging macros can classify failures without matching on
//! message text.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using SnapError
pub type Result<T> = std::result::Result<T, SnapError>;

/// Canonical error kind taxonomy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapErrorKind {
    /// Snapshot migrations combined with a migrate-fresh-every-test capability
    CapabilityConflict,
    /// A database session could not be opened
    Connection,
    /// Filesystem access failed
    Io,
    /// Serializing the database to the snapshot failed
    Dump,
    /// Loading the snapshot into the database failed
    Restore,
    /// An external migrate/seed command failed
    Command,
    /// A built-in migration or seed script failed
    Migration,
    /// The configuration could not be read or parsed
    Config,
}

impl SnapErrorKind {
    /// Get the stable error code for this kind
    pub fn code(&self) -> &'static str {
        match self {
            SnapErrorKind::CapabilityConflict => "ERR_CAPABILITY_CONFLICT",
            SnapErrorKind::Connection => "ERR_CONNECTION",
            SnapErrorKind::Io => "ERR_IO",
            SnapErrorKind::Dump => "ERR_DUMP",
            SnapErrorKind::Restore => "ERR_RESTORE",
            SnapErrorKind::Command => "ERR_COMMAND",
            SnapErrorKind::Migration => "ERR_MIGRATION",
            SnapErrorKind::Config => "ERR_CONFIG",
        }
    }
}

/// Errors raised while preparing a test database
#[derive(Error, Debug)]
pub enum SnapError {
    #[error("Remove the fresh-migration capability from {fixture} and use snapshot migrations instead")]
    CapabilityConflict { fixture: String },

    #[error("Failed to open database session for {database}: {message}")]
    Connection { database: String, message: String },

    #[error("I/O failure during {op} on {}: {source}", .path.display())]
    Io {
        op: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write snapshot {}: {message}", .path.display())]
    Dump { path: PathBuf, message: String },

    #[error("Failed to restore snapshot {}: {message}", .path.display())]
    Restore { path: PathBuf, message: String },

    #[error("Command '{command}' failed: {message}")]
    Command { command: String, message: String },

    #[error("Migration {migration_id} failed: {message}")]
    Migration {
        migration_id: String,
        message: String,
    },

    #[error("Invalid configuration: {message}")]
    Config { message: String },
}

impl SnapError {
    /// Get the error kind
    pub fn kind(&self) -> SnapErrorKind {
        match self {
            SnapError::CapabilityConflict { .. } => SnapErrorKind::CapabilityConflict,
            SnapError::Connection { .. } => SnapErrorKind::Connection,
            SnapError::Io { .. } => SnapErrorKind::Io,
            SnapError::Dump { .. } => SnapErrorKind::Dump,
            SnapError::Restore { .. } => SnapErrorKind::Restore,
            SnapError::Command { .. } => SnapErrorKind::Command,
            SnapError::Migration { .. } => SnapErrorKind::Migration,
            SnapError::Config { .. } => SnapErrorKind::Config,
        }
    }

    /// Get the stable error code
    pub fn code(&self) -> &'static str {
        self.kind().code()
    }

    /// Wrap an `std::io::Error` with the operation and path it concerns
    pub fn io(op: impl Into<String>, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        SnapError::Io {
            op: op.into(),
            path: path.into(),
            source,
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        SnapError::Config {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conflict_message_names_fixture() {
        let err = SnapError::CapabilityConflict {
            fixture: "UserRepositoryTest".to_string(),
        };
        assert_eq!(err.kind(), SnapErrorKind::CapabilityConflict);
        assert!(err.to_string().contains("UserRepositoryTest"));
    }

    #[test]
    fn test_codes_are_unique() {
        let kinds = [
            SnapErrorKind::CapabilityConflict,
            SnapErrorKind::Connection,
            SnapErrorKind::Io,
            SnapErrorKind::Dump,
            SnapErrorKind::Restore,
            SnapErrorKind::Command,
            SnapErrorKind::Migration,
            SnapErrorKind::Config,
        ];
        let mut codes: Vec<_> = kinds.iter().map(|k| k.code()).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), kinds.len());
    }

    #[test]
    fn test_io_error_keeps_source() {
        use std::error::Error as _;

        let err = SnapError::io(
            "read_snapshot",
            "storage/snap.sql",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert_eq!(err.code(), "ERR_IO");
        assert!(err.to_string().contains("storage/snap.sql"));
        assert!(err.source().is_some());
    }
}
