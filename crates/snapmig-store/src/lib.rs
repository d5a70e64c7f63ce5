//! snapmig store - SQLite collaborators for the snapshot protocol
//!
//! Provides:
//! - `SqliteConnector` / `SqliteSession`: SQL text dump and restore
//! - Atomic snapshot file writes
//! - `SqlMigrator`: built-in migrate-from-empty and seed runner

pub mod atomic;
pub mod db;
pub mod dump;
pub mod errors;
pub mod migrations;

pub use db::{SqliteConnector, SqliteSession};
pub use errors::Result;
pub use migrations::SqlMigrator;
