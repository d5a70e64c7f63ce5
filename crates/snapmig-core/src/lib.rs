//! snapmig core - snapshot-cached test database bootstrap
//!
//! Running every migration before each test is slow. This crate caches the
//! migrated (and optionally seeded) database as a single snapshot file and
//! restores from it while the snapshot is newer than every migration source.
//!
//! - Connection resolution with read/write split collapsing
//! - Freshness checking against migration source mtimes
//! - Snapshot write/restore orchestration over pluggable collaborators
//! - A lifecycle guard rejecting fixtures that also migrate fresh

pub mod capability;
pub mod commands;
pub mod config;
pub mod connection;
pub mod errors;
pub mod freshness;
pub mod logging_facility;
pub mod orchestrator;
pub mod snapshot;

#[doc(hidden)]
pub use snapmig_core_types as core_types;

pub use capability::{Capability, CapabilitySet, TestFixture};
pub use commands::{MigrationCommands, ShellCommands};
pub use config::SnapConfig;
pub use connection::{
    ChooseOne, ConnectionParameters, ConnectionResolver, FirstCandidate, UniformRandom,
};
pub use errors::{Result, SnapError, SnapErrorKind};
pub use freshness::{Freshness, MigrationSource};
pub use orchestrator::{BootstrapPath, SnapMigrations};
pub use snapshot::{DatabaseConnector, SnapshotSession};
