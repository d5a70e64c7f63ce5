//! Built-in SQL migrator
//!
//! Applies `<dir>/*.sql` migrations in file-name order from an empty
//! database, recording each in `schema_version` with its checksum, and runs
//! seed scripts on request.

mod checksums;
mod runner;

pub use checksums::compute_checksum;
pub use runner::{apply_migrations, SqlMigrator};
