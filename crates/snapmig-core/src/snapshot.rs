//! Snapshot Writer and Snapshot Restorer
//!
//! Both open exactly one session with freshly resolved parameters and hand
//! the snapshot path to the session's dump/restore capability. Neither
//! retries; failures propagate as-is.

use crate::connection::ConnectionParameters;
use crate::errors::Result;
use std::path::Path;

/// An open database session able to dump and restore full database state
pub trait SnapshotSession {
    /// Serialize the full database state to `path`, replacing any file there
    fn save(&mut self, path: &Path) -> Result<()>;

    /// Replace the database's schema and data with the contents of `path`
    fn load(&mut self, path: &Path) -> Result<()>;
}

/// Opens [`SnapshotSession`]s
pub trait DatabaseConnector {
    type Session: SnapshotSession;

    fn connect(&self, params: &ConnectionParameters) -> Result<Self::Session>;
}

/// Snapshot the database's current state to `path`
///
/// Migrations (and seeding) must already have run; this only captures
/// whatever state exists.
pub fn write_snapshot<C>(connector: &C, path: &Path, params: &ConnectionParameters) -> Result<()>
where
    C: DatabaseConnector + ?Sized,
{
    let mut session = connector.connect(params)?;
    session.save(path)?;
    tracing::debug!(snapshot_path = %path.display(), "snapshot written");
    Ok(())
}

/// Reset the database to the state captured in `path`
pub fn restore_snapshot<C>(connector: &C, path: &Path, params: &ConnectionParameters) -> Result<()>
where
    C: DatabaseConnector + ?Sized,
{
    let mut session = connector.connect(params)?;
    session.load(path)?;
    tracing::debug!(snapshot_path = %path.display(), "snapshot restored");
    Ok(())
}
