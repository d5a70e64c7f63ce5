//! Lifecycle guard
//!
//! A test fixture declares the behaviours it composes as a [`CapabilitySet`].
//! Snapshot migrations and migrate-fresh-every-test are mutually exclusive:
//! the guard rejects a fixture advertising both before any database work.

use crate::errors::{Result, SnapError};
use std::collections::BTreeSet;

/// Behaviours a test fixture can compose
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Capability {
    /// Restore from a cached migration snapshot (this crate)
    SnapshotMigrations,
    /// The framework's migrate-fresh-before-every-test behaviour
    DatabaseMigrations,
    /// The micro-framework flavour of the same behaviour
    LumenDatabaseMigrations,
    /// Any other composed behaviour; never conflicts
    Other(String),
}

impl Capability {
    /// Whether this capability re-runs migrations on every test
    pub fn migrates_fresh_every_test(&self) -> bool {
        matches!(
            self,
            Capability::DatabaseMigrations | Capability::LumenDatabaseMigrations
        )
    }
}

/// The declared capabilities of one fixture
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CapabilitySet(BTreeSet<Capability>);

impl CapabilitySet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, capability: Capability) -> Self {
        self.0.insert(capability);
        self
    }

    pub fn contains(&self, capability: &Capability) -> bool {
        self.0.contains(capability)
    }

    /// Capabilities that cannot be combined with snapshot migrations
    pub fn conflicting(&self) -> Vec<&Capability> {
        self.0
            .iter()
            .filter(|c| c.migrates_fresh_every_test())
            .collect()
    }
}

impl FromIterator<Capability> for CapabilitySet {
    fn from_iter<I: IntoIterator<Item = Capability>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// The host test framework's per-test hook, as seen by the orchestrator
pub trait TestFixture {
    /// Name reported in the conflict error
    fn fixture_name(&self) -> &str;

    fn capabilities(&self) -> CapabilitySet;

    /// The framework's own setup, run after the guard and before the protocol
    fn framework_set_up(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Fail with [`SnapError::CapabilityConflict`] if `fixture` also migrates fresh
pub fn ensure_compatible<F: TestFixture + ?Sized>(fixture: &F) -> Result<()> {
    let capabilities = fixture.capabilities();
    let conflicting = capabilities.conflicting();
    if conflicting.is_empty() {
        return Ok(());
    }

    tracing::debug!(
        fixture = fixture.fixture_name(),
        conflicting = ?conflicting,
        "fixture composes a migrate-fresh capability"
    );
    Err(SnapError::CapabilityConflict {
        fixture: fixture.fixture_name().to_string(),
    })
}
