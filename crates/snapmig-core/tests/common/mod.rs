//! Recording collaborators shared by the integration tests

#![allow(dead_code)]

use snapmig_core::config::SnapConfig;
use snapmig_core::errors::{Result, SnapError};
use snapmig_core::{
    Capability, CapabilitySet, ConnectionParameters, DatabaseConnector, MigrationCommands,
    SnapshotSession, TestFixture,
};
use std::cell::RefCell;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::{Duration, SystemTime};
use tempfile::TempDir;

/// One observable collaborator call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    FrameworkSetUp,
    Migrate,
    Seed,
    Connect(Option<String>),
    Save(PathBuf),
    Load(PathBuf),
}

pub type CallLog = Rc<RefCell<Vec<Call>>>;

pub fn count(log: &CallLog, wanted: fn(&Call) -> bool) -> usize {
    log.borrow().iter().filter(|c| wanted(c)).count()
}

pub struct RecordingCommands {
    pub log: CallLog,
    pub fail_migrate: bool,
    pub fail_seed: bool,
    /// Host each migrate/seed call was pointed at
    pub targets: Vec<Option<String>>,
}

impl MigrationCommands for RecordingCommands {
    fn migrate_fresh(&mut self, params: &ConnectionParameters) -> Result<()> {
        self.log.borrow_mut().push(Call::Migrate);
        self.targets.push(params.host.clone());
        if self.fail_migrate {
            return Err(SnapError::Command {
                command: "migrate".to_string(),
                message: "exit status: 1".to_string(),
            });
        }
        Ok(())
    }

    fn seed(&mut self, params: &ConnectionParameters) -> Result<()> {
        self.log.borrow_mut().push(Call::Seed);
        self.targets.push(params.host.clone());
        if self.fail_seed {
            return Err(SnapError::Command {
                command: "seed".to_string(),
                message: "exit status: 1".to_string(),
            });
        }
        Ok(())
    }
}

pub struct RecordingConnector {
    pub log: CallLog,
    pub refuse: bool,
}

pub struct RecordingSession {
    log: CallLog,
}

impl DatabaseConnector for RecordingConnector {
    type Session = RecordingSession;

    fn connect(&self, params: &ConnectionParameters) -> Result<RecordingSession> {
        self.log
            .borrow_mut()
            .push(Call::Connect(params.host.clone()));
        if self.refuse {
            return Err(SnapError::Connection {
                database: params.database.clone().unwrap_or_default(),
                message: "access denied".to_string(),
            });
        }
        Ok(RecordingSession {
            log: self.log.clone(),
        })
    }
}

impl SnapshotSession for RecordingSession {
    fn save(&mut self, path: &Path) -> Result<()> {
        self.log.borrow_mut().push(Call::Save(path.to_path_buf()));
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| SnapError::io("create_dir", parent, e))?;
        }
        fs::write(path, b"-- snapshot\n").map_err(|e| SnapError::io("save", path, e))
    }

    fn load(&mut self, path: &Path) -> Result<()> {
        self.log.borrow_mut().push(Call::Load(path.to_path_buf()));
        Ok(())
    }
}

pub struct Fixture {
    pub name: &'static str,
    pub capabilities: CapabilitySet,
    pub log: CallLog,
}

impl Fixture {
    pub fn snapshot_only(log: &CallLog) -> Self {
        Self {
            name: "tests::InvoiceTest",
            capabilities: CapabilitySet::new().with(Capability::SnapshotMigrations),
            log: log.clone(),
        }
    }
}

impl TestFixture for Fixture {
    fn fixture_name(&self) -> &str {
        self.name
    }

    fn capabilities(&self) -> CapabilitySet {
        self.capabilities.clone()
    }

    fn framework_set_up(&mut self) -> Result<()> {
        self.log.borrow_mut().push(Call::FrameworkSetUp);
        Ok(())
    }
}

/// A scratch project: `storage/` for the snapshot, `migrations/` for sources
pub struct Project {
    pub dir: TempDir,
}

impl Project {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("migrations")).unwrap();
        Self { dir }
    }

    pub fn config(&self) -> SnapConfig {
        let mut config = SnapConfig::from_toml_str(
            r#"
            [database]
            default = "testing"

            [database.connections.testing]
            host = "db.local"
            username = "app"
            password = "secret"
            database = "app_test"
            "#,
        )
        .unwrap();
        config.snapshot.storage_dir = self.dir.path().join("storage");
        config.migrations.dir = self.dir.path().join("migrations");
        config
    }

    pub fn snapshot_path(&self) -> PathBuf {
        self.config().snapshot_location()
    }

    /// Create a migration file with an mtime `age` in the past
    pub fn add_migration(&self, name: &str, age: Duration) -> PathBuf {
        let path = self.dir.path().join("migrations").join(name);
        fs::write(&path, b"CREATE TABLE t (id INTEGER);").unwrap();
        set_mtime(&path, SystemTime::now() - age);
        path
    }

    /// Create the snapshot file with an mtime `age` in the past
    pub fn add_snapshot(&self, age: Duration) -> PathBuf {
        let path = self.snapshot_path();
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, b"-- snapshot\n").unwrap();
        set_mtime(&path, SystemTime::now() - age);
        path
    }
}

pub fn set_mtime(path: &Path, mtime: SystemTime) {
    File::options()
        .write(true)
        .open(path)
        .unwrap()
        .set_modified(mtime)
        .unwrap();
}

pub fn new_log() -> CallLog {
    Rc::new(RefCell::new(Vec::new()))
}

pub fn commands(log: &CallLog) -> RecordingCommands {
    RecordingCommands {
        log: log.clone(),
        fail_migrate: false,
        fail_seed: false,
        targets: Vec::new(),
    }
}

pub fn connector(log: &CallLog) -> RecordingConnector {
    RecordingConnector {
        log: log.clone(),
        refuse: false,
    }
}
