//! Freshness Checker
//!
//! A snapshot may be reused only when it exists, is readable, and its
//! modification time is strictly later than that of every migration source
//! file. Equal timestamps count as stale, and any metadata failure on either
//! side forces regeneration.

use crate::config::MigrationSettings;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// The set of migration sources matched by `<dir>/*.<extension>`
///
/// Discovery happens on every call; nothing is cached between checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationSource {
    dir: PathBuf,
    extension: String,
}

impl MigrationSource {
    pub fn new(dir: impl Into<PathBuf>, extension: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            extension: extension.into(),
        }
    }

    pub fn from_settings(settings: &MigrationSettings) -> Self {
        Self::new(&settings.dir, &settings.extension)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// List the current migration files, sorted by path
    ///
    /// A missing or unreadable directory yields an empty set, like a glob that
    /// matches nothing. Hidden files are not matched.
    pub fn discover(&self) -> Vec<PathBuf> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(_) => return Vec::new(),
        };

        let mut files: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| self.matches(path))
            .collect();
        files.sort();
        files
    }

    fn matches(&self, path: &Path) -> bool {
        let visible = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| !n.starts_with('.'));
        let extension_matches = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e == self.extension);
        visible && extension_matches && path.is_file()
    }
}

/// Outcome of a freshness check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Freshness {
    /// The snapshot can be restored
    Fresh,
    /// The snapshot does not exist or cannot be read
    Missing,
    /// `newer` was modified at or after the snapshot (or its mtime is unreadable)
    Stale { newer: PathBuf },
}

impl Freshness {
    pub fn is_fresh(&self) -> bool {
        matches!(self, Freshness::Fresh)
    }
}

/// Decide whether the snapshot at `snapshot` is usable
///
/// Stops at the first migration file that is not strictly older than the
/// snapshot.
pub fn check(snapshot: &Path, source: &MigrationSource) -> Freshness {
    let snapshot_mtime = match readable_mtime(snapshot) {
        Some(mtime) => mtime,
        None => return Freshness::Missing,
    };

    for migration in source.discover() {
        let is_older = fs::metadata(&migration)
            .and_then(|m| m.modified())
            .map(|mtime| mtime < snapshot_mtime)
            .unwrap_or(false);
        if !is_older {
            return Freshness::Stale { newer: migration };
        }
    }

    Freshness::Fresh
}

/// `true` iff [`check`] reports [`Freshness::Fresh`]
pub fn is_fresh(snapshot: &Path, source: &MigrationSource) -> bool {
    check(snapshot, source).is_fresh()
}

fn readable_mtime(path: &Path) -> Option<SystemTime> {
    let file = File::open(path).ok()?;
    let metadata = file.metadata().ok()?;
    if !metadata.is_file() {
        return None;
    }
    metadata.modified().ok()
}
