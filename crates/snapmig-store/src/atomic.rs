//! Atomic snapshot file writes
//!
//! temp→rename, so a reader never sees a half-written snapshot from this
//! process.

use crate::errors::{io_error, Result};
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

/// Atomically replace `target_path` with `content`
///
/// Creates the parent directory if needed.
pub fn atomic_write(target_path: &Path, content: &[u8]) -> Result<()> {
    if let Some(parent) = target_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| io_error("create_snapshot_dir", parent, e))?;
    }

    let temp_path = temp_path_for(target_path);
    fs::write(&temp_path, content).map_err(|e| io_error("write_snapshot_temp", &temp_path, e))?;

    fs::rename(&temp_path, target_path).map_err(|e| {
        let _ = fs::remove_file(&temp_path);
        io_error("rename_snapshot_temp", target_path, e)
    })?;

    Ok(())
}

// snap_migration.sql -> snap_migration.sql.tmp
fn temp_path_for(target: &Path) -> PathBuf {
    let mut name = target
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| OsString::from("snapshot"));
    name.push(".tmp");
    target.with_file_name(name)
}
