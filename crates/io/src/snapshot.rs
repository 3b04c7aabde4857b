// Dated regulator snapshots
//
// A snapshot directory holds one `pharmacies-<dd-mm-yyyy>.json` per export.
// The newest one is promoted to the stable "latest" file name.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use chrono::{DateTime, Local, NaiveDate};

use pharmamap_recon::run_key::{date_from_file_name, key_from_file_name};

use crate::error::IoError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub path: PathBuf,
    /// Date from the file name, else the file's modification day.
    pub date: NaiveDate,
    pub modified: SystemTime,
}

impl Snapshot {
    fn rank(&self) -> (NaiveDate, SystemTime, &Path) {
        (self.date, self.modified, self.path.as_path())
    }
}

/// Every snapshot file directly inside `dir`.
pub fn list_snapshots(dir: &Path) -> Result<Vec<Snapshot>, IoError> {
    if !dir.is_dir() {
        return Err(IoError::NotFound(dir.to_path_buf()));
    }
    let read_err = |e: std::io::Error| IoError::Read {
        path: dir.to_path_buf(),
        message: e.to_string(),
    };

    let mut out = Vec::new();
    for entry in fs::read_dir(dir).map_err(read_err)? {
        let entry = entry.map_err(read_err)?;
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        if key_from_file_name(name).is_none() {
            continue;
        }
        let meta = entry.metadata().map_err(read_err)?;
        if !meta.is_file() {
            continue;
        }
        let modified = meta.modified().unwrap_or(SystemTime::UNIX_EPOCH);
        let date = date_from_file_name(name)
            .unwrap_or_else(|| DateTime::<Local>::from(modified).date_naive());
        out.push(Snapshot {
            path: entry.path(),
            date,
            modified,
        });
    }
    Ok(out)
}

/// Most recent snapshot; ties on date go to the later mtime, then the larger name.
pub fn latest_snapshot(dir: &Path) -> Result<Snapshot, IoError> {
    list_snapshots(dir)?
        .into_iter()
        .max_by(|a, b| a.rank().cmp(&b.rank()))
        .ok_or_else(|| IoError::NoSnapshot(dir.to_path_buf()))
}

/// Copy the most recent snapshot in `dir` to `dest`. Returns the source snapshot.
pub fn copy_latest(dir: &Path, dest: &Path) -> Result<Snapshot, IoError> {
    let snapshot = latest_snapshot(dir)?;
    let write_err = |e: std::io::Error| IoError::Write {
        path: dest.to_path_buf(),
        message: e.to_string(),
    };
    if let Some(parent) = dest.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(write_err)?;
    }
    fs::copy(&snapshot.path, dest).map_err(write_err)?;
    tracing::info!(
        from = %snapshot.path.display(),
        to = %dest.display(),
        date = %snapshot.date,
        "copied latest snapshot"
    );
    Ok(snapshot)
}
