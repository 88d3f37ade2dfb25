use log::info;
use rusqlite::Connection;
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use crate::discovery::{absolute_path, list_work_folders};
use crate::error::Result;
use crate::persistence;

/// A catalogued work whose folder is not among the physical folders
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingWork {
    pub path: PathBuf,
    pub work_id: i64,
    pub original_name: String,
}

/// Set difference between catalog paths and folders on disk
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub recorded: usize,
    pub on_disk: usize,
    pub missing_on_disk: Vec<MissingWork>,
    pub unregistered: Vec<PathBuf>,
}

impl ReconcileReport {
    pub fn is_consistent(&self) -> bool {
        self.missing_on_disk.is_empty() && self.unregistered.is_empty()
    }
}

/// Absolute catalog path → (work id, original name)
pub fn recorded_paths(conn: &Connection) -> Result<BTreeMap<PathBuf, (i64, String)>> {
    Ok(persistence::all_works(conn)?
        .into_iter()
        .map(|w| (absolute_path(&w.folder_path), (w.id, w.original_name)))
        .collect())
}

/// Compare the catalog with the immediate subfolders of `base_dirs`.
/// Read-only.
pub fn diff(conn: &Connection, base_dirs: &[PathBuf]) -> Result<ReconcileReport> {
    let recorded = recorded_paths(conn)?;
    let physical: BTreeSet<PathBuf> = list_work_folders(base_dirs).into_iter().collect();

    let missing_on_disk: Vec<MissingWork> = recorded
        .iter()
        .filter(|(path, _)| !physical.contains(*path))
        .map(|(path, (work_id, original_name))| MissingWork {
            path: path.clone(),
            work_id: *work_id,
            original_name: original_name.clone(),
        })
        .collect();

    let unregistered: Vec<PathBuf> = physical
        .iter()
        .filter(|path| !recorded.contains_key(*path))
        .cloned()
        .collect();

    info!(
        "Catalog: {} / on disk: {} / missing on disk: {} / unregistered: {}",
        recorded.len(),
        physical.len(),
        missing_on_disk.len(),
        unregistered.len()
    );

    Ok(ReconcileReport {
        recorded: recorded.len(),
        on_disk: physical.len(),
        missing_on_disk,
        unregistered,
    })
}
