use log::{info, warn};
use std::path::{Path, PathBuf};

use crate::discovery::{count_images, list_work_folders};
use crate::error::Result;
use crate::persistence::{self, Catalog, OrphanSweep};
use crate::progress::batch_progress;
use crate::safety::{CleanupMode, SafetyManager};

use super::reconciler::recorded_paths;

/// Folders a cleanup pass looked at and what it did with them
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanupReport {
    pub mode: Option<CleanupMode>,
    /// Folders matching the cleanup criterion
    pub candidates: Vec<PathBuf>,
    /// Candidates actually removed (empty in dry-run mode)
    pub deleted: Vec<PathBuf>,
    /// Candidates whose removal failed, with the error message
    pub failed: Vec<(PathBuf, String)>,
    /// Folders that did not match
    pub kept: usize,
}

/// Delete catalog rows whose folder no longer exists. Catalog only.
pub fn delete_works_with_missing_folders(
    catalog: &mut Catalog,
    safety: &SafetyManager,
) -> Result<Vec<i64>> {
    catalog.transaction(|conn| {
        let targets: Vec<i64> = persistence::all_works(conn)?
            .into_iter()
            .filter(|w| !safety.exists(&w.folder_path))
            .map(|w| w.id)
            .collect();
        info!("Works without a folder: {}", targets.len());

        for id in &targets {
            persistence::delete_work(conn, *id)?;
        }
        Ok(targets)
    })
}

/// Delete every folder under the base directories that the catalog does
/// not know about
pub fn delete_unregistered_folders(
    catalog: &Catalog,
    safety: &SafetyManager,
    base_dirs: &[PathBuf],
    mode: CleanupMode,
) -> Result<CleanupReport> {
    let registered = recorded_paths(catalog.conn())?;
    let folders = list_work_folders(base_dirs);

    Ok(sweep_folders(safety, folders, mode, "unregistered", |path| {
        !registered.contains_key(path)
    }))
}

/// Delete every folder under the base directories that holds no images
pub fn delete_empty_folders(
    safety: &SafetyManager,
    base_dirs: &[PathBuf],
    mode: CleanupMode,
) -> Result<CleanupReport> {
    let folders = list_work_folders(base_dirs);
    let bar = batch_progress(folders.len(), "Counting images...");

    let report = sweep_folders(safety, folders, mode, "zero", |path| {
        bar.inc(1);
        count_images(path) == 0
    });
    bar.finish_and_clear();
    Ok(report)
}

/// Remove relation, completion and draft rows whose work is gone
pub fn delete_orphan_relations(catalog: &mut Catalog) -> Result<OrphanSweep> {
    let sweep = catalog.transaction(|conn| persistence::delete_orphan_relations(conn))?;
    info!(
        "Orphans removed - work_circle_authors: {}, work_sources: {}, work_completion_state: {}, works_draft: {}",
        sweep.circle_authors, sweep.sources, sweep.completion_states, sweep.drafts
    );
    Ok(sweep)
}

fn sweep_folders(
    safety: &SafetyManager,
    folders: Vec<PathBuf>,
    mode: CleanupMode,
    label: &str,
    mut is_candidate: impl FnMut(&Path) -> bool,
) -> CleanupReport {
    let mut report = CleanupReport {
        mode: Some(mode),
        ..Default::default()
    };

    for folder in folders {
        if !is_candidate(&folder) {
            report.kept += 1;
            continue;
        }

        info!("Candidate ({}): {}", label, folder.display());
        match safety.remove_folder(&folder, mode) {
            Ok(true) => report.deleted.push(folder.clone()),
            Ok(false) => {}
            Err(e) => {
                warn!("Could not delete {}: {}", folder.display(), e);
                report.failed.push((folder.clone(), e.to_string()));
            }
        }
        report.candidates.push(folder);
    }

    if mode.is_dry_run() {
        info!("Dry run: {} {} candidates, nothing deleted", report.candidates.len(), label);
    } else {
        info!(
            "Deleted {} {} folders, {} failed, {} kept",
            report.deleted.len(),
            label,
            report.failed.len(),
            report.kept
        );
    }
    report
}
