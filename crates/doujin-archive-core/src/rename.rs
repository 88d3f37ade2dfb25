//! Applying canonical names to work folders.

use chrono::Local;
use log::{error, info, warn};
use std::path::{Path, PathBuf};

use crate::audit::{write_audit_log, AuditRow, AuditStatus};
use crate::error::{Error, Result};
use crate::naming::compose_folder_name;
use crate::persistence::{self, Catalog, Work, WorkStatus};
use crate::progress::batch_progress;
use crate::safety::SafetyManager;

/// What happened to a single work
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenameOutcome {
    Renamed { from: PathBuf, to: PathBuf },
    /// Destination already occupied; nothing was touched
    Skipped { from: PathBuf, to: PathBuf },
    Failed {
        from: PathBuf,
        to: Option<PathBuf>,
        reason: String,
    },
}

impl RenameOutcome {
    pub fn status(&self) -> AuditStatus {
        match self {
            Self::Renamed { .. } => AuditStatus::Renamed,
            Self::Skipped { .. } => AuditStatus::Skipped,
            Self::Failed { .. } => AuditStatus::Error,
        }
    }

    pub fn to_audit_row(&self, work_id: i64) -> AuditRow {
        let display = |p: &Path| p.to_string_lossy().into_owned();
        let (old_path, new_path, reason) = match self {
            Self::Renamed { from, to } => (display(from), display(to), String::new()),
            Self::Skipped { from, to } => (display(from), display(to), "already exists".into()),
            Self::Failed { from, to, reason } => (
                display(from),
                to.as_deref().map(display).unwrap_or_default(),
                reason.clone(),
            ),
        };
        AuditRow {
            work_id,
            old_path,
            new_path,
            status: self.status(),
            reason,
        }
    }
}

/// Totals and audit trail of one batch
#[derive(Debug, Clone, Default)]
pub struct RenameBatchReport {
    pub rows: Vec<AuditRow>,
    pub renamed: usize,
    pub skipped: usize,
    pub failed: usize,
    pub audit_log: PathBuf,
}

/// Rename one work's folder to its canonical name.
///
/// Only an unknown work id is returned as an error; every other problem
/// is reported through the outcome.
pub fn rename_one(
    catalog: &mut Catalog,
    safety: &SafetyManager,
    work_id: i64,
) -> Result<RenameOutcome> {
    let work = persistence::get_work(catalog.conn(), work_id)?.ok_or(Error::WorkNotFound(work_id))?;
    Ok(rename_work(catalog, safety, &work))
}

/// Rename every confirmed, fully resolved work and write the audit CSV
/// into `audit_dir`. Per-work failures never stop the batch.
pub fn rename_all_confirmed(
    catalog: &mut Catalog,
    safety: &SafetyManager,
    audit_dir: &Path,
) -> Result<RenameBatchReport> {
    let works = persistence::rename_candidates(catalog.conn())?;
    info!("Rename candidates: {}", works.len());

    let mut report = RenameBatchReport::default();
    let bar = batch_progress(works.len(), "Renaming folders...");

    for work in &works {
        let outcome = rename_work(catalog, safety, work);
        match outcome.status() {
            AuditStatus::Renamed => report.renamed += 1,
            AuditStatus::Skipped => report.skipped += 1,
            AuditStatus::Error => report.failed += 1,
        }
        report.rows.push(outcome.to_audit_row(work.id));
        bar.inc(1);
    }
    bar.finish_and_clear();

    report.audit_log = write_audit_log(audit_dir, Local::now().date_naive(), &report.rows)?;
    info!("Audit log written: {}", report.audit_log.display());
    info!(
        "Renamed {}, skipped {}, failed {}",
        report.renamed, report.skipped, report.failed
    );
    Ok(report)
}

fn rename_work(catalog: &mut Catalog, safety: &SafetyManager, work: &Work) -> RenameOutcome {
    let from = work.folder_path.clone();
    let failed = |to: Option<PathBuf>, reason: String| {
        error!("Rename of work {} failed: {}", work.id, reason);
        RenameOutcome::Failed {
            from: from.clone(),
            to,
            reason,
        }
    };

    if !safety.exists(&from) {
        return failed(None, "missing folder".into());
    }

    let new_name = match compose_folder_name(catalog.conn(), work.id) {
        Ok(name) => name,
        Err(e) => return failed(None, e.to_string()),
    };
    let to = match from.parent() {
        Some(parent) => parent.join(&new_name),
        None => return failed(None, format!("no parent directory for {}", from.display())),
    };

    match safety.move_folder(&from, &to) {
        Ok(()) => {}
        Err(Error::Collision(_)) => {
            warn!("Destination already exists, skipping: {}", to.display());
            return RenameOutcome::Skipped { from, to };
        }
        Err(Error::MissingSource(_)) => return failed(None, "missing folder".into()),
        Err(e) => return failed(Some(to), e.to_string()),
    }

    let recorded = catalog.transaction(|conn| {
        persistence::update_work_location(conn, work.id, &to, WorkStatus::Renamed)
    });
    if let Err(e) = recorded {
        // Put the folder back so disk and catalog agree again
        if let Err(undo) = safety.move_folder(&to, &from) {
            error!(
                "Catalog update failed and folder could not be moved back: {} is now at {} ({})",
                from.display(),
                to.display(),
                undo
            );
        }
        return failed(Some(to), e.to_string());
    }

    info!("Renamed {} -> {}", from.display(), to.display());
    RenameOutcome::Renamed { from, to }
}
