//! Core functionality for cataloguing and renaming doujin work folders.
//!
//! This library provides the foundational components of the archive:
//! - Folder discovery, scanning and registration
//! - Folder-name parsing and identity resolution into dictionaries
//! - Canonical name composition and audited renames
//! - Reconciliation and cleanup of the catalog against the disk

// -- External Dependencies --

use chrono::Local;
use log::{info, warn};
use std::path::{Path, PathBuf};

// -- Internal Modules --
mod error;

// -- Public Re-exports --
pub use config::*;
pub use error::{Error, Result};
pub use persistence::{Catalog, WorkStatus};
pub use safety::CleanupMode;

// -- Public Modules --
pub mod audit;
pub mod classify;
pub mod config;
pub mod curation;
pub mod discovery;
pub mod drafts;
pub mod identity;
pub mod logging;
pub mod naming;
pub mod normalize;
pub mod parsing;
pub mod persistence;
pub mod progress;
pub mod rename;
pub mod safety;
pub mod scan;
pub mod sync;

use classify::ClassificationExport;
use discovery::absolute_path;
use drafts::{ExtractReport, MergeReport};
use identity::IdentityResolver;
use persistence::{OrphanSweep, ScanTarget};
use rename::{RenameBatchReport, RenameOutcome};
use safety::SafetyManager;
use scan::{LoadReport, ScanRecord};
use sync::{CleanupReport, ReconcileReport};

/// Main entry point: one catalog, one configuration, one filesystem gate
pub struct Archive {
    config: Config,
    catalog: Catalog,
    safety: SafetyManager,
    resolver: IdentityResolver,
}

impl Archive {
    /// Open the catalog named by the configuration on the local disk
    pub fn open(config: Config) -> Result<Self> {
        config.validate()?;
        let catalog = Catalog::open(&config.database_path)?;
        Ok(Self::with_parts(config, catalog, SafetyManager::new()))
    }

    /// Assemble an archive from already opened parts
    pub fn with_parts(config: Config, catalog: Catalog, safety: SafetyManager) -> Self {
        Self {
            config,
            catalog,
            safety,
            resolver: IdentityResolver::new(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Configured base directories followed by the catalog's active scan
    /// targets, without duplicates. Fails when the list is empty.
    pub fn base_dirs(&self) -> Result<Vec<PathBuf>> {
        let mut dirs = self.config.base_dirs.clone();
        for target in persistence::scan_targets(self.catalog.conn(), true)? {
            if !dirs.contains(&target.path) {
                dirs.push(target.path);
            }
        }
        if dirs.is_empty() {
            return Err(Error::Configuration(
                "no base directories configured and no active scan targets".into(),
            ));
        }
        Ok(dirs)
    }

    // -- Scan targets --

    /// Register a directory (made absolute) as an active scan target
    pub fn add_scan_target(&mut self, path: &Path, note: Option<&str>) -> Result<bool> {
        let path = absolute_path(path);
        let added = persistence::add_scan_target(self.catalog.conn(), &path, note)?;
        if added {
            info!("Scan target added: {}", path.display());
        } else {
            warn!("Scan target already registered: {}", path.display());
        }
        Ok(added)
    }

    pub fn set_scan_target_active(&mut self, id: i64, active: bool) -> Result<bool> {
        Ok(persistence::set_scan_target_active(self.catalog.conn(), id, active)?)
    }

    pub fn scan_targets(&self) -> Result<Vec<ScanTarget>> {
        Ok(persistence::scan_targets(self.catalog.conn(), false)?)
    }

    // -- Registration --

    /// Describe the folders under every base directory and stamp the scan
    /// targets that were covered
    pub fn scan(&mut self) -> Result<Vec<ScanRecord>> {
        let dirs = self.base_dirs()?;
        let records = scan::scan_base_dirs(&dirs);
        let now = Local::now().naive_local();
        self.catalog
            .transaction(|conn| persistence::mark_scan_targets_scanned(conn, &dirs, now))?;
        Ok(records)
    }

    /// Write one scan export into each base directory
    pub fn export_scan_per_base(&self, records: &[ScanRecord]) -> Result<Vec<(PathBuf, usize)>> {
        let now = Local::now().naive_local();
        scan::export_per_base_dir(&self.base_dirs()?, records, now)
    }

    /// Classify works in `【画像N枚以上】` category folders against the
    /// configured threshold and write JSON and CSV results per base directory
    pub fn classify(&self) -> Result<Vec<ClassificationExport>> {
        let now = Local::now().naive_local();
        classify::classify_and_export(&self.base_dirs()?, self.config.threshold, now)
    }

    /// Register scanned folders the catalog does not know yet
    pub fn load(&mut self, records: &[ScanRecord]) -> Result<LoadReport> {
        scan::load_records(&mut self.catalog, records)
    }

    /// Load the newest scan export found in each base directory
    pub fn load_latest_exports(&mut self) -> Result<LoadReport> {
        let mut total = LoadReport::default();

        for base in self.base_dirs()? {
            let Some(path) = scan::latest_scan_file(&base) else {
                warn!("No scan export found in {}", base.display());
                continue;
            };
            info!("Loading {}", path.display());
            let report = scan::load_records(&mut self.catalog, &scan::read_records(&path)?)?;
            total.inserted += report.inserted;
            total.skipped += report.skipped;
        }
        Ok(total)
    }

    // -- Draft pipeline --

    pub fn extract_drafts(&mut self) -> Result<ExtractReport> {
        drafts::extract_drafts(&mut self.catalog)
    }

    pub fn merge_drafts(&mut self) -> Result<MergeReport> {
        drafts::merge_drafts(&mut self.catalog, &mut self.resolver)
    }

    // -- Operator edits --

    pub fn set_status(&mut self, ids: &[i64], status: WorkStatus) -> Result<Vec<i64>> {
        curation::set_status(&mut self.catalog, ids, status)
    }

    pub fn link_circle(&mut self, work_id: i64, circle: &str, author: Option<&str>) -> Result<bool> {
        curation::link_circle(&mut self.catalog, &mut self.resolver, work_id, circle, author)
    }

    pub fn link_source(&mut self, work_id: i64, source: &str) -> Result<bool> {
        curation::link_source(&mut self.catalog, &mut self.resolver, work_id, source)
    }

    // -- Naming and renames --

    /// Canonical folder name of a work, without touching the disk
    pub fn compose_name(&self, work_id: i64) -> Result<String> {
        naming::compose_folder_name(self.catalog.conn(), work_id)
    }

    pub fn rename_one(&mut self, work_id: i64) -> Result<RenameOutcome> {
        rename::rename_one(&mut self.catalog, &self.safety, work_id)
    }

    /// Rename every confirmed work and write the audit CSV
    pub fn rename_all_confirmed(&mut self) -> Result<RenameBatchReport> {
        rename::rename_all_confirmed(&mut self.catalog, &self.safety, &self.config.audit_log_dir)
    }

    // -- Reconciliation --

    pub fn diff(&self) -> Result<ReconcileReport> {
        sync::diff(self.catalog.conn(), &self.base_dirs()?)
    }

    /// Drop catalog rows whose folder is gone; returns the removed ids
    pub fn clean_missing_works(&mut self) -> Result<Vec<i64>> {
        sync::delete_works_with_missing_folders(&mut self.catalog, &self.safety)
    }

    pub fn clean_unregistered_folders(&self, mode: CleanupMode) -> Result<CleanupReport> {
        sync::delete_unregistered_folders(
            &self.catalog,
            &self.safety,
            &self.base_dirs()?,
            mode,
        )
    }

    pub fn clean_empty_folders(&self, mode: CleanupMode) -> Result<CleanupReport> {
        sync::delete_empty_folders(&self.safety, &self.base_dirs()?, mode)
    }

    pub fn clean_orphan_relations(&mut self) -> Result<OrphanSweep> {
        sync::delete_orphan_relations(&mut self.catalog)
    }

    /// Path of the catalog file, when it lives on disk
    pub fn database_path(&self) -> Option<&Path> {
        self.catalog.path()
    }
}
