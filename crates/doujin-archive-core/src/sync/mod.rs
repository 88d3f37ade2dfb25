//! Keeping the catalog and the folders on disk in step.

mod cleaner;
mod reconciler;

pub use cleaner::{
    delete_empty_folders, delete_orphan_relations, delete_unregistered_folders,
    delete_works_with_missing_folders, CleanupReport,
};
pub use reconciler::{diff, recorded_paths, MissingWork, ReconcileReport};
