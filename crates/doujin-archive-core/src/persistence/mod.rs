mod db;
mod error;
mod models;
mod schema;


pub use db::{
    add_scan_target, all_works, apply_resolved_fields, circle_credits, delete_orphan_relations, delete_work,
    dictionary_entries, dictionary_name, get_completion_state, get_draft, get_work,
    insert_dictionary_entry, insert_work, link_circle_author, link_source,
    mark_scan_targets_scanned, pending_drafts, rename_candidates, scan_targets,
    set_scan_target_active, set_status, source_names, update_work_location, upsert_completion_state,
    upsert_draft, work_exists, works_by_status, Catalog,
};
pub use error::{PersistenceError, PersistenceResult};
pub use models::{
    CircleCredit, CompletionState, DictionaryEntry, Draft, Namespace, OrphanSweep,
    ResolvedFields, ScanTarget, Work, WorkStatus,
};
