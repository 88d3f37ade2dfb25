//! Draft pipeline: parse pending folder names into drafts, then resolve
//! drafts into dictionary ids on the catalogued work.

use log::{error, info, warn};
use rusqlite::Connection;

use crate::error::Result;
use crate::identity::IdentityResolver;
use crate::parsing::parse_name;
use crate::persistence::{
    self, Catalog, CompletionState, Draft, Namespace, PersistenceResult, ResolvedFields,
    WorkStatus,
};

/// Outcome of an extract pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtractReport {
    pub scanned: usize,
    pub drafted: usize,
    pub skipped: usize,
}

/// Outcome of a merge pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeReport {
    pub candidates: usize,
    pub merged: usize,
    pub complete: usize,
    pub failed: usize,
}

/// Parse the original name of every pending work and upsert its draft.
/// Runs as one transaction; re-running replaces earlier drafts.
pub fn extract_drafts(catalog: &mut Catalog) -> Result<ExtractReport> {
    catalog.transaction(|conn| {
        let pending = persistence::works_by_status(conn, WorkStatus::Pending)?;
        info!("Parsing {} pending works", pending.len());

        let mut report = ExtractReport {
            scanned: pending.len(),
            ..Default::default()
        };

        for work in pending {
            match parse_name(&work.original_name) {
                Some(parsed) => {
                    persistence::upsert_draft(conn, &parsed.into_draft(work.id))?;
                    report.drafted += 1;
                }
                None => {
                    warn!(
                        "No pattern matched work {} ('{}')",
                        work.id, work.original_name
                    );
                    report.skipped += 1;
                }
            }
        }

        info!("Drafted {} works", report.drafted);
        Ok(report)
    })
}

/// Resolve every pending work's draft into dictionary ids and record which
/// fields were filled. Each work is merged in its own transaction; one
/// failure is logged and the rest of the batch carries on. Status is left
/// as it is.
pub fn merge_drafts(catalog: &mut Catalog, resolver: &mut IdentityResolver) -> Result<MergeReport> {
    let drafts = persistence::pending_drafts(catalog.conn())?;
    info!("Merging {} drafts into works", drafts.len());

    let mut report = MergeReport {
        candidates: drafts.len(),
        ..Default::default()
    };

    for draft in drafts {
        let outcome = catalog.transaction(|conn| merge_one(conn, resolver, &draft));
        match outcome {
            Ok(state) => {
                report.merged += 1;
                if state.is_complete() {
                    report.complete += 1;
                }
            }
            Err(e) => {
                // The rolled-back inserts may still sit in the index
                resolver.invalidate();
                error!("Failed to merge draft for work {}: {}", draft.work_id, e);
                report.failed += 1;
            }
        }
    }

    info!(
        "Merged {} works ({} complete, {} failed)",
        report.merged, report.complete, report.failed
    );
    Ok(report)
}

fn merge_one(
    conn: &Connection,
    resolver: &mut IdentityResolver,
    draft: &Draft,
) -> PersistenceResult<CompletionState> {
    let mut resolve = |namespace: Namespace, raw: &Option<String>| -> PersistenceResult<Option<i64>> {
        match raw.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            Some(text) => resolver.resolve(conn, namespace, text).map(Some),
            None => Ok(None),
        }
    };

    let fields = ResolvedFields {
        type_id: resolve(Namespace::Type, &draft.work_type)?,
        source_id: resolve(Namespace::Source, &draft.source)?,
        circle_id: resolve(Namespace::Circle, &draft.circle)?,
        author_id: resolve(Namespace::Author, &draft.author)?,
        title: draft.title.clone(),
    };

    persistence::apply_resolved_fields(conn, draft.work_id, &fields)?;

    // Composed names read credits from the relation tables
    if let Some(circle_id) = fields.circle_id {
        persistence::link_circle_author(conn, draft.work_id, circle_id, fields.author_id)?;
    }
    if let Some(source_id) = fields.source_id {
        persistence::link_source(conn, draft.work_id, source_id)?;
    }

    let state = CompletionState::from_resolved(draft.work_id, &fields);
    persistence::upsert_completion_state(conn, &state)?;
    Ok(state)
}
