//! Operator edits to the catalog: status changes and relation links.

use log::{info, warn};

use crate::error::{Error, Result};
use crate::identity::IdentityResolver;
use crate::persistence::{self, Catalog, Namespace, WorkStatus};

/// Set `status` on each listed work; returns the ids that were not found.
/// Unknown ids are reported, the known ones are still updated.
pub fn set_status(catalog: &mut Catalog, ids: &[i64], status: WorkStatus) -> Result<Vec<i64>> {
    catalog.transaction(|conn| {
        let mut missing = Vec::new();
        for &id in ids {
            if persistence::set_status(conn, id, status)? {
                info!("Work {} -> {}", id, status);
            } else {
                warn!("Work {} not found", id);
                missing.push(id);
            }
        }
        Ok(missing)
    })
}

/// Credit a circle (and optionally an author under it) to a work.
/// Returns false when the exact pair was already linked.
pub fn link_circle(
    catalog: &mut Catalog,
    resolver: &mut IdentityResolver,
    work_id: i64,
    circle: &str,
    author: Option<&str>,
) -> Result<bool> {
    let circle = non_empty(circle, "circle")?;
    let author = author.map(str::trim).filter(|a| !a.is_empty());

    let linked = catalog.transaction(|conn| -> Result<bool> {
        ensure_work(conn, work_id)?;
        let circle_id = resolver.resolve(conn, Namespace::Circle, circle)?;
        let author_id = author
            .map(|a| resolver.resolve(conn, Namespace::Author, a))
            .transpose()?;
        Ok(persistence::link_circle_author(conn, work_id, circle_id, author_id)?)
    });

    if linked.is_err() {
        resolver.invalidate();
    }
    linked
}

/// Attach a source to a work. Returns false when already attached.
pub fn link_source(
    catalog: &mut Catalog,
    resolver: &mut IdentityResolver,
    work_id: i64,
    source: &str,
) -> Result<bool> {
    let source = non_empty(source, "source")?;

    let linked = catalog.transaction(|conn| -> Result<bool> {
        ensure_work(conn, work_id)?;
        let source_id = resolver.resolve(conn, Namespace::Source, source)?;
        Ok(persistence::link_source(conn, work_id, source_id)?)
    });

    if linked.is_err() {
        resolver.invalidate();
    }
    linked
}

fn ensure_work(conn: &rusqlite::Connection, work_id: i64) -> Result<()> {
    match persistence::get_work(conn, work_id)? {
        Some(_) => Ok(()),
        None => Err(Error::WorkNotFound(work_id)),
    }
}

fn non_empty<'a>(value: &'a str, what: &str) -> Result<&'a str> {
    let value = value.trim();
    if value.is_empty() {
        return Err(Error::Configuration(format!("{} name is empty", what)));
    }
    Ok(value)
}
