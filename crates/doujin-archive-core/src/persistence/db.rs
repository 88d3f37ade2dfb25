use chrono::NaiveDateTime;
use log::{debug, info};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::{Path, PathBuf};

use super::error::{PersistenceError, PersistenceResult};
use super::models::{
    CircleCredit, CompletionState, DictionaryEntry, Draft, Namespace, OrphanSweep,
    ResolvedFields, ScanTarget, Work, WorkStatus,
};
use super::schema::SCHEMA;

/// The sqlite catalog of works, dictionaries and relations
pub struct Catalog {
    conn: Connection,
    path: Option<PathBuf>,
}

impl Catalog {
    /// Open (creating if needed) the catalog at `path` and apply the schema
    pub fn open(path: &Path) -> PersistenceResult<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|e| PersistenceError::Path(parent.to_path_buf(), e.to_string()))?;
        }

        let conn = Connection::open(path)?;
        initialize_schema(&conn)?;

        info!("Catalog opened at {}", path.display());
        Ok(Self {
            conn,
            path: Some(path.to_path_buf()),
        })
    }

    /// Throwaway catalog, mostly for tests
    pub fn open_in_memory() -> PersistenceResult<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self { conn, path: None })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Run `f` inside one transaction; any error rolls the whole unit back
    pub fn transaction<T, E>(&mut self, f: impl FnOnce(&Connection) -> Result<T, E>) -> Result<T, E>
    where
        E: From<rusqlite::Error>,
    {
        let tx = self.conn.transaction()?;
        let conn: &Connection = &tx;
        let value = f(conn)?;
        tx.commit()?;
        Ok(value)
    }
}

fn initialize_schema(conn: &Connection) -> PersistenceResult<()> {
    conn.execute_batch(SCHEMA)
        .map_err(|e| PersistenceError::Initialization(e.to_string()))
}

fn path_to_sql(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

// -- Works --

const WORK_COLUMNS: &str = "id, folder_path, original_name, image_count, status, title, \
                            type_id, source_id, circle_id, author_id";

fn work_from_row(row: &Row<'_>) -> rusqlite::Result<Work> {
    Ok(Work {
        id: row.get(0)?,
        folder_path: PathBuf::from(row.get::<_, String>(1)?),
        original_name: row.get(2)?,
        image_count: row.get(3)?,
        status: row.get(4)?,
        title: row.get(5)?,
        type_id: row.get(6)?,
        source_id: row.get(7)?,
        circle_id: row.get(8)?,
        author_id: row.get(9)?,
    })
}

fn query_works(
    conn: &Connection,
    sql: &str,
    params: impl rusqlite::Params,
) -> PersistenceResult<Vec<Work>> {
    let mut stmt = conn.prepare(sql)?;
    let works = stmt
        .query_map(params, work_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(works)
}

/// Register a newly scanned folder as a pending work
pub fn insert_work(
    conn: &Connection,
    folder_path: &Path,
    original_name: &str,
    image_count: i64,
) -> PersistenceResult<i64> {
    conn.execute(
        "INSERT INTO works (folder_path, original_name, image_count, status)
         VALUES (?1, ?2, ?3, ?4)",
        params![
            path_to_sql(folder_path),
            original_name,
            image_count,
            WorkStatus::Pending
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn work_exists(conn: &Connection, folder_path: &Path) -> PersistenceResult<bool> {
    let found = conn
        .query_row(
            "SELECT 1 FROM works WHERE folder_path = ?1 LIMIT 1",
            [path_to_sql(folder_path)],
            |_| Ok(()),
        )
        .optional()?;
    Ok(found.is_some())
}

pub fn get_work(conn: &Connection, id: i64) -> PersistenceResult<Option<Work>> {
    let work = conn
        .query_row(
            &format!("SELECT {} FROM works WHERE id = ?1", WORK_COLUMNS),
            [id],
            work_from_row,
        )
        .optional()?;
    Ok(work)
}

pub fn all_works(conn: &Connection) -> PersistenceResult<Vec<Work>> {
    query_works(
        conn,
        &format!("SELECT {} FROM works ORDER BY id", WORK_COLUMNS),
        [],
    )
}

pub fn works_by_status(conn: &Connection, status: WorkStatus) -> PersistenceResult<Vec<Work>> {
    query_works(
        conn,
        &format!(
            "SELECT {} FROM works WHERE status = ?1 ORDER BY id",
            WORK_COLUMNS
        ),
        [status],
    )
}

/// Returns false when no work has this id
pub fn set_status(conn: &Connection, id: i64, status: WorkStatus) -> PersistenceResult<bool> {
    let changed = conn.execute(
        "UPDATE works SET status = ?1 WHERE id = ?2",
        params![status, id],
    )?;
    Ok(changed > 0)
}

/// Record where a work's folder now lives
pub fn update_work_location(
    conn: &Connection,
    id: i64,
    folder_path: &Path,
    status: WorkStatus,
) -> PersistenceResult<()> {
    let changed = conn.execute(
        "UPDATE works SET folder_path = ?1, status = ?2 WHERE id = ?3",
        params![path_to_sql(folder_path), status, id],
    )?;
    if changed == 0 {
        return Err(PersistenceError::Database(
            rusqlite::Error::QueryReturnedNoRows,
        ));
    }
    Ok(())
}

pub fn apply_resolved_fields(
    conn: &Connection,
    id: i64,
    fields: &ResolvedFields,
) -> PersistenceResult<()> {
    conn.execute(
        "UPDATE works
         SET type_id = ?1, source_id = ?2, circle_id = ?3, author_id = ?4, title = ?5
         WHERE id = ?6",
        params![
            fields.type_id,
            fields.source_id,
            fields.circle_id,
            fields.author_id,
            fields.title,
            id
        ],
    )?;
    Ok(())
}

pub fn delete_work(conn: &Connection, id: i64) -> PersistenceResult<bool> {
    let changed = conn.execute("DELETE FROM works WHERE id = ?1", [id])?;
    Ok(changed > 0)
}

// -- Drafts --

fn draft_from_row(row: &Row<'_>) -> rusqlite::Result<Draft> {
    Ok(Draft {
        work_id: row.get(0)?,
        circle: row.get(1)?,
        author: row.get(2)?,
        source: row.get(3)?,
        work_type: row.get(4)?,
        title: row.get(5)?,
    })
}

/// Insert or replace the draft owned by `draft.work_id`
pub fn upsert_draft(conn: &Connection, draft: &Draft) -> PersistenceResult<()> {
    conn.execute(
        "INSERT INTO works_draft (work_id, circle_raw, author_raw, source_raw, type_raw, title_raw)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)
         ON CONFLICT(work_id) DO UPDATE SET
             circle_raw = excluded.circle_raw,
             author_raw = excluded.author_raw,
             source_raw = excluded.source_raw,
             type_raw = excluded.type_raw,
             title_raw = excluded.title_raw",
        params![
            draft.work_id,
            draft.circle,
            draft.author,
            draft.source,
            draft.work_type,
            draft.title
        ],
    )?;
    Ok(())
}

pub fn get_draft(conn: &Connection, work_id: i64) -> PersistenceResult<Option<Draft>> {
    let draft = conn
        .query_row(
            "SELECT work_id, circle_raw, author_raw, source_raw, type_raw, title_raw
             FROM works_draft WHERE work_id = ?1",
            [work_id],
            draft_from_row,
        )
        .optional()?;
    Ok(draft)
}

/// Drafts whose work is still pending
pub fn pending_drafts(conn: &Connection) -> PersistenceResult<Vec<Draft>> {
    let mut stmt = conn.prepare(
        "SELECT d.work_id, d.circle_raw, d.author_raw, d.source_raw, d.type_raw, d.title_raw
         FROM works w
         JOIN works_draft d ON w.id = d.work_id
         WHERE w.status = ?1
         ORDER BY w.id",
    )?;
    let drafts = stmt
        .query_map([WorkStatus::Pending], draft_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(drafts)
}

// -- Completion state --

pub fn upsert_completion_state(
    conn: &Connection,
    state: &CompletionState,
) -> PersistenceResult<()> {
    conn.execute(
        "INSERT INTO work_completion_state (
             work_id, circle_id_done, author_id_done, source_id_done, type_id_done, title_done
         ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
         ON CONFLICT(work_id) DO UPDATE SET
             circle_id_done = excluded.circle_id_done,
             author_id_done = excluded.author_id_done,
             source_id_done = excluded.source_id_done,
             type_id_done = excluded.type_id_done,
             title_done = excluded.title_done",
        params![
            state.work_id,
            state.circle,
            state.author,
            state.source,
            state.work_type,
            state.title
        ],
    )?;
    Ok(())
}

pub fn get_completion_state(
    conn: &Connection,
    work_id: i64,
) -> PersistenceResult<Option<CompletionState>> {
    let state = conn
        .query_row(
            "SELECT work_id, circle_id_done, author_id_done, source_id_done, type_id_done, title_done
             FROM work_completion_state WHERE work_id = ?1",
            [work_id],
            |row| {
                Ok(CompletionState {
                    work_id: row.get(0)?,
                    circle: row.get(1)?,
                    author: row.get(2)?,
                    source: row.get(3)?,
                    work_type: row.get(4)?,
                    title: row.get(5)?,
                })
            },
        )
        .optional()?;
    Ok(state)
}

/// Confirmed works whose every completion flag is set
pub fn rename_candidates(conn: &Connection) -> PersistenceResult<Vec<Work>> {
    query_works(
        conn,
        "SELECT w.id, w.folder_path, w.original_name, w.image_count, w.status, w.title,
                w.type_id, w.source_id, w.circle_id, w.author_id
         FROM works w
         JOIN work_completion_state s ON w.id = s.work_id
         WHERE w.status = ?1
           AND s.circle_id_done = 1
           AND s.author_id_done = 1
           AND s.source_id_done = 1
           AND s.type_id_done = 1
           AND s.title_done = 1
         ORDER BY w.id",
        [WorkStatus::Confirmed],
    )
}

// -- Dictionaries --

/// All entries of a namespace in insertion order
pub fn dictionary_entries(
    conn: &Connection,
    namespace: Namespace,
) -> PersistenceResult<Vec<DictionaryEntry>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT id, name FROM {} ORDER BY id",
        namespace.table()
    ))?;
    let entries = stmt
        .query_map([], |row| {
            Ok(DictionaryEntry {
                id: row.get(0)?,
                name: row.get(1)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(entries)
}

pub fn insert_dictionary_entry(
    conn: &Connection,
    namespace: Namespace,
    name: &str,
) -> PersistenceResult<i64> {
    conn.execute(
        &format!("INSERT INTO {} (name) VALUES (?1)", namespace.table()),
        [name],
    )?;
    let id = conn.last_insert_rowid();
    debug!("New {} entry {} = '{}'", namespace.table(), id, name);
    Ok(id)
}

pub fn dictionary_name(
    conn: &Connection,
    namespace: Namespace,
    id: i64,
) -> PersistenceResult<Option<String>> {
    let name = conn
        .query_row(
            &format!("SELECT name FROM {} WHERE id = ?1", namespace.table()),
            [id],
            |row| row.get(0),
        )
        .optional()?;
    Ok(name)
}

// -- Relations --

/// Link a circle (and optionally an author under it); false if already linked
pub fn link_circle_author(
    conn: &Connection,
    work_id: i64,
    circle_id: i64,
    author_id: Option<i64>,
) -> PersistenceResult<bool> {
    let existing = conn
        .query_row(
            "SELECT 1 FROM work_circle_authors
             WHERE work_id = ?1 AND circle_id = ?2 AND author_id IS ?3",
            params![work_id, circle_id, author_id],
            |_| Ok(()),
        )
        .optional()?;
    if existing.is_some() {
        return Ok(false);
    }

    conn.execute(
        "INSERT INTO work_circle_authors (work_id, circle_id, author_id) VALUES (?1, ?2, ?3)",
        params![work_id, circle_id, author_id],
    )?;
    Ok(true)
}

/// Link a source; false if already linked
pub fn link_source(conn: &Connection, work_id: i64, source_id: i64) -> PersistenceResult<bool> {
    let changed = conn.execute(
        "INSERT OR IGNORE INTO work_sources (work_id, source_id) VALUES (?1, ?2)",
        params![work_id, source_id],
    )?;
    Ok(changed > 0)
}

/// Circle/author pairs of a work, in link order
pub fn circle_credits(conn: &Connection, work_id: i64) -> PersistenceResult<Vec<CircleCredit>> {
    let mut stmt = conn.prepare(
        "SELECT c.name, a.name
         FROM work_circle_authors wca
         JOIN circles c ON wca.circle_id = c.id
         LEFT JOIN authors a ON wca.author_id = a.id
         WHERE wca.work_id = ?1
         ORDER BY wca.id",
    )?;
    let credits = stmt
        .query_map([work_id], |row| {
            Ok(CircleCredit {
                circle: row.get(0)?,
                author: row.get(1)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(credits)
}

/// Source names of a work, in link order
pub fn source_names(conn: &Connection, work_id: i64) -> PersistenceResult<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT s.name
         FROM work_sources ws
         JOIN sources s ON ws.source_id = s.id
         WHERE ws.work_id = ?1
         ORDER BY ws.id",
    )?;
    let names = stmt
        .query_map([work_id], |row| row.get(0))?
        .collect::<rusqlite::Result<Vec<String>>>()?;
    Ok(names)
}

/// Delete rows owned by works that no longer exist.
/// Dictionary rows are left alone even when nothing references them.
pub fn delete_orphan_relations(conn: &Connection) -> PersistenceResult<OrphanSweep> {
    let sweep = |table: &str| -> PersistenceResult<usize> {
        Ok(conn.execute(
            &format!(
                "DELETE FROM {} WHERE work_id NOT IN (SELECT id FROM works)",
                table
            ),
            [],
        )?)
    };

    Ok(OrphanSweep {
        circle_authors: sweep("work_circle_authors")?,
        sources: sweep("work_sources")?,
        completion_states: sweep("work_completion_state")?,
        drafts: sweep("works_draft")?,
    })
}

// -- Scan targets --

/// Register a base directory as an active scan target; false if the path
/// is already registered
pub fn add_scan_target(conn: &Connection, path: &Path, note: Option<&str>) -> PersistenceResult<bool> {
    let changed = conn.execute(
        "INSERT OR IGNORE INTO scan_targets (path, active, note) VALUES (?1, 1, ?2)",
        params![path_to_sql(path), note],
    )?;
    Ok(changed > 0)
}

/// Switch a target on or off; false if no target has that id
pub fn set_scan_target_active(conn: &Connection, id: i64, active: bool) -> PersistenceResult<bool> {
    let changed = conn.execute(
        "UPDATE scan_targets SET active = ?1 WHERE id = ?2",
        params![active, id],
    )?;
    Ok(changed > 0)
}

/// All targets in registration order; only active ones when `active_only`
pub fn scan_targets(conn: &Connection, active_only: bool) -> PersistenceResult<Vec<ScanTarget>> {
    let mut stmt = conn.prepare(
        "SELECT id, path, active, note, last_scanned_at FROM scan_targets
         WHERE active = 1 OR ?1 = 0
         ORDER BY id",
    )?;
    let targets = stmt
        .query_map([active_only], |row| {
            Ok(ScanTarget {
                id: row.get(0)?,
                path: PathBuf::from(row.get::<_, String>(1)?),
                active: row.get(2)?,
                note: row.get(3)?,
                last_scanned_at: row.get(4)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(targets)
}

/// Stamp the targets whose path is in `paths` as scanned at `at`
pub fn mark_scan_targets_scanned(
    conn: &Connection,
    paths: &[PathBuf],
    at: NaiveDateTime,
) -> PersistenceResult<usize> {
    let stamp = at.format("%Y-%m-%d %H:%M:%S").to_string();
    let mut stmt = conn.prepare("UPDATE scan_targets SET last_scanned_at = ?1 WHERE path = ?2")?;
    let mut updated = 0;
    for path in paths {
        updated += stmt.execute(params![stamp, path_to_sql(path)])?;
    }
    debug!("Stamped {} scan targets", updated);
    Ok(updated)
}
