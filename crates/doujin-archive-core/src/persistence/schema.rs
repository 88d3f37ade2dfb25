/// Catalog schema, applied idempotently on every open.
///
/// Foreign keys are not enforced; relation rows of a deleted work stay
/// until the orphan sweep removes them.
pub const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS works (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    folder_path     TEXT NOT NULL UNIQUE,
    original_name   TEXT NOT NULL,
    image_count     INTEGER NOT NULL DEFAULT 0,
    status          TEXT NOT NULL DEFAULT 'pending'
                    CHECK (status IN ('pending', 'reviewed', 'confirmed', 'renamed')),
    title           TEXT,
    type_id         INTEGER,
    source_id       INTEGER,
    circle_id       INTEGER,
    author_id       INTEGER
);

CREATE INDEX IF NOT EXISTS idx_works_status ON works(status);

CREATE TABLE IF NOT EXISTS types (
    id      INTEGER PRIMARY KEY AUTOINCREMENT,
    name    TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS sources (
    id      INTEGER PRIMARY KEY AUTOINCREMENT,
    name    TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS circles (
    id      INTEGER PRIMARY KEY AUTOINCREMENT,
    name    TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS authors (
    id      INTEGER PRIMARY KEY AUTOINCREMENT,
    name    TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS works_draft (
    work_id     INTEGER PRIMARY KEY,
    circle_raw  TEXT,
    author_raw  TEXT,
    source_raw  TEXT,
    type_raw    TEXT,
    title_raw   TEXT
);

CREATE TABLE IF NOT EXISTS work_circle_authors (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    work_id     INTEGER NOT NULL,
    circle_id   INTEGER NOT NULL,
    author_id   INTEGER
);

CREATE INDEX IF NOT EXISTS idx_wca_work_id ON work_circle_authors(work_id);

CREATE TABLE IF NOT EXISTS work_sources (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    work_id     INTEGER NOT NULL,
    source_id   INTEGER NOT NULL,
    UNIQUE (work_id, source_id)
);

CREATE INDEX IF NOT EXISTS idx_ws_work_id ON work_sources(work_id);

CREATE TABLE IF NOT EXISTS work_completion_state (
    work_id         INTEGER PRIMARY KEY,
    circle_id_done  INTEGER NOT NULL DEFAULT 0,
    author_id_done  INTEGER NOT NULL DEFAULT 0,
    source_id_done  INTEGER NOT NULL DEFAULT 0,
    type_id_done    INTEGER NOT NULL DEFAULT 0,
    title_done      INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS scan_targets (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    path            TEXT NOT NULL UNIQUE,
    active          INTEGER NOT NULL DEFAULT 1,
    note            TEXT,
    last_scanned_at TEXT
);
"#;
