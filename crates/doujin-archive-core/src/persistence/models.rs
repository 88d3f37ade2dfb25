use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};

use super::error::PersistenceError;

/// Lifecycle of a catalogued work
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkStatus {
    Pending,
    Reviewed,
    Confirmed,
    Renamed,
}

impl WorkStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Reviewed => "reviewed",
            Self::Confirmed => "confirmed",
            Self::Renamed => "renamed",
        }
    }
}

impl fmt::Display for WorkStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WorkStatus {
    type Err = PersistenceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "reviewed" => Ok(Self::Reviewed),
            "confirmed" => Ok(Self::Confirmed),
            "renamed" => Ok(Self::Renamed),
            other => Err(PersistenceError::InvalidValue(format!(
                "unknown work status '{}'",
                other
            ))),
        }
    }
}

impl ToSql for WorkStatus {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for WorkStatus {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|e| FromSqlError::Other(Box::new(e)))
    }
}

/// One of the four independent dictionaries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Namespace {
    Type,
    Source,
    Circle,
    Author,
}

impl Namespace {
    pub const ALL: [Namespace; 4] = [Self::Type, Self::Source, Self::Circle, Self::Author];

    /// Backing table; never user supplied, so safe to splice into SQL
    pub fn table(self) -> &'static str {
        match self {
            Self::Type => "types",
            Self::Source => "sources",
            Self::Circle => "circles",
            Self::Author => "authors",
        }
    }
}

/// A catalogued work: one folder, one row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Work {
    pub id: i64,
    pub folder_path: PathBuf,
    pub original_name: String,
    pub image_count: i64,
    pub status: WorkStatus,
    pub title: Option<String>,
    pub type_id: Option<i64>,
    pub source_id: Option<i64>,
    pub circle_id: Option<i64>,
    pub author_id: Option<i64>,
}

/// Raw fields pulled out of a folder name, before identity resolution
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Draft {
    pub work_id: i64,
    pub circle: Option<String>,
    pub author: Option<String>,
    pub source: Option<String>,
    pub work_type: Option<String>,
    pub title: Option<String>,
}

/// Dictionary ids written onto a work by the merge pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedFields {
    pub type_id: Option<i64>,
    pub source_id: Option<i64>,
    pub circle_id: Option<i64>,
    pub author_id: Option<i64>,
    pub title: Option<String>,
}

/// Which resolvable fields of a work are populated
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompletionState {
    pub work_id: i64,
    pub circle: bool,
    pub author: bool,
    pub source: bool,
    pub work_type: bool,
    pub title: bool,
}

impl CompletionState {
    pub fn from_resolved(work_id: i64, fields: &ResolvedFields) -> Self {
        Self {
            work_id,
            circle: fields.circle_id.is_some(),
            author: fields.author_id.is_some(),
            source: fields.source_id.is_some(),
            work_type: fields.type_id.is_some(),
            title: fields
                .title
                .as_deref()
                .is_some_and(|t| !t.trim().is_empty()),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.circle && self.author && self.source && self.work_type && self.title
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DictionaryEntry {
    pub id: i64,
    pub name: String,
}

/// A circle linked to a work, with the author credited under it (if any)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CircleCredit {
    pub circle: String,
    pub author: Option<String>,
}

/// Rows removed by an orphan sweep, per table
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OrphanSweep {
    pub circle_authors: usize,
    pub sources: usize,
    pub completion_states: usize,
    pub drafts: usize,
}

impl OrphanSweep {
    pub fn total(&self) -> usize {
        self.circle_authors + self.sources + self.completion_states + self.drafts
    }
}

/// A directory registered in the catalog as a scan base
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanTarget {
    pub id: i64,
    pub path: PathBuf,
    pub active: bool,
    pub note: Option<String>,
    /// `YYYY-MM-DD HH:MM:SS`, local time of the last scan that covered it
    pub last_scanned_at: Option<String>,
}
