//! Per-run CSV trail of rename outcomes.

use chrono::NaiveDate;
use serde::Serialize;
use std::fmt;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::Result;

/// Excel reads the file as UTF-8 only with a byte-order mark
pub(crate) const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditStatus {
    Renamed,
    Skipped,
    Error,
}

impl fmt::Display for AuditStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Renamed => "renamed",
            Self::Skipped => "skipped",
            Self::Error => "error",
        })
    }
}

/// One line of the audit file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuditRow {
    pub work_id: i64,
    pub old_path: String,
    pub new_path: String,
    pub status: AuditStatus,
    pub reason: String,
}

/// `rename_YYYYMMDD.csv` inside `dir`
pub fn audit_log_path(dir: &Path, date: NaiveDate) -> PathBuf {
    dir.join(format!("rename_{}.csv", date.format("%Y%m%d")))
}

/// Write all rows (with a header) to the dated audit file, replacing any
/// file from an earlier run on the same day
pub fn write_audit_log(dir: &Path, date: NaiveDate, rows: &[AuditRow]) -> Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let path = audit_log_path(dir, date);

    let mut file = File::create(&path)?;
    file.write_all(UTF8_BOM)?;

    let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(file);
    writer.write_record(["work_id", "old_path", "new_path", "status", "reason"])?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_write_audit_log() {
        let dir = tempdir().unwrap();
        let logs = dir.path().join("data").join("logs");
        let date = NaiveDate::from_ymd_opt(2022, 1, 2).unwrap();

        let rows = vec![
            AuditRow {
                work_id: 1,
                old_path: "/a/old".into(),
                new_path: "/a/new, with comma".into(),
                status: AuditStatus::Renamed,
                reason: String::new(),
            },
            AuditRow {
                work_id: 2,
                old_path: "/a/gone".into(),
                new_path: String::new(),
                status: AuditStatus::Error,
                reason: "missing folder".into(),
            },
        ];

        let path = write_audit_log(&logs, date, &rows).unwrap();
        assert_eq!(path, logs.join("rename_20220102.csv"));

        let bytes = fs::read(&path).unwrap();
        assert!(bytes.starts_with(UTF8_BOM));

        let text = String::from_utf8(bytes[UTF8_BOM.len()..].to_vec()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "work_id,old_path,new_path,status,reason");
        assert_eq!(lines[1], "1,/a/old,\"/a/new, with comma\",renamed,");
        assert_eq!(lines[2], "2,/a/gone,,error,missing folder");
    }

    #[test]
    fn test_empty_batch_still_writes_header() {
        let dir = tempdir().unwrap();
        let date = NaiveDate::from_ymd_opt(2024, 12, 31).unwrap();

        let path = write_audit_log(dir.path(), date, &[]).unwrap();
        let text = fs::read_to_string(path).unwrap();
        assert_eq!(text.trim_start_matches('\u{feff}').trim_end(), "work_id,old_path,new_path,status,reason");
    }
}
