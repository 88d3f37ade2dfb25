//! First registration of work folders: scan, export to JSON, load.

use chrono::NaiveDateTime;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use crate::discovery::{absolute_path, count_images, list_work_folders};
use crate::error::Result;
use crate::persistence::{self, Catalog, WorkStatus};
use crate::progress::batch_progress;

const SCAN_FILE_PREFIX: &str = "scan_";

/// One scanned folder, as written to and read from the export file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanRecord {
    pub folder_path: PathBuf,
    pub original_name: String,
    pub image_count: i64,
    #[serde(default = "pending")]
    pub status: WorkStatus,
}

fn pending() -> WorkStatus {
    WorkStatus::Pending
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub inserted: usize,
    pub skipped: usize,
}

/// Describe every immediate subfolder of the base directories
pub fn scan_base_dirs(base_dirs: &[PathBuf]) -> Vec<ScanRecord> {
    let folders = list_work_folders(base_dirs);
    let bar = batch_progress(folders.len(), "Scanning folders...");

    let records: Vec<ScanRecord> = folders
        .into_iter()
        .map(|folder| {
            let record = ScanRecord {
                original_name: folder
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default(),
                image_count: count_images(&folder) as i64,
                status: WorkStatus::Pending,
                folder_path: folder,
            };
            bar.inc(1);
            record
        })
        .collect();

    bar.finish_and_clear();
    info!("Scanned {} folders", records.len());
    records
}

/// `scan_YYYYMMDD_HHMM.json` inside `dir`
pub fn scan_file_path(dir: &Path, at: NaiveDateTime) -> PathBuf {
    dir.join(format!("{}{}.json", SCAN_FILE_PREFIX, at.format("%Y%m%d_%H%M")))
}

pub fn export_records(path: &Path, records: &[ScanRecord]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(writer, records)?;
    info!("Exported {} records to {}", records.len(), path.display());
    Ok(())
}

/// Export each base directory's records into that directory as
/// `scan_YYYYMMDD_HHMM.json`; returns the written files with their sizes
pub fn export_per_base_dir(
    base_dirs: &[PathBuf],
    records: &[ScanRecord],
    at: NaiveDateTime,
) -> Result<Vec<(PathBuf, usize)>> {
    let mut written = Vec::new();

    for base in base_dirs {
        let absolute_base = absolute_path(base);
        if !absolute_base.is_dir() {
            warn!("Base directory not found: {}", base.display());
            continue;
        }

        let in_base: Vec<ScanRecord> = records
            .iter()
            .filter(|r| r.folder_path.parent() == Some(absolute_base.as_path()))
            .cloned()
            .collect();
        let path = scan_file_path(&absolute_base, at);
        export_records(&path, &in_base)?;
        written.push((path, in_base.len()));
    }
    Ok(written)
}

pub fn read_records(path: &Path) -> Result<Vec<ScanRecord>> {
    let reader = BufReader::new(File::open(path)?);
    Ok(serde_json::from_reader(reader)?)
}

/// Most recently modified `scan_*.json` directly inside `dir`
pub fn latest_scan_file(dir: &Path) -> Option<PathBuf> {
    let entries = fs::read_dir(dir).ok()?;

    entries
        .filter_map(|e| e.ok())
        .filter(|e| {
            let name = e.file_name();
            let name = name.to_string_lossy();
            name.starts_with(SCAN_FILE_PREFIX) && name.ends_with(".json")
        })
        .filter_map(|e| {
            let modified = e.metadata().and_then(|m| m.modified()).ok()?;
            Some((modified, e.path()))
        })
        .max()
        .map(|(_, path)| path)
}

/// Register every record whose folder is not yet catalogued, as a
/// pending work. One transaction for the whole batch.
pub fn load_records(catalog: &mut Catalog, records: &[ScanRecord]) -> Result<LoadReport> {
    catalog.transaction(|conn| {
        let mut report = LoadReport::default();

        for record in records {
            if persistence::work_exists(conn, &record.folder_path)? {
                report.skipped += 1;
                continue;
            }
            if record.status != WorkStatus::Pending {
                warn!(
                    "Record for {} has status {}; registering as pending",
                    record.folder_path.display(),
                    record.status
                );
            }
            persistence::insert_work(
                conn,
                &record.folder_path,
                &record.original_name,
                record.image_count,
            )?;
            report.inserted += 1;
        }

        info!(
            "Registered {} new works (skipped: {})",
            report.inserted, report.skipped
        );
        Ok(report)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::fs::File;
    use tempfile::tempdir;

    #[test]
    fn test_scan_counts_images_per_folder() {
        let dir = tempdir().unwrap();
        let work = dir.path().join("[Circle] Title");
        fs::create_dir_all(work.join("sub")).unwrap();
        File::create(work.join("001.jpg")).unwrap();
        File::create(work.join("sub").join("002.PNG")).unwrap();
        File::create(work.join("notes.txt")).unwrap();
        fs::create_dir(dir.path().join("empty")).unwrap();

        let records = scan_base_dirs(&[dir.path().to_path_buf()]);
        assert_eq!(records.len(), 2);

        let titled = records
            .iter()
            .find(|r| r.original_name == "[Circle] Title")
            .unwrap();
        assert_eq!(titled.image_count, 2);
        assert!(titled.folder_path.is_absolute());
        assert_eq!(titled.status, WorkStatus::Pending);

        let empty = records.iter().find(|r| r.original_name == "empty").unwrap();
        assert_eq!(empty.image_count, 0);
    }

    #[test]
    fn test_scan_file_name() {
        let at = NaiveDate::from_ymd_opt(2025, 7, 4)
            .unwrap()
            .and_hms_opt(9, 5, 0)
            .unwrap();
        assert_eq!(
            scan_file_path(Path::new("/base"), at),
            Path::new("/base/scan_20250704_0905.json")
        );
    }

    #[test]
    fn test_export_then_load_skips_known_folders() {
        let dir = tempdir().unwrap();
        let export = dir.path().join("out").join("scan.json");
        let records = vec![
            ScanRecord {
                folder_path: PathBuf::from("/archive/a"),
                original_name: "a".into(),
                image_count: 3,
                status: WorkStatus::Pending,
            },
            ScanRecord {
                folder_path: PathBuf::from("/archive/b"),
                original_name: "b".into(),
                image_count: 0,
                status: WorkStatus::Pending,
            },
        ];
        export_records(&export, &records).unwrap();
        let read = read_records(&export).unwrap();
        assert_eq!(read, records);

        let mut catalog = Catalog::open_in_memory().unwrap();
        let first = load_records(&mut catalog, &read).unwrap();
        assert_eq!(first, LoadReport { inserted: 2, skipped: 0 });

        let second = load_records(&mut catalog, &read).unwrap();
        assert_eq!(second, LoadReport { inserted: 0, skipped: 2 });

        let works = persistence::all_works(catalog.conn()).unwrap();
        assert_eq!(works.len(), 2);
        assert!(works.iter().all(|w| w.status == WorkStatus::Pending));
    }

    #[test]
    fn test_export_per_base_dir_splits_records() {
        let first = tempdir().unwrap();
        let second = tempdir().unwrap();
        fs::create_dir(first.path().join("a")).unwrap();
        fs::create_dir(first.path().join("b")).unwrap();
        fs::create_dir(second.path().join("c")).unwrap();

        let bases = vec![first.path().to_path_buf(), second.path().to_path_buf()];
        let records = scan_base_dirs(&bases);
        let at = NaiveDate::from_ymd_opt(2025, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();

        let written = export_per_base_dir(&bases, &records, at).unwrap();
        assert_eq!(written.len(), 2);
        assert_eq!(written[0].1, 2);
        assert_eq!(written[1].1, 1);
        assert_eq!(read_records(&written[1].0).unwrap()[0].original_name, "c");
        assert_eq!(
            latest_scan_file(second.path()).unwrap().file_name(),
            written[1].0.file_name()
        );
    }

    #[test]
    fn test_missing_status_defaults_to_pending() {
        let json = r#"[{"folder_path": "/x", "original_name": "x", "image_count": 1}]"#;
        let records: Vec<ScanRecord> = serde_json::from_str(json).unwrap();
        assert_eq!(records[0].status, WorkStatus::Pending);
    }

    #[test]
    fn test_latest_scan_file_ignores_other_json() {
        let dir = tempdir().unwrap();
        assert!(latest_scan_file(dir.path()).is_none());

        File::create(dir.path().join("config.json")).unwrap();
        File::create(dir.path().join("scan_20250101_0000.json")).unwrap();

        let latest = latest_scan_file(dir.path()).unwrap();
        assert_eq!(latest.file_name().unwrap(), "scan_20250101_0000.json");
    }
}
