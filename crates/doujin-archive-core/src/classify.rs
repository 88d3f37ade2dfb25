//! Image-count classification of works sorted into `【画像N枚以上】`
//! category folders, exported per base directory as JSON and CSV.

use chrono::NaiveDateTime;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::audit::UTF8_BOM;
use crate::discovery::{absolute_path, count_images};
use crate::error::Result;

const CLASSIFY_FILE_PREFIX: &str = "classification_result";
const CATEGORY_PREFIX: &str = "【画像";
const CATEGORY_MARKER: char = '枚';

/// One work folder found inside a category folder
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifiedRecord {
    pub folder_path: PathBuf,
    pub original_name: String,
    pub image_count: i64,
    /// Name of the category folder the work sits in
    pub category: String,
    /// Whether `image_count` reaches the configured threshold
    pub meets_threshold: bool,
}

/// Files written for one base directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassificationExport {
    pub json_path: PathBuf,
    pub csv_path: PathBuf,
    pub records: usize,
}

/// `【画像100枚以上】` and the like
pub fn is_category_folder(name: &str) -> bool {
    name.starts_with(CATEGORY_PREFIX) && name.contains(CATEGORY_MARKER)
}

/// Work folders one level below each category folder of `base`.
/// Symlinks are skipped at both levels.
pub fn classify_base_dir(base: &Path, threshold: u32) -> Vec<ClassifiedRecord> {
    let mut records = Vec::new();

    for category in real_subfolders(&absolute_path(base)) {
        let Some(category_name) = file_name(&category) else {
            continue;
        };
        if !is_category_folder(&category_name) {
            continue;
        }

        for folder in real_subfolders(&category) {
            let image_count = count_images(&folder) as i64;
            records.push(ClassifiedRecord {
                original_name: file_name(&folder).unwrap_or_default(),
                image_count,
                category: category_name.clone(),
                meets_threshold: image_count >= i64::from(threshold),
                folder_path: folder,
            });
        }
    }

    records
}

/// `classification_result_thresh{T}_{YYYYMMDD-HHMM}` inside `dir`, without extension
pub fn classification_stem(dir: &Path, threshold: u32, at: NaiveDateTime) -> PathBuf {
    dir.join(format!(
        "{}_thresh{}_{}",
        CLASSIFY_FILE_PREFIX,
        threshold,
        at.format("%Y%m%d-%H%M")
    ))
}

/// Classify every base directory and write its results next to it.
/// Base directories without any category folder content write nothing.
pub fn classify_and_export(
    base_dirs: &[PathBuf],
    threshold: u32,
    at: NaiveDateTime,
) -> Result<Vec<ClassificationExport>> {
    let mut exports = Vec::new();

    for base in base_dirs {
        if !base.is_dir() {
            warn!("Base directory not found: {}", base.display());
            continue;
        }

        let records = classify_base_dir(base, threshold);
        if records.is_empty() {
            warn!("Nothing to classify in {}", base.display());
            continue;
        }

        let stem = classification_stem(&absolute_path(base), threshold, at);
        let json_path = stem.with_extension("json");
        let csv_path = stem.with_extension("csv");
        write_json(&json_path, &records)?;
        write_csv(&csv_path, &records)?;

        info!(
            "Classified {} works in {} (threshold {})",
            records.len(),
            base.display(),
            threshold
        );
        exports.push(ClassificationExport {
            json_path,
            csv_path,
            records: records.len(),
        });
    }

    Ok(exports)
}

fn write_json(path: &Path, records: &[ClassifiedRecord]) -> Result<()> {
    let writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(writer, records)?;
    Ok(())
}

fn write_csv(path: &Path, records: &[ClassifiedRecord]) -> Result<()> {
    let mut file = File::create(path)?;
    file.write_all(UTF8_BOM)?;

    let mut writer = csv::Writer::from_writer(file);
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;
    Ok(())
}

fn real_subfolders(dir: &Path) -> Vec<PathBuf> {
    let Ok(entries) = fs::read_dir(dir) else {
        return Vec::new();
    };

    let mut folders: Vec<PathBuf> = entries
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().map(|t| t.is_dir()).unwrap_or(false))
        .map(|e| dir.join(e.file_name()))
        .collect();
    folders.sort();
    folders
}

fn file_name(path: &Path) -> Option<String> {
    path.file_name().map(|n| n.to_string_lossy().into_owned())
}
