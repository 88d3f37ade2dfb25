#![allow(dead_code)]

use doujin_archive_core::{Archive, Catalog, Config};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A throwaway library directory with a file-backed catalog
pub struct TestLibrary {
    pub root: TempDir,
    pub base: PathBuf,
    pub config: Config,
}

impl TestLibrary {
    pub fn new() -> Self {
        let root = tempfile::tempdir().unwrap();
        let base = root.path().join("library");
        fs::create_dir(&base).unwrap();
        let base = fs::canonicalize(&base).unwrap();

        let config = Config {
            database_path: root.path().join("catalog.sqlite3"),
            base_dirs: vec![base.clone()],
            audit_log_dir: root.path().join("logs"),
            ..Config::default()
        };

        Self { root, base, config }
    }

    pub fn open(&self) -> Archive {
        Archive::open(self.config.clone()).unwrap()
    }

    /// Create a work folder holding `images` jpg files
    pub fn add_folder(&self, name: &str, images: usize) -> PathBuf {
        make_folder(&self.base, name, images)
    }
}

pub fn make_folder(parent: &Path, name: &str, images: usize) -> PathBuf {
    let folder = parent.join(name);
    fs::create_dir_all(&folder).unwrap();
    for i in 0..images {
        fs::write(folder.join(format!("{:03}.jpg", i + 1)), b"jpg").unwrap();
    }
    folder
}

/// Id of the work registered with `original_name`
pub fn work_id(catalog: &Catalog, original_name: &str) -> i64 {
    doujin_archive_core::persistence::all_works(catalog.conn())
        .unwrap()
        .into_iter()
        .find(|w| w.original_name == original_name)
        .map(|w| w.id)
        .unwrap()
}
