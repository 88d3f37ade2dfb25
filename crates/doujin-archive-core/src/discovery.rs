use log::warn;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Extensions counted as images (compared lowercase)
pub const IMAGE_EXTENSIONS: [&str; 6] = ["jpg", "jpeg", "png", "gif", "bmp", "webp"];

/// Returns if the given path has an image extension
pub fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Recursively count image files below `folder`; 0 if it is not a directory
pub fn count_images(folder: &Path) -> usize {
    if !folder.is_dir() {
        return 0;
    }

    WalkDir::new(folder)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| has_image_extension(e.path()))
        .count()
}

/// Absolute form of a path: canonical when it exists, otherwise made
/// absolute lexically
pub fn absolute_path(path: &Path) -> PathBuf {
    fs::canonicalize(path)
        .or_else(|_| std::path::absolute(path))
        .unwrap_or_else(|_| path.to_path_buf())
}

/// Immediate subfolders of every base directory, as absolute paths.
///
/// Only the base directory itself is canonicalized; each entry keeps its
/// own name under it. Symlinked entries are skipped so nothing outside a
/// base directory is ever listed. Missing base directories are warned
/// about and skipped.
pub fn list_work_folders(base_dirs: &[PathBuf]) -> Vec<PathBuf> {
    let mut folders = Vec::new();

    for base in base_dirs {
        let entries = match fs::read_dir(base) {
            Ok(entries) => entries,
            Err(e) => {
                warn!("Base directory not readable: {} ({})", base.display(), e);
                continue;
            }
        };
        let absolute_base = absolute_path(base);

        for entry in entries.filter_map(|e| e.ok()) {
            let Ok(file_type) = entry.file_type() else {
                continue;
            };
            if file_type.is_symlink() {
                warn!("Skipping symlink {}", entry.path().display());
                continue;
            }
            if file_type.is_dir() {
                folders.push(absolute_base.join(entry.file_name()));
            }
        }
    }

    folders.sort();
    folders
}

// -- Tests --
