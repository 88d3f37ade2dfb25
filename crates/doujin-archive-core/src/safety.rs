use log::info;
use std::fs;
use std::io;
use std::path::Path;

use crate::error::{Error, Result};
use crate::logging::{log_file_error, log_fs_modification};

/// Whether a destructive operation may touch the filesystem
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CleanupMode {
    /// Report candidates only
    DryRun,
    /// Actually delete
    Execute,
}

impl CleanupMode {
    pub fn from_execute_flag(execute: bool) -> Self {
        if execute {
            Self::Execute
        } else {
            Self::DryRun
        }
    }

    pub fn is_dry_run(self) -> bool {
        self == Self::DryRun
    }
}

/// The filesystem primitives the catalog tools are allowed to use
pub trait FolderOps {
    fn exists(&self, path: &Path) -> bool;
    fn rename(&self, from: &Path, to: &Path) -> io::Result<()>;
    fn remove_all(&self, path: &Path) -> io::Result<()>;

    /// Whether `path` itself is a symlink (not followed)
    fn is_symlink(&self, path: &Path) -> bool {
        fs::symlink_metadata(path)
            .map(|m| m.file_type().is_symlink())
            .unwrap_or(false)
    }
}

/// Folders on the local disk
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalFolders;

impl FolderOps for LocalFolders {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        fs::rename(from, to)
    }

    fn remove_all(&self, path: &Path) -> io::Result<()> {
        fs::remove_dir_all(path)
    }
}

/// Gatekeeper for every move and delete the tools perform
pub struct SafetyManager {
    ops: Box<dyn FolderOps>,
}

impl Default for SafetyManager {
    fn default() -> Self {
        Self::new()
    }
}

impl SafetyManager {
    /// Create a SafetyManager working on the local disk
    pub fn new() -> Self {
        Self::with_ops(Box::new(LocalFolders))
    }

    pub fn with_ops(ops: Box<dyn FolderOps>) -> Self {
        Self { ops }
    }

    pub fn exists(&self, path: &Path) -> bool {
        self.ops.exists(path)
    }

    /// Move a folder, refusing to overwrite anything at `to`
    pub fn move_folder(&self, from: &Path, to: &Path) -> Result<()> {
        if !self.ops.exists(from) {
            return Err(Error::MissingSource(from.to_path_buf()));
        }
        if self.ops.exists(to) {
            return Err(Error::Collision(to.to_path_buf()));
        }

        self.ops.rename(from, to).map_err(|e| {
            log_file_error(from, "rename", &e);
            Error::Io(e)
        })?;
        log_fs_modification("rename", from, Some(&format!("to {}", to.display())));
        Ok(())
    }

    /// Delete a folder tree. In dry-run mode only reports; returns whether
    /// anything was removed. Symlinks are refused in both modes.
    pub fn remove_folder(&self, path: &Path, mode: CleanupMode) -> Result<bool> {
        if self.ops.is_symlink(path) {
            return Err(Error::SafetyCheck(format!(
                "refusing to delete symlink {}",
                path.display()
            )));
        }
        if mode.is_dry_run() {
            info!("Dry run, would delete {}", path.display());
            return Ok(false);
        }

        self.ops.remove_all(path).map_err(|e| {
            log_file_error(path, "remove_dir_all", &e);
            Error::Io(e)
        })?;
        log_fs_modification("delete", path, None);
        Ok(true)
    }
}
