use log::LevelFilter;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Log level for the application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn to_level_filter(self) -> LevelFilter {
        match self {
            Self::Error => LevelFilter::Error,
            Self::Warn => LevelFilter::Warn,
            Self::Info => LevelFilter::Info,
            Self::Debug => LevelFilter::Debug,
            Self::Trace => LevelFilter::Trace,
        }
    }
}

/// Configuration for the archive catalog
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Path to the sqlite catalog
    pub database_path: PathBuf,

    /// Directories whose immediate subfolders are works
    pub base_dirs: Vec<PathBuf>,

    /// Where rename audit CSVs are written
    pub audit_log_dir: PathBuf,

    /// Directory for the rolling log file (console logging when unset)
    pub log_dir: Option<PathBuf>,

    /// Log level
    pub log_level: LogLevel,

    /// Image count a classified work must reach to meet the threshold
    pub threshold: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from("metadata.sqlite3"),
            base_dirs: Vec::new(),
            audit_log_dir: PathBuf::from("data/logs"),
            log_dir: None,
            log_level: LogLevel::Info,
            threshold: 100,
        }
    }
}

impl Config {
    /// Load a configuration from a JSON file
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config = serde_json::from_str(&contents)?;
        Ok(config)
    }

    /// Write this configuration as pretty JSON
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Check the configuration for values no command can work with
    pub fn validate(&self) -> Result<()> {
        if self.database_path.as_os_str().is_empty() {
            return Err(Error::Configuration("database_path is empty".into()));
        }
        if self.audit_log_dir.as_os_str().is_empty() {
            return Err(Error::Configuration("audit_log_dir is empty".into()));
        }
        for (i, dir) in self.base_dirs.iter().enumerate() {
            if self.base_dirs[..i].contains(dir) {
                return Err(Error::Configuration(format!(
                    "base directory listed twice: {}",
                    dir.display()
                )));
            }
        }
        Ok(())
    }
}
