use std::path::PathBuf;
use thiserror::Error;

use crate::persistence::PersistenceError;

pub type Result<T> = core::result::Result<T, Error>;

/// Custom error types for the doujin-archive library
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Catalog store error
    #[error("{0}")]
    Persistence(#[from] PersistenceError),

    /// Referenced work has no catalog record
    #[error("Work not found: {0}")]
    WorkNotFound(i64),

    /// Folder expected on disk is gone
    #[error("Source folder missing: {0}")]
    MissingSource(PathBuf),

    /// Destination folder already occupied
    #[error("Destination already exists: {0}")]
    Collision(PathBuf),

    /// Invalid configuration error
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    /// Safety check failure
    #[error("Safety check failed: {0}")]
    SafetyCheck(String),

    /// JSON (de)serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Audit log write error
    #[error("Audit log error: {0}")]
    Audit(#[from] csv::Error),
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::Persistence(PersistenceError::Database(err))
    }
}
