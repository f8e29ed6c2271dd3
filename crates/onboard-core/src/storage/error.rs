//! Storage error handling
//!
//! Provides typed errors for storage operations with descriptive messages
//! and recovery suggestions.

use std::io;
use std::path::PathBuf;

use rusqlite::ErrorCode;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Error, Debug)]
pub enum StorageError {
    /// Failed to create data directory
    #[error("Failed to create data directory '{path}': {source}")]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Permission denied accessing path
    #[error("Permission denied: cannot access '{path}'. Check file permissions.")]
    PermissionDenied {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Disk is full or quota exceeded
    #[error("Disk full or quota exceeded while writing the store. Free up disk space and try again.")]
    DiskFull {
        #[source]
        source: rusqlite::Error,
    },

    /// Database file is not a valid store
    #[error("Store is corrupted: {details}")]
    Corrupt { details: String },

    /// Store was written by a newer schema than this build understands
    #[error("Store schema version {found} is newer than supported version {supported}")]
    UnsupportedVersion { found: i32, supported: i32 },

    /// Schema migration failed; nothing else may run against the store
    #[error("Schema migration from version {from} to {to} failed: {source}")]
    MigrationFailed {
        from: i32,
        to: i32,
        #[source]
        source: rusqlite::Error,
    },

    /// Operation not supported by the collection (e.g. `add` on the draft slot)
    #[error("'{operation}' is not supported on the {collection} collection")]
    WrongCollection {
        operation: &'static str,
        collection: &'static str,
    },

    /// Key could not be interpreted for this collection
    #[error("Invalid key '{key}' for the {collection} collection")]
    InvalidKey {
        key: String,
        collection: &'static str,
    },

    /// Stored value could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// SQLite database error
    #[error("Database error: {0}")]
    Database(rusqlite::Error),

    /// Another holder of the store panicked mid-operation
    #[error("Store lock poisoned")]
    Poisoned,

    /// Blocking storage task was cancelled or panicked
    #[error("Storage task failed: {0}")]
    Task(String),

    /// Generic I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl StorageError {
    /// Create an error from an I/O error with path context
    ///
    /// Classifies the error based on its kind (permission, etc.)
    pub fn from_io(error: io::Error, path: PathBuf) -> Self {
        match error.kind() {
            io::ErrorKind::PermissionDenied => StorageError::PermissionDenied {
                path,
                source: error,
            },
            _ => StorageError::CreateDirectory {
                path,
                source: error,
            },
        }
    }

    /// Check if this error is recoverable
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            StorageError::DiskFull { .. } | StorageError::PermissionDenied { .. }
        )
    }

    /// Get a recovery suggestion for this error
    pub fn recovery_suggestion(&self) -> Option<&'static str> {
        match self {
            StorageError::DiskFull { .. } => Some("Free up disk space and try again."),
            StorageError::PermissionDenied { .. } => {
                Some("Check file and directory permissions. You may need to run with different permissions or change ownership.")
            }
            StorageError::Corrupt { .. } => {
                Some("Move the store file aside to start fresh. Use an earlier export to restore queued submissions.")
            }
            StorageError::UnsupportedVersion { .. } => {
                Some("Upgrade onboard to a version that understands this store.")
            }
            StorageError::CreateDirectory { .. } => {
                Some("Check that the parent directory exists and you have write permissions.")
            }
            _ => None,
        }
    }
}

impl From<rusqlite::Error> for StorageError {
    /// Classify SQLite failures that need a different recovery path
    fn from(error: rusqlite::Error) -> Self {
        match error.sqlite_error_code() {
            Some(ErrorCode::DiskFull) => StorageError::DiskFull { source: error },
            Some(ErrorCode::DatabaseCorrupt) | Some(ErrorCode::NotADatabase) => {
                StorageError::Corrupt {
                    details: error.to_string(),
                }
            }
            _ => StorageError::Database(error),
        }
    }
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;
