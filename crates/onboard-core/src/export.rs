//! Export artifact
//!
//! A full snapshot of the store as one pretty-printed JSON document:
//!
//! ```json
//! {
//!   "draft": { "company_name": "Acme", "locations": [] },
//!   "outbox": [ { "id": 1, "type": "caprock-onboarding", ... } ]
//! }
//! ```
//!
//! The same document can be imported into another store.

use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::models::{Draft, QueuedSubmission};
use crate::storage::{StorageError, StorageResult};

/// Snapshot of both store collections
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExportDocument {
    /// Stored draft; `null` when the slot was never written
    #[serde(default)]
    pub draft: Option<Draft>,
    /// Queued submissions, oldest first
    #[serde(default)]
    pub outbox: Vec<QueuedSubmission>,
}

impl ExportDocument {
    pub fn to_pretty_json(&self) -> StorageResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> StorageResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Write the document to `path`, replacing any existing file
    pub fn write_to(&self, path: &Path) -> StorageResult<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|e| StorageError::from_io(e, parent.to_path_buf()))?;
        }
        std::fs::write(path, self.to_pretty_json()?).map_err(|e| file_error(e, path))
    }

    pub fn read_from(path: &Path) -> StorageResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| file_error(e, path))?;
        Self::from_json(&content)
    }
}

fn file_error(error: io::Error, path: &Path) -> StorageError {
    match error.kind() {
        io::ErrorKind::PermissionDenied => StorageError::from_io(error, path.to_path_buf()),
        _ => StorageError::Io(error),
    }
}

/// Result of importing an export document
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    /// Whether the document carried a draft that replaced the current one
    pub draft_restored: bool,
    /// Submissions appended to the outbox
    pub queued: usize,
    /// Submissions skipped because their idempotency key was already queued
    pub skipped: usize,
}
