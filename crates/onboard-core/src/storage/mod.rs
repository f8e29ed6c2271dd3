//! Storage layer
//!
//! The durable store holds exactly two logical collections:
//!
//! - **Draft**: a keyed slot table; the form keeps one draft under `current`
//! - **Outbox**: an auto-keyed append log of queued submissions
//!
//! `DurableStore` is the raw JSON-value contract. `DurableStoreExt` layers
//! the typed draft/outbox operations the sync controller uses on top of it.
//!
//! ## Backends
//!
//! - `SqliteStore`: file-backed, survives restarts
//! - `MemoryStore`: in-process only, for tests and throwaway sessions

pub mod error;
pub mod memory;
pub mod schema;
pub mod sqlite;

use std::fmt;

use async_trait::async_trait;
use serde_json::Value;
use tracing::warn;

pub use error::{StorageError, StorageResult};
pub use memory::MemoryStore;
pub use schema::SCHEMA_VERSION;
pub use sqlite::SqliteStore;

use crate::models::{Draft, OutboxEntry, QueuedSubmission, SubmissionId};

/// Key of the single draft slot
pub const DRAFT_KEY: &str = "current";

/// The two logical collections in a store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Draft,
    Outbox,
}

impl Collection {
    pub fn name(&self) -> &'static str {
        match self {
            Collection::Draft => "draft",
            Collection::Outbox => "outbox",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A record key: named for the draft slot, numeric for the outbox
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Key {
    Name(String),
    Id(SubmissionId),
}

impl Key {
    /// Numeric id, if this is an outbox key
    pub fn as_id(&self) -> Option<SubmissionId> {
        match self {
            Key::Id(id) => Some(*id),
            Key::Name(_) => None,
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Name(name) => f.write_str(name),
            Key::Id(id) => write!(f, "{}", id),
        }
    }
}

impl From<&str> for Key {
    fn from(name: &str) -> Self {
        Key::Name(name.to_string())
    }
}

impl From<SubmissionId> for Key {
    fn from(id: SubmissionId) -> Self {
        Key::Id(id)
    }
}

/// Crash-safe key/value and append-log persistence
///
/// Every failure is returned to the caller; a backend never drops a write
/// silently.
#[async_trait]
pub trait DurableStore: Send + Sync {
    /// Read a value; `None` when the key is absent
    async fn get(&self, collection: Collection, key: &Key) -> StorageResult<Option<Value>>;

    /// Insert or overwrite the value at `key`
    async fn put(&self, collection: Collection, key: &Key, value: Value) -> StorageResult<()>;

    /// Append to an auto-keyed collection, returning a never-reused id
    async fn add(&self, collection: Collection, value: Value) -> StorageResult<SubmissionId>;

    /// Remove a value; missing keys are not an error
    async fn delete(&self, collection: Collection, key: &Key) -> StorageResult<()>;

    /// All entries of a collection, in no guaranteed order
    async fn list(&self, collection: Collection) -> StorageResult<Vec<(Key, Value)>>;
}

/// Typed draft and outbox operations over any `DurableStore`
#[async_trait]
pub trait DurableStoreExt: DurableStore {
    /// Current draft, or the empty skeleton when none is stored
    async fn load_draft(&self) -> StorageResult<Draft> {
        match self.get(Collection::Draft, &Key::from(DRAFT_KEY)).await? {
            Some(value) => Ok(serde_json::from_value(value)?),
            None => Ok(Draft::skeleton()),
        }
    }

    /// Overwrite the draft slot
    async fn save_draft(&self, draft: &Draft) -> StorageResult<()> {
        let value = serde_json::to_value(draft)?;
        self.put(Collection::Draft, &Key::from(DRAFT_KEY), value).await
    }

    /// Reset the draft slot to the empty skeleton
    async fn clear_draft(&self) -> StorageResult<()> {
        self.save_draft(&Draft::skeleton()).await
    }

    /// Append an entry to the outbox
    async fn enqueue(&self, entry: &OutboxEntry) -> StorageResult<SubmissionId> {
        let value = serde_json::to_value(entry)?;
        self.add(Collection::Outbox, value).await
    }

    /// Every decodable queued submission, oldest first
    ///
    /// Rows that no longer decode are logged and left in place; they still
    /// count towards `queued_count`.
    async fn queued(&self) -> StorageResult<Vec<QueuedSubmission>> {
        let mut items = Vec::new();
        for (key, value) in self.list(Collection::Outbox).await? {
            let id = key.as_id().ok_or_else(|| StorageError::InvalidKey {
                key: key.to_string(),
                collection: "outbox",
            })?;
            match serde_json::from_value::<OutboxEntry>(value) {
                Ok(entry) => items.push(QueuedSubmission { id, entry }),
                Err(e) => warn!("Skipping unreadable outbox entry {}: {}", id, e),
            }
        }
        QueuedSubmission::sort_oldest_first(&mut items);
        Ok(items)
    }

    /// Number of queued submissions
    async fn queued_count(&self) -> StorageResult<usize> {
        Ok(self.list(Collection::Outbox).await?.len())
    }

    /// Remove a delivered submission
    async fn remove_queued(&self, id: SubmissionId) -> StorageResult<()> {
        self.delete(Collection::Outbox, &Key::Id(id)).await
    }
}

impl<S: DurableStore + ?Sized> DurableStoreExt for S {}
