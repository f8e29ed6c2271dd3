//! In-memory durable store
//!
//! Holds both collections in process memory. Nothing survives a restart, so
//! this backs tests and `--ephemeral` sessions. Writes can be switched to
//! fail so callers can exercise their storage-fault paths.

use std::collections::BTreeMap;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use super::error::{StorageError, StorageResult};
use super::{Collection, DurableStore, Key};
use crate::models::SubmissionId;

#[derive(Debug, Default)]
struct Inner {
    draft: BTreeMap<String, Value>,
    outbox: BTreeMap<SubmissionId, Value>,
    last_id: SubmissionId,
}

/// Process-local store
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
    fail_writes: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent write fail as if the disk quota were exhausted
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn check_writable(&self) -> StorageResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StorageError::Io(io::Error::new(
                io::ErrorKind::Other,
                "quota exceeded",
            )));
        }
        Ok(())
    }

    fn lock(&self) -> StorageResult<std::sync::MutexGuard<'_, Inner>> {
        self.inner.lock().map_err(|_| StorageError::Poisoned)
    }
}

fn outbox_id(key: &Key) -> StorageResult<SubmissionId> {
    key.as_id().ok_or_else(|| StorageError::InvalidKey {
        key: key.to_string(),
        collection: "outbox",
    })
}

#[async_trait]
impl DurableStore for MemoryStore {
    async fn get(&self, collection: Collection, key: &Key) -> StorageResult<Option<Value>> {
        let inner = self.lock()?;
        Ok(match collection {
            Collection::Draft => inner.draft.get(&key.to_string()).cloned(),
            Collection::Outbox => inner.outbox.get(&outbox_id(key)?).cloned(),
        })
    }

    async fn put(&self, collection: Collection, key: &Key, value: Value) -> StorageResult<()> {
        if collection == Collection::Outbox {
            return Err(StorageError::WrongCollection {
                operation: "put",
                collection: "outbox",
            });
        }
        self.check_writable()?;
        self.lock()?.draft.insert(key.to_string(), value);
        Ok(())
    }

    async fn add(&self, collection: Collection, value: Value) -> StorageResult<SubmissionId> {
        if collection == Collection::Draft {
            return Err(StorageError::WrongCollection {
                operation: "add",
                collection: "draft",
            });
        }
        self.check_writable()?;
        let mut inner = self.lock()?;
        inner.last_id += 1;
        let id = inner.last_id;
        inner.outbox.insert(id, value);
        Ok(id)
    }

    async fn delete(&self, collection: Collection, key: &Key) -> StorageResult<()> {
        self.check_writable()?;
        let mut inner = self.lock()?;
        match collection {
            Collection::Draft => {
                inner.draft.remove(&key.to_string());
            }
            Collection::Outbox => {
                inner.outbox.remove(&outbox_id(key)?);
            }
        }
        Ok(())
    }

    async fn list(&self, collection: Collection) -> StorageResult<Vec<(Key, Value)>> {
        let inner = self.lock()?;
        Ok(match collection {
            Collection::Draft => inner
                .draft
                .iter()
                .map(|(k, v)| (Key::Name(k.clone()), v.clone()))
                .collect(),
            Collection::Outbox => inner
                .outbox
                .iter()
                .map(|(id, v)| (Key::Id(*id), v.clone()))
                .collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_add_get_delete() {
        let store = MemoryStore::new();

        let id = store.add(Collection::Outbox, json!({"a": 1})).await.unwrap();
        let value = store.get(Collection::Outbox, &Key::Id(id)).await.unwrap();
        assert_eq!(value, Some(json!({"a": 1})));

        store.delete(Collection::Outbox, &Key::Id(id)).await.unwrap();
        store.delete(Collection::Outbox, &Key::Id(id)).await.unwrap();
        assert!(store.list(Collection::Outbox).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_ids_not_reused_after_delete() {
        let store = MemoryStore::new();
        let first = store.add(Collection::Outbox, json!({})).await.unwrap();
        store.delete(Collection::Outbox, &Key::Id(first)).await.unwrap();
        let second = store.add(Collection::Outbox, json!({})).await.unwrap();
        assert_ne!(first, second);
    }

    #[tokio::test]
    async fn test_failing_writes_propagate() {
        let store = MemoryStore::new();
        store.set_fail_writes(true);

        let err = store
            .put(Collection::Draft, &Key::from("current"), json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::Io(_)));
        assert!(store.add(Collection::Outbox, json!({})).await.is_err());
        assert!(store.list(Collection::Draft).await.unwrap().is_empty());

        store.set_fail_writes(false);
        store
            .put(Collection::Draft, &Key::from("current"), json!({}))
            .await
            .unwrap();
    }
}
