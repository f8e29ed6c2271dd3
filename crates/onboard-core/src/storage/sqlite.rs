//! SQLite-backed durable store
//!
//! Storage location: `~/.local/share/onboard/store.db` (configurable via
//! `Config`). rusqlite is blocking, so every operation runs on tokio's
//! blocking pool behind a mutex; callers only ever see async methods.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::Value;
use tracing::debug;

use super::error::{StorageError, StorageResult};
use super::schema;
use super::{Collection, DurableStore, Key};
use crate::config::Config;
use crate::models::SubmissionId;

/// File-backed store
#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
    path: Option<PathBuf>,
}

impl SqliteStore {
    /// Open the store at the configured location
    pub fn open_with_config(config: &Config) -> StorageResult<Self> {
        Self::open(&config.store_path())
    }

    /// Open (or create) a store file, migrating its schema first
    pub fn open(path: &Path) -> StorageResult<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| StorageError::from_io(e, parent.to_path_buf()))?;
        }

        let mut conn = Connection::open(path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "FULL")?;
        schema::migrate(&mut conn)?;

        debug!(path = %path.display(), "Opened store");
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            path: Some(path.to_path_buf()),
        })
    }

    /// Open a throwaway in-memory SQLite store
    pub fn open_in_memory() -> StorageResult<Self> {
        let mut conn = Connection::open_in_memory()?;
        schema::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            path: None,
        })
    }

    /// Path of the backing file, if any
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Size of the backing file in bytes (0 for in-memory stores)
    pub fn file_size(&self) -> u64 {
        self.path
            .as_ref()
            .and_then(|p| fs::metadata(p).ok())
            .map(|m| m.len())
            .unwrap_or(0)
    }

    async fn with_conn<T, F>(&self, f: F) -> StorageResult<T>
    where
        F: FnOnce(&mut Connection) -> StorageResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut guard = conn.lock().map_err(|_| StorageError::Poisoned)?;
            f(&mut *guard)
        })
        .await
        .map_err(|e| StorageError::Task(e.to_string()))?
    }
}

fn outbox_id(key: &Key) -> StorageResult<SubmissionId> {
    key.as_id().ok_or_else(|| StorageError::InvalidKey {
        key: key.to_string(),
        collection: "outbox",
    })
}

fn decode(text: String) -> StorageResult<Value> {
    Ok(serde_json::from_str(&text)?)
}

#[async_trait]
impl DurableStore for SqliteStore {
    async fn get(&self, collection: Collection, key: &Key) -> StorageResult<Option<Value>> {
        let key = key.clone();
        self.with_conn(move |conn| {
            let text: Option<String> = match collection {
                Collection::Draft => conn
                    .query_row(
                        "SELECT value FROM draft WHERE key = ?1",
                        params![key.to_string()],
                        |row| row.get(0),
                    )
                    .optional()?,
                Collection::Outbox => conn
                    .query_row(
                        "SELECT value FROM outbox WHERE id = ?1",
                        params![outbox_id(&key)?],
                        |row| row.get(0),
                    )
                    .optional()?,
            };
            text.map(decode).transpose()
        })
        .await
    }

    async fn put(&self, collection: Collection, key: &Key, value: Value) -> StorageResult<()> {
        if collection == Collection::Outbox {
            return Err(StorageError::WrongCollection {
                operation: "put",
                collection: "outbox",
            });
        }

        let key = key.to_string();
        let text = serde_json::to_string(&value)?;
        self.with_conn(move |conn| {
            conn.execute(
                "INSERT INTO draft (key, value) VALUES (?1, ?2)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value",
                params![key, text],
            )?;
            Ok(())
        })
        .await
    }

    async fn add(&self, collection: Collection, value: Value) -> StorageResult<SubmissionId> {
        if collection == Collection::Draft {
            return Err(StorageError::WrongCollection {
                operation: "add",
                collection: "draft",
            });
        }

        let text = serde_json::to_string(&value)?;
        self.with_conn(move |conn| {
            conn.execute("INSERT INTO outbox (value) VALUES (?1)", params![text])?;
            Ok(conn.last_insert_rowid())
        })
        .await
    }

    async fn delete(&self, collection: Collection, key: &Key) -> StorageResult<()> {
        let key = key.clone();
        self.with_conn(move |conn| {
            match collection {
                Collection::Draft => {
                    conn.execute("DELETE FROM draft WHERE key = ?1", params![key.to_string()])?
                }
                Collection::Outbox => {
                    conn.execute("DELETE FROM outbox WHERE id = ?1", params![outbox_id(&key)?])?
                }
            };
            Ok(())
        })
        .await
    }

    async fn list(&self, collection: Collection) -> StorageResult<Vec<(Key, Value)>> {
        self.with_conn(move |conn| {
            let mut entries = Vec::new();
            match collection {
                Collection::Draft => {
                    let mut stmt = conn.prepare("SELECT key, value FROM draft ORDER BY key")?;
                    let rows = stmt.query_map([], |row| {
                        Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
                    })?;
                    for row in rows {
                        let (key, text) = row?;
                        entries.push((Key::Name(key), decode(text)?));
                    }
                }
                Collection::Outbox => {
                    let mut stmt = conn.prepare("SELECT id, value FROM outbox ORDER BY id")?;
                    let rows = stmt.query_map([], |row| {
                        Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?))
                    })?;
                    for row in rows {
                        let (id, text) = row?;
                        entries.push((Key::Id(id), decode(text)?));
                    }
                }
            }
            Ok(entries)
        })
        .await
    }
}
