//! SQLite schema for the durable store
//!
//! Two tables back the two logical collections: `draft` is a keyed slot
//! table, `outbox` is an append log whose ids come from `AUTOINCREMENT` so
//! they are never reissued, even after the newest row is deleted.

use rusqlite::{Connection, Transaction};
use tracing::info;

use super::error::{StorageError, StorageResult};

/// Current schema version for migrations
pub const SCHEMA_VERSION: i32 = 1;

/// Bring the database up to `SCHEMA_VERSION`
///
/// Runs at most one migration, inside a single transaction, before the
/// store serves any other operation. A database stamped with a newer
/// version is refused.
pub fn migrate(conn: &mut Connection) -> StorageResult<()> {
    let found = get_schema_version(conn)?.unwrap_or(0);

    if found > SCHEMA_VERSION {
        return Err(StorageError::UnsupportedVersion {
            found,
            supported: SCHEMA_VERSION,
        });
    }

    if found == SCHEMA_VERSION {
        return Ok(());
    }

    let tx = conn.transaction()?;
    init_schema(&tx).map_err(|source| StorageError::MigrationFailed {
        from: found,
        to: SCHEMA_VERSION,
        source,
    })?;
    tx.commit()?;

    info!(from = found, to = SCHEMA_VERSION, "Migrated store schema");
    Ok(())
}

/// Create both collections and stamp the schema version
fn init_schema(tx: &Transaction<'_>) -> rusqlite::Result<()> {
    tx.execute_batch(
        r#"
        -- Schema version tracking
        CREATE TABLE IF NOT EXISTS schema_info (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        );

        -- Single-slot draft storage (keyed, JSON values)
        CREATE TABLE IF NOT EXISTS draft (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        );

        -- Queued submissions (append log, ids never reused)
        CREATE TABLE IF NOT EXISTS outbox (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            value TEXT NOT NULL
        );
        "#,
    )?;

    tx.execute(
        "INSERT OR REPLACE INTO schema_info (key, value) VALUES ('version', ?)",
        [SCHEMA_VERSION.to_string()],
    )?;

    Ok(())
}

/// Get the current schema version from the database
pub fn get_schema_version(conn: &Connection) -> rusqlite::Result<Option<i32>> {
    let table_exists = conn
        .prepare("SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_info'")?
        .exists([])?;

    if !table_exists {
        return Ok(None);
    }

    let mut stmt = conn.prepare("SELECT value FROM schema_info WHERE key = 'version'")?;
    let result: rusqlite::Result<String> = stmt.query_row([], |row| row.get(0));

    match result {
        Ok(version_str) => Ok(version_str.parse().ok()),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e),
    }
}
