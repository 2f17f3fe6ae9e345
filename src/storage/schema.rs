//! Database schema definitions.

use rusqlite::Connection;

use crate::storage::StorageError;

/// SQL statement for creating the events table.
///
/// `id` is assigned by SQLite and strictly increasing in insertion order;
/// AUTOINCREMENT prevents id reuse after deletion. `event_type` holds the
/// upstream kind tag and `event_time` the collection timestamp in epoch
/// seconds.
pub const EVENTS_TABLE_DDL: &str = r#"
CREATE TABLE IF NOT EXISTS events (
    id         INTEGER PRIMARY KEY AUTOINCREMENT,
    repo_name  TEXT NOT NULL,
    event_type TEXT NOT NULL,
    event_time INTEGER NOT NULL
);
"#;

/// Index backing the count query's repository + time-range filter.
pub const EVENTS_INDEX_DDL: &str = r#"
CREATE INDEX IF NOT EXISTS idx_events_repo_time ON events (repo_name, event_time);
"#;

/// Initialize the database schema.
///
/// Idempotent: safe to run on every startup against an existing store.
/// Also switches the database to WAL mode so pooled readers never block on,
/// or observe part of, the writer's batch transactions.
pub fn init_schema(conn: &Connection) -> Result<(), StorageError> {
    // journal_mode returns a result row, so pragma_update cannot be used.
    conn.query_row("PRAGMA journal_mode = WAL", [], |_| Ok(()))?;
    conn.pragma_update(None, "synchronous", "NORMAL")?;
    conn.execute_batch(EVENTS_TABLE_DDL)?;
    conn.execute_batch(EVENTS_INDEX_DDL)?;

    tracing::info!("Database schema initialized");
    Ok(())
}
