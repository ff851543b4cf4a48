//! Database schema migrations for SQLite.
//!
//! Each migration is a SQL batch that moves the schema from version N to N+1.

use rusqlite::Connection;

use crate::error::{Result, StoreError};

/// Current schema version.
pub const CURRENT_VERSION: u32 = 1;

/// Initialize or migrate the database schema. Idempotent.
pub fn migrate(conn: &mut Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            applied_at INTEGER NOT NULL
        )",
        [],
    )?;

    let current: u32 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
        [],
        |row| row.get(0),
    )?;

    if current > CURRENT_VERSION {
        return Err(StoreError::Migration(format!(
            "database schema version {current} is newer than supported version {CURRENT_VERSION}"
        )));
    }

    if current < CURRENT_VERSION {
        let tx = conn.transaction()?;

        for version in (current + 1)..=CURRENT_VERSION {
            apply_migration(&tx, version)?;

            tx.execute(
                "INSERT INTO schema_migrations (version, applied_at) VALUES (?1, ?2)",
                rusqlite::params![version, now_millis()],
            )?;
        }

        tx.commit()?;
        tracing::debug!(from = current, to = CURRENT_VERSION, "migrated schema");
    }

    Ok(())
}

fn apply_migration(conn: &Connection, version: u32) -> Result<()> {
    match version {
        1 => apply_v1(conn),
        _ => Err(StoreError::Migration(format!(
            "unknown migration version: {}",
            version
        ))),
    }
}

/// Migration v1: state rows and event log.
fn apply_v1(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        -- Block of the last commit; at most one row
        CREATE TABLE registry_meta (
            id INTEGER PRIMARY KEY CHECK (id = 0),
            block INTEGER NOT NULL,
            updated_at INTEGER NOT NULL       -- local time of the commit
        );

        -- Registry state, one row per owner, role member, mask, claim,
        -- record and proof
        CREATE TABLE state_rows (
            kind TEXT NOT NULL,
            key BLOB NOT NULL,
            value BLOB NOT NULL,              -- CBOR-encoded state value
            block INTEGER NOT NULL,           -- block that last wrote the row
            PRIMARY KEY (kind, key)
        ) WITHOUT ROWID;

        -- Append-only event log
        CREATE TABLE log_entries (
            seq INTEGER PRIMARY KEY,          -- 1-based, contiguous
            event_id BLOB NOT NULL UNIQUE,    -- 32 bytes, Blake3 of the encoded entry
            prev_id BLOB,                     -- 32 bytes, NULL only for seq 1
            block INTEGER NOT NULL,
            timestamp INTEGER NOT NULL,       -- Unix ms
            kind TEXT NOT NULL,               -- event name
            body BLOB NOT NULL                -- CBOR of the entry
        );

        CREATE INDEX idx_log_entries_block ON log_entries(block);
        CREATE INDEX idx_log_entries_kind ON log_entries(kind);
        CREATE INDEX idx_log_entries_timestamp ON log_entries(timestamp);
        "#,
    )?;

    Ok(())
}

/// Current time in milliseconds; 0 if the clock is before the epoch.
pub(crate) fn now_millis() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}
