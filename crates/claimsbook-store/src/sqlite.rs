//! SQLite implementation of the Store trait.
//!
//! This is the primary storage backend. It uses rusqlite with bundled SQLite,
//! wrapped in async via tokio::spawn_blocking.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};

use claimsbook_core::{from_cbor, to_cbor, EventFilter, EventId, LogEntry};

use crate::error::{Result, StoreError};
use crate::migration::{self, now_millis};
use crate::state::{StateKey, StateWrite};
use crate::traits::{check_append, Commit, Snapshot, Store};

/// SQLite-based store implementation.
///
/// Thread-safe via internal Mutex. All operations use spawn_blocking
/// to avoid blocking the async runtime.
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open a SQLite database at the given path.
    ///
    /// Creates the file and runs migrations if it doesn't exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let mut conn = Connection::open(path)?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open an in-memory SQLite database.
    pub fn open_memory() -> Result<Self> {
        let mut conn = Connection::open_in_memory()?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run `f` against the connection on the blocking pool.
    async fn blocking<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = conn
                .lock()
                .map_err(|e| StoreError::Unavailable(format!("mutex poisoned: {e}")))?;
            f(&mut conn)
        })
        .await
        .map_err(|e| StoreError::Unavailable(format!("spawn_blocking failed: {e}")))?
    }
}

fn stored_block(conn: &Connection) -> Result<Option<u64>> {
    let block = conn
        .query_row("SELECT block FROM registry_meta WHERE id = 0", [], |row| {
            row.get::<_, i64>(0)
        })
        .optional()?;
    Ok(block.map(|b| b as u64))
}

fn head(conn: &Connection) -> Result<Option<(u64, EventId)>> {
    let row = conn
        .query_row(
            "SELECT seq, event_id FROM log_entries ORDER BY seq DESC LIMIT 1",
            [],
            |row| Ok((row.get::<_, i64>(0)?, row.get::<_, Vec<u8>>(1)?)),
        )
        .optional()?;

    match row {
        Some((seq, id)) => {
            let id = EventId::try_from(id.as_slice())
                .map_err(|_| StoreError::InvalidData(format!("event id at seq {seq}")))?;
            Ok(Some((seq as u64, id)))
        }
        None => Ok(None),
    }
}

/// Decode a stored entry and check it against its recorded id.
fn decode_entry(id: &[u8], body: &[u8]) -> Result<LogEntry> {
    let entry: LogEntry = from_cbor(body)?;
    if entry.compute_id()?.as_bytes().as_slice() != id {
        return Err(StoreError::InvalidData(format!(
            "entry {} does not match its stored id",
            entry.seq
        )));
    }
    Ok(entry)
}

/// SQLite integers are signed; a block bound past `i64::MAX` is clamped, which
/// selects the same entries since no stored block exceeds it.
fn block_bound(block: u64) -> Value {
    Value::Integer(i64::try_from(block).unwrap_or(i64::MAX))
}

fn write_row(conn: &Connection, block: u64, write: &StateWrite) -> Result<()> {
    let kind = write.key.kind();
    let key = write.key.key_bytes();
    match &write.value {
        Some(value) => conn.execute(
            "INSERT INTO state_rows (kind, key, value, block) VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(kind, key) DO UPDATE SET
                value = excluded.value,
                block = excluded.block",
            params![kind, key, value, block as i64],
        )?,
        None => conn.execute(
            "DELETE FROM state_rows WHERE kind = ?1 AND key = ?2",
            params![kind, key],
        )?,
    };
    Ok(())
}

/// Build the WHERE clause and parameters for an event filter.
fn filter_clause(filter: &EventFilter) -> (String, Vec<Value>) {
    let mut clauses = Vec::new();
    let mut values = Vec::new();

    if let Some(kinds) = &filter.kinds {
        if kinds.is_empty() {
            clauses.push("0".to_string());
        } else {
            let marks = vec!["?"; kinds.len()].join(", ");
            clauses.push(format!("kind IN ({marks})"));
            values.extend(kinds.iter().map(|k| Value::Text(k.name().to_string())));
        }
    }
    if let Some(from) = filter.from_block {
        clauses.push("block >= ?".to_string());
        values.push(block_bound(from));
    }
    if let Some(to) = filter.to_block {
        clauses.push("block <= ?".to_string());
        values.push(block_bound(to));
    }
    if let Some(from) = filter.from_time {
        clauses.push("timestamp >= ?".to_string());
        values.push(Value::Integer(from));
    }
    if let Some(to) = filter.to_time {
        clauses.push("timestamp <= ?".to_string());
        values.push(Value::Integer(to));
    }

    let clause = if clauses.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", clauses.join(" AND "))
    };
    (clause, values)
}

#[async_trait]
impl Store for SqliteStore {
    async fn commit(&self, commit: Commit) -> Result<()> {
        self.blocking(move |conn| {
            let tx = conn.transaction()?;

            check_append(stored_block(&tx)?, head(&tx)?, &commit)?;

            for write in &commit.writes {
                write_row(&tx, commit.block, write)?;
            }

            if let Some(entry) = &commit.entry {
                let id = entry.compute_id()?;
                let body = to_cbor(entry)?;
                tx.execute(
                    "INSERT INTO log_entries (seq, event_id, prev_id, block, timestamp, kind, body)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                    params![
                        entry.seq as i64,
                        id.as_bytes().as_slice(),
                        entry.prev.as_ref().map(|p| p.as_bytes().to_vec()),
                        entry.block as i64,
                        entry.timestamp,
                        entry.kind().name(),
                        body,
                    ],
                )?;
            }

            tx.execute(
                "INSERT INTO registry_meta (id, block, updated_at) VALUES (0, ?1, ?2)
                 ON CONFLICT(id) DO UPDATE SET
                    block = excluded.block,
                    updated_at = excluded.updated_at",
                params![commit.block as i64, now_millis()],
            )?;

            tx.commit()?;
            tracing::debug!(
                block = commit.block,
                rows = commit.writes.len(),
                seq = commit.entry.as_ref().map(|e| e.seq),
                "sqlite commit"
            );
            Ok(())
        })
        .await
    }

    async fn load_snapshot(&self) -> Result<Option<Snapshot>> {
        self.blocking(|conn| {
            let Some(block) = stored_block(conn)? else {
                return Ok(None);
            };

            let mut stmt = conn.prepare("SELECT kind, key, value FROM state_rows")?;
            let raw = stmt
                .query_map([], |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, Vec<u8>>(1)?,
                        row.get::<_, Vec<u8>>(2)?,
                    ))
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            let mut rows = BTreeMap::new();
            for (kind, key, value) in raw {
                rows.insert(StateKey::decode(&kind, &key)?, value);
            }
            Ok(Some(Snapshot { block, rows }))
        })
        .await
    }

    async fn get_entry(&self, seq: u64) -> Result<Option<LogEntry>> {
        self.blocking(move |conn| {
            let row = conn
                .query_row(
                    "SELECT event_id, body FROM log_entries WHERE seq = ?1",
                    params![seq as i64],
                    |row| Ok((row.get::<_, Vec<u8>>(0)?, row.get::<_, Vec<u8>>(1)?)),
                )
                .optional()?;
            row.map(|(id, body)| decode_entry(&id, &body)).transpose()
        })
        .await
    }

    async fn query_entries(&self, filter: &EventFilter) -> Result<Vec<LogEntry>> {
        let (clause, values) = filter_clause(filter);
        self.blocking(move |conn| {
            let sql = format!("SELECT event_id, body FROM log_entries {clause} ORDER BY seq");
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(params_from_iter(values.iter()), |row| {
                    Ok((row.get::<_, Vec<u8>>(0)?, row.get::<_, Vec<u8>>(1)?))
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            rows.iter()
                .map(|(id, body)| decode_entry(id, body))
                .collect()
        })
        .await
    }

    async fn head(&self) -> Result<Option<(u64, EventId)>> {
        self.blocking(|conn| head(conn)).await
    }

    async fn entry_count(&self) -> Result<u64> {
        self.blocking(|conn| {
            let count: i64 =
                conn.query_row("SELECT COUNT(*) FROM log_entries", [], |row| row.get(0))?;
            Ok(count as u64)
        })
        .await
    }
}
