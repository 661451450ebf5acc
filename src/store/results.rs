//! Persistent result store.
//!
//! Two namespaces keyed by `(version, target, trace)`:
//! - `traces` holds the symbolicated trace, written once
//! - `metrics` holds a request counter, only ever incremented
//!
//! The miss path writes both in one transaction so the counter never
//! loses an increment, even when two requests computed the same trace.

use super::transactions::execute_in_transaction;
use crate::parser::schema::{RequestKey, Trace};
use crate::utils::config::{STORE_BUSY_TIMEOUT, STORE_SCHEMA_VERSION};
use crate::utils::error::StorageError;
use log::{debug, info};
use parking_lot::Mutex;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Transaction};
use std::path::Path;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS traces (
    version TEXT NOT NULL,
    target  TEXT NOT NULL,
    trace   TEXT NOT NULL,
    frames  TEXT NOT NULL,
    PRIMARY KEY (version, target, trace)
);
CREATE TABLE IF NOT EXISTS metrics (
    version       TEXT NOT NULL,
    target        TEXT NOT NULL,
    trace         TEXT NOT NULL,
    request_count INTEGER NOT NULL,
    PRIMARY KEY (version, target, trace)
);
";

/// Key components, in prefix order
const KEY_COLUMNS: [&str; 3] = ["version", "target", "trace"];

/// Trace cache and request counters over SQLite
pub struct ResultStore {
    conn: Mutex<Connection>,
}

impl ResultStore {
    /// Open (or create) a store backed by a database file
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref();
        info!("Opening result store: {}", path.display());

        let conn = Connection::open(path)?;
        conn.busy_timeout(STORE_BUSY_TIMEOUT)?;
        let mode: String =
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
        debug!("Journal mode: {}", mode);

        Self::with_connection(conn)
    }

    /// Open a private in-memory store
    pub fn open_in_memory() -> Result<Self, StorageError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, StorageError> {
        migrate(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Exact-match lookup of a previously stored trace
    pub fn lookup(&self, key: &RequestKey) -> Result<Option<Trace>, StorageError> {
        let conn = self.conn.lock();
        let frames: Option<String> = conn
            .query_row(
                "SELECT frames FROM traces WHERE version = ?1 AND target = ?2 AND trace = ?3",
                params![key.version, key.target, key.trace],
                |row| row.get(0),
            )
            .optional()?;

        frames
            .map(|json| serde_json::from_str(&json).map_err(StorageError::from))
            .transpose()
    }

    /// Store the trace if absent and count the request, atomically
    ///
    /// **Public** - miss path of the pipeline
    ///
    /// # Returns
    /// The counter value after this request
    pub fn record_miss(&self, key: &RequestKey, trace: &Trace) -> Result<u64, StorageError> {
        let frames = serde_json::to_string(trace)?;
        let mut conn = self.conn.lock();

        execute_in_transaction(&mut conn, |tx| {
            let inserted = tx.execute(
                "INSERT INTO traces (version, target, trace, frames) VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT (version, target, trace) DO NOTHING",
                params![key.version, key.target, key.trace, frames],
            )?;
            if inserted == 0 {
                debug!("Trace already stored for {}", key);
            }
            increment_counter(tx, key)
        })
    }

    /// Count a request served from the cache
    ///
    /// # Returns
    /// The counter value after this request
    pub fn record_hit(&self, key: &RequestKey) -> Result<u64, StorageError> {
        let mut conn = self.conn.lock();
        execute_in_transaction(&mut conn, |tx| increment_counter(tx, key))
    }

    /// Current counter for a key, 0 when never requested
    pub fn count(&self, key: &RequestKey) -> Result<u64, StorageError> {
        let conn = self.conn.lock();
        let count: Option<i64> = conn
            .query_row(
                "SELECT request_count FROM metrics WHERE version = ?1 AND target = ?2 AND trace = ?3",
                params![key.version, key.target, key.trace],
                |row| row.get(0),
            )
            .optional()?;

        Ok(count.map_or(0, to_count))
    }

    /// All counters whose key starts with `prefix`
    ///
    /// `prefix` holds up to three key components (version, target, trace);
    /// extra components are ignored and an empty prefix matches everything.
    /// Rows come back in key order.
    pub fn scan_counters(&self, prefix: &[&str]) -> Result<Vec<(RequestKey, u64)>, StorageError> {
        let prefix = &prefix[..prefix.len().min(KEY_COLUMNS.len())];

        let mut sql = String::from("SELECT version, target, trace, request_count FROM metrics");
        if !prefix.is_empty() {
            let clauses: Vec<String> = KEY_COLUMNS
                .iter()
                .take(prefix.len())
                .enumerate()
                .map(|(i, column)| format!("{} = ?{}", column, i + 1))
                .collect();
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }
        sql.push_str(" ORDER BY version, target, trace");

        let conn = self.conn.lock();
        let mut stmt = conn.prepare(&sql)?;
        let counters = stmt
            .query_map(params_from_iter(prefix.iter()), |row| {
                Ok((
                    RequestKey {
                        version: row.get(0)?,
                        target: row.get(1)?,
                        trace: row.get(2)?,
                    },
                    to_count(row.get(3)?),
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        debug!("Scanned {} counters", counters.len());
        Ok(counters)
    }
}

fn migrate(conn: &Connection) -> Result<(), StorageError> {
    let version: i32 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;
    if version < STORE_SCHEMA_VERSION {
        debug!("Migrating result store schema {} -> {}", version, STORE_SCHEMA_VERSION);
        conn.execute_batch(SCHEMA)?;
        conn.pragma_update(None, "user_version", STORE_SCHEMA_VERSION)?;
    }
    Ok(())
}

fn increment_counter(tx: &Transaction, key: &RequestKey) -> Result<u64, StorageError> {
    let count: i64 = tx.query_row(
        "INSERT INTO metrics (version, target, trace, request_count) VALUES (?1, ?2, ?3, 1)
         ON CONFLICT (version, target, trace) DO UPDATE SET request_count = request_count + 1
         RETURNING request_count",
        params![key.version, key.target, key.trace],
        |row| row.get(0),
    )?;
    Ok(to_count(count))
}

fn to_count(value: i64) -> u64 {
    u64::try_from(value).unwrap_or(0)
}
