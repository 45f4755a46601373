//! SQLite-backed key-value cache.
//!
//! Opens the database with WAL pragmas so several edge workers on one host
//! can share a file, runs migrations, then serves `get`/`set` with expiry
//! timestamps stored next to each value.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use tokio_rusqlite::rusqlite::OptionalExtension;
use tokio_rusqlite::{Connection, params};

use super::{Error, KvCache, migrations};

const PRAGMAS: &str = "PRAGMA journal_mode=WAL;
     PRAGMA synchronous=NORMAL;
     PRAGMA temp_store=MEMORY;
     PRAGMA busy_timeout=5000;";

/// Fixed-width UTC timestamp so expiry comparisons work on the raw TEXT column.
fn timestamp(at: chrono::DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Cache database handle.
///
/// Wraps a tokio-rusqlite Connection that runs statements on a background
/// thread; clones share the connection.
#[derive(Clone, Debug)]
pub struct SqliteKvCache {
    pub(crate) conn: Connection,
}

impl SqliteKvCache {
    /// Open a database at the specified path.
    ///
    /// Creates the file if it doesn't exist, applies pragmas, and runs any
    /// pending migrations.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, Error> {
        let conn = Connection::open(path).await.map_err(|e| Error::Database(e.into()))?;
        Self::init(conn).await
    }

    /// Open an in-memory database for testing.
    pub async fn open_in_memory() -> Result<Self, Error> {
        let conn = Connection::open_in_memory()
            .await
            .map_err(|e| Error::Database(e.into()))?;
        Self::init(conn).await
    }

    async fn init(conn: Connection) -> Result<Self, Error> {
        conn.call(|conn| conn.execute_batch(PRAGMAS))
            .await
            .map_err(Error::Database)?;

        migrations::run(&conn).await?;

        Ok(Self { conn })
    }

    /// Delete expired entries.
    ///
    /// Returns the number of deleted entries.
    pub async fn purge_expired(&self) -> Result<u64, Error> {
        let now = timestamp(Utc::now());
        self.conn
            .call(move |conn| -> Result<u64, Error> {
                let count = conn.execute("DELETE FROM kv_entries WHERE expires_at <= ?1", params![now])?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }
}

#[async_trait]
impl KvCache for SqliteKvCache {
    async fn get(&self, key: &str) -> Result<Option<String>, Error> {
        let key = key.to_string();
        let now = timestamp(Utc::now());
        self.conn
            .call(move |conn| -> Result<Option<String>, Error> {
                let value = conn
                    .query_row(
                        "SELECT value FROM kv_entries WHERE key = ?1 AND expires_at > ?2",
                        params![key, now],
                        |row| row.get(0),
                    )
                    .optional()?;
                Ok(value)
            })
            .await
            .map_err(Error::from)
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), Error> {
        let ttl = chrono::Duration::from_std(ttl).map_err(|e| Error::InvalidInput(format!("ttl out of range: {e}")))?;
        let now = Utc::now();
        let (key, value) = (key.to_string(), value.to_string());
        let expires_at = now
            .checked_add_signed(ttl)
            .ok_or_else(|| Error::InvalidInput(format!("ttl out of range: {ttl}")))?;
        let (written_at, expires_at) = (timestamp(now), timestamp(expires_at));

        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT INTO kv_entries (key, value, written_at, expires_at)
                     VALUES (?1, ?2, ?3, ?4)
                     ON CONFLICT(key) DO UPDATE SET
                        value = excluded.value,
                        written_at = excluded.written_at,
                        expires_at = excluded.expires_at",
                    params![key, value, written_at, expires_at],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }
}
