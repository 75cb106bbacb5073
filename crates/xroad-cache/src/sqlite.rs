//! Embedded SQLite cache.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use chrono::Utc;
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::debug;

use crate::error::{CacheError, CacheResult};
use crate::key::CacheKey;
use crate::{BoxFuture, WsdlCache};

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS wsdl_cache (
    key TEXT PRIMARY KEY,
    payload BLOB NOT NULL,
    stored_at INTEGER NOT NULL
)";

/// SQLite-backed cache.
///
/// Expiry is enforced in the read query against `stored_at`. All access goes
/// through one connection guarded by a mutex, so concurrent writers are
/// serialised.
#[derive(Debug, Clone)]
pub struct SqliteCache {
    conn: Arc<Mutex<Connection>>,
    ttl: Duration,
}

impl SqliteCache {
    /// Opens (or creates) the cache database at `path`.
    pub fn open(path: impl AsRef<Path>, ttl: Duration) -> CacheResult<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path).map_err(|e| {
            CacheError::configuration(format!("cannot open {}: {e}", path.display()))
        })?;
        debug!(path = %path.display(), "opened sqlite wsdl cache");
        Self::with_connection(conn, ttl)
    }

    /// Creates a cache in a private in-memory database.
    pub fn in_memory(ttl: Duration) -> CacheResult<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| CacheError::configuration(format!("cannot open in-memory database: {e}")))?;
        Self::with_connection(conn, ttl)
    }

    fn with_connection(conn: Connection, ttl: Duration) -> CacheResult<Self> {
        conn.execute(SCHEMA, [])
            .map_err(|e| CacheError::configuration(format!("cannot create cache table: {e}")))?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            ttl,
        })
    }

    fn ttl_millis(&self) -> i64 {
        i64::try_from(self.ttl.as_millis()).unwrap_or(i64::MAX)
    }

    async fn blocking<T, F>(&self, op: F) -> CacheResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> rusqlite::Result<T> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let conn = conn.lock();
            op(&conn)
        })
        .await
        .map_err(|e| CacheError::unavailable(format!("sqlite task failed: {e}")))?
        .map_err(|e| CacheError::unavailable(e.to_string()))
    }
}

impl WsdlCache for SqliteCache {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn ttl(&self) -> Duration {
        self.ttl
    }

    fn get<'a>(&'a self, key: &'a CacheKey) -> BoxFuture<'a, CacheResult<Option<Bytes>>> {
        let key = key.as_str().to_string();
        let ttl = self.ttl_millis();
        Box::pin(async move {
            let payload = self
                .blocking(move |conn| {
                    conn.query_row(
                        "SELECT payload FROM wsdl_cache WHERE key = ?1 AND stored_at + ?2 > ?3",
                        params![key, ttl, Utc::now().timestamp_millis()],
                        |row| row.get::<_, Vec<u8>>(0),
                    )
                    .optional()
                })
                .await?;
            Ok(payload.map(Bytes::from))
        })
    }

    fn add<'a>(&'a self, key: &'a CacheKey, payload: Bytes) -> BoxFuture<'a, CacheResult<()>> {
        let key = key.as_str().to_string();
        Box::pin(async move {
            self.blocking(move |conn| {
                conn.execute(
                    "INSERT OR REPLACE INTO wsdl_cache (key, payload, stored_at) VALUES (?1, ?2, ?3)",
                    params![key, payload.as_ref(), Utc::now().timestamp_millis()],
                )
                .map(|_| ())
            })
            .await
        })
    }
}
