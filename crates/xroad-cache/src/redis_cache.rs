//! Redis cache.

use std::time::Duration;

use bytes::Bytes;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use tracing::debug;

use crate::error::{CacheError, CacheResult};
use crate::key::CacheKey;
use crate::{BoxFuture, WsdlCache};

/// Redis-backed cache using `SET .. EX` for expiry.
///
/// The connection manager reconnects on its own; clones share the
/// underlying multiplexed connection.
#[derive(Clone)]
pub struct RedisCache {
    conn: ConnectionManager,
    ttl: Duration,
}

impl std::fmt::Debug for RedisCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisCache").field("ttl", &self.ttl).finish_non_exhaustive()
    }
}

impl RedisCache {
    /// Connects to `url`. Fails fast if the URL is invalid or the server is unreachable.
    pub async fn connect(url: &str, ttl: Duration) -> CacheResult<Self> {
        let client = redis::Client::open(url)
            .map_err(|e| CacheError::configuration(format!("invalid redis url: {e}")))?;
        let conn = ConnectionManager::new(client)
            .await
            .map_err(|e| CacheError::configuration(format!("cannot connect to redis: {e}")))?;
        debug!(ttl_secs = ttl.as_secs(), "connected redis wsdl cache");
        Ok(Self { conn, ttl })
    }

    fn ttl_secs(&self) -> u64 {
        // redis rejects EX 0
        self.ttl.as_secs().max(1)
    }
}

impl WsdlCache for RedisCache {
    fn name(&self) -> &'static str {
        "redis"
    }

    fn ttl(&self) -> Duration {
        self.ttl
    }

    fn get<'a>(&'a self, key: &'a CacheKey) -> BoxFuture<'a, CacheResult<Option<Bytes>>> {
        Box::pin(async move {
            let mut conn = self.conn.clone();
            let payload: Option<Vec<u8>> = conn
                .get(key.as_str())
                .await
                .map_err(|e| CacheError::unavailable(e.to_string()))?;
            Ok(payload.map(Bytes::from))
        })
    }

    fn add<'a>(&'a self, key: &'a CacheKey, payload: Bytes) -> BoxFuture<'a, CacheResult<()>> {
        Box::pin(async move {
            let mut conn = self.conn.clone();
            conn.set_ex::<_, _, ()>(key.as_str(), payload.as_ref(), self.ttl_secs())
                .await
                .map_err(|e| CacheError::unavailable(e.to_string()))
        })
    }
}
