//! # X-Road Cache
//!
//! Time-to-live caches for fetched service descriptions.
//!
//! All backends implement [`WsdlCache`] and are keyed by [`CacheKey`], a
//! SHA-256 digest of the logical URL. The TTL is fixed per backend at
//! construction.
//!
//! | Backend | Type | Expiry |
//! |---------|------|--------|
//! | `memory` | [`InMemoryCache`] | checked on read |
//! | `redis` | [`RedisCache`] | `SET .. EX` |
//! | `sqlite` | [`SqliteCache`] | `stored_at` filter in the read query |
//!
//! Construction failures are [`CacheError::Configuration`]. Read and write
//! failures are [`CacheError::Unavailable`]; callers treat those as a miss.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use bytes::Bytes;
//! use xroad_cache::{CacheKey, InMemoryCache, WsdlCache};
//!
//! # tokio_test::block_on(async {
//! let cache = InMemoryCache::new(Duration::from_secs(3600));
//! let key = CacheKey::for_url("https://ss.example/wsdl?serviceCode=getData");
//! cache.add(&key, Bytes::from_static(b"<definitions/>")).await.unwrap();
//! assert!(cache.get(&key).await.unwrap().is_some());
//! # });
//! ```

#![doc(html_root_url = "https://docs.rs/xroad-cache/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod error;
mod key;
mod memory;
mod redis_cache;
mod sqlite;

use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;

pub use error::{CacheError, CacheResult};
pub use key::{CacheKey, KEY_PREFIX};
pub use memory::InMemoryCache;
pub use redis_cache::RedisCache;
pub use sqlite::SqliteCache;

/// A boxed, sendable future.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Cache contract shared by every backend.
///
/// `add` overwrites any previous entry for the key; a `get` issued after
/// `add` returns sees the new payload. Expired and absent entries both
/// read as `Ok(None)`. Implementations must tolerate concurrent use.
pub trait WsdlCache: Send + Sync + 'static {
    /// Backend name used in logs and metric labels.
    fn name(&self) -> &'static str;

    /// TTL assigned at construction.
    fn ttl(&self) -> Duration;

    /// Reads a payload.
    fn get<'a>(&'a self, key: &'a CacheKey) -> BoxFuture<'a, CacheResult<Option<Bytes>>>;

    /// Stores a payload, replacing any previous one.
    fn add<'a>(&'a self, key: &'a CacheKey, payload: Bytes) -> BoxFuture<'a, CacheResult<()>>;
}

/// Which backend to build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheBackend {
    /// No caching.
    None,
    /// Process-local map.
    Memory,
    /// Redis at the given URL.
    Redis {
        /// Connection URL, e.g. `redis://127.0.0.1/`.
        url: String,
    },
    /// SQLite database file.
    Sqlite {
        /// Database path.
        path: PathBuf,
    },
}

/// Builds the configured backend. Returns `None` for [`CacheBackend::None`].
pub async fn open(backend: &CacheBackend, ttl: Duration) -> CacheResult<Option<Arc<dyn WsdlCache>>> {
    let cache: Arc<dyn WsdlCache> = match backend {
        CacheBackend::None => return Ok(None),
        CacheBackend::Memory => Arc::new(InMemoryCache::new(ttl)),
        CacheBackend::Redis { url } => Arc::new(RedisCache::connect(url, ttl).await?),
        CacheBackend::Sqlite { path } => Arc::new(SqliteCache::open(path, ttl)?),
    };
    Ok(Some(cache))
}
