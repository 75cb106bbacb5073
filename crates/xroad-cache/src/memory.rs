//! Process-local cache.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use bytes::Bytes;
use parking_lot::RwLock;

use crate::error::CacheResult;
use crate::key::CacheKey;
use crate::{BoxFuture, WsdlCache};

/// In-memory cache with a fixed TTL.
///
/// Expired entries are dropped lazily on read.
#[derive(Debug)]
pub struct InMemoryCache {
    entries: RwLock<HashMap<CacheKey, (Bytes, Instant)>>,
    ttl: Duration,
}

impl InMemoryCache {
    /// Creates an empty cache.
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    /// Number of stored entries, including expired ones not yet evicted.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Returns true if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    fn lookup(&self, key: &CacheKey) -> Option<Bytes> {
        {
            let entries = self.entries.read();
            match entries.get(key) {
                Some((payload, stored_at)) if stored_at.elapsed() < self.ttl => {
                    return Some(payload.clone());
                }
                Some(_) => {}
                None => return None,
            }
        }
        self.evict_if_expired(key);
        None
    }

    /// Removes `key` if its entry is still expired under the write lock.
    fn evict_if_expired(&self, key: &CacheKey) {
        let mut entries = self.entries.write();
        if entries
            .get(key)
            .is_some_and(|(_, stored_at)| stored_at.elapsed() >= self.ttl)
        {
            entries.remove(key);
        }
    }
}

impl WsdlCache for InMemoryCache {
    fn name(&self) -> &'static str {
        "memory"
    }

    fn ttl(&self) -> Duration {
        self.ttl
    }

    fn get<'a>(&'a self, key: &'a CacheKey) -> BoxFuture<'a, CacheResult<Option<Bytes>>> {
        Box::pin(async move { Ok(self.lookup(key)) })
    }

    fn add<'a>(&'a self, key: &'a CacheKey, payload: Bytes) -> BoxFuture<'a, CacheResult<()>> {
        Box::pin(async move {
            self.entries
                .write()
                .insert(key.clone(), (payload, Instant::now()));
            Ok(())
        })
    }
}
