//! Cache-aware service-description fetching.

use std::sync::Arc;

use bytes::Bytes;
use tracing::{debug, info, warn};
use xroad_cache::{CacheKey, WsdlCache};
use xroad_telemetry::metrics::{record_cache_error, record_cache_hit, record_cache_miss, record_fetch};

use crate::error::{WsdlError, WsdlResult};

/// Fetches service descriptions, consulting a [`WsdlCache`] first.
///
/// Cache failures never fail a load: a `get` error is treated as a miss and
/// an `add` error is logged and dropped.
#[derive(Clone)]
pub struct WsdlLoader {
    http: reqwest::Client,
    cache: Option<Arc<dyn WsdlCache>>,
}

impl WsdlLoader {
    /// Creates a loader without a cache.
    pub fn new(http: reqwest::Client) -> Self {
        Self { http, cache: None }
    }

    /// Attaches a cache.
    #[must_use]
    pub fn with_cache(mut self, cache: Arc<dyn WsdlCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Replaces the cache (or removes it).
    #[must_use]
    pub fn with_optional_cache(mut self, cache: Option<Arc<dyn WsdlCache>>) -> Self {
        self.cache = cache;
        self
    }

    /// The HTTP client used for fetches.
    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// Returns the document at `url`, from cache when possible.
    pub async fn load(&self, url: &str) -> WsdlResult<Bytes> {
        let Some(cache) = &self.cache else {
            return fetch(&self.http, url).await;
        };

        let key = CacheKey::for_url(url);
        match cache.get(&key).await {
            Ok(Some(payload)) => {
                debug!(url = %url, key = %key, backend = cache.name(), "wsdl cache hit");
                record_cache_hit(cache.name());
                return Ok(payload);
            }
            Ok(None) => {
                debug!(url = %url, key = %key, backend = cache.name(), "wsdl cache miss");
                record_cache_miss(cache.name());
            }
            Err(e) => {
                warn!(url = %url, key = %key, backend = cache.name(), error = %e, "wsdl cache unavailable, treating as miss");
                record_cache_error(cache.name(), "get");
                record_cache_miss(cache.name());
            }
        }

        let payload = fetch(&self.http, url).await?;

        if let Err(e) = cache.add(&key, payload.clone()).await {
            warn!(url = %url, key = %key, backend = cache.name(), error = %e, "failed to store wsdl in cache");
            record_cache_error(cache.name(), "add");
        }

        Ok(payload)
    }
}

impl std::fmt::Debug for WsdlLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WsdlLoader")
            .field("cache", &self.cache.as_ref().map(|c| c.name()))
            .finish_non_exhaustive()
    }
}

/// GETs `url`, failing on transport errors and non-2xx statuses.
pub(crate) async fn fetch(http: &reqwest::Client, url: &str) -> WsdlResult<Bytes> {
    info!(url = %url, "fetching service description");

    let response = http
        .get(url)
        .send()
        .await
        .map_err(|e| WsdlError::fetch(url, None, format!("request failed: {e}")))?;

    let status = response.status();
    record_fetch(status.as_u16());
    if !status.is_success() {
        return Err(WsdlError::fetch(
            url,
            Some(status.as_u16()),
            format!("server returned status {status}"),
        ));
    }

    response
        .bytes()
        .await
        .map_err(|e| WsdlError::fetch(url, Some(status.as_u16()), format!("failed to read body: {e}")))
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use xroad_cache::InMemoryCache;
    use xroad_test::fixtures::GET_DATA_WSDL;
    use xroad_test::{MockResponse, MockSecurityServer};

    use super::*;

    #[tokio::test]
    async fn test_load_without_cache() {
        let server = MockSecurityServer::start().await.unwrap();
        server.mock("GET", "/wsdl", MockResponse::xml(GET_DATA_WSDL));

        let loader = WsdlLoader::new(reqwest::Client::new());
        let url = format!("{}/wsdl?serviceCode=getData", server.url());
        let body = loader.load(&url).await.unwrap();

        assert_eq!(body, GET_DATA_WSDL.as_bytes());
    }

    #[tokio::test]
    async fn test_second_load_is_served_from_cache() {
        let server = MockSecurityServer::start().await.unwrap();
        server.mock("GET", "/wsdl", MockResponse::xml(GET_DATA_WSDL));

        let cache = Arc::new(InMemoryCache::new(Duration::from_secs(60)));
        let loader = WsdlLoader::new(reqwest::Client::new()).with_cache(cache.clone());
        let url = format!("{}/wsdl?serviceCode=getData", server.url());

        let first = loader.load(&url).await.unwrap();
        let second = loader.load(&url).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(server.requests_to("/wsdl").len(), 1);
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn test_non_success_status_is_fetch_error() {
        let server = MockSecurityServer::start().await.unwrap();
        server.mock("GET", "/wsdl", MockResponse::status(500));

        let loader = WsdlLoader::new(reqwest::Client::new());
        let err = loader.load(&format!("{}/wsdl", server.url())).await.unwrap_err();

        assert!(matches!(err, WsdlError::Fetch { status: Some(500), .. }));
    }

    struct BrokenCache;

    impl WsdlCache for BrokenCache {
        fn name(&self) -> &'static str {
            "broken"
        }

        fn ttl(&self) -> Duration {
            Duration::from_secs(1)
        }

        fn get<'a>(&'a self, _key: &'a CacheKey) -> xroad_cache::BoxFuture<'a, xroad_cache::CacheResult<Option<Bytes>>> {
            Box::pin(async { Err(xroad_cache::CacheError::unavailable("connection refused")) })
        }

        fn add<'a>(&'a self, _key: &'a CacheKey, _payload: Bytes) -> xroad_cache::BoxFuture<'a, xroad_cache::CacheResult<()>> {
            Box::pin(async { Err(xroad_cache::CacheError::unavailable("connection refused")) })
        }
    }

    #[tokio::test]
    async fn test_broken_cache_degrades_to_fetch() {
        let server = MockSecurityServer::start().await.unwrap();
        server.mock("GET", "/wsdl", MockResponse::xml(GET_DATA_WSDL));

        let loader = WsdlLoader::new(reqwest::Client::new()).with_cache(Arc::new(BrokenCache));
        let url = format!("{}/wsdl", server.url());

        assert_eq!(loader.load(&url).await.unwrap(), GET_DATA_WSDL.as_bytes());
        assert_eq!(loader.load(&url).await.unwrap(), GET_DATA_WSDL.as_bytes());
        assert_eq!(server.requests_to("/wsdl").len(), 2);
    }

    #[tokio::test]
    async fn test_failed_fetch_is_not_cached() {
        let server = MockSecurityServer::start().await.unwrap();
        server.mock("GET", "/wsdl", MockResponse::status(503));

        let cache = Arc::new(InMemoryCache::new(Duration::from_secs(60)));
        let loader = WsdlLoader::new(reqwest::Client::new()).with_cache(cache.clone());

        assert!(loader.load(&format!("{}/wsdl", server.url())).await.is_err());
        assert!(cache.is_empty());
    }
}
