//! Cache and fetch counters.
//!
//! Recording is a no-op until the application installs a `metrics` recorder.

use metrics::{counter, describe_counter};

/// Cache hit counter.
pub const CACHE_HITS: &str = "xroad_wsdl_cache_hits_total";
/// Cache miss counter.
pub const CACHE_MISSES: &str = "xroad_wsdl_cache_misses_total";
/// Cache failure counter.
pub const CACHE_ERRORS: &str = "xroad_wsdl_cache_errors_total";
/// Service-description download counter.
pub const WSDL_FETCHES: &str = "xroad_wsdl_fetches_total";

/// Registers descriptions for the standard metrics.
pub fn describe_metrics() {
    describe_counter!(CACHE_HITS, "Service descriptions served from cache");
    describe_counter!(CACHE_MISSES, "Service-description lookups that missed the cache");
    describe_counter!(CACHE_ERRORS, "Cache backend failures treated as a miss");
    describe_counter!(WSDL_FETCHES, "Service-description downloads by HTTP status");
}

/// Records a cache hit.
pub fn record_cache_hit(backend: &'static str) {
    counter!(CACHE_HITS, "backend" => backend).increment(1);
}

/// Records a cache miss.
pub fn record_cache_miss(backend: &'static str) {
    counter!(CACHE_MISSES, "backend" => backend).increment(1);
}

/// Records a backend failure during `op` (`get` or `add`).
pub fn record_cache_error(backend: &'static str, op: &'static str) {
    counter!(CACHE_ERRORS, "backend" => backend, "op" => op).increment(1);
}

/// Records a service-description download.
pub fn record_fetch(status: u16) {
    counter!(WSDL_FETCHES, "status" => status.to_string()).increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_without_recorder() {
        describe_metrics();
        record_cache_hit("memory");
        record_cache_miss("memory");
        record_cache_error("redis", "get");
        record_fetch(200);
    }

    #[test]
    fn test_metric_names() {
        assert!(CACHE_HITS.ends_with("_total"));
        assert!(CACHE_MISSES.starts_with("xroad_wsdl_cache"));
        assert_ne!(CACHE_HITS, CACHE_ERRORS);
    }
}
