//! SQLite cache against a real database file.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use xroad_cache::{open, CacheBackend, CacheKey, SqliteCache, WsdlCache};

#[tokio::test]
async fn survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("wsdl-cache.db");
    let key = CacheKey::for_url("https://ss.example/wsdl?serviceCode=getData");

    {
        let cache = SqliteCache::open(&path, Duration::from_secs(3600)).unwrap();
        cache.add(&key, Bytes::from_static(b"<definitions/>")).await.unwrap();
    }

    let cache = SqliteCache::open(&path, Duration::from_secs(3600)).unwrap();
    assert_eq!(cache.get(&key).await.unwrap().unwrap(), "<definitions/>");
}

#[tokio::test]
async fn overwrite_keeps_latest() {
    let dir = tempfile::tempdir().unwrap();
    let backend = CacheBackend::Sqlite {
        path: dir.path().join("cache.db"),
    };
    let cache = open(&backend, Duration::from_secs(3600)).await.unwrap().unwrap();
    let key = CacheKey::for_url("https://ss.example/wsdl?serviceCode=getData");

    cache.add(&key, Bytes::from_static(b"v1")).await.unwrap();
    cache.add(&key, Bytes::from_static(b"v2")).await.unwrap();
    assert_eq!(cache.get(&key).await.unwrap().unwrap(), "v2");
}

#[tokio::test]
async fn entries_expire() {
    let dir = tempfile::tempdir().unwrap();
    let cache = SqliteCache::open(dir.path().join("cache.db"), Duration::from_millis(50)).unwrap();
    let key = CacheKey::for_url("https://ss.example/wsdl?serviceCode=getData");

    cache.add(&key, Bytes::from_static(b"v1")).await.unwrap();
    assert!(cache.get(&key).await.unwrap().is_some());

    tokio::time::sleep(Duration::from_millis(120)).await;
    assert!(cache.get(&key).await.unwrap().is_none());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_writers() {
    let dir = tempfile::tempdir().unwrap();
    let cache = Arc::new(SqliteCache::open(dir.path().join("cache.db"), Duration::from_secs(3600)).unwrap());

    let mut tasks = Vec::new();
    for i in 0..16 {
        let cache = Arc::clone(&cache);
        tasks.push(tokio::spawn(async move {
            let key = CacheKey::for_url(&format!("https://ss.example/wsdl?serviceCode=s{}", i % 4));
            cache.add(&key, Bytes::from(format!("payload-{i}"))).await.unwrap();
            cache.get(&key).await.unwrap().is_some()
        }));
    }

    for task in tasks {
        assert!(task.await.unwrap());
    }
}
