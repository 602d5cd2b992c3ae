use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

use quake_inventory::{
    AvailableResources, FetchError, FilterSet, Image, InventoryCache, InventoryError,
    QueryEngine, RemoteInventorySource, ResourceKind,
};

fn images(prefix: &str, count: usize) -> AvailableResources {
    AvailableResources {
        images: (0..count)
            .map(|n| Image {
                id: format!("{prefix}-{n}"),
                flavor: prefix.to_string(),
                category: "compute".to_string(),
                version: "1.0".to_string(),
            })
            .collect(),
        ..Default::default()
    }
}

/// Alternates between two distinct payloads on every fetch
struct AlternatingSource {
    calls: AtomicUsize,
}

#[async_trait]
impl RemoteInventorySource for AlternatingSource {
    async fn fetch(&self) -> Result<AvailableResources, FetchError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;
        if n % 2 == 0 {
            Ok(images("a", 50))
        } else {
            Ok(images("b", 75))
        }
    }

    fn source_name(&self) -> &'static str {
        "alternating"
    }
}

/// First fetch blocks until released; later fetches return immediately
struct GatedSource {
    calls: AtomicUsize,
    started: Notify,
    release: Notify,
}

#[async_trait]
impl RemoteInventorySource for GatedSource {
    async fn fetch(&self) -> Result<AvailableResources, FetchError> {
        if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
            self.started.notify_one();
            self.release.notified().await;
            Ok(images("old", 1))
        } else {
            Ok(images("new", 2))
        }
    }

    fn source_name(&self) -> &'static str {
        "gated"
    }
}

/// Never completes
struct HangingSource;

#[async_trait]
impl RemoteInventorySource for HangingSource {
    async fn fetch(&self) -> Result<AvailableResources, FetchError> {
        std::future::pending().await
    }

    fn source_name(&self) -> &'static str {
        "hanging"
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn readers_never_observe_mixed_snapshots() {
    let cache = Arc::new(InventoryCache::new(Arc::new(AlternatingSource {
        calls: AtomicUsize::new(0),
    })));
    cache.refresh(&CancellationToken::new()).await.unwrap();

    let writer = {
        let cache = Arc::clone(&cache);
        tokio::spawn(async move {
            let cancel = CancellationToken::new();
            for _ in 0..200 {
                cache.refresh(&cancel).await.unwrap();
            }
        })
    };

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let cache = Arc::clone(&cache);
            tokio::spawn(async move {
                for _ in 0..500 {
                    let snapshot = cache.read().unwrap();
                    let entries = snapshot.entries(ResourceKind::Image);
                    let prefix = entries[0].attribute("flavor").unwrap().into_owned();
                    let expected = if prefix == "a" { 50 } else { 75 };
                    assert_eq!(entries.len(), expected);
                    assert!(
                        entries
                            .iter()
                            .all(|d| d.attribute("flavor").as_deref() == Some(prefix.as_str()))
                    );
                    tokio::task::yield_now().await;
                }
            })
        })
        .collect();

    writer.await.unwrap();
    for reader in readers {
        reader.await.unwrap();
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn stale_overlapping_refresh_is_discarded() {
    let source = Arc::new(GatedSource {
        calls: AtomicUsize::new(0),
        started: Notify::new(),
        release: Notify::new(),
    });
    let cache = Arc::new(InventoryCache::new(source.clone()));

    let slow = {
        let cache = Arc::clone(&cache);
        tokio::spawn(async move { cache.refresh(&CancellationToken::new()).await })
    };
    source.started.notified().await;

    cache.refresh(&CancellationToken::new()).await.unwrap();
    assert_eq!(cache.generation(), Some(2));

    source.release.notify_one();
    slow.await.unwrap().unwrap();

    let snapshot = cache.read().unwrap();
    assert_eq!(snapshot.generation(), 2);
    assert_eq!(snapshot.entries(ResourceKind::Image)[0].id(), "new-0");
}

#[tokio::test]
async fn cancellation_reaches_in_flight_fetch() {
    let cache = Arc::new(InventoryCache::new(Arc::new(HangingSource)));
    let cancel = CancellationToken::new();

    let task = {
        let cache = Arc::clone(&cache);
        let cancel = cancel.clone();
        tokio::spawn(async move { cache.refresh(&cancel).await })
    };

    tokio::time::sleep(Duration::from_millis(10)).await;
    cancel.cancel();

    let result = tokio::time::timeout(Duration::from_secs(5), task)
        .await
        .expect("refresh did not observe cancellation")
        .unwrap();
    assert_eq!(result, Err(FetchError::Cancelled));
    assert_eq!(cache.read().unwrap_err(), InventoryError::Uninitialized);
}

#[tokio::test]
async fn evaluate_through_cache_requires_refresh() {
    let cache = InventoryCache::new(Arc::new(AlternatingSource {
        calls: AtomicUsize::new(0),
    }));
    let filters = FilterSet::new();

    assert_eq!(
        QueryEngine::evaluate_cache(&cache, ResourceKind::Image, &filters).unwrap_err(),
        InventoryError::Uninitialized
    );

    cache.refresh(&CancellationToken::new()).await.unwrap();
    let all = QueryEngine::evaluate_cache(&cache, ResourceKind::Image, &filters).unwrap();
    assert_eq!(all.len(), 50);
}
