use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use perfscope::core::{MetricAggregator, MetricCache};
use serde_json::json;

use super::common::{shared, FakeSource};

fn slow_cache(ttl: Duration) -> (Arc<MetricCache>, Arc<std::sync::atomic::AtomicUsize>) {
    let source = FakeSource::new("cpu_metrics", json!({"cpu_usage_percent": 5.0}))
        .slow(Duration::from_millis(150));
    let calls = source.counter();
    let aggregator = Arc::new(MetricAggregator::new(vec![shared(source)]));
    (Arc::new(MetricCache::new(aggregator, ttl)), calls)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_callers_share_one_collection() {
    let (cache, calls) = slow_cache(Duration::from_secs(60));

    let handles: Vec<_> = (0..16)
        .map(|_| {
            let cache = Arc::clone(&cache);
            tokio::spawn(async move { cache.get_or_refresh().await })
        })
        .collect();

    let mut snapshots = Vec::new();
    for handle in handles {
        snapshots.push(handle.await.unwrap());
    }

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(cache.collections(), 1);
    assert!(snapshots.iter().all(|s| Arc::ptr_eq(s, &snapshots[0])));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_fresh_entry_is_served_without_collecting() {
    let (cache, calls) = slow_cache(Duration::from_secs(60));

    let first = cache.get_or_refresh().await;
    let second = cache.get_or_refresh().await;

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_expired_entry_is_recollected() {
    let (cache, calls) = slow_cache(Duration::from_millis(50));

    let first = cache.get_or_refresh().await;
    tokio::time::sleep(Duration::from_millis(120)).await;
    let second = cache.get_or_refresh().await;

    assert!(!Arc::ptr_eq(&first, &second));
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    // Later collections never carry an older timestamp.
    assert!(second.timestamp >= first.timestamp);
}
