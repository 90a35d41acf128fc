//! TTL cache in front of the aggregator.
//!
//! One async mutex covers the whole decide-and-collect sequence: the first
//! caller after expiry collects while holding the lock, and callers queued
//! behind it wake up to a fresh entry and return it without collecting.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;

use super::aggregator::MetricAggregator;
use super::snapshot::MetricSnapshot;

struct CacheEntry {
    snapshot: Arc<MetricSnapshot>,
    collected_at: Instant,
}

impl CacheEntry {
    fn is_fresh(&self, ttl: Duration) -> bool {
        self.collected_at.elapsed() <= ttl
    }
}

pub struct MetricCache {
    aggregator: Arc<MetricAggregator>,
    ttl: Duration,
    entry: Mutex<Option<CacheEntry>>,
    collections: AtomicU64,
}

impl MetricCache {
    pub fn new(aggregator: Arc<MetricAggregator>, ttl: Duration) -> Self {
        Self {
            aggregator,
            ttl,
            entry: Mutex::new(None),
            collections: AtomicU64::new(0),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Return the cached snapshot, collecting a new one first if there is
    /// none or it is older than the TTL.
    pub async fn get_or_refresh(&self) -> Arc<MetricSnapshot> {
        let mut entry = self.entry.lock().await;

        if let Some(current) = entry.as_ref().filter(|e| e.is_fresh(self.ttl)) {
            log::debug!(
                "Returning cached metrics ({:?} old)",
                current.collected_at.elapsed()
            );
            return Arc::clone(&current.snapshot);
        }

        let snapshot = Arc::new(self.aggregator.collect().await);
        self.collections.fetch_add(1, Ordering::Relaxed);
        *entry = Some(CacheEntry {
            snapshot: Arc::clone(&snapshot),
            collected_at: Instant::now(),
        });

        snapshot
    }

    /// Snapshot currently held, without refreshing. `None` before the first
    /// collection or while a collection holds the lock.
    pub fn peek(&self) -> Option<Arc<MetricSnapshot>> {
        let entry = self.entry.try_lock().ok()?;
        entry.as_ref().map(|e| Arc::clone(&e.snapshot))
    }

    /// Number of collections performed through this cache.
    pub fn collections(&self) -> u64 {
        self.collections.load(Ordering::Relaxed)
    }
}
