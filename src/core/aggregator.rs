//! Metric aggregation.
//!
//! Calls every registered [`MetricSource`] once per collection and merges the
//! results into one [`MetricSnapshot`]. Sources run concurrently on the
//! blocking pool under a shared timeout; a source that fails, panics or
//! times out contributes `{"error": ...}` under its own key and nothing else.

use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Map, Value};

use super::snapshot::{utc_timestamp, MetricSnapshot};
use super::sources::MetricSource;
use crate::error::PerfError;

pub const DEFAULT_SOURCE_TIMEOUT: Duration = Duration::from_secs(10);

pub struct MetricAggregator {
    sources: Vec<Arc<dyn MetricSource>>,
    source_timeout: Duration,
}

impl MetricAggregator {
    pub fn new(sources: Vec<Arc<dyn MetricSource>>) -> Self {
        Self::with_timeout(sources, DEFAULT_SOURCE_TIMEOUT)
    }

    pub fn with_timeout(sources: Vec<Arc<dyn MetricSource>>, source_timeout: Duration) -> Self {
        let mut unique: Vec<Arc<dyn MetricSource>> = Vec::with_capacity(sources.len());
        for source in sources {
            if let Some(pos) = unique.iter().position(|s| s.name() == source.name()) {
                log::warn!(
                    "Metric source '{}' registered twice; keeping the last one",
                    source.name()
                );
                unique.remove(pos);
            }
            unique.push(source);
        }

        Self {
            sources: unique,
            source_timeout,
        }
    }

    pub fn source_names(&self) -> Vec<&'static str> {
        self.sources.iter().map(|s| s.name()).collect()
    }

    /// Collect one snapshot from every source.
    ///
    /// Never fails: per-source problems are recorded inline.
    pub async fn collect(&self) -> MetricSnapshot {
        // All sources start together, so they share one deadline.
        let deadline = tokio::time::Instant::now() + self.source_timeout;
        let handles: Vec<_> = self
            .sources
            .iter()
            .map(|source| {
                let source = Arc::clone(source);
                let name = source.name();
                let task = tokio::task::spawn_blocking(move || source.produce_snapshot());
                (name, task)
            })
            .collect();

        let mut subsystems = Map::new();
        for (name, task) in handles {
            let payload = match tokio::time::timeout_at(deadline, task).await {
                Ok(Ok(Ok(payload))) => Value::Object(payload),
                Ok(Ok(Err(e))) => error_entry(name, &e.to_string()),
                Ok(Err(join_error)) => {
                    let reason = if join_error.is_panic() {
                        "source panicked".to_string()
                    } else {
                        join_error.to_string()
                    };
                    error_entry(name, &reason)
                }
                Err(_) => error_entry(
                    name,
                    &PerfError::SourceTimeout(name.to_string(), self.source_timeout).to_string(),
                ),
            };
            subsystems.insert(name.to_string(), payload);
        }

        log::debug!("Collected metrics from {} sources", subsystems.len());

        MetricSnapshot {
            timestamp: utc_timestamp(),
            subsystems,
        }
    }
}

fn error_entry(name: &str, description: &str) -> Value {
    log::warn!("Metric source '{}' failed: {}", name, description);
    json!({ "error": description })
}
