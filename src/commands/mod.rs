// Command handlers module
pub mod analyze;
pub mod config;
pub mod run;
pub mod snapshot;
pub mod suggest;
pub mod sweep;
pub mod version;

use std::sync::Arc;

use anyhow::{Context, Result};

use crate::core::sources::default_sources;
use crate::core::{MetricAggregator, MonitorConfig};

/// Multi-threaded runtime for the async pipeline.
pub(crate) fn build_runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_time()
        .thread_name("perfscope-worker")
        .build()
        .context("Failed to start async runtime")
}

/// Aggregator over every built-in source, configured from `config`.
pub(crate) fn build_aggregator(config: &MonitorConfig) -> Arc<MetricAggregator> {
    Arc::new(MetricAggregator::with_timeout(
        default_sources(config),
        config.source_timeout(),
    ))
}
