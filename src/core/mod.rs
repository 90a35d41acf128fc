// Core pipeline: sources, aggregation, caching, persistence and analysis

pub mod aggregator;
pub mod alerts;
pub mod analyzer;
pub mod cache;
pub mod config;
pub mod metric_log;
pub mod persistence;
pub mod snapshot;
pub mod sources;
pub mod suggestions;

// Re-export commonly used items
pub use aggregator::MetricAggregator;
pub use alerts::{AlertConfig, AlertManager, Mailer};
pub use analyzer::{Analyzer, Issue, IssueKind, LiveSweep};
pub use cache::MetricCache;
pub use config::MonitorConfig;
pub use metric_log::MetricLog;
pub use persistence::PersistenceLoop;
pub use snapshot::MetricSnapshot;
pub use sources::MetricSource;
