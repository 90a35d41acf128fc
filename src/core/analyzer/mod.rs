//! Rule engine over persisted metrics, plus live sweeps.
//!
//! [`Analyzer::analyze`] streams the metrics log record by record, so a log
//! of any length is scanned without loading it. [`LiveSweep`] looks at the
//! running system instead of the log.

mod issue;
mod rules;
mod summary;
mod sweep;

pub use issue::{Issue, IssueDetail, IssueKind};
pub use rules::{is_blocking, truncate_stack, Thresholds};
pub use summary::{Finding, Severity, ThresholdSummary};
pub use sweep::{
    DiskCounters, LiveProbe, LiveSweep, PartitionUsage, ProcessMemory, SweepThresholds,
    SystemProbe,
};

use std::path::PathBuf;

use crate::core::metric_log::MetricLog;
use crate::core::snapshot::MetricSnapshot;
use crate::ui::report;

pub struct Analyzer {
    log: MetricLog,
    thresholds: Thresholds,
}

impl Analyzer {
    pub fn new(metrics_file: impl Into<PathBuf>, thresholds: Thresholds) -> Self {
        Self {
            log: MetricLog::new(metrics_file),
            thresholds,
        }
    }

    pub fn thresholds(&self) -> &Thresholds {
        &self.thresholds
    }

    /// Lazily evaluate every record of the log.
    ///
    /// An unreadable log yields nothing; the failure is logged.
    pub fn analyze(&self) -> impl Iterator<Item = Issue> + '_ {
        let records = match self.log.records() {
            Ok(records) => Some(records),
            Err(e) => {
                log::error!("Error opening metrics file {}: {}", self.log.path().display(), e);
                None
            }
        };

        records
            .into_iter()
            .flatten()
            .flat_map(move |record| rules::evaluate(&record, &self.thresholds))
    }

    /// Evaluate a single snapshot, typically a live one from the cache.
    pub fn analyze_snapshot(&self, snapshot: &MetricSnapshot) -> Vec<Issue> {
        rules::evaluate(snapshot, &self.thresholds)
    }

    /// Print every issue of the log and return them.
    pub fn generate_report(&self) -> Vec<Issue> {
        let issues: Vec<Issue> = self.analyze().collect();
        report::print_issues(&issues);
        issues
    }
}
