//! Coarse threshold checks run by the persistence loop on every fresh sample.

use std::fmt;

use serde::Serialize;

use super::rules::{deep_memory_percent, number_at, Thresholds};
use crate::core::snapshot::MetricSnapshot;

/// Info findings are only logged; warnings go to the alert manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum Severity {
    Info,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Finding {
    pub severity: Severity,
    pub message: String,
}

impl Finding {
    fn info(message: String) -> Self {
        Self {
            severity: Severity::Info,
            message,
        }
    }

    fn warning(message: String) -> Self {
        Self {
            severity: Severity::Warning,
            message,
        }
    }

    /// Whether the finding should be escalated to the alert manager.
    pub fn is_alertable(&self) -> bool {
        self.severity >= Severity::Warning
    }
}

/// Subsystems read by the summary.
const SUMMARY_SUBSYSTEMS: [&str; 3] = [
    "memory_deep_metrics",
    "cpu_deep_metrics",
    "disk_deep_metrics",
];

pub struct ThresholdSummary {
    thresholds: Thresholds,
}

impl ThresholdSummary {
    pub fn new(thresholds: Thresholds) -> Self {
        Self { thresholds }
    }

    pub fn evaluate(&self, snapshot: &MetricSnapshot) -> Vec<Finding> {
        let mut findings = Vec::new();

        for subsystem in SUMMARY_SUBSYSTEMS {
            if let Some(error) = snapshot.subsystem_error(subsystem) {
                findings.push(Finding::info(format!("{} unavailable: {}", subsystem, error)));
            }
        }

        let memory = summary_memory_percent(snapshot);
        if memory > self.thresholds.memory_threshold {
            findings.push(Finding::warning(format!(
                "High memory usage detected: {:.2}%",
                memory
            )));
        }

        // A host that does not report its frequency is not flagged.
        if let Some(freq) = number_at(snapshot, &["cpu_deep_metrics", "cpu_frequency", "current"]) {
            if freq > 0.0 && freq < self.thresholds.cpu_freq_threshold {
                findings.push(Finding::warning(format!(
                    "CPU frequency below threshold: {:.0} MHz",
                    freq
                )));
            }
        }

        if let Some(disk) = number_at(snapshot, &["disk_deep_metrics", "disk_usage", "percent"]) {
            if disk > self.thresholds.disk_threshold {
                findings.push(Finding::warning(format!("Disk usage high: {:.2}%", disk)));
            }
        }

        findings
    }
}

/// Deep memory percent, else the flat `memory_metrics` reading.
fn summary_memory_percent(snapshot: &MetricSnapshot) -> f64 {
    deep_memory_percent(snapshot)
        .or_else(|| number_at(snapshot, &["memory_metrics", "memory_usage_percent"]))
        .unwrap_or(0.0)
}
