//! Per-record rules.
//!
//! Every rule reads one [`MetricSnapshot`] and emits zero or more issues.
//! Rules are independent of each other. A missing or malformed field takes
//! a neutral default and never fails the record.

use serde_json::Value;

use super::issue::{Issue, IssueDetail};
use crate::core::snapshot::MetricSnapshot;

const UNKNOWN_TIME: &str = "Unknown Time";
const LOW_BATTERY_PERCENT: f64 = 20.0;

/// Bounds applied to persisted records.
#[derive(Debug, Clone, PartialEq)]
pub struct Thresholds {
    pub cpu_threshold: f64,
    pub memory_threshold: f64,
    pub disk_threshold: f64,
    pub cpu_freq_threshold: f64,
    /// Trailing stack frames kept for thread contention; `None` or `0`
    /// keeps the whole stack.
    pub include_stack_lines: Option<usize>,
    /// Minimum CPU percent for a top process to be reported. `None` reports
    /// every listed process.
    pub top_cpu_process_gate: Option<f64>,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            cpu_threshold: 1.0,
            memory_threshold: 5.0,
            disk_threshold: 50.0,
            cpu_freq_threshold: 1500.0,
            include_stack_lines: Some(10),
            top_cpu_process_gate: None,
        }
    }
}

/// Run every rule against one record.
pub fn evaluate(record: &MetricSnapshot, thresholds: &Thresholds) -> Vec<Issue> {
    let timestamp = record_timestamp(record);
    let mut issues = Vec::new();

    cpu_rule(record, thresholds, &timestamp, &mut issues);
    memory_rule(record, thresholds, &timestamp, &mut issues);
    thread_contention_rule(record, thresholds, &timestamp, &mut issues);
    top_cpu_process_rule(record, thresholds, &timestamp, &mut issues);
    top_memory_process_rule(record, thresholds, &timestamp, &mut issues);
    network_rule(record, &timestamp, &mut issues);
    power_rule(record, &timestamp, &mut issues);

    issues
}

fn cpu_rule(
    record: &MetricSnapshot,
    thresholds: &Thresholds,
    timestamp: &str,
    issues: &mut Vec<Issue>,
) {
    let usage = number_at(record, &["cpu_metrics", "cpu_usage_percent"]).unwrap_or(0.0);
    if usage > thresholds.cpu_threshold {
        issues.push(Issue::new(
            timestamp,
            format!("High CPU usage: {:.2}%", usage),
            IssueDetail::Cpu,
        ));
    }
}

fn memory_rule(
    record: &MetricSnapshot,
    thresholds: &Thresholds,
    timestamp: &str,
    issues: &mut Vec<Issue>,
) {
    let usage = memory_percent(record);
    if usage > thresholds.memory_threshold {
        issues.push(Issue::new(
            timestamp,
            format!("High memory usage: {:.2}%", usage),
            IssueDetail::Memory,
        ));
    }
}

/// Memory percent from `memory_metrics`, or from the deep metrics when the
/// primary field is zero or absent.
fn memory_percent(record: &MetricSnapshot) -> f64 {
    match number_at(record, &["memory_metrics", "memory_usage_percent"]) {
        Some(primary) if primary != 0.0 => primary,
        _ => deep_memory_percent(record).unwrap_or(0.0),
    }
}

pub(crate) fn deep_memory_percent(record: &MetricSnapshot) -> Option<f64> {
    number_at(record, &["memory_deep_metrics", "memory_usage", "percent"])
}

fn thread_contention_rule(
    record: &MetricSnapshot,
    thresholds: &Thresholds,
    timestamp: &str,
    issues: &mut Vec<Issue>,
) {
    let Some(threads) =
        value_at(record, &["thread_metrics", "thread_details"]).and_then(Value::as_array)
    else {
        return;
    };

    for thread in threads {
        if !is_blocking(thread.get("is_blocking")) {
            continue;
        }
        let stack = stack_frames(thread.get("stack_summary"));
        issues.push(Issue::new(
            timestamp,
            "Blocking thread detected",
            IssueDetail::ThreadContention {
                process_name: str_or(thread.get("process_name"), "UnknownProcess"),
                thread_name: str_or(thread.get("thread_name"), "UnknownThread"),
                stack_summary: truncate_stack(stack, thresholds.include_stack_lines),
            },
        ));
    }
}

fn top_cpu_process_rule(
    record: &MetricSnapshot,
    thresholds: &Thresholds,
    timestamp: &str,
    issues: &mut Vec<Issue>,
) {
    let Some(processes) =
        value_at(record, &["cpu_deep_metrics", "top_cpu_processes"]).and_then(Value::as_array)
    else {
        return;
    };
    log::debug!("Count of the top CPU processes: {}", processes.len());

    for process in processes {
        let cpu_percent = process.get("cpu_percent").and_then(Value::as_f64).unwrap_or(0.0);
        if thresholds.top_cpu_process_gate.is_some_and(|gate| cpu_percent <= gate) {
            continue;
        }
        let name = str_or(process.get("name"), "Unknown");
        issues.push(Issue::new(
            timestamp,
            format!("High CPU process: {} using {:.2}% CPU", name, cpu_percent),
            IssueDetail::CpuProcess {
                process_name: name,
                pid: pid_of(process),
                cpu_percent,
            },
        ));
    }
}

fn top_memory_process_rule(
    record: &MetricSnapshot,
    thresholds: &Thresholds,
    timestamp: &str,
    issues: &mut Vec<Issue>,
) {
    let Some(processes) =
        value_at(record, &["memory_deep_metrics", "top_memory_processes"]).and_then(Value::as_array)
    else {
        return;
    };

    for process in processes {
        let memory_percent = process
            .get("memory_percent")
            .and_then(Value::as_f64)
            .unwrap_or(0.0);
        if memory_percent <= thresholds.memory_threshold {
            continue;
        }
        let name = str_or(process.get("name"), "Unknown");
        issues.push(Issue::new(
            timestamp,
            format!("High Memory process: {} using {:.2}% Memory", name, memory_percent),
            IssueDetail::MemoryProcess {
                process_name: name,
                pid: pid_of(process),
                memory_percent,
            },
        ));
    }
}

/// Missing byte counters count as zero. A failed network probe is not
/// judged.
fn network_rule(record: &MetricSnapshot, timestamp: &str, issues: &mut Vec<Issue>) {
    if record.subsystem_error("network_metrics").is_some() {
        return;
    }

    let sent = number_at(record, &["network_metrics", "bytes_sent"]).unwrap_or(0.0);
    let received = number_at(record, &["network_metrics", "bytes_received"]).unwrap_or(0.0);
    if sent == 0.0 && received == 0.0 {
        issues.push(Issue::new(timestamp, "No network traffic detected", IssueDetail::Network));
    }
}

fn power_rule(record: &MetricSnapshot, timestamp: &str, issues: &mut Vec<Issue>) {
    // "N/A" readings (no battery) count as full and plugged in.
    let battery_percent =
        number_at(record, &["power_metrics", "battery_percent"]).unwrap_or(100.0);
    let plugged = is_plugged(value_at(record, &["power_metrics", "power_plugged"]));

    if battery_percent < LOW_BATTERY_PERCENT && !plugged {
        issues.push(Issue::new(
            timestamp,
            format!("Low battery: {}% and not plugged in", battery_percent),
            IssueDetail::Power { battery_percent },
        ));
    }
}

/// Absent and `"N/A"` mean plugged in; `null`, `false`, zero and empty
/// strings mean running on battery.
fn is_plugged(value: Option<&Value>) -> bool {
    match value {
        None => true,
        Some(Value::String(text)) if text == "N/A" => true,
        Some(Value::Bool(flag)) => *flag,
        Some(Value::Null) => false,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|n| n != 0.0),
        Some(Value::String(text)) => !text.is_empty(),
        Some(Value::Array(items)) => !items.is_empty(),
        Some(Value::Object(map)) => !map.is_empty(),
    }
}

/// Timestamp of the record, else the host clock reading stored with it.
fn record_timestamp(record: &MetricSnapshot) -> String {
    if !record.timestamp.is_empty() {
        return record.timestamp.clone();
    }
    value_at(record, &["system_info", "current_time"])
        .and_then(Value::as_str)
        .unwrap_or(UNKNOWN_TIME)
        .to_string()
}

/// `true`, or any casing of the string `"true"`. Everything else, including
/// `"Unknown"` from external processes, is not blocking.
pub fn is_blocking(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Bool(flag)) => *flag,
        Some(Value::String(text)) => text.eq_ignore_ascii_case("true"),
        _ => false,
    }
}

/// Keep the last `limit` frames; `None` or `0` keeps all.
pub fn truncate_stack(mut frames: Vec<String>, limit: Option<usize>) -> Vec<String> {
    match limit {
        Some(n) if n > 0 && frames.len() > n => frames.split_off(frames.len() - n),
        _ => frames,
    }
}

fn stack_frames(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(frames)) => frames
            .iter()
            .map(|frame| match frame {
                Value::String(text) => text.clone(),
                other => other.to_string(),
            })
            .collect(),
        Some(Value::String(text)) => vec![text.clone()],
        _ => Vec::new(),
    }
}

pub(crate) fn value_at<'a>(record: &'a MetricSnapshot, path: &[&str]) -> Option<&'a Value> {
    let (subsystem, rest) = path.split_first()?;
    rest.iter()
        .try_fold(record.subsystem(subsystem)?, |value, key| value.get(*key))
}

pub(crate) fn number_at(record: &MetricSnapshot, path: &[&str]) -> Option<f64> {
    value_at(record, path).and_then(Value::as_f64)
}

fn str_or(value: Option<&Value>, default: &str) -> String {
    value
        .and_then(Value::as_str)
        .unwrap_or(default)
        .to_string()
}

fn pid_of(process: &Value) -> Option<u32> {
    process
        .get("pid")
        .and_then(Value::as_u64)
        .and_then(|pid| u32::try_from(pid).ok())
}
