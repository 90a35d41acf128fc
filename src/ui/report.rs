//! Terminal rendering of snapshots, issues and suggestions.

use colored::*;
use humansize::{format_size, BINARY};
use serde_json::Value;

use crate::core::analyzer::{Issue, IssueDetail};
use crate::core::snapshot::MetricSnapshot;
use crate::core::suggestions::{Suggestion, SuggestionStatus};

/// Print one line per issue; thread contention also gets its process,
/// thread and stack.
pub fn print_issues(issues: &[Issue]) {
    if issues.is_empty() {
        println!("{}", "No performance issues detected.".green().bold());
        return;
    }

    println!("{}\n", "Performance Issues Detected:".red().bold());
    for issue in issues {
        println!("{}", issue_line(issue));

        if let IssueDetail::ThreadContention {
            process_name,
            thread_name,
            stack_summary,
        } = &issue.detail
        {
            println!("    Process: {}", process_name);
            println!("    Thread : {}", thread_name);
            println!("    Stack  :");
            for frame in stack_summary {
                println!("        {}", frame.dimmed());
            }
            println!();
        }
    }
}

/// `[timestamp] - [type] message`
pub fn issue_line(issue: &Issue) -> String {
    format!(
        "[{}] - [{}] {}",
        issue.timestamp.dimmed(),
        issue.kind().to_string().yellow(),
        issue.message
    )
}

pub fn print_suggestions(suggestions: &[Suggestion]) {
    if suggestions.is_empty() {
        println!("{}", "Nothing to optimize.".green());
        return;
    }

    for suggestion in suggestions {
        let marker = match suggestion.status {
            SuggestionStatus::Success => "✓".green().bold(),
            SuggestionStatus::Error => "✗".red().bold(),
        };
        println!("{} {}", marker, suggestion.message);
        if let Some(original) = &suggestion.original_message {
            println!("    {} {}", "from:".dimmed(), original.dimmed());
        }
    }
}

/// Short human-readable overview of a snapshot.
pub fn print_snapshot_overview(snapshot: &MetricSnapshot) {
    println!("\n{}", "METRIC SNAPSHOT".bold().bright_cyan());
    println!("{}", "=".repeat(60));
    println!("{:<14} {}", "Collected:".bold(), snapshot.timestamp);

    if let Some(cpu) = healthy(snapshot, "cpu_metrics") {
        println!(
            "{:<14} {}",
            "CPU:".bold(),
            percent_of(cpu, "cpu_usage_percent")
        );
    }

    if let Some(memory) = healthy(snapshot, "memory_metrics") {
        println!(
            "{:<14} {} of {} ({})",
            "Memory:".bold(),
            bytes_of(memory, "used_memory"),
            bytes_of(memory, "total_memory"),
            percent_of(memory, "memory_usage_percent")
        );
    }

    if let Some(usage) = healthy(snapshot, "disk_deep_metrics").and_then(|d| d.get("disk_usage")) {
        println!(
            "{:<14} {} of {} ({}) on {}",
            "Disk:".bold(),
            bytes_of(usage, "used"),
            bytes_of(usage, "total"),
            percent_of(usage, "percent"),
            usage.get("mountpoint").and_then(Value::as_str).unwrap_or("?")
        );
    }

    if let Some(network) = healthy(snapshot, "network_metrics") {
        println!(
            "{:<14} {} sent, {} received",
            "Network:".bold(),
            bytes_of(network, "bytes_sent"),
            bytes_of(network, "bytes_received")
        );
    }

    let failed: Vec<&str> = snapshot
        .subsystems
        .keys()
        .map(String::as_str)
        .filter(|name| snapshot.subsystem_error(name).is_some())
        .collect();
    if !failed.is_empty() {
        println!(
            "{:<14} {}",
            "Unavailable:".bold(),
            failed.join(", ").red()
        );
    }
    println!();
}

fn healthy<'a>(snapshot: &'a MetricSnapshot, name: &str) -> Option<&'a Value> {
    if snapshot.subsystem_error(name).is_some() {
        return None;
    }
    snapshot.subsystem(name)
}

fn bytes_of(value: &Value, key: &str) -> String {
    value
        .get(key)
        .and_then(Value::as_u64)
        .map(|bytes| format_size(bytes, BINARY))
        .unwrap_or_else(|| "N/A".to_string())
}

fn percent_of(value: &Value, key: &str) -> ColoredString {
    match value.get(key).and_then(Value::as_f64) {
        Some(p) if p >= 90.0 => format!("{:.1}%", p).red(),
        Some(p) if p >= 70.0 => format!("{:.1}%", p).yellow(),
        Some(p) => format!("{:.1}%", p).green(),
        None => "N/A".normal(),
    }
}
