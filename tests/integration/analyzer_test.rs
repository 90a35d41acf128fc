use std::io::Write;

use perfscope::core::analyzer::{Analyzer, IssueDetail, IssueKind, Thresholds};
use perfscope::core::snapshot::MetricSnapshot;
use perfscope::core::MetricLog;
use serde_json::{json, Value};
use tempfile::TempDir;

/// A record with the given subsystems; without `network_metrics` it shows
/// some traffic so the network rule stays quiet.
fn record(subsystems: Value) -> MetricSnapshot {
    let mut snapshot = bare_record(subsystems);
    if snapshot.subsystem("network_metrics").is_none() {
        snapshot.insert("network_metrics", json!({"bytes_sent": 512, "bytes_received": 2048}));
    }
    snapshot
}

fn bare_record(subsystems: Value) -> MetricSnapshot {
    let mut snapshot = MetricSnapshot::new("2024-03-01T12:00:00.000000Z".to_string());
    if let Value::Object(map) = subsystems {
        snapshot.subsystems = map;
    }
    snapshot
}

fn analyzer() -> Analyzer {
    Analyzer::new("unused.json", Thresholds::default())
}

#[test]
fn test_cpu_rule_formats_two_decimals() {
    let issues = analyzer().analyze_snapshot(&record(json!({
        "cpu_metrics": {"cpu_usage_percent": 45.2}
    })));

    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].kind(), IssueKind::Cpu);
    assert!(issues[0].message.contains("45.20%"));
    assert_eq!(issues[0].timestamp, "2024-03-01T12:00:00.000000Z");
}

#[test]
fn test_memory_rule_falls_back_to_deep_metrics() {
    let issues = analyzer().analyze_snapshot(&record(json!({
        "memory_metrics": {"memory_usage_percent": 0},
        "memory_deep_metrics": {"memory_usage": {"percent": 12.0}}
    })));

    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].kind(), IssueKind::Memory);
    assert_eq!(issues[0].message, "High memory usage: 12.00%");
}

#[test]
fn test_network_rule_only_fires_on_silence() {
    let silent = analyzer().analyze_snapshot(&record(json!({
        "network_metrics": {"bytes_sent": 0, "bytes_received": 0}
    })));
    assert_eq!(silent.len(), 1);
    assert_eq!(silent[0].message, "No network traffic detected");

    for traffic in [
        json!({"bytes_sent": 1, "bytes_received": 0}),
        json!({"bytes_sent": 0, "bytes_received": 7}),
    ] {
        let issues = analyzer().analyze_snapshot(&record(json!({ "network_metrics": traffic })));
        assert!(issues.iter().all(|i| i.kind() != IssueKind::Network));
    }
}

#[test]
fn test_network_rule_treats_missing_subsystem_as_silent() {
    let issues = analyzer().analyze_snapshot(&bare_record(json!({
        "cpu_metrics": {"cpu_usage_percent": 0.2}
    })));
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].kind(), IssueKind::Network);
    assert_eq!(issues[0].message, "No network traffic detected");
}

#[test]
fn test_network_rule_skips_failed_probe() {
    let issues = analyzer().analyze_snapshot(&bare_record(json!({
        "network_metrics": {"error": "Network metrics collection timed out"}
    })));
    assert!(issues.is_empty());
}

#[test]
fn test_thread_contention_coercion_and_truncation() {
    let stack: Vec<String> = (1..=15).map(|i| format!("frame {}", i)).collect();
    let issues = analyzer().analyze_snapshot(&record(json!({
        "thread_metrics": {"thread_details": [
            {
                "process_name": "app",
                "thread_name": "worker-1",
                "is_blocking": "True",
                "stack_summary": stack
            },
            {"process_name": "app", "thread_name": "worker-2", "is_blocking": "Unknown"},
            {"process_name": "app", "thread_name": "worker-3", "is_blocking": false},
            {"thread_name": "worker-4", "is_blocking": true},
            {"process_name": "app", "thread_name": "worker-5"}
        ]}
    })));

    assert_eq!(issues.len(), 2);
    match &issues[0].detail {
        IssueDetail::ThreadContention {
            process_name,
            thread_name,
            stack_summary,
        } => {
            assert_eq!(process_name, "app");
            assert_eq!(thread_name, "worker-1");
            assert_eq!(stack_summary.len(), 10);
            assert_eq!(stack_summary.first().unwrap(), "frame 6");
            assert_eq!(stack_summary.last().unwrap(), "frame 15");
        }
        other => panic!("unexpected detail {:?}", other),
    }
    match &issues[1].detail {
        IssueDetail::ThreadContention { process_name, .. } => {
            assert_eq!(process_name, "UnknownProcess")
        }
        other => panic!("unexpected detail {:?}", other),
    }
}

#[test]
fn test_full_stack_when_limit_unset() {
    let analyzer = Analyzer::new(
        "unused.json",
        Thresholds {
            include_stack_lines: None,
            ..Thresholds::default()
        },
    );
    let stack: Vec<String> = (0..25).map(|i| i.to_string()).collect();
    let issues = analyzer.analyze_snapshot(&record(json!({
        "thread_metrics": {"thread_details": [{"is_blocking": "true", "stack_summary": stack}]}
    })));

    match &issues[0].detail {
        IssueDetail::ThreadContention { stack_summary, .. } => assert_eq!(stack_summary.len(), 25),
        other => panic!("unexpected detail {:?}", other),
    }
}

#[test]
fn test_process_rules() {
    let issues = analyzer().analyze_snapshot(&record(json!({
        "cpu_deep_metrics": {"top_cpu_processes": [
            {"pid": 10, "name": "a", "cpu_percent": 0.0},
            {"pid": 11, "name": "b", "cpu_percent": 35.5}
        ]},
        "memory_deep_metrics": {"top_memory_processes": [
            {"pid": 20, "name": "small", "memory_percent": 2.0},
            {"pid": 21, "name": "big", "memory_percent": 9.25}
        ]}
    })));

    let kinds: Vec<IssueKind> = issues.iter().map(|i| i.kind()).collect();
    assert_eq!(
        kinds,
        vec![IssueKind::CpuProcess, IssueKind::CpuProcess, IssueKind::MemoryProcess]
    );
    assert_eq!(issues[2].message, "High Memory process: big using 9.25% Memory");
}

#[test]
fn test_log_scan_skips_bad_lines_and_partial_tail() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("system_metrics.json");
    let log = MetricLog::new(&path);

    log.append(&record(json!({"cpu_metrics": {"cpu_usage_percent": 45.2}})))
        .unwrap();
    {
        let mut file = std::fs::OpenOptions::new().append(true).open(&path).unwrap();
        file.write_all(b"{broken json\n").unwrap();
    }
    log.append(&record(json!({"network_metrics": {"bytes_sent": 0, "bytes_received": 0}})))
        .unwrap();
    {
        let mut file = std::fs::OpenOptions::new().append(true).open(&path).unwrap();
        file.write_all(b"{\"timestamp\":\"x\",\"cpu_metrics\":{\"cpu_usage_percent\":99")
            .unwrap();
    }

    let analyzer = Analyzer::new(&path, Thresholds::default());
    let kinds: Vec<IssueKind> = analyzer.analyze().map(|i| i.kind()).collect();
    assert_eq!(kinds, vec![IssueKind::Cpu, IssueKind::Network]);

    // Reporting is repeatable and returns what it printed.
    assert_eq!(analyzer.generate_report().len(), 2);
    assert_eq!(analyzer.generate_report().len(), 2);
}

#[test]
fn test_persisted_record_keeps_field_set() {
    let dir = TempDir::new().unwrap();
    let log = MetricLog::new(dir.path().join("metrics.json"));
    let original = record(json!({
        "cpu_metrics": {"cpu_usage_percent": 3},
        "gpu_metrics": {"error": "No supported GPU found"},
        "power_metrics": {"battery_percent": "N/A"}
    }));

    log.append(&original).unwrap();
    let read: Vec<_> = log.records().unwrap().collect();

    assert_eq!(read.len(), 1);
    let mut keys: Vec<_> = read[0].subsystems.keys().collect();
    keys.sort();
    assert_eq!(
        keys,
        vec!["cpu_metrics", "gpu_metrics", "network_metrics", "power_metrics"]
    );
    assert_eq!(read[0].timestamp, original.timestamp);
}
