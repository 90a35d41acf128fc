use std::path::PathBuf;
use std::time::Duration;

use perfscope::core::MonitorConfig;
use perfscope::error::PerfError;
use tempfile::TempDir;

#[test]
fn test_config_default() {
    let config = MonitorConfig::default();
    assert_eq!(config.metrics_file_path, PathBuf::from("system_metrics.json"));
    assert_eq!(config.cache_ttl(), Duration::from_secs(120));
    assert_eq!(config.persistence_interval(), Duration::from_secs(120));
    assert_eq!(config.include_stack_lines, Some(10));
    assert!(config.top_cpu_process_gate.is_none());
    assert!(!config.email_enabled);
}

#[test]
fn test_config_save_and_load_roundtrip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("config.json");

    let config = MonitorConfig {
        memory_threshold: 75.0,
        alert_recipients: vec!["ops@example.com".to_string()],
        top_cpu_process_gate: Some(20.0),
        ..Default::default()
    };
    config.save_to(&path).unwrap();

    assert_eq!(MonitorConfig::load_from(&path).unwrap(), config);
}

#[test]
fn test_config_missing_and_empty_files_use_defaults() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("missing.json");
    assert_eq!(MonitorConfig::load_from(&missing).unwrap(), MonitorConfig::default());

    let empty = dir.path().join("empty.json");
    std::fs::write(&empty, b"").unwrap();
    assert_eq!(MonitorConfig::load_from(&empty).unwrap(), MonitorConfig::default());
}

#[test]
fn test_derived_settings_follow_fields() {
    let config = MonitorConfig {
        cpu_threshold: 70.0,
        thread_cpu_time_threshold: 3.0,
        disk_io_sample_ms: 250,
        email_enabled: true,
        ..Default::default()
    };

    assert_eq!(config.thresholds().cpu_threshold, 70.0);
    let sweep = config.sweep_thresholds();
    assert_eq!(sweep.thread_cpu_time_secs, 3.0);
    assert_eq!(sweep.disk_io_sample_window, Duration::from_millis(250));
    assert!(config.alert_config().email_enabled);
}

#[test]
fn test_ensure_log_dir_creates_parent() {
    let dir = TempDir::new().unwrap();
    let config = MonitorConfig {
        metrics_file_path: dir.path().join("logs").join("metrics.json"),
        ..Default::default()
    };

    config.ensure_log_dir().unwrap();
    assert!(dir.path().join("logs").is_dir());
}

#[test]
fn test_ensure_log_dir_reports_config_error() {
    let dir = TempDir::new().unwrap();
    let blocker = dir.path().join("blocker");
    std::fs::write(&blocker, b"a file, not a directory").unwrap();

    let config = MonitorConfig {
        metrics_file_path: blocker.join("metrics.json"),
        ..Default::default()
    };

    match config.ensure_log_dir() {
        Err(PerfError::Config(_)) => {}
        other => panic!("expected a config error, got {:?}", other),
    }
}
