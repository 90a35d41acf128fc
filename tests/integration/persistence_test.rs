use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use perfscope::core::alerts::ALERT_SUBJECT;
use perfscope::core::analyzer::{Analyzer, IssueKind, Thresholds};
use perfscope::core::{
    AlertConfig, AlertManager, Mailer, MetricAggregator, MetricLog, PersistenceLoop,
};
use perfscope::error::Result;
use serde_json::json;
use tempfile::TempDir;

use super::common::{shared, FailingSource, FakeSource};

fn persistence_with(
    log: MetricLog,
    interval: Duration,
) -> (PersistenceLoop, Arc<std::sync::atomic::AtomicUsize>) {
    let cpu = FakeSource::new("cpu_metrics", json!({"cpu_usage_percent": 45.2}));
    let calls = cpu.counter();
    let network = FakeSource::new(
        "network_metrics",
        json!({"bytes_sent": 4096, "bytes_received": 8192}),
    );
    let aggregator = Arc::new(MetricAggregator::new(vec![
        shared(cpu),
        shared(network),
        shared(FailingSource("gpu_metrics")),
    ]));
    let persistence = PersistenceLoop::new(
        aggregator,
        log,
        Thresholds::default(),
        AlertManager::new(AlertConfig::default()),
        interval,
    );
    (persistence, calls)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_loop_appends_records_until_stopped() {
    let dir = TempDir::new().unwrap();
    let log = MetricLog::new(dir.path().join("metrics.json"));
    let (persistence, calls) = persistence_with(log.clone(), Duration::from_millis(30));

    assert!(persistence.start());
    tokio::time::sleep(Duration::from_millis(200)).await;
    persistence.stop().await;

    assert!(!persistence.is_running());
    let written = persistence.iterations();
    assert!(written >= 2, "only {} iterations", written);

    // No background work after stop() returned.
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(persistence.iterations(), written);
    assert_eq!(calls.load(Ordering::SeqCst) as u64, written);

    let records: Vec<_> = log.records().unwrap().collect();
    assert_eq!(records.len() as u64, written);
    for record in &records {
        assert!(record.timestamp.ends_with('Z'));
        assert!(record.subsystem_error("gpu_metrics").is_some());
        assert_eq!(record.subsystem("cpu_metrics").unwrap()["cpu_usage_percent"], json!(45.2));
    }
    assert!(records.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_start_twice_is_noop() {
    let dir = TempDir::new().unwrap();
    let (persistence, _) =
        persistence_with(MetricLog::new(dir.path().join("metrics.json")), Duration::from_secs(60));

    assert!(persistence.start());
    assert!(!persistence.start());
    assert!(persistence.is_running());
    persistence.stop().await;

    // Stopping again has nothing to wait for.
    persistence.stop().await;
    assert_eq!(persistence.iterations(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_write_failure_keeps_loop_alive() {
    let dir = TempDir::new().unwrap();
    // The parent directory does not exist, so every append fails.
    let log = MetricLog::new(dir.path().join("missing").join("metrics.json"));
    let (persistence, calls) = persistence_with(log, Duration::from_millis(20));

    persistence.start();
    tokio::time::sleep(Duration::from_millis(150)).await;
    assert!(persistence.is_running());
    persistence.stop().await;

    assert!(calls.load(Ordering::SeqCst) >= 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_persisted_records_feed_the_analyzer() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("metrics.json");
    let (persistence, _) = persistence_with(MetricLog::new(&path), Duration::from_secs(60));

    persistence.start();
    persistence.stop().await;

    let issues: Vec<_> = Analyzer::new(&path, Thresholds::default()).analyze().collect();
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].kind(), IssueKind::Cpu);
    assert_eq!(issues[0].message, "High CPU usage: 45.20%");
}

/// Mailer that keeps every (subject, body, recipients) it was given.
#[derive(Default)]
struct RecordingMailer {
    sent: Mutex<Vec<(String, String, Vec<String>)>>,
}

impl Mailer for RecordingMailer {
    fn send(&self, subject: &str, body: &str, recipients: &[String]) -> Result<()> {
        self.sent
            .lock()
            .push((subject.to_string(), body.to_string(), recipients.to_vec()));
        Ok(())
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_summary_breach_is_mailed() {
    let dir = TempDir::new().unwrap();
    let memory = FakeSource::new(
        "memory_deep_metrics",
        json!({"memory_usage": {"percent": 91.0}}),
    );
    let aggregator = Arc::new(MetricAggregator::new(vec![shared(memory)]));

    let mailer = Arc::new(RecordingMailer::default());
    let alerts = AlertManager::new(AlertConfig {
        email_enabled: true,
        recipients: vec!["ops@example.com".to_string()],
    })
    .with_mailer(mailer.clone());

    let persistence = PersistenceLoop::new(
        aggregator,
        MetricLog::new(dir.path().join("metrics.json")),
        Thresholds {
            memory_threshold: 80.0,
            ..Thresholds::default()
        },
        alerts,
        Duration::from_secs(60),
    );

    persistence.start();
    persistence.stop().await;

    let sent = mailer.sent.lock();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, ALERT_SUBJECT);
    assert_eq!(sent[0].1, "System Alert: High memory usage detected: 91.00%");
    assert_eq!(sent[0].2, vec!["ops@example.com".to_string()]);
}
