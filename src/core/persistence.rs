//! Background persistence loop.
//!
//! Each iteration collects a fresh snapshot straight from the aggregator,
//! appends it to the metrics log, runs the threshold summary and escalates
//! its findings. The shutdown signal is only observed between iterations,
//! so an iteration in progress always completes.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use super::aggregator::MetricAggregator;
use super::alerts::AlertManager;
use super::analyzer::{ThresholdSummary, Thresholds};
use super::config::MonitorConfig;
use super::metric_log::MetricLog;

struct LoopContext {
    aggregator: Arc<MetricAggregator>,
    log: MetricLog,
    summary: ThresholdSummary,
    alerts: AlertManager,
    interval: Duration,
    iterations: AtomicU64,
}

struct RunningLoop {
    shutdown_tx: broadcast::Sender<()>,
    handle: JoinHandle<()>,
}

pub struct PersistenceLoop {
    context: Arc<LoopContext>,
    running: Mutex<Option<RunningLoop>>,
}

impl PersistenceLoop {
    pub fn new(
        aggregator: Arc<MetricAggregator>,
        log: MetricLog,
        thresholds: Thresholds,
        alerts: AlertManager,
        interval: Duration,
    ) -> Self {
        Self {
            context: Arc::new(LoopContext {
                aggregator,
                log,
                summary: ThresholdSummary::new(thresholds),
                alerts,
                interval,
                iterations: AtomicU64::new(0),
            }),
            running: Mutex::new(None),
        }
    }

    pub fn from_config(aggregator: Arc<MetricAggregator>, config: &MonitorConfig) -> Self {
        Self::new(
            aggregator,
            MetricLog::new(&config.metrics_file_path),
            config.thresholds(),
            AlertManager::new(config.alert_config()),
            config.persistence_interval(),
        )
    }

    pub fn interval(&self) -> Duration {
        self.context.interval
    }

    /// Completed iterations since construction.
    pub fn iterations(&self) -> u64 {
        self.context.iterations.load(Ordering::Relaxed)
    }

    pub fn is_running(&self) -> bool {
        self.running
            .lock()
            .as_ref()
            .is_some_and(|running| !running.handle.is_finished())
    }

    /// Spawn the loop on the current tokio runtime.
    ///
    /// Returns `false` without doing anything when the loop is already
    /// running.
    pub fn start(&self) -> bool {
        let mut running = self.running.lock();
        if running.as_ref().is_some_and(|r| !r.handle.is_finished()) {
            log::debug!("Persistence loop already running");
            return false;
        }

        let (shutdown_tx, shutdown_rx) = broadcast::channel::<()>(1);
        let handle = tokio::spawn(run(Arc::clone(&self.context), shutdown_rx));
        *running = Some(RunningLoop { shutdown_tx, handle });
        true
    }

    /// Signal the loop and wait until it has exited.
    pub async fn stop(&self) {
        let Some(running) = self.running.lock().take() else {
            return;
        };

        // Fails only if the task already exited and dropped its receiver.
        let _ = running.shutdown_tx.send(());
        if let Err(e) = running.handle.await {
            log::error!("Persistence loop ended abnormally: {}", e);
        }
    }
}

async fn run(context: Arc<LoopContext>, mut shutdown: broadcast::Receiver<()>) {
    log::info!(
        "Started background auto-save every {}s",
        context.interval.as_secs()
    );

    loop {
        context.iterate().await;

        tokio::select! {
            _ = tokio::time::sleep(context.interval) => {}
            _ = shutdown.recv() => break,
        }
    }

    log::info!("Stopped background auto-save.");
}

impl LoopContext {
    async fn iterate(&self) {
        let snapshot = Arc::new(self.aggregator.collect().await);

        let log = self.log.clone();
        let record = Arc::clone(&snapshot);
        match tokio::task::spawn_blocking(move || log.append(&record)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => log::error!("Error saving metrics to file: {}", e),
            Err(e) => log::error!("Metrics append task failed: {}", e),
        }

        for finding in self.summary.evaluate(&snapshot) {
            if finding.is_alertable() {
                self.alerts.trigger(&finding.message);
            } else {
                log::info!("{}", finding.message);
            }
        }

        self.iterations.fetch_add(1, Ordering::Relaxed);
    }
}
