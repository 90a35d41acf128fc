use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::core::alerts::AlertConfig;
use crate::core::analyzer::{SweepThresholds, Thresholds};
use crate::error::PerfError;

/// Settings consumed by the aggregation, persistence and analysis pipeline.
///
/// Stored as JSON under the platform config directory. Missing fields fall
/// back to their defaults so older files keep loading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    pub cpu_threshold: f64,
    pub memory_threshold: f64,
    pub disk_threshold: f64,
    pub cpu_freq_threshold: f64,
    pub disk_usage_threshold: f64,
    pub disk_io_threshold_mb_s: f64,
    pub disk_io_sample_ms: u64,
    pub memory_threshold_mb: f64,
    pub thread_cpu_time_threshold: f64,
    pub include_stack_lines: Option<usize>,
    /// `None` keeps the historical behaviour of reporting every top CPU process.
    pub top_cpu_process_gate: Option<f64>,
    pub metrics_file_path: PathBuf,
    pub auto_save_interval_secs: u64,
    pub analysis_backoff_secs: u64,
    pub metrics_refresh_interval_secs: u64,
    pub source_timeout_secs: u64,
    pub top_process_count: usize,
    pub max_thread_processes: usize,
    pub email_enabled: bool,
    pub alert_recipients: Vec<String>,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            cpu_threshold: 1.0,
            memory_threshold: 5.0,
            disk_threshold: 50.0,
            cpu_freq_threshold: 1500.0,
            disk_usage_threshold: 85.0,
            disk_io_threshold_mb_s: 100.0,
            disk_io_sample_ms: 1000,
            memory_threshold_mb: 500.0,
            thread_cpu_time_threshold: 1.0,
            include_stack_lines: Some(10),
            top_cpu_process_gate: None,
            metrics_file_path: PathBuf::from("system_metrics.json"),
            auto_save_interval_secs: 60,
            analysis_backoff_secs: 60,
            metrics_refresh_interval_secs: 120,
            source_timeout_secs: 10,
            top_process_count: 5,
            max_thread_processes: 10,
            email_enabled: false,
            alert_recipients: Vec::new(),
        }
    }
}

impl MonitorConfig {
    /// Load the config file (defaults if absent or unreadable) and apply
    /// environment overrides.
    pub fn load() -> Result<Self> {
        let config_path = Self::get_config_path()?;
        let mut config = Self::load_from(&config_path)?;
        config.apply_env_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Load from an explicit path without consulting the environment.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let data = fs::read(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        if data.is_empty() {
            return Ok(Self::default());
        }

        Ok(serde_json::from_slice(&data).unwrap_or_else(|e| {
            log::warn!("Ignoring unreadable config file {:?}: {}", path, e);
            Self::default()
        }))
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::get_config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
        }

        let data = serde_json::to_vec_pretty(self).context("Failed to serialize config")?;

        fs::write(path, data)
            .with_context(|| format!("Failed to write config file: {:?}", path))?;

        Ok(())
    }

    pub fn get_config_path() -> Result<PathBuf> {
        let config_dir =
            dirs::config_dir().with_context(|| "Could not determine config directory")?;

        Ok(config_dir.join("perfscope").join("config.json"))
    }

    /// Apply `MEMORY_THRESHOLD`, `CPU_THRESHOLD`, `METRICS_FILE_PATH` and
    /// `AUTO_SAVE_INTERVAL`. Values that do not parse are ignored.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = parse_env(&lookup, "MEMORY_THRESHOLD") {
            self.memory_threshold = value;
        }
        if let Some(value) = parse_env(&lookup, "CPU_THRESHOLD") {
            self.cpu_threshold = value;
        }
        if let Some(value) = parse_env(&lookup, "AUTO_SAVE_INTERVAL") {
            self.auto_save_interval_secs = value;
        }
        if let Some(path) = lookup("METRICS_FILE_PATH").filter(|p| !p.trim().is_empty()) {
            self.metrics_file_path = PathBuf::from(path);
        }
    }

    /// Create the directory that will hold the metrics log.
    ///
    /// This is the only failure that is fatal at startup.
    pub fn ensure_log_dir(&self) -> crate::error::Result<()> {
        let dir = match self.metrics_file_path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => return Ok(()),
        };

        fs::create_dir_all(dir).map_err(|e| {
            PerfError::config(format!("cannot create log directory {:?}: {}", dir, e))
        })?;
        log::info!("Metrics log directory ready: {:?}", dir);
        Ok(())
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.metrics_refresh_interval_secs)
    }

    /// Cadence of the persistence loop: auto-save interval plus the fixed
    /// analysis backoff.
    pub fn persistence_interval(&self) -> Duration {
        Duration::from_secs(self.auto_save_interval_secs + self.analysis_backoff_secs)
    }

    pub fn source_timeout(&self) -> Duration {
        Duration::from_secs(self.source_timeout_secs)
    }

    pub fn disk_io_sample_window(&self) -> Duration {
        Duration::from_millis(self.disk_io_sample_ms)
    }

    pub fn thresholds(&self) -> Thresholds {
        Thresholds {
            cpu_threshold: self.cpu_threshold,
            memory_threshold: self.memory_threshold,
            disk_threshold: self.disk_threshold,
            cpu_freq_threshold: self.cpu_freq_threshold,
            include_stack_lines: self.include_stack_lines,
            top_cpu_process_gate: self.top_cpu_process_gate,
        }
    }

    pub fn sweep_thresholds(&self) -> SweepThresholds {
        SweepThresholds {
            thread_cpu_time_secs: self.thread_cpu_time_threshold,
            memory_threshold_mb: self.memory_threshold_mb,
            disk_usage_threshold: self.disk_usage_threshold,
            disk_io_threshold_mb_s: self.disk_io_threshold_mb_s,
            disk_io_sample_window: self.disk_io_sample_window(),
        }
    }

    pub fn alert_config(&self) -> AlertConfig {
        AlertConfig {
            email_enabled: self.email_enabled,
            recipients: self.alert_recipients.clone(),
        }
    }
}

fn parse_env<T, F>(lookup: &F, key: &str) -> Option<T>
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            log::warn!("Ignoring {}={:?}: not a valid value", key, raw);
            None
        }
    }
}
