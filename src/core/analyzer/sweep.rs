//! Point-in-time sweeps of live process, thread and disk state.
//!
//! Unlike the record rules these do not look at the log. The probe reports
//! each process as a `Result`; the sweep skips failed entries so one
//! vanished or protected process never aborts the scan.

use std::collections::HashMap;
use std::time::Duration;

use sysinfo::{Disks, ProcessRefreshKind, ProcessesToUpdate, System};

use super::issue::{Issue, IssueDetail};
use crate::core::snapshot::utc_timestamp;
use crate::core::sources::{process_name, real_processes, round2};
use crate::error::{PerfError, Result};
use crate::platform::threads::{process_threads, ProcessThreads};

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;
const BYTES_PER_GB: f64 = 1024.0 * 1024.0 * 1024.0;

#[derive(Debug, Clone, PartialEq)]
pub struct SweepThresholds {
    /// Cumulative user + system seconds for a thread to be reported.
    pub thread_cpu_time_secs: f64,
    pub memory_threshold_mb: f64,
    pub disk_usage_threshold: f64,
    pub disk_io_threshold_mb_s: f64,
    pub disk_io_sample_window: Duration,
}

impl Default for SweepThresholds {
    fn default() -> Self {
        Self {
            thread_cpu_time_secs: 1.0,
            memory_threshold_mb: 500.0,
            disk_usage_threshold: 85.0,
            disk_io_threshold_mb_s: 100.0,
            disk_io_sample_window: Duration::from_secs(1),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProcessMemory {
    pub pid: u32,
    pub name: String,
    pub rss_bytes: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PartitionUsage {
    pub device: String,
    pub mountpoint: String,
    pub total_bytes: u64,
    pub used_bytes: u64,
    pub free_bytes: u64,
}

impl PartitionUsage {
    pub fn usage_percent(&self) -> f64 {
        let known = self.used_bytes + self.free_bytes;
        if known == 0 {
            return 0.0;
        }
        self.used_bytes as f64 / known as f64 * 100.0
    }
}

/// Cumulative bytes moved by one physical disk.
#[derive(Debug, Clone, PartialEq)]
pub struct DiskCounters {
    pub name: String,
    pub read_bytes: u64,
    pub write_bytes: u64,
}

/// Source of live OS state for [`LiveSweep`].
pub trait LiveProbe {
    fn process_threads(&self) -> Vec<Result<ProcessThreads>>;
    fn process_memory(&self) -> Vec<Result<ProcessMemory>>;
    fn partitions(&self) -> Vec<Result<PartitionUsage>>;
    fn disk_counters(&self) -> Vec<DiskCounters>;

    /// Block for the I/O sample window.
    fn wait(&self, window: Duration) {
        std::thread::sleep(window);
    }
}

/// Probe backed by sysinfo and, for threads, procfs.
#[derive(Debug, Default)]
pub struct SystemProbe;

impl LiveProbe for SystemProbe {
    fn process_threads(&self) -> Vec<Result<ProcessThreads>> {
        process_threads(None, None)
    }

    fn process_memory(&self) -> Vec<Result<ProcessMemory>> {
        let mut system = System::new();
        system.refresh_processes_specifics(
            ProcessesToUpdate::All,
            true,
            ProcessRefreshKind::nothing().with_memory(),
        );

        real_processes(&system)
            .map(|proc| {
                Ok(ProcessMemory {
                    pid: proc.pid().as_u32(),
                    name: process_name(proc),
                    rss_bytes: proc.memory(),
                })
            })
            .collect()
    }

    fn partitions(&self) -> Vec<Result<PartitionUsage>> {
        Disks::new_with_refreshed_list()
            .list()
            .iter()
            .map(|disk| {
                let device = disk.name().to_string_lossy().to_string();
                let mountpoint = disk.mount_point().to_string_lossy().to_string();
                let total = disk.total_space();
                if total == 0 {
                    return Err(PerfError::other(format!(
                        "partition {} ({}) reports no capacity",
                        device, mountpoint
                    )));
                }
                let free = disk.available_space();
                Ok(PartitionUsage {
                    device,
                    mountpoint,
                    total_bytes: total,
                    used_bytes: total.saturating_sub(free),
                    free_bytes: free,
                })
            })
            .collect()
    }

    fn disk_counters(&self) -> Vec<DiskCounters> {
        let disks = Disks::new_with_refreshed_list();
        // Several mounts can share a device; count each device once.
        let mut by_name: HashMap<String, DiskCounters> = HashMap::new();
        for disk in disks.list() {
            let name = disk.name().to_string_lossy().to_string();
            let usage = disk.usage();
            by_name.entry(name.clone()).or_insert(DiskCounters {
                name,
                read_bytes: usage.total_read_bytes,
                write_bytes: usage.total_written_bytes,
            });
        }
        by_name.into_values().collect()
    }
}

pub struct LiveSweep<P: LiveProbe = SystemProbe> {
    probe: P,
    thresholds: SweepThresholds,
}

impl LiveSweep<SystemProbe> {
    pub fn system(thresholds: SweepThresholds) -> Self {
        Self::new(SystemProbe, thresholds)
    }
}

impl<P: LiveProbe> LiveSweep<P> {
    pub fn new(probe: P, thresholds: SweepThresholds) -> Self {
        Self { probe, thresholds }
    }

    pub fn thresholds(&self) -> &SweepThresholds {
        &self.thresholds
    }

    /// Threads whose cumulative CPU time exceeds the threshold.
    pub fn blocking_threads(&self) -> Vec<Issue> {
        let mut issues = Vec::new();
        for process in skip_failed(self.probe.process_threads()) {
            for thread in &process.threads {
                let cpu_time = thread.total_cpu_time();
                if cpu_time <= self.thresholds.thread_cpu_time_secs {
                    continue;
                }
                issues.push(Issue::new(
                    utc_timestamp(),
                    format!(
                        "Thread {} in process {} (PID: {}) exceeded CPU threshold.",
                        thread.tid, process.process_name, process.pid
                    ),
                    IssueDetail::HighCpuThread {
                        thread_name: format!("Thread-{}", thread.tid),
                        process_name: process.process_name.clone(),
                        pid: process.pid,
                        cpu_time: round2(cpu_time),
                        stack_trace: vec!["Stack unavailable across processes".to_string()],
                    },
                ));
            }
        }
        issues
    }

    /// Processes whose resident memory exceeds the MB threshold.
    pub fn memory_leak_suspects(&self) -> Vec<Issue> {
        skip_failed(self.probe.process_memory())
            .filter_map(|process| {
                let usage_mb = process.rss_bytes as f64 / BYTES_PER_MB;
                if usage_mb <= self.thresholds.memory_threshold_mb {
                    return None;
                }
                Some(Issue::new(
                    utc_timestamp(),
                    format!(
                        "Process {} (PID: {}) is using {:.2} MB, which exceeds threshold.",
                        process.name, process.pid, usage_mb
                    ),
                    IssueDetail::HighMemoryUsage {
                        process_name: process.name,
                        pid: process.pid,
                        memory_usage_mb: round2(usage_mb),
                    },
                ))
            })
            .collect()
    }

    /// Nearly full partitions, then disks with sustained I/O over the sample
    /// window. Blocks for the window.
    pub fn disk_issues(&self) -> Vec<Issue> {
        let mut issues = self.full_partitions();
        issues.extend(self.busy_disks());
        issues
    }

    fn full_partitions(&self) -> Vec<Issue> {
        let threshold = self.thresholds.disk_usage_threshold;
        skip_failed(self.probe.partitions())
            .filter_map(|part| {
                let usage = part.usage_percent();
                if usage <= threshold {
                    return None;
                }
                Some(Issue::new(
                    utc_timestamp(),
                    format!(
                        "Partition {} ({}) is {:.1}% full - exceeds {}% threshold.",
                        part.device, part.mountpoint, usage, threshold
                    ),
                    IssueDetail::HighDiskUsage {
                        total_gb: round2(part.total_bytes as f64 / BYTES_PER_GB),
                        used_gb: round2(part.used_bytes as f64 / BYTES_PER_GB),
                        free_gb: round2(part.free_bytes as f64 / BYTES_PER_GB),
                        usage_percent: round2(usage),
                        device: part.device,
                        mountpoint: part.mountpoint,
                    },
                ))
            })
            .collect()
    }

    fn busy_disks(&self) -> Vec<Issue> {
        let window = self.thresholds.disk_io_sample_window;
        let seconds = window.as_secs_f64();
        if seconds <= 0.0 {
            log::warn!("Disk I/O sample window is zero; skipping I/O sweep");
            return Vec::new();
        }

        let start = self.probe.disk_counters();
        self.probe.wait(window);
        let end: HashMap<String, DiskCounters> = self
            .probe
            .disk_counters()
            .into_iter()
            .map(|c| (c.name.clone(), c))
            .collect();

        let threshold = self.thresholds.disk_io_threshold_mb_s;
        let mut issues = Vec::new();
        for before in start {
            // A disk that vanished during the window is skipped.
            let Some(after) = end.get(&before.name) else {
                continue;
            };
            let delta = after.read_bytes.saturating_sub(before.read_bytes)
                + after.write_bytes.saturating_sub(before.write_bytes);
            let mb_per_sec = delta as f64 / BYTES_PER_MB / seconds;
            if mb_per_sec <= threshold {
                continue;
            }
            issues.push(Issue::new(
                utc_timestamp(),
                format!(
                    "Disk {} sustained {:.2} MB/s I/O for {}s - exceeds {} MB/s threshold.",
                    before.name, mb_per_sec, seconds, threshold
                ),
                IssueDetail::HighDiskIo {
                    disk: before.name,
                    io_mb_per_sec: round2(mb_per_sec),
                    sample_seconds: seconds,
                },
            ));
        }
        issues
    }
}

fn skip_failed<T>(entries: Vec<Result<T>>) -> impl Iterator<Item = T> {
    entries.into_iter().filter_map(|entry| match entry {
        Ok(value) => Some(value),
        Err(e) => {
            log::debug!("Skipping process during sweep: {}", e);
            None
        }
    })
}
