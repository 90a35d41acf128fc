use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use perfscope::core::analyzer::{
    DiskCounters, IssueDetail, IssueKind, LiveProbe, LiveSweep, PartitionUsage, ProcessMemory,
    SweepThresholds,
};
use perfscope::error::{PerfError, Result};
use perfscope::platform::{ProcessThreads, ThreadTimes};

const MB: u64 = 1024 * 1024;
const GB: u64 = 1024 * MB;

/// Probe with canned answers; disk counters advance by `io_step` bytes per call.
struct FakeProbe {
    counter_calls: AtomicUsize,
    io_step: u64,
}

impl FakeProbe {
    fn new(io_step: u64) -> Self {
        Self {
            counter_calls: AtomicUsize::new(0),
            io_step,
        }
    }
}

impl LiveProbe for FakeProbe {
    fn process_threads(&self) -> Vec<Result<ProcessThreads>> {
        vec![
            Ok(ProcessThreads {
                pid: 100,
                process_name: "server".into(),
                threads: vec![
                    ThreadTimes {
                        tid: 101,
                        user_time: 4.0,
                        system_time: 1.5,
                    },
                    ThreadTimes {
                        tid: 102,
                        user_time: 0.1,
                        system_time: 0.0,
                    },
                ],
            }),
            Err(PerfError::process_access(200, "permission denied")),
        ]
    }

    fn process_memory(&self) -> Vec<Result<ProcessMemory>> {
        vec![
            Ok(ProcessMemory {
                pid: 1,
                name: "browser".into(),
                rss_bytes: 900 * MB,
            }),
            Err(PerfError::process_access(2, "no such process")),
            Ok(ProcessMemory {
                pid: 3,
                name: "shell".into(),
                rss_bytes: 20 * MB,
            }),
        ]
    }

    fn partitions(&self) -> Vec<Result<PartitionUsage>> {
        vec![
            Ok(PartitionUsage {
                device: "/dev/sda1".into(),
                mountpoint: "/".into(),
                total_bytes: 1000 * GB,
                used_bytes: 923 * GB,
                free_bytes: 77 * GB,
            }),
            Ok(PartitionUsage {
                device: "/dev/sdb1".into(),
                mountpoint: "/data".into(),
                total_bytes: 100 * GB,
                used_bytes: 10 * GB,
                free_bytes: 90 * GB,
            }),
            Err(PerfError::other("cdrom not ready")),
        ]
    }

    fn disk_counters(&self) -> Vec<DiskCounters> {
        let call = self.counter_calls.fetch_add(1, Ordering::SeqCst) as u64;
        vec![
            DiskCounters {
                name: "sda".into(),
                read_bytes: call * self.io_step,
                write_bytes: call * self.io_step,
            },
            DiskCounters {
                name: "sdb".into(),
                read_bytes: 5,
                write_bytes: 5,
            },
        ]
    }

    fn wait(&self, _window: Duration) {}
}

fn sweep(io_step: u64) -> LiveSweep<FakeProbe> {
    LiveSweep::new(FakeProbe::new(io_step), SweepThresholds::default())
}

#[test]
fn test_blocking_threads_skip_failed_processes() {
    let issues = sweep(0).blocking_threads();

    assert_eq!(issues.len(), 1);
    assert_eq!(
        issues[0].message,
        "Thread 101 in process server (PID: 100) exceeded CPU threshold."
    );
    match &issues[0].detail {
        IssueDetail::HighCpuThread {
            thread_name,
            pid,
            cpu_time,
            ..
        } => {
            assert_eq!(thread_name, "Thread-101");
            assert_eq!(*pid, 100);
            assert_eq!(*cpu_time, 5.5);
        }
        other => panic!("unexpected detail {:?}", other),
    }
}

#[test]
fn test_memory_suspects_above_threshold() {
    let issues = sweep(0).memory_leak_suspects();

    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].kind(), IssueKind::HighMemoryUsage);
    assert_eq!(
        issues[0].message,
        "Process browser (PID: 1) is using 900.00 MB, which exceeds threshold."
    );
}

#[test]
fn test_full_partition_is_reported() {
    let issues = sweep(0).disk_issues();

    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].kind(), IssueKind::HighDiskUsage);
    assert!(issues[0].message.contains("/dev/sda1"));
    assert!(issues[0].message.contains("(/)"));
    assert!(issues[0].message.contains("92.3% full"));
    match &issues[0].detail {
        IssueDetail::HighDiskUsage {
            device,
            mountpoint,
            usage_percent,
            ..
        } => {
            assert_eq!(device, "/dev/sda1");
            assert_eq!(mountpoint, "/");
            assert_eq!(*usage_percent, 92.3);
        }
        other => panic!("unexpected detail {:?}", other),
    }
}

#[test]
fn test_heavy_io_is_reported_per_disk() {
    // 100 MiB read plus 100 MiB written over a one second window.
    let issues = sweep(100 * MB).disk_issues();

    let io: Vec<_> = issues
        .iter()
        .filter(|i| i.kind() == IssueKind::HighDiskIo)
        .collect();
    assert_eq!(io.len(), 1);
    assert_eq!(
        io[0].message,
        "Disk sda sustained 200.00 MB/s I/O for 1s - exceeds 100 MB/s threshold."
    );
}
