//! Per-thread CPU times.
//!
//! Linux reads `/proc/<pid>/task/<tid>/stat` through procfs. Other platforms
//! report no threads.

use crate::error::Result;

/// Cumulative CPU time of one OS thread, in seconds.
#[derive(Debug, Clone, PartialEq)]
pub struct ThreadTimes {
    pub tid: u32,
    pub user_time: f64,
    pub system_time: f64,
}

impl ThreadTimes {
    pub fn total_cpu_time(&self) -> f64 {
        self.user_time + self.system_time
    }
}

/// A process together with its threads.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessThreads {
    pub pid: u32,
    pub process_name: String,
    pub threads: Vec<ThreadTimes>,
}

/// Enumerate processes and their threads.
///
/// One entry per process; a process that vanished or denied access is an
/// `Err` entry so callers can skip it. `limit` caps the number of processes
/// visited and `exclude` skips one pid (usually our own).
#[cfg(target_os = "linux")]
pub fn process_threads(limit: Option<usize>, exclude: Option<u32>) -> Vec<Result<ProcessThreads>> {
    use crate::error::PerfError;

    let ticks = procfs::ticks_per_second() as f64;
    let all = match procfs::process::all_processes() {
        Ok(all) => all,
        Err(e) => {
            return vec![Err(PerfError::other(format!(
                "cannot enumerate processes: {}",
                e
            )))]
        }
    };

    let mut results = Vec::new();
    for entry in all {
        if limit.is_some_and(|limit| results.len() >= limit) {
            break;
        }
        let process = match entry {
            Ok(process) => process,
            Err(e) => {
                results.push(Err(PerfError::other(e.to_string())));
                continue;
            }
        };
        let pid = process.pid as u32;
        if exclude == Some(pid) {
            continue;
        }
        results.push(read_process(&process, pid, ticks));
    }
    results
}

#[cfg(target_os = "linux")]
fn read_process(
    process: &procfs::process::Process,
    pid: u32,
    ticks: f64,
) -> Result<ProcessThreads> {
    use crate::error::PerfError;

    let stat = process
        .stat()
        .map_err(|e| PerfError::process_access(pid, e.to_string()))?;
    let tasks = process
        .tasks()
        .map_err(|e| PerfError::process_access(pid, e.to_string()))?;

    let threads = tasks
        .flatten()
        .filter_map(|task| {
            let task_stat = task.stat().ok()?;
            Some(ThreadTimes {
                tid: task.tid as u32,
                user_time: task_stat.utime as f64 / ticks,
                system_time: task_stat.stime as f64 / ticks,
            })
        })
        .collect();

    Ok(ProcessThreads {
        pid,
        process_name: stat.comm,
        threads,
    })
}

#[cfg(not(target_os = "linux"))]
pub fn process_threads(
    _limit: Option<usize>,
    _exclude: Option<u32>,
) -> Vec<Result<ProcessThreads>> {
    log::debug!("Per-thread CPU times are only available on Linux");
    Vec::new()
}
