//! Metric sources.
//!
//! Each source reads one OS subsystem and returns its payload as a JSON
//! object. Sources never touch shared pipeline state; the aggregator owns
//! failure isolation, so a source simply returns `Err` (or even panics)
//! when its subsystem cannot be read.

mod cpu;
mod disk;
mod gpu;
mod memory;
mod network;
mod power;
mod system;
mod threads;

pub use cpu::{CpuDeepSource, CpuSource};
pub use disk::DiskDeepSource;
pub use gpu::GpuSource;
pub use memory::{MemoryDeepSource, MemorySource};
pub use network::NetworkSource;
pub use power::PowerSource;
pub use system::SystemInfoSource;
pub use threads::ThreadSource;

use std::sync::Arc;

use serde::Serialize;
use serde_json::{Map, Value};
use sysinfo::{Process, ProcessRefreshKind, ProcessesToUpdate, System};

use crate::core::config::MonitorConfig;
use crate::error::{PerfError, Result};

/// Capability implemented by every subsystem reader.
pub trait MetricSource: Send + Sync {
    /// Subsystem key under which the payload is stored in a snapshot.
    fn name(&self) -> &'static str;

    /// Read the current value of the subsystem.
    fn produce_snapshot(&self) -> Result<Map<String, Value>>;
}

/// Every built-in source, in registration order.
pub fn default_sources(config: &MonitorConfig) -> Vec<Arc<dyn MetricSource>> {
    vec![
        Arc::new(CpuSource::new()),
        Arc::new(CpuDeepSource::new(config.top_process_count)),
        Arc::new(MemorySource::new(config.top_process_count * 2)),
        Arc::new(MemoryDeepSource::new(config.top_process_count)),
        Arc::new(DiskDeepSource::new()),
        Arc::new(ThreadSource::new(config.max_thread_processes)),
        Arc::new(NetworkSource::new()),
        Arc::new(PowerSource::new()),
        Arc::new(GpuSource::new()),
        Arc::new(SystemInfoSource::new()),
    ]
}

/// Serialise a typed payload into the object form stored in snapshots.
pub(crate) fn to_object<T: Serialize>(
    source_name: &str,
    payload: &T,
) -> Result<Map<String, Value>> {
    match serde_json::to_value(payload)? {
        Value::Object(map) => Ok(map),
        _ => Err(PerfError::source_failure(
            source_name,
            "payload did not serialise to an object",
        )),
    }
}

/// Refresh CPU and memory usage of every process, twice, so that CPU
/// percentages are measured over a real interval.
pub(crate) fn refresh_processes_twice(system: &mut System) {
    let kind = ProcessRefreshKind::nothing().with_cpu().with_memory();
    system.refresh_processes_specifics(ProcessesToUpdate::All, true, kind);
    std::thread::sleep(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL);
    system.refresh_processes_specifics(ProcessesToUpdate::All, true, kind);
}

/// Processes proper; on Linux sysinfo also lists threads, which are skipped.
pub(crate) fn real_processes(system: &System) -> impl Iterator<Item = &Process> {
    system
        .processes()
        .values()
        .filter(|proc| proc.thread_kind().is_none())
}

pub(crate) fn process_name(proc: &Process) -> String {
    proc.name().to_string_lossy().to_string()
}

pub(crate) fn percent(part: u64, total: u64) -> f64 {
    if total > 0 {
        (part as f64 / total as f64) * 100.0
    } else {
        0.0
    }
}

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
