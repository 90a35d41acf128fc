use parking_lot::Mutex;
use serde::Serialize;
use serde_json::{Map, Value};
use sysinfo::{MemoryRefreshKind, ProcessRefreshKind, ProcessesToUpdate, RefreshKind, System};

use super::{percent, process_name, real_processes, round2, to_object, MetricSource};
use crate::core::snapshot::utc_timestamp;
use crate::error::Result;

#[derive(Debug, Serialize)]
struct MemoryProcess {
    pid: u32,
    name: String,
    memory_used: u64,
    memory_percent: f64,
}

#[derive(Debug, Serialize)]
struct MemoryPayload {
    total_memory: u64,
    available_memory: u64,
    used_memory: u64,
    memory_usage_percent: f64,
    swap_memory_percent: f64,
    top_memory_consuming_processes: Vec<MemoryProcess>,
}

fn refreshed_system(system: &mut System) {
    system.refresh_memory();
    system.refresh_processes_specifics(
        ProcessesToUpdate::All,
        true,
        ProcessRefreshKind::nothing().with_memory(),
    );
}

fn top_by_memory(system: &System, limit: usize) -> Vec<MemoryProcess> {
    let total = system.total_memory();
    let mut processes: Vec<MemoryProcess> = real_processes(system)
        .map(|proc| MemoryProcess {
            pid: proc.pid().as_u32(),
            name: process_name(proc),
            memory_used: proc.memory(),
            memory_percent: round2(percent(proc.memory(), total)),
        })
        .collect();

    processes.sort_by(|a, b| b.memory_used.cmp(&a.memory_used));
    processes.truncate(limit);
    processes
}

/// RAM and swap usage with the largest resident processes (`memory_metrics`).
pub struct MemorySource {
    system: Mutex<System>,
    top_n: usize,
}

impl MemorySource {
    pub fn new(top_n: usize) -> Self {
        let refresh_kind = RefreshKind::nothing().with_memory(MemoryRefreshKind::everything());
        Self {
            system: Mutex::new(System::new_with_specifics(refresh_kind)),
            top_n,
        }
    }
}

impl MetricSource for MemorySource {
    fn name(&self) -> &'static str {
        "memory_metrics"
    }

    fn produce_snapshot(&self) -> Result<Map<String, Value>> {
        let mut system = self.system.lock();
        refreshed_system(&mut system);

        let total = system.total_memory();
        let payload = MemoryPayload {
            total_memory: total,
            available_memory: system.available_memory(),
            used_memory: system.used_memory(),
            memory_usage_percent: round2(percent(system.used_memory(), total)),
            swap_memory_percent: round2(percent(system.used_swap(), system.total_swap())),
            top_memory_consuming_processes: top_by_memory(&system, self.top_n),
        };

        to_object(self.name(), &payload)
    }
}

#[derive(Debug, Serialize)]
struct MemoryUsage {
    total: u64,
    available: u64,
    used: u64,
    free: u64,
    percent: f64,
}

#[derive(Debug, Serialize)]
struct SwapUsage {
    total: u64,
    used: u64,
    free: u64,
    percent: f64,
}

#[derive(Debug, Serialize)]
struct TopMemoryProcess {
    pid: u32,
    name: String,
    memory_percent: f64,
}

#[derive(Debug, Serialize)]
struct MemoryDeepPayload {
    timestamp: String,
    memory_usage: MemoryUsage,
    swap_usage: SwapUsage,
    top_memory_processes: Vec<TopMemoryProcess>,
}

/// Detailed RAM/swap breakdown (`memory_deep_metrics`).
pub struct MemoryDeepSource {
    system: Mutex<System>,
    top_n: usize,
}

impl MemoryDeepSource {
    pub fn new(top_n: usize) -> Self {
        let refresh_kind = RefreshKind::nothing().with_memory(MemoryRefreshKind::everything());
        Self {
            system: Mutex::new(System::new_with_specifics(refresh_kind)),
            top_n,
        }
    }
}

impl MetricSource for MemoryDeepSource {
    fn name(&self) -> &'static str {
        "memory_deep_metrics"
    }

    fn produce_snapshot(&self) -> Result<Map<String, Value>> {
        let mut system = self.system.lock();
        refreshed_system(&mut system);

        let total = system.total_memory();
        let swap_total = system.total_swap();

        let payload = MemoryDeepPayload {
            timestamp: utc_timestamp(),
            memory_usage: MemoryUsage {
                total,
                available: system.available_memory(),
                used: system.used_memory(),
                free: system.free_memory(),
                percent: round2(percent(system.used_memory(), total)),
            },
            swap_usage: SwapUsage {
                total: swap_total,
                used: system.used_swap(),
                free: system.free_swap(),
                percent: round2(percent(system.used_swap(), swap_total)),
            },
            top_memory_processes: top_by_memory(&system, self.top_n)
                .into_iter()
                .map(|p| TopMemoryProcess {
                    pid: p.pid,
                    name: p.name,
                    memory_percent: p.memory_percent,
                })
                .collect(),
        };

        to_object(self.name(), &payload)
    }
}
