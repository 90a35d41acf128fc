use parking_lot::Mutex;
use serde::Serialize;
use serde_json::{Map, Value};
use sysinfo::{CpuRefreshKind, RefreshKind, System};

use super::{
    percent, process_name, real_processes, refresh_processes_twice, round2, to_object,
    MetricSource,
};
use crate::core::snapshot::utc_timestamp;
use crate::error::Result;

/// Memory share above which a process is listed as critical in `cpu_metrics`.
const CRITICAL_MEMORY_PERCENT: f64 = 1.0;

#[derive(Debug, Serialize)]
struct CriticalProcess {
    pid: u32,
    name: String,
    cpu_percent: f64,
    memory_percent: f64,
}

#[derive(Debug, Serialize)]
struct CpuPayload {
    cpu_usage_percent: f64,
    cpu_count: usize,
    cpu_frequency: Option<u64>,
    critical_processes: Vec<CriticalProcess>,
    top_process_cpu_percent: f64,
}

/// Headline CPU usage (`cpu_metrics`).
pub struct CpuSource {
    system: Mutex<System>,
}

impl CpuSource {
    pub fn new() -> Self {
        let refresh_kind = RefreshKind::nothing()
            .with_cpu(CpuRefreshKind::everything())
            .with_memory(sysinfo::MemoryRefreshKind::nothing().with_ram());
        Self {
            system: Mutex::new(System::new_with_specifics(refresh_kind)),
        }
    }
}

impl Default for CpuSource {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricSource for CpuSource {
    fn name(&self) -> &'static str {
        "cpu_metrics"
    }

    fn produce_snapshot(&self) -> Result<Map<String, Value>> {
        let mut system = self.system.lock();

        system.refresh_cpu_all();
        system.refresh_memory();
        refresh_processes_twice(&mut system);
        system.refresh_cpu_usage();

        let total_memory = system.total_memory();
        let mut critical_processes = Vec::new();
        let mut top_process_cpu_percent = 0.0;

        for proc in real_processes(&system) {
            let memory_percent = percent(proc.memory(), total_memory);
            if memory_percent <= CRITICAL_MEMORY_PERCENT {
                continue;
            }
            let cpu_percent = f64::from(proc.cpu_usage());
            if cpu_percent > top_process_cpu_percent {
                top_process_cpu_percent = cpu_percent;
            }
            critical_processes.push(CriticalProcess {
                pid: proc.pid().as_u32(),
                name: process_name(proc),
                cpu_percent: round2(cpu_percent),
                memory_percent: round2(memory_percent),
            });
        }

        let cpus = system.cpus();
        let payload = CpuPayload {
            cpu_usage_percent: round2(f64::from(system.global_cpu_usage())),
            cpu_count: cpus.len(),
            cpu_frequency: cpus.first().map(|cpu| cpu.frequency()),
            critical_processes,
            top_process_cpu_percent: round2(top_process_cpu_percent),
        };

        to_object(self.name(), &payload)
    }
}

#[derive(Debug, Serialize)]
struct CpuFrequency {
    current: u64,
    min: u64,
    max: u64,
}

#[derive(Debug, Serialize)]
struct TopCpuProcess {
    pid: u32,
    name: String,
    cpu_percent: f64,
}

#[derive(Debug, Serialize)]
struct CpuDeepPayload {
    timestamp: String,
    cpu_usage_per_core: Vec<f64>,
    cpu_frequency: CpuFrequency,
    cpu_load: [f64; 3],
    top_cpu_processes: Vec<TopCpuProcess>,
}

/// Per-core usage, frequency, load and top CPU consumers (`cpu_deep_metrics`).
pub struct CpuDeepSource {
    system: Mutex<System>,
    top_n: usize,
}

impl CpuDeepSource {
    pub fn new(top_n: usize) -> Self {
        let refresh_kind = RefreshKind::nothing().with_cpu(CpuRefreshKind::everything());
        Self {
            system: Mutex::new(System::new_with_specifics(refresh_kind)),
            top_n,
        }
    }
}

impl MetricSource for CpuDeepSource {
    fn name(&self) -> &'static str {
        "cpu_deep_metrics"
    }

    fn produce_snapshot(&self) -> Result<Map<String, Value>> {
        let mut system = self.system.lock();

        system.refresh_cpu_all();
        refresh_processes_twice(&mut system);
        system.refresh_cpu_all();

        let cpus = system.cpus();
        let frequencies: Vec<u64> = cpus.iter().map(|cpu| cpu.frequency()).collect();
        let cpu_frequency = CpuFrequency {
            current: frequencies.first().copied().unwrap_or(0),
            min: frequencies.iter().copied().min().unwrap_or(0),
            max: frequencies.iter().copied().max().unwrap_or(0),
        };

        let mut top_cpu_processes: Vec<TopCpuProcess> = real_processes(&system)
            .map(|proc| TopCpuProcess {
                pid: proc.pid().as_u32(),
                name: process_name(proc),
                cpu_percent: round2(f64::from(proc.cpu_usage())),
            })
            .collect();

        top_cpu_processes.sort_by(|a, b| {
            b.cpu_percent
                .partial_cmp(&a.cpu_percent)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        top_cpu_processes.truncate(self.top_n);

        let load = System::load_average();
        let payload = CpuDeepPayload {
            timestamp: utc_timestamp(),
            cpu_usage_per_core: cpus
                .iter()
                .map(|cpu| round2(f64::from(cpu.cpu_usage())))
                .collect(),
            cpu_frequency,
            cpu_load: [load.one, load.five, load.fifteen],
            top_cpu_processes,
        };

        to_object(self.name(), &payload)
    }
}
