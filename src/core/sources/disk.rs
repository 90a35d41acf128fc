use parking_lot::Mutex;
use serde::Serialize;
use serde_json::{Map, Value};
use sysinfo::Disks;

use super::{percent, round2, to_object, MetricSource};
use crate::core::snapshot::utc_timestamp;
use crate::error::Result;

#[derive(Debug, Serialize)]
struct DiskUsage {
    mountpoint: String,
    total: u64,
    used: u64,
    free: u64,
    percent: f64,
}

#[derive(Debug, Default, Serialize)]
struct DiskIo {
    read_bytes: u64,
    write_bytes: u64,
}

#[derive(Debug, Serialize)]
struct Partition {
    device: String,
    mountpoint: String,
    fstype: String,
    total: u64,
    used: u64,
    free: u64,
    percent: f64,
}

#[derive(Debug, Serialize)]
struct DiskDeepPayload {
    timestamp: String,
    disk_usage: DiskUsage,
    disk_io: DiskIo,
    disk_partitions: Vec<Partition>,
}

#[derive(Debug, Serialize)]
struct NoDiskPayload {
    timestamp: String,
    error: String,
}

/// Primary disk usage, cumulative I/O and per-partition usage (`disk_deep_metrics`).
pub struct DiskDeepSource {
    disks: Mutex<Disks>,
}

impl DiskDeepSource {
    pub fn new() -> Self {
        Self {
            disks: Mutex::new(Disks::new_with_refreshed_list()),
        }
    }
}

impl Default for DiskDeepSource {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricSource for DiskDeepSource {
    fn name(&self) -> &'static str {
        "disk_deep_metrics"
    }

    fn produce_snapshot(&self) -> Result<Map<String, Value>> {
        let mut disks = self.disks.lock();
        disks.refresh(true);

        let mut partitions = Vec::new();
        let mut io = DiskIo::default();

        for disk in disks.list() {
            let total = disk.total_space();
            if total == 0 {
                continue;
            }
            let free = disk.available_space();
            let used = total.saturating_sub(free);
            let usage = disk.usage();
            io.read_bytes += usage.total_read_bytes;
            io.write_bytes += usage.total_written_bytes;

            partitions.push(Partition {
                device: disk.name().to_string_lossy().to_string(),
                mountpoint: disk.mount_point().to_string_lossy().to_string(),
                fstype: disk.file_system().to_string_lossy().to_string(),
                total,
                used,
                free,
                percent: round2(percent(used, total)),
            });
        }

        // Root first, otherwise the first readable partition.
        let primary = partitions
            .iter()
            .find(|p| p.mountpoint == "/")
            .or_else(|| partitions.first());

        let Some(primary) = primary else {
            return to_object(
                self.name(),
                &NoDiskPayload {
                    timestamp: utc_timestamp(),
                    error: "No accessible disks found (drives may not be ready or are restricted)."
                        .to_string(),
                },
            );
        };

        let disk_usage = DiskUsage {
            mountpoint: primary.mountpoint.clone(),
            total: primary.total,
            used: primary.used,
            free: primary.free,
            percent: primary.percent,
        };

        let payload = DiskDeepPayload {
            timestamp: utc_timestamp(),
            disk_usage,
            disk_io: io,
            disk_partitions: partitions,
        };

        to_object(self.name(), &payload)
    }
}
