use serde::Serialize;
use serde_json::{Map, Value};
use sysinfo::System;

use super::{to_object, MetricSource};
use crate::core::snapshot::local_timestamp;
use crate::error::Result;

#[derive(Debug, Serialize)]
struct SystemInfoPayload {
    hostname: String,
    os: String,
    os_version: String,
    kernel: String,
    architecture: String,
    boot_time: u64,
    current_time: String,
}

/// Host identity (`system_info`).
#[derive(Default)]
pub struct SystemInfoSource;

impl SystemInfoSource {
    pub fn new() -> Self {
        Self
    }
}

impl MetricSource for SystemInfoSource {
    fn name(&self) -> &'static str {
        "system_info"
    }

    fn produce_snapshot(&self) -> Result<Map<String, Value>> {
        let unknown = || "Unknown".to_string();
        let payload = SystemInfoPayload {
            hostname: System::host_name().unwrap_or_else(unknown),
            os: System::name().unwrap_or_else(unknown),
            os_version: System::os_version().unwrap_or_else(unknown),
            kernel: System::kernel_version().unwrap_or_else(unknown),
            architecture: std::env::consts::ARCH.to_string(),
            boot_time: System::boot_time(),
            current_time: local_timestamp(),
        };

        to_object(self.name(), &payload)
    }
}
