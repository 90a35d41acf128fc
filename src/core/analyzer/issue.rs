//! Structured performance findings.

use std::fmt;

use serde::{Deserialize, Serialize};

/// One classified finding. Serialises flat, with the kind under `type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    pub timestamp: String,
    pub message: String,
    #[serde(flatten)]
    pub detail: IssueDetail,
}

/// Kind-specific fields of an [`Issue`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum IssueDetail {
    #[serde(rename = "CPU")]
    Cpu,
    Memory,
    ThreadContention {
        process_name: String,
        thread_name: String,
        stack_summary: Vec<String>,
    },
    #[serde(rename = "CPUProcess")]
    CpuProcess {
        process_name: String,
        pid: Option<u32>,
        cpu_percent: f64,
    },
    MemoryProcess {
        process_name: String,
        pid: Option<u32>,
        memory_percent: f64,
    },
    Network,
    Power {
        battery_percent: f64,
    },
    HighDiskUsage {
        device: String,
        mountpoint: String,
        total_gb: f64,
        used_gb: f64,
        free_gb: f64,
        usage_percent: f64,
    },
    #[serde(rename = "HighDiskIO")]
    HighDiskIo {
        disk: String,
        io_mb_per_sec: f64,
        sample_seconds: f64,
    },
    #[serde(rename = "HighCPUThread")]
    HighCpuThread {
        thread_name: String,
        process_name: String,
        pid: u32,
        cpu_time: f64,
        stack_trace: Vec<String>,
    },
    HighMemoryUsage {
        process_name: String,
        pid: u32,
        memory_usage_mb: f64,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IssueKind {
    Cpu,
    Memory,
    ThreadContention,
    CpuProcess,
    MemoryProcess,
    Network,
    Power,
    HighDiskUsage,
    HighDiskIo,
    HighCpuThread,
    HighMemoryUsage,
}

impl IssueKind {
    /// Wire name, as written in the `type` field.
    pub fn as_str(self) -> &'static str {
        match self {
            IssueKind::Cpu => "CPU",
            IssueKind::Memory => "Memory",
            IssueKind::ThreadContention => "ThreadContention",
            IssueKind::CpuProcess => "CPUProcess",
            IssueKind::MemoryProcess => "MemoryProcess",
            IssueKind::Network => "Network",
            IssueKind::Power => "Power",
            IssueKind::HighDiskUsage => "HighDiskUsage",
            IssueKind::HighDiskIo => "HighDiskIO",
            IssueKind::HighCpuThread => "HighCPUThread",
            IssueKind::HighMemoryUsage => "HighMemoryUsage",
        }
    }
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl IssueDetail {
    pub fn kind(&self) -> IssueKind {
        match self {
            IssueDetail::Cpu => IssueKind::Cpu,
            IssueDetail::Memory => IssueKind::Memory,
            IssueDetail::ThreadContention { .. } => IssueKind::ThreadContention,
            IssueDetail::CpuProcess { .. } => IssueKind::CpuProcess,
            IssueDetail::MemoryProcess { .. } => IssueKind::MemoryProcess,
            IssueDetail::Network => IssueKind::Network,
            IssueDetail::Power { .. } => IssueKind::Power,
            IssueDetail::HighDiskUsage { .. } => IssueKind::HighDiskUsage,
            IssueDetail::HighDiskIo { .. } => IssueKind::HighDiskIo,
            IssueDetail::HighCpuThread { .. } => IssueKind::HighCpuThread,
            IssueDetail::HighMemoryUsage { .. } => IssueKind::HighMemoryUsage,
        }
    }
}

impl Issue {
    pub fn new(
        timestamp: impl Into<String>,
        message: impl Into<String>,
        detail: IssueDetail,
    ) -> Self {
        Self {
            timestamp: timestamp.into(),
            message: message.into(),
            detail,
        }
    }

    pub fn kind(&self) -> IssueKind {
        self.detail.kind()
    }
}
