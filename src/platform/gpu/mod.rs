//! GPU-specific platform code.
//!
//! Provides GPU readings for the `gpu_metrics` subsystem. NVIDIA devices are
//! read through NVML when the `nvml` feature is enabled.

mod nvidia;

pub use nvidia::NvidiaGpuProvider;

use serde::Serialize;

use crate::error::{PerfError, Result};

/// One GPU as reported in `gpu_metrics`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GpuReading {
    pub id: u32,
    pub name: String,
    /// Utilisation as a fraction in `0.0..=1.0`.
    pub load: f64,
    /// MiB
    pub memory_used: f64,
    /// MiB
    pub memory_total: f64,
    pub temperature: Option<u32>,
}

/// Trait for GPU metrics providers
///
/// This trait abstracts GPU monitoring across vendors. Implementations
/// report every device they can see.
pub trait GpuProvider: Send + Sync {
    fn vendor(&self) -> &'static str;

    fn collect(&self) -> Result<Vec<GpuReading>>;
}

/// Attempt to get an available GPU provider
pub fn get_gpu_provider() -> Result<Box<dyn GpuProvider>> {
    if let Ok(provider) = NvidiaGpuProvider::new() {
        return Ok(Box::new(provider));
    }

    Err(PerfError::gpu_not_available("No supported GPU found"))
}
