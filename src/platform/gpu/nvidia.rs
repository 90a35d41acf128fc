#[cfg(feature = "nvml")]
use nvml_wrapper::{enum_wrappers::device::TemperatureSensor, Nvml};
#[cfg(feature = "nvml")]
use once_cell::sync::Lazy;

use super::{GpuProvider, GpuReading};
#[cfg(not(feature = "nvml"))]
use crate::error::PerfError;
use crate::error::Result;

/// Singleton - NVML must be initialized ONCE only
#[cfg(feature = "nvml")]
static NVML: Lazy<Option<Nvml>> = Lazy::new(|| match Nvml::init() {
    Ok(nvml) => Some(nvml),
    Err(e) => {
        log::debug!("NVML unavailable: {}", e);
        None
    }
});

#[cfg(feature = "nvml")]
const MIB: f64 = 1024.0 * 1024.0;

/// NVIDIA GPU provider using NVML
pub struct NvidiaGpuProvider {
    #[cfg(feature = "nvml")]
    nvml: &'static Nvml,
}

impl NvidiaGpuProvider {
    /// Create a provider backed by the process-wide NVML handle.
    pub fn new() -> Result<Self> {
        #[cfg(feature = "nvml")]
        {
            let nvml = NVML.as_ref().ok_or_else(|| {
                crate::error::PerfError::gpu_not_available(
                    "NVML not available (NVIDIA driver not installed or incompatible)",
                )
            })?;
            Ok(Self { nvml })
        }
        #[cfg(not(feature = "nvml"))]
        {
            Err(PerfError::gpu_not_available(
                "NVIDIA GPU support not enabled",
            ))
        }
    }
}

impl GpuProvider for NvidiaGpuProvider {
    fn vendor(&self) -> &'static str {
        "NVIDIA"
    }

    fn collect(&self) -> Result<Vec<GpuReading>> {
        #[cfg(feature = "nvml")]
        {
            use crate::error::PerfError;

            let count = self
                .nvml
                .device_count()
                .map_err(|e| PerfError::gpu_not_available(format!("NVML device count: {}", e)))?;

            let mut readings = Vec::with_capacity(count as usize);
            for index in 0..count {
                let device = match self.nvml.device_by_index(index) {
                    Ok(device) => device,
                    Err(e) => {
                        log::warn!("Skipping NVIDIA device {}: {}", index, e);
                        continue;
                    }
                };

                let memory = device.memory_info().ok();
                readings.push(GpuReading {
                    id: index,
                    name: device
                        .name()
                        .unwrap_or_else(|_| "Unknown NVIDIA GPU".to_string()),
                    load: device
                        .utilization_rates()
                        .map(|u| f64::from(u.gpu) / 100.0)
                        .unwrap_or(0.0),
                    memory_used: memory.as_ref().map(|m| m.used as f64 / MIB).unwrap_or(0.0),
                    memory_total: memory.as_ref().map(|m| m.total as f64 / MIB).unwrap_or(0.0),
                    temperature: device.temperature(TemperatureSensor::Gpu).ok(),
                });
            }

            Ok(readings)
        }
        #[cfg(not(feature = "nvml"))]
        {
            Err(PerfError::gpu_not_available(
                "NVIDIA GPU support not enabled",
            ))
        }
    }
}
