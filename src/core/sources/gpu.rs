use once_cell::sync::OnceCell;
use serde_json::{json, Map, Value};

use super::MetricSource;
use crate::error::Result;
use crate::platform::gpu::{get_gpu_provider, GpuProvider};

/// GPU load and memory (`gpu_metrics`).
///
/// The provider is resolved on first use; a machine without a supported GPU
/// reports an `error` field rather than failing.
#[derive(Default)]
pub struct GpuSource {
    provider: OnceCell<Option<Box<dyn GpuProvider>>>,
}

impl GpuSource {
    pub fn new() -> Self {
        Self::default()
    }
}

impl MetricSource for GpuSource {
    fn name(&self) -> &'static str {
        "gpu_metrics"
    }

    fn produce_snapshot(&self) -> Result<Map<String, Value>> {
        let provider = self.provider.get_or_init(|| match get_gpu_provider() {
            Ok(provider) => Some(provider),
            Err(e) => {
                log::warn!("GPU provider not available: {}", e);
                None
            }
        });

        let mut payload = Map::new();
        match provider {
            Some(provider) => {
                let gpus = provider.collect()?;
                payload.insert("vendor".into(), json!(provider.vendor()));
                payload.insert("gpus".into(), serde_json::to_value(gpus)?);
            }
            None => {
                payload.insert("error".into(), json!("No supported GPU found"));
            }
        }
        Ok(payload)
    }
}
