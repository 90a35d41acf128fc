// Fake metric sources shared by the integration tests

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use perfscope::core::sources::MetricSource;
use perfscope::error::{PerfError, Result};
use serde_json::{Map, Value};

/// Returns a fixed payload and counts its calls, optionally after a delay.
pub struct FakeSource {
    name: &'static str,
    payload: Value,
    delay: Duration,
    pub calls: Arc<AtomicUsize>,
}

impl FakeSource {
    pub fn new(name: &'static str, payload: Value) -> Self {
        Self {
            name,
            payload,
            delay: Duration::ZERO,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn slow(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }
}

impl MetricSource for FakeSource {
    fn name(&self) -> &'static str {
        self.name
    }

    fn produce_snapshot(&self) -> Result<Map<String, Value>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }
        match &self.payload {
            Value::Object(map) => Ok(map.clone()),
            _ => Err(PerfError::source_failure(self.name, "payload is not an object")),
        }
    }
}

/// Always fails with a source error.
pub struct FailingSource(pub &'static str);

impl MetricSource for FailingSource {
    fn name(&self) -> &'static str {
        self.0
    }

    fn produce_snapshot(&self) -> Result<Map<String, Value>> {
        Err(PerfError::source_failure(self.0, "sensor unavailable"))
    }
}

/// Panics inside the probe.
pub struct PanickingSource(pub &'static str);

impl MetricSource for PanickingSource {
    fn name(&self) -> &'static str {
        self.0
    }

    fn produce_snapshot(&self) -> Result<Map<String, Value>> {
        panic!("probe crashed");
    }
}

pub fn shared(source: impl MetricSource + 'static) -> Arc<dyn MetricSource> {
    Arc::new(source)
}
