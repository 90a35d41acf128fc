use serde::Serialize;
use serde_json::{Map, Value};
use sysinfo::System;

use super::{round2, to_object, MetricSource};
use crate::core::snapshot::local_timestamp;
use crate::error::{PerfError, Result};

/// A reading that is reported as the string `"N/A"` when the machine has
/// no battery.
#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Reading<T> {
    Value(T),
    Unavailable(&'static str),
}

const NOT_AVAILABLE: &str = "N/A";

#[derive(Debug, Serialize)]
struct PowerPayload {
    current_time: String,
    uptime_seconds: u64,
    battery_percent: Reading<f64>,
    power_plugged: Reading<bool>,
}

/// Battery charge and AC state (`power_metrics`).
#[derive(Default)]
pub struct PowerSource;

impl PowerSource {
    pub fn new() -> Self {
        Self
    }

    /// Charge of the first battery and whether the machine is on AC power.
    fn read_battery(&self) -> Result<Option<(f64, bool)>> {
        let manager = battery::Manager::new()
            .map_err(|e| PerfError::source_failure(self.name(), e.to_string()))?;
        let mut batteries = manager
            .batteries()
            .map_err(|e| PerfError::source_failure(self.name(), e.to_string()))?;

        let Some(first) = batteries.next() else {
            return Ok(None);
        };
        let battery = first.map_err(|e| PerfError::source_failure(self.name(), e.to_string()))?;

        let charge = battery
            .state_of_charge()
            .get::<battery::units::ratio::percent>();
        let plugged = !matches!(
            battery.state(),
            battery::State::Discharging | battery::State::Empty
        );

        Ok(Some((round2(f64::from(charge)), plugged)))
    }
}

impl MetricSource for PowerSource {
    fn name(&self) -> &'static str {
        "power_metrics"
    }

    fn produce_snapshot(&self) -> Result<Map<String, Value>> {
        let (battery_percent, power_plugged) = match self.read_battery()? {
            Some((charge, plugged)) => (Reading::Value(charge), Reading::Value(plugged)),
            None => (
                Reading::Unavailable(NOT_AVAILABLE),
                Reading::Unavailable(NOT_AVAILABLE),
            ),
        };

        let payload = PowerPayload {
            current_time: local_timestamp(),
            uptime_seconds: System::uptime(),
            battery_percent,
            power_plugged,
        };

        to_object(self.name(), &payload)
    }
}
