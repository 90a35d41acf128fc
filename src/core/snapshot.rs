use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One fully aggregated reading across all subsystems.
///
/// Serialises flat: `timestamp` next to one key per subsystem, which is
/// exactly one line of the persisted log.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricSnapshot {
    #[serde(default)]
    pub timestamp: String,
    #[serde(flatten)]
    pub subsystems: Map<String, Value>,
}

impl MetricSnapshot {
    pub fn new(timestamp: String) -> Self {
        Self {
            timestamp,
            subsystems: Map::new(),
        }
    }

    /// Payload of a subsystem, if present.
    pub fn subsystem(&self, name: &str) -> Option<&Value> {
        self.subsystems.get(name)
    }

    /// Error description recorded for a failed subsystem.
    pub fn subsystem_error(&self, name: &str) -> Option<&str> {
        self.subsystem(name)?.get("error")?.as_str()
    }

    pub fn insert(&mut self, name: impl Into<String>, payload: Value) {
        self.subsystems.insert(name.into(), payload);
    }
}

/// Current time as ISO-8601 UTC with a trailing `Z`.
pub fn utc_timestamp() -> String {
    chrono::Utc::now()
        .format("%Y-%m-%dT%H:%M:%S%.6fZ")
        .to_string()
}

/// Current local time, `YYYY-MM-DD HH:MM:SS`.
pub fn local_timestamp() -> String {
    chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}
