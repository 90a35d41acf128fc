use parking_lot::Mutex;
use serde::Serialize;
use serde_json::{Map, Value};
use sysinfo::Networks;

use super::{to_object, MetricSource};
use crate::error::Result;

#[derive(Debug, Default, Serialize)]
struct NetworkPayload {
    bytes_sent: u64,
    bytes_received: u64,
    packets_sent: u64,
    packets_received: u64,
}

/// Cumulative traffic summed over every interface (`network_metrics`).
pub struct NetworkSource {
    networks: Mutex<Networks>,
}

impl NetworkSource {
    pub fn new() -> Self {
        Self {
            networks: Mutex::new(Networks::new_with_refreshed_list()),
        }
    }
}

impl Default for NetworkSource {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricSource for NetworkSource {
    fn name(&self) -> &'static str {
        "network_metrics"
    }

    fn produce_snapshot(&self) -> Result<Map<String, Value>> {
        let mut networks = self.networks.lock();
        networks.refresh(true);

        let payload = networks
            .values()
            .fold(NetworkPayload::default(), |mut acc, data| {
                acc.bytes_sent += data.total_transmitted();
                acc.bytes_received += data.total_received();
                acc.packets_sent += data.total_packets_transmitted();
                acc.packets_received += data.total_packets_received();
                acc
            });

        to_object(self.name(), &payload)
    }
}
