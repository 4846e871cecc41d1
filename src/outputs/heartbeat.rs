use serde_json::json;
use tracing::warn;

use crate::kernel::telemetry::HealthReport;
use crate::node::RecordSource;
use crate::storage::QueueRecord;

/// Record source for nodes with no sensors wired in: every record is the
/// node-info block alone.
pub struct HeartbeatSource {
    device_id: String,
    sequence: u64,
}

impl HeartbeatSource {
    pub fn new(device_id: &str) -> Self {
        Self {
            device_id: device_id.to_string(),
            sequence: 0,
        }
    }

    fn build(&mut self, event: &str, health: &HealthReport) -> Option<QueueRecord> {
        self.sequence += 1;
        let body = json!({
            "device_id": self.device_id,
            "event": event,
            "seq": self.sequence,
            "node": health,
        });
        // serde_json's compact form never emits a raw line break.
        match QueueRecord::new(body.to_string()) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!("heartbeat: cannot build {} record: {}", event, e);
                None
            }
        }
    }
}

impl RecordSource for HeartbeatSource {
    fn boot_record(&mut self, health: &HealthReport) -> Option<QueueRecord> {
        self.build("boot", health)
    }

    fn telemetry_record(&mut self, health: &HealthReport) -> Option<QueueRecord> {
        self.build("heartbeat", health)
    }
}
