use serde::Serialize;
use uuid::Uuid;

use super::metrics::TransitionSummary;
use crate::kernel::state::FailureCounters;
use crate::publisher::PublisherStats;

/// Observability surface of the node, embedded in outgoing telemetry by the
/// record source and logged locally.
#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub boot_id: Uuid,
    pub uptime_s: u64,
    pub state: &'static str,
    pub counters: FailureCounters,
    pub secs_since_publish: u64,
    pub storage_tier: &'static str,
    pub queue_depth: usize,
    pub publisher: PublisherStats,
    pub history: TransitionSummary,
}
