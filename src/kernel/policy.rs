use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Whether the machine owns the message-session rung of the ladder.
///
/// `Unmanaged` is for builds whose transport has no long-lived session: the
/// rung is still passed through in order, but it is treated as always up.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionLayer {
    #[default]
    Managed,
    Unmanaged,
}

/// Retry cadences and escalation thresholds of the recovery ladder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecoveryPolicy {
    pub link_retry_secs: u64,
    pub reachability_retry_secs: u64,
    pub session_retry_secs: u64,
    /// Re-probe cadence while fully connected.
    pub reachability_recheck_secs: u64,
    pub health_log_secs: u64,
    pub link_failures_before_power_cycle: u32,
    pub session_failures_before_escalation: u32,
    /// Cumulative session failures since boot that trigger a device restart.
    pub session_failure_restart_budget: u32,
    pub publish_watchdog_secs: u64,
    pub session_layer: SessionLayer,
}

impl Default for RecoveryPolicy {
    fn default() -> Self {
        Self {
            link_retry_secs: 30,
            reachability_retry_secs: 10,
            session_retry_secs: 10,
            reachability_recheck_secs: 300,
            health_log_secs: 300,
            link_failures_before_power_cycle: 3,
            session_failures_before_escalation: 3,
            session_failure_restart_budget: 9,
            publish_watchdog_secs: 600,
            session_layer: SessionLayer::Managed,
        }
    }
}

impl RecoveryPolicy {
    pub fn link_retry(&self) -> Duration {
        Duration::from_secs(self.link_retry_secs)
    }

    pub fn reachability_retry(&self) -> Duration {
        Duration::from_secs(self.reachability_retry_secs)
    }

    pub fn session_retry(&self) -> Duration {
        Duration::from_secs(self.session_retry_secs)
    }

    pub fn reachability_recheck(&self) -> Duration {
        Duration::from_secs(self.reachability_recheck_secs)
    }

    pub fn health_log(&self) -> Duration {
        Duration::from_secs(self.health_log_secs)
    }

    pub fn publish_watchdog(&self) -> Duration {
        Duration::from_secs(self.publish_watchdog_secs)
    }

    pub fn manages_session(&self) -> bool {
        self.session_layer == SessionLayer::Managed
    }
}
