use serde::Serialize;
use super::time::Uptime;

/// The recovery ladder. Exactly one rung is current; promotion only ever moves
/// one rung up per tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ConnectionState {
    LinkDown,
    LinkUpReachabilityDown,
    LinkUpReachabilityUpSessionDown,
    FullyConnected,
}

impl ConnectionState {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::LinkDown => "LINK_DOWN",
            Self::LinkUpReachabilityDown => "LINK_UP_REACHABILITY_DOWN",
            Self::LinkUpReachabilityUpSessionDown => "LINK_UP_REACHABILITY_UP_SESSION_DOWN",
            Self::FullyConnected => "FULLY_CONNECTED",
        }
    }
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Last attempt per layer. `None` is "unset": the layer fires on the next tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RetryTimestamps {
    pub link: Option<Uptime>,
    pub reachability: Option<Uptime>,
    pub session: Option<Uptime>,
    pub health_check: Option<Uptime>,
}

/// Consecutive counters reset on success at their layer, the rest only grow.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FailureCounters {
    pub link_consecutive_failures: u32,
    pub link_reconnect_attempts: u32,
    pub hard_reboots: u32,
    pub reachability_failures: u32,
    pub session_consecutive_failures: u32,
    pub session_reconnect_attempts: u32,
    pub session_failures_total: u32,
    pub publish_failures: u32,
}

/// Why the machine handed control to a platform reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum RestartReason {
    SessionFailureBudget,
    PublishWatchdog,
}

impl RestartReason {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SessionFailureBudget => "session_failure_budget",
            Self::PublishWatchdog => "publish_watchdog",
        }
    }
}
