use serde::Serialize;

use crate::kernel::state::{ConnectionState, RestartReason};
use crate::kernel::time::Uptime;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TransitionCause {
    LinkRestored,
    PowerCycled,
    ReachabilityRestored,
    SessionRestored,
    /// Session rung passed through without a connect call (unmanaged layer).
    SessionAssumed,
    LinkLost,
    SessionLost,
    SessionEscalation,
    ReachabilityDegraded,
}

impl TransitionCause {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::LinkRestored => "link_restored",
            Self::PowerCycled => "power_cycled",
            Self::ReachabilityRestored => "reachability_restored",
            Self::SessionRestored => "session_restored",
            Self::SessionAssumed => "session_assumed",
            Self::LinkLost => "link_lost",
            Self::SessionLost => "session_lost",
            Self::SessionEscalation => "session_escalation",
            Self::ReachabilityDegraded => "reachability_degraded",
        }
    }
}

// Events carry states, causes and times only. Payload text never lands here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ConnectivityEvent {
    Boot {
        state: ConnectionState,
        at: Uptime,
    },

    Transition {
        from: ConnectionState,
        to: ConnectionState,
        cause: TransitionCause,
        at: Uptime,
    },

    PowerCycle {
        success: bool,
        at: Uptime,
    },

    RestartRequested {
        reason: RestartReason,
        at: Uptime,
    },
}
