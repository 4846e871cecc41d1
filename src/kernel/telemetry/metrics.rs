use serde::Serialize;
use std::collections::VecDeque;

use super::event::{ConnectivityEvent, TransitionCause};
use crate::kernel::state::ConnectionState;

/// Aggregate over the recorder's retained window, not the whole process
/// lifetime. Lifetime totals live in `FailureCounters`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TransitionSummary {
    pub transitions: u64,
    pub full_recoveries: u64,
    pub link_losses: u64,
    pub session_losses: u64,
    pub session_escalations: u64,
    pub reachability_degradations: u64,
    pub power_cycles_ok: u64,
    pub power_cycles_failed: u64,
    pub restart_requests: u64,
}

pub fn compute_summary(events: &VecDeque<ConnectivityEvent>) -> TransitionSummary {
    let mut summary = TransitionSummary::default();

    for event in events {
        match event {
            ConnectivityEvent::Transition { to, cause, .. } => {
                summary.transitions += 1;
                if *to == ConnectionState::FullyConnected {
                    summary.full_recoveries += 1;
                }
                match cause {
                    TransitionCause::LinkLost => summary.link_losses += 1,
                    TransitionCause::SessionLost => summary.session_losses += 1,
                    TransitionCause::SessionEscalation => summary.session_escalations += 1,
                    TransitionCause::ReachabilityDegraded => summary.reachability_degradations += 1,
                    _ => {}
                }
            }
            ConnectivityEvent::PowerCycle { success, .. } => {
                if *success {
                    summary.power_cycles_ok += 1;
                } else {
                    summary.power_cycles_failed += 1;
                }
            }
            ConnectivityEvent::RestartRequested { .. } => summary.restart_requests += 1,
            ConnectivityEvent::Boot { .. } => {}
        }
    }

    summary
}
