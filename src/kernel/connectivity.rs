//! Layered reconnection across link, reachability and session.
//!
//! One tick evaluates exactly one state handler. Soft failures retry forever on
//! their fixed interval; repeated link failures escalate to a modem power-cycle
//! and repeated session failures (or a silent publish path) escalate to a
//! device restart, which latches the machine.

use tracing::{debug, error, info, warn};

use super::policy::RecoveryPolicy;
use super::state::{ConnectionState, FailureCounters, RestartReason, RetryTimestamps};
use super::telemetry::{ConnectivityEvent, EventRecorder, TransitionCause, TransitionSummary};
use super::time::{interval_elapsed, Uptime};
use crate::link::{MessageSession, NetworkLink};

pub struct ConnectivityStateMachine<L, S> {
    link: L,
    session: S,
    policy: RecoveryPolicy,
    state: ConnectionState,
    state_entered_at: Uptime,
    timers: RetryTimestamps,
    counters: FailureCounters,
    last_publish_success: Uptime,
    restart: Option<RestartReason>,
    history: EventRecorder,
}

impl<L: NetworkLink, S: MessageSession> ConnectivityStateMachine<L, S> {
    pub fn new(link: L, session: S, policy: RecoveryPolicy) -> Self {
        Self {
            link,
            session,
            policy,
            state: ConnectionState::LinkDown,
            state_entered_at: Uptime::ZERO,
            timers: RetryTimestamps::default(),
            counters: FailureCounters::default(),
            last_publish_success: Uptime::ZERO,
            restart: None,
            history: EventRecorder::new(),
        }
    }

    /// Probes the link once and picks the starting rung.
    pub fn begin(&mut self, now: Uptime) {
        if self.link.is_connected() {
            self.state = ConnectionState::LinkUpReachabilityDown;
            self.timers.reachability = None;
            info!("connectivity: link ready at boot, validating reachability next");
        } else {
            self.state = ConnectionState::LinkDown;
            self.timers.link = None;
            info!("connectivity: link offline at boot, starting reconnection loop");
        }
        self.state_entered_at = now;
        self.last_publish_success = now;
        self.history.record(ConnectivityEvent::Boot {
            state: self.state,
            at: now,
        });
    }

    /// One control-loop step. Returns the restart reason once an escalation
    /// has handed control to the platform; from then on the machine issues no
    /// further collaborator calls.
    pub fn tick(&mut self, now: Uptime) -> Option<RestartReason> {
        if let Some(reason) = self.restart {
            return Some(reason);
        }

        let escalation = match self.state {
            ConnectionState::LinkDown => self.handle_link_down(now),
            ConnectionState::LinkUpReachabilityDown => self.handle_reachability_down(now),
            ConnectionState::LinkUpReachabilityUpSessionDown => self.handle_session_down(now),
            ConnectionState::FullyConnected => self.handle_connected(now),
        };

        if let Some(reason) = escalation {
            error!(
                "connectivity: requesting device restart ({}) in state {}",
                reason.as_str(),
                self.state
            );
            self.restart = Some(reason);
            self.history.record(ConnectivityEvent::RestartRequested { reason, at: now });
            return Some(reason);
        }

        if self.policy.manages_session() {
            self.session.tick();
        }
        None
    }

    pub fn notify_publish_result(&mut self, success: bool, now: Uptime) {
        if success {
            self.last_publish_success = now;
        } else {
            self.counters.publish_failures = self.counters.publish_failures.saturating_add(1);
        }
    }

    // === State handlers ===

    fn handle_link_down(&mut self, now: Uptime) -> Option<RestartReason> {
        if !interval_elapsed(now, self.timers.link, self.policy.link_retry()) {
            return None;
        }

        self.timers.link = Some(now);
        self.counters.link_reconnect_attempts = self.counters.link_reconnect_attempts.saturating_add(1);
        info!(
            "connectivity: attempting link reconnection (attempt {})",
            self.counters.link_reconnect_attempts
        );

        if self.link.connect() {
            info!("connectivity: link reconnected");
            self.counters.link_consecutive_failures = 0;
            self.enter_reachability_check(now, TransitionCause::LinkRestored);
            return None;
        }

        self.counters.link_consecutive_failures = self.counters.link_consecutive_failures.saturating_add(1);
        warn!(
            "connectivity: link reconnection failed ({} consecutive)",
            self.counters.link_consecutive_failures
        );

        if self.counters.link_consecutive_failures >= self.policy.link_failures_before_power_cycle {
            warn!("connectivity: link not recovering, power-cycling modem");
            let recovered = self.link.hard_recover();
            self.history.record(ConnectivityEvent::PowerCycle { success: recovered, at: now });
            if recovered {
                info!("connectivity: modem power-cycle complete");
                self.counters.link_consecutive_failures = 0;
                self.counters.hard_reboots = self.counters.hard_reboots.saturating_add(1);
                self.enter_reachability_check(now, TransitionCause::PowerCycled);
                return None;
            }
            warn!("connectivity: modem power-cycle failed, will retry later");
        }

        None
    }

    fn handle_reachability_down(&mut self, now: Uptime) -> Option<RestartReason> {
        if !self.link.is_connected() {
            self.link_lost(now);
            return None;
        }

        if !interval_elapsed(now, self.timers.reachability, self.policy.reachability_retry()) {
            return None;
        }

        self.timers.reachability = Some(now);
        debug!("connectivity: testing reachability");

        if self.link.test_reachability() {
            info!("connectivity: reachability restored");
            self.counters.session_consecutive_failures = 0;
            self.timers.session = None;
            self.transition(
                ConnectionState::LinkUpReachabilityUpSessionDown,
                TransitionCause::ReachabilityRestored,
                now,
            );
        } else {
            self.counters.reachability_failures = self.counters.reachability_failures.saturating_add(1);
            warn!(
                "connectivity: reachability still down, retrying in {}s",
                self.policy.reachability_retry_secs
            );
        }
        None
    }

    fn handle_session_down(&mut self, now: Uptime) -> Option<RestartReason> {
        if !self.link.is_connected() {
            self.link_lost(now);
            return None;
        }

        if !self.policy.manages_session() {
            self.counters.session_consecutive_failures = 0;
            self.transition(ConnectionState::FullyConnected, TransitionCause::SessionAssumed, now);
            return None;
        }

        if !interval_elapsed(now, self.timers.session, self.policy.session_retry()) {
            return None;
        }

        self.timers.session = Some(now);
        self.counters.session_reconnect_attempts = self.counters.session_reconnect_attempts.saturating_add(1);
        info!("connectivity: attempting session reconnection");

        if self.session.connect() {
            info!("connectivity: session reconnected");
            self.counters.session_consecutive_failures = 0;
            self.transition(ConnectionState::FullyConnected, TransitionCause::SessionRestored, now);
            return None;
        }

        self.counters.session_consecutive_failures = self.counters.session_consecutive_failures.saturating_add(1);
        self.counters.session_failures_total = self.counters.session_failures_total.saturating_add(1);
        warn!(
            "connectivity: session reconnection failed ({}/{}, {} total)",
            self.counters.session_consecutive_failures,
            self.policy.session_failures_before_escalation,
            self.counters.session_failures_total
        );

        if self.counters.session_consecutive_failures >= self.policy.session_failures_before_escalation {
            warn!("connectivity: escalating to reachability diagnostics after session failures");
            self.counters.session_consecutive_failures = 0;
            self.timers.reachability = None;
            self.transition(
                ConnectionState::LinkUpReachabilityDown,
                TransitionCause::SessionEscalation,
                now,
            );
        }

        if self.counters.session_failures_total >= self.policy.session_failure_restart_budget {
            return Some(RestartReason::SessionFailureBudget);
        }
        None
    }

    fn handle_connected(&mut self, now: Uptime) -> Option<RestartReason> {
        if !self.link.is_connected() {
            self.link_lost(now);
            return None;
        }

        if self.policy.manages_session() && !self.session.is_connected() {
            warn!("connectivity: session dropped while connected");
            self.counters.session_consecutive_failures = 0;
            self.timers.session = None;
            self.transition(
                ConnectionState::LinkUpReachabilityUpSessionDown,
                TransitionCause::SessionLost,
                now,
            );
            return None;
        }

        if interval_elapsed(now, self.timers.reachability, self.policy.reachability_recheck()) {
            debug!("connectivity: periodic reachability re-check");
            if !self.link.test_reachability() {
                warn!("connectivity: reachability degraded, back to diagnostics");
                self.timers.reachability = None;
                self.transition(
                    ConnectionState::LinkUpReachabilityDown,
                    TransitionCause::ReachabilityDegraded,
                    now,
                );
                return None;
            }
            self.timers.reachability = Some(now);
        }

        if now.since(self.last_publish_success) >= self.policy.publish_watchdog() {
            error!(
                "connectivity: no successful publish for {}s",
                now.since(self.last_publish_success).as_secs()
            );
            return Some(RestartReason::PublishWatchdog);
        }

        if interval_elapsed(now, self.timers.health_check, self.policy.health_log()) {
            self.timers.health_check = Some(now);
            self.log_health(now);
        }
        None
    }

    // === Transitions ===

    fn enter_reachability_check(&mut self, now: Uptime, cause: TransitionCause) {
        self.timers.reachability = None;
        self.timers.session = None;
        self.transition(ConnectionState::LinkUpReachabilityDown, cause, now);
    }

    fn link_lost(&mut self, now: Uptime) {
        warn!("connectivity: link dropped in {}, returning to {}", self.state, ConnectionState::LinkDown);
        self.timers.link = None;
        self.transition(ConnectionState::LinkDown, TransitionCause::LinkLost, now);
    }

    fn transition(&mut self, to: ConnectionState, cause: TransitionCause, now: Uptime) {
        let from = self.state;
        self.state = to;
        self.state_entered_at = now;
        info!("connectivity: {} -> {} ({})", from, to, cause.as_str());
        self.history.record(ConnectivityEvent::Transition { from, to, cause, at: now });
    }

    fn log_health(&mut self, now: Uptime) {
        let c = self.counters;
        let signal = self.link.signal_quality();
        let carrier = self.link.carrier();
        info!(
            state = self.state.as_str(),
            signal = ?signal,
            carrier = ?carrier,
            link_reconnects = c.link_reconnect_attempts,
            hard_reboots = c.hard_reboots,
            reachability_failures = c.reachability_failures,
            session_reconnects = c.session_reconnect_attempts,
            session_failures_total = c.session_failures_total,
            publish_failures = c.publish_failures,
            secs_since_publish = now.since(self.last_publish_success).as_secs(),
            "connectivity: periodic health check"
        );
    }

    // === Readiness ===

    pub fn is_link_ready(&mut self) -> bool {
        self.link.is_connected()
    }

    pub fn is_reachability_ready(&self) -> bool {
        matches!(
            self.state,
            ConnectionState::LinkUpReachabilityUpSessionDown | ConnectionState::FullyConnected
        )
    }

    pub fn is_session_ready(&mut self) -> bool {
        self.state == ConnectionState::FullyConnected
            && (!self.policy.manages_session() || self.session.is_connected())
    }

    pub fn is_fully_connected(&self) -> bool {
        self.state == ConnectionState::FullyConnected
    }

    // === Accessors ===

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn state_entered_at(&self) -> Uptime {
        self.state_entered_at
    }

    pub fn counters(&self) -> FailureCounters {
        self.counters
    }

    pub fn retry_timestamps(&self) -> RetryTimestamps {
        self.timers
    }

    pub fn last_publish_success(&self) -> Uptime {
        self.last_publish_success
    }

    pub fn secs_since_publish(&self, now: Uptime) -> u64 {
        now.since(self.last_publish_success).as_secs()
    }

    pub fn restart_requested(&self) -> Option<RestartReason> {
        self.restart
    }

    pub fn history(&self) -> &EventRecorder {
        &self.history
    }

    pub fn history_summary(&self) -> TransitionSummary {
        self.history.summary()
    }

    pub fn policy(&self) -> &RecoveryPolicy {
        &self.policy
    }

    pub fn link(&self) -> &L {
        &self.link
    }

    pub fn link_mut(&mut self) -> &mut L {
        &mut self.link
    }

    pub fn session(&self) -> &S {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut S {
        &mut self.session
    }
}
