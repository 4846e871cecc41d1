//! The control loop: one connectivity tick, then the boot announcement and the
//! telemetry decision, once per cadence.

use std::time::Duration;
use tokio::runtime::{Handle, RuntimeFlavor};
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::NodeConfig;
use crate::kernel::connectivity::ConnectivityStateMachine;
use crate::kernel::state::RestartReason;
use crate::kernel::telemetry::HealthReport;
use crate::kernel::time::{interval_elapsed, Clock, Uptime};
use crate::link::{MessageSession, NetworkLink};
use crate::publisher::{PublishOutcome, TelemetryPublisher};
use crate::storage::{DurableQueue, QueueRecord};

/// Payload construction lives outside the core. A source returning `None`
/// simply skips that record.
pub trait RecordSource {
    fn boot_record(&mut self, health: &HealthReport) -> Option<QueueRecord>;
    fn telemetry_record(&mut self, health: &HealthReport) -> Option<QueueRecord>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shutdown {
    Interrupted,
    /// The platform must restart the device.
    Restart(RestartReason),
}

pub struct FieldNode<L, S, C, R> {
    machine: ConnectivityStateMachine<L, S>,
    queue: DurableQueue,
    publisher: TelemetryPublisher,
    clock: C,
    source: R,
    boot_id: Uuid,
    telemetry_interval: Duration,
    loop_interval: Duration,
    last_telemetry: Option<Uptime>,
    boot_announced: bool,
    started: bool,
}

impl<L, S, C, R> FieldNode<L, S, C, R>
where
    L: NetworkLink,
    S: MessageSession,
    C: Clock,
    R: RecordSource,
{
    pub fn new(config: &NodeConfig, link: L, session: S, clock: C, source: R, queue: DurableQueue) -> Self {
        Self {
            machine: ConnectivityStateMachine::new(link, session, config.recovery.clone()),
            queue,
            publisher: TelemetryPublisher::new(
                &config.device_id,
                &config.topic_prefix,
                config.storage.drain_batch,
            ),
            clock,
            source,
            boot_id: Uuid::new_v4(),
            telemetry_interval: config.telemetry_interval(),
            loop_interval: config.loop_interval(),
            last_telemetry: None,
            boot_announced: false,
            started: false,
        }
    }

    pub fn begin(&mut self) {
        let now = self.clock.now();
        info!(
            "node: boot {} (queue on {}, {} pending)",
            self.boot_id,
            self.queue.tier(),
            self.queue.size()
        );
        self.machine.begin(now);
        self.started = true;
    }

    /// One loop iteration. Returns the restart reason once the machine has
    /// escalated; nothing else runs in that iteration or after it.
    pub fn step(&mut self) -> Option<RestartReason> {
        let now = self.clock.now();
        if let Some(reason) = self.machine.tick(now) {
            return Some(reason);
        }

        if self.machine.is_fully_connected() && !self.boot_announced {
            self.announce_boot(now);
        }

        if interval_elapsed(now, self.last_telemetry, self.telemetry_interval) {
            self.last_telemetry = Some(now);
            self.emit_telemetry(now);
        }
        None
    }

    fn announce_boot(&mut self, now: Uptime) {
        let report = self.health_report(now);
        match self.source.boot_record(&report) {
            Some(record) => {
                self.boot_announced = self.publisher.announce_boot(&record, &mut self.machine, now);
            }
            None => {
                debug!("node: no boot record, skipping announcement");
                self.boot_announced = true;
            }
        }
    }

    fn emit_telemetry(&mut self, now: Uptime) {
        let report = self.health_report(now);
        let Some(record) = self.source.telemetry_record(&report) else {
            return;
        };
        match self.publisher.submit(record, &mut self.machine, &mut self.queue, now) {
            PublishOutcome::Published { drain } => debug!(
                "node: telemetry published (drained {}, requeued {})",
                drain.republished, drain.requeued
            ),
            PublishOutcome::Queued => debug!("node: telemetry queued ({} pending)", self.queue.size()),
            PublishOutcome::Lost => warn!("node: telemetry record lost, {} cannot store it", self.queue.tier()),
        }
    }

    /// Drives [`step`](Self::step) on the loop cadence until cancelled or until
    /// a restart is requested.
    ///
    /// A step blocks for as long as its collaborator calls do (a modem
    /// power-cycle can take tens of seconds) and cancellation is only seen
    /// between steps. On a multi-threaded runtime the step runs under
    /// `block_in_place`, so other tasks such as the signal handler keep going.
    pub async fn run(&mut self, cancel: CancellationToken) -> Shutdown {
        if !self.started {
            self.begin();
        }
        info!("node: control loop started, cadence {:?}", self.loop_interval);

        let mut cadence = interval(self.loop_interval);
        cadence.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    info!("node: shutdown requested");
                    return Shutdown::Interrupted;
                }
                _ = cadence.tick() => {
                    if let Some(reason) = self.step_in_runtime() {
                        return Shutdown::Restart(reason);
                    }
                }
            }
        }
    }

    fn step_in_runtime(&mut self) -> Option<RestartReason> {
        match Handle::try_current().map(|h| h.runtime_flavor()) {
            Ok(RuntimeFlavor::MultiThread) => tokio::task::block_in_place(|| self.step()),
            _ => self.step(),
        }
    }

    pub fn health_report(&self, now: Uptime) -> HealthReport {
        HealthReport {
            boot_id: self.boot_id,
            uptime_s: now.as_secs(),
            state: self.machine.state().as_str(),
            counters: self.machine.counters(),
            secs_since_publish: self.machine.secs_since_publish(now),
            storage_tier: self.queue.tier_name(),
            queue_depth: self.queue.size(),
            publisher: self.publisher.stats(),
            history: self.machine.history_summary(),
        }
    }

    pub fn boot_id(&self) -> Uuid {
        self.boot_id
    }

    pub fn boot_announced(&self) -> bool {
        self.boot_announced
    }

    pub fn machine(&self) -> &ConnectivityStateMachine<L, S> {
        &self.machine
    }

    pub fn machine_mut(&mut self) -> &mut ConnectivityStateMachine<L, S> {
        &mut self.machine
    }

    pub fn queue(&self) -> &DurableQueue {
        &self.queue
    }

    pub fn publisher(&self) -> &TelemetryPublisher {
        &self.publisher
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }
}
