//! Publish-or-queue decision for each outgoing record, and the bounded drain of
//! the offline queue once the session is back.

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::kernel::connectivity::ConnectivityStateMachine;
use crate::kernel::time::Uptime;
use crate::link::{MessageSession, NetworkLink};
use crate::storage::{DurableQueue, QueueError, QueueRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishOutcome {
    /// Sent live; `drain` reports what the follow-up drain pass did.
    Published { drain: DrainReport },
    Queued,
    /// Could not be sent nor stored.
    Lost,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DrainReport {
    pub republished: usize,
    pub requeued: usize,
    pub dropped: usize,
    /// The pass ended on a failed republish rather than an empty queue or
    /// the batch limit.
    pub stopped_early: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PublisherStats {
    pub published: u64,
    pub queued: u64,
    pub drained: u64,
    pub requeued: u64,
    pub dropped_corrupt: u64,
    pub lost: u64,
}

pub struct TelemetryPublisher {
    telemetry_topic: String,
    boot_topic: String,
    command_topic: String,
    drain_batch: usize,
    stats: PublisherStats,
}

impl TelemetryPublisher {
    pub fn new(device_id: &str, topic_prefix: &str, drain_batch: usize) -> Self {
        let base = format!("{}/{}", topic_prefix.trim_end_matches('/'), device_id);
        Self {
            telemetry_topic: format!("{base}/telemetry"),
            boot_topic: format!("{base}/boot"),
            command_topic: format!("{base}/command"),
            drain_batch: drain_batch.max(1),
            stats: PublisherStats::default(),
        }
    }

    pub fn telemetry_topic(&self) -> &str {
        &self.telemetry_topic
    }

    pub fn boot_topic(&self) -> &str {
        &self.boot_topic
    }

    pub fn command_topic(&self) -> &str {
        &self.command_topic
    }

    pub fn stats(&self) -> PublisherStats {
        self.stats
    }

    /// Publishes `record` if the machine is fully connected, otherwise parks it
    /// in the queue. A live publish that succeeds is followed by one bounded
    /// drain pass. A failed publish is reported to the machine but does not
    /// demote its state.
    pub fn submit<L, S>(
        &mut self,
        record: QueueRecord,
        machine: &mut ConnectivityStateMachine<L, S>,
        queue: &mut DurableQueue,
        now: Uptime,
    ) -> PublishOutcome
    where
        L: NetworkLink,
        S: MessageSession,
    {
        if !machine.is_fully_connected() {
            debug!("publisher: offline ({}), queueing record", machine.state());
            return self.park(&record, queue);
        }

        let sent = machine.session_mut().publish(&self.telemetry_topic, record.as_str());
        machine.notify_publish_result(sent, now);

        if !sent {
            warn!("publisher: publish failed, queueing record");
            return self.park(&record, queue);
        }

        self.stats.published += 1;
        let drain = if queue.size() > 0 {
            self.drain(machine, queue)
        } else {
            DrainReport::default()
        };
        PublishOutcome::Published { drain }
    }

    /// Republishes up to `drain_batch` queued records, oldest first. The first
    /// failed republish puts that record back at the tail and ends the pass.
    pub fn drain<L, S>(
        &mut self,
        machine: &mut ConnectivityStateMachine<L, S>,
        queue: &mut DurableQueue,
    ) -> DrainReport
    where
        L: NetworkLink,
        S: MessageSession,
    {
        let mut report = DrainReport::default();
        let pending = queue.size();
        if pending == 0 {
            return report;
        }
        info!("publisher: draining offline queue ({} pending on {})", pending, queue.tier());

        for _ in 0..self.drain_batch {
            let record = match queue.dequeue_oldest() {
                Ok(record) => record,
                Err(QueueError::Empty) => break,
                Err(e) if e.consumed_record() => {
                    report.dropped += 1;
                    self.stats.dropped_corrupt += 1;
                    continue;
                }
                Err(e) => {
                    warn!("publisher: drain aborted: {}", e);
                    break;
                }
            };

            if machine.session_mut().publish(&self.telemetry_topic, record.as_str()) {
                report.republished += 1;
                self.stats.drained += 1;
                continue;
            }

            warn!("publisher: republish failed, returning record to queue");
            match queue.enqueue(&record) {
                Ok(()) => {
                    report.requeued += 1;
                    self.stats.requeued += 1;
                }
                Err(_) => self.stats.lost += 1,
            }
            report.stopped_early = true;
            break;
        }

        info!(
            "publisher: drain pass done ({} sent, {} requeued, {} dropped, {} left)",
            report.republished,
            report.requeued,
            report.dropped,
            queue.size()
        );
        report
    }

    /// Boot record on the boot topic, then the command subscription. Returns
    /// whether the announcement went out.
    pub fn announce_boot<L, S>(
        &mut self,
        record: &QueueRecord,
        machine: &mut ConnectivityStateMachine<L, S>,
        now: Uptime,
    ) -> bool
    where
        L: NetworkLink,
        S: MessageSession,
    {
        let sent = machine.session_mut().publish(&self.boot_topic, record.as_str());
        machine.notify_publish_result(sent, now);
        if !sent {
            warn!("publisher: boot announcement failed, will retry");
            return false;
        }

        self.stats.published += 1;
        info!("publisher: boot announced on {}", self.boot_topic);
        if machine.session_mut().subscribe(&self.command_topic) {
            info!("publisher: subscribed to {}", self.command_topic);
        } else {
            warn!("publisher: subscribe to {} failed", self.command_topic);
        }
        true
    }

    fn park(&mut self, record: &QueueRecord, queue: &mut DurableQueue) -> PublishOutcome {
        match queue.enqueue(record) {
            Ok(()) => {
                self.stats.queued += 1;
                PublishOutcome::Queued
            }
            Err(_) => {
                self.stats.lost += 1;
                PublishOutcome::Lost
            }
        }
    }
}
