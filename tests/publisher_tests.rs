mod common;

use std::fs;

use common::{connected_machine, machine, primary_storage, record, secs, volatile_queue, ScriptedLink, ScriptedSession};
use fieldlink::kernel::state::ConnectionState;
use fieldlink::kernel::time::Uptime;
use fieldlink::publisher::{DrainReport, PublishOutcome, TelemetryPublisher};
use fieldlink::storage::DurableQueue;

const TELEMETRY: &str = "sensor/X/telemetry";

fn publisher() -> TelemetryPublisher {
    TelemetryPublisher::new("X", "sensor", 10)
}

fn queued(n: usize) -> DurableQueue {
    let mut queue = volatile_queue(64);
    for i in 1..=n {
        queue.enqueue(&record(&format!(r#"{{"q":{i}}}"#))).unwrap();
    }
    queue
}

#[test]
fn test_topics_follow_prefix_and_device() {
    let p = TelemetryPublisher::new("X", "sensor/", 10);
    assert_eq!(p.telemetry_topic(), TELEMETRY);
    assert_eq!(p.boot_topic(), "sensor/X/boot");
    assert_eq!(p.command_topic(), "sensor/X/command");
}

#[test]
fn test_offline_record_is_queued_without_publish() {
    let mut m = machine(ScriptedLink::down(), ScriptedSession::healthy());
    m.begin(Uptime::ZERO);
    let mut queue = volatile_queue(10);
    let mut p = publisher();

    let outcome = p.submit(record(r#"{"v":1}"#), &mut m, &mut queue, secs(1));

    assert_eq!(outcome, PublishOutcome::Queued);
    assert_eq!(queue.size(), 1);
    assert!(m.session().published.is_empty());
    assert_eq!(p.stats().queued, 1);
}

#[test]
fn test_live_publish_then_bounded_drain_in_order() {
    let mut m = connected_machine();
    let mut queue = queued(12);
    let mut p = publisher();

    let outcome = p.submit(record(r#"{"live":true}"#), &mut m, &mut queue, secs(5));

    assert_eq!(
        outcome,
        PublishOutcome::Published {
            drain: DrainReport {
                republished: 10,
                requeued: 0,
                dropped: 0,
                stopped_early: false,
            }
        }
    );
    let sent = m.session().payloads_on(TELEMETRY);
    assert_eq!(sent[0], r#"{"live":true}"#);
    let drained: Vec<String> = (1..=10).map(|i| format!(r#"{{"q":{i}}}"#)).collect();
    assert_eq!(&sent[1..], drained.as_slice());

    assert_eq!(queue.size(), 2);
    assert_eq!(m.last_publish_success(), secs(5));
    assert_eq!(p.stats().published, 1);
    assert_eq!(p.stats().drained, 10);
}

#[test]
fn test_failed_republish_requeues_at_tail_and_stops() {
    let mut m = connected_machine();
    m.session_mut().publish_results.extend([true, true, false]);
    let mut queue = queued(3);
    let mut p = publisher();

    let outcome = p.submit(record(r#"{"live":1}"#), &mut m, &mut queue, secs(1));

    let PublishOutcome::Published { drain } = outcome else {
        panic!("expected a live publish, got {outcome:?}");
    };
    assert_eq!(drain.republished, 1);
    assert_eq!(drain.requeued, 1);
    assert!(drain.stopped_early);

    assert_eq!(queue.size(), 2);
    assert_eq!(queue.dequeue_oldest().unwrap().as_str(), r#"{"q":3}"#);
    assert_eq!(queue.dequeue_oldest().unwrap().as_str(), r#"{"q":2}"#);
    assert_eq!(m.state(), ConnectionState::FullyConnected);
}

#[test]
fn test_direct_publish_failure_notifies_and_queues() {
    let mut m = connected_machine();
    m.session_mut().publish_results.push_back(false);
    let mut queue = queued(1);
    let mut p = publisher();

    let outcome = p.submit(record(r#"{"v":2}"#), &mut m, &mut queue, secs(3));

    assert_eq!(outcome, PublishOutcome::Queued);
    assert_eq!(m.counters().publish_failures, 1);
    assert_eq!(m.last_publish_success(), Uptime::ZERO);
    assert_eq!(queue.size(), 2);
    assert_eq!(m.state(), ConnectionState::FullyConnected);

    m.tick(secs(4));
    assert_eq!(m.state(), ConnectionState::FullyConnected);
}

#[test]
fn test_corrupt_journal_line_is_skipped_during_drain() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("sd_queue.jsonl"), "{\"q\":1}\nnot-json\n{\"q\":2}\n").unwrap();
    let mut queue = DurableQueue::open(&primary_storage(dir.path()));
    let mut m = connected_machine();
    let mut p = publisher();

    let report = p.drain(&mut m, &mut queue);

    assert_eq!(report.republished, 2);
    assert_eq!(report.dropped, 1);
    assert_eq!(queue.size(), 0);
    assert_eq!(m.session().payloads_on(TELEMETRY), vec![r#"{"q":1}"#, r#"{"q":2}"#]);
    assert_eq!(p.stats().dropped_corrupt, 1);
}

#[test]
fn test_record_without_storage_is_lost() {
    let mut m = machine(ScriptedLink::down(), ScriptedSession::down());
    m.begin(Uptime::ZERO);
    let mut queue = DurableQueue::new();
    let mut p = publisher();

    let outcome = p.submit(record("{}"), &mut m, &mut queue, secs(1));
    assert_eq!(outcome, PublishOutcome::Lost);
    assert_eq!(p.stats().lost, 1);
}

#[test]
fn test_boot_announcement_subscribes_to_commands() {
    let mut m = connected_machine();
    let mut p = publisher();

    assert!(p.announce_boot(&record(r#"{"event":"boot"}"#), &mut m, secs(2)));

    assert_eq!(m.session().payloads_on("sensor/X/boot"), vec![r#"{"event":"boot"}"#]);
    assert_eq!(m.session().subscriptions, vec!["sensor/X/command".to_string()]);
    assert_eq!(m.last_publish_success(), secs(2));
}

#[test]
fn test_failed_boot_announcement_skips_subscription() {
    let mut m = connected_machine();
    m.session_mut().publish_results.push_back(false);
    let mut p = publisher();

    assert!(!p.announce_boot(&record(r#"{"event":"boot"}"#), &mut m, secs(2)));
    assert!(m.session().subscriptions.is_empty());
    assert_eq!(m.counters().publish_failures, 1);
}
