#![allow(dead_code)]

use std::collections::VecDeque;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use fieldlink::config::StorageConfig;
use fieldlink::kernel::policy::RecoveryPolicy;
use fieldlink::kernel::state::ConnectionState;
use fieldlink::kernel::time::{Clock, Uptime};
use fieldlink::link::{MessageSession, NetworkLink};
use fieldlink::storage::{DurableQueue, QueueRecord};
use fieldlink::ConnectivityStateMachine;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkCall {
    Connect,
    Disconnect,
    Reachability,
    HardRecover,
}

/// Link whose answers come from scripted queues, falling back to defaults.
pub struct ScriptedLink {
    pub up: bool,
    pub connect_results: VecDeque<bool>,
    pub connect_default: bool,
    pub reachability_results: VecDeque<bool>,
    pub reachability_default: bool,
    pub recover_results: VecDeque<bool>,
    pub recover_default: bool,
    pub calls: Vec<LinkCall>,
}

impl ScriptedLink {
    pub fn down() -> Self {
        Self {
            up: false,
            connect_results: VecDeque::new(),
            connect_default: false,
            reachability_results: VecDeque::new(),
            reachability_default: false,
            recover_results: VecDeque::new(),
            recover_default: false,
            calls: Vec::new(),
        }
    }

    pub fn healthy() -> Self {
        Self {
            up: true,
            connect_default: true,
            reachability_default: true,
            recover_default: true,
            ..Self::down()
        }
    }

    pub fn count(&self, call: LinkCall) -> usize {
        self.calls.iter().filter(|c| **c == call).count()
    }
}

impl NetworkLink for ScriptedLink {
    fn connect(&mut self) -> bool {
        self.calls.push(LinkCall::Connect);
        let ok = self.connect_results.pop_front().unwrap_or(self.connect_default);
        self.up = ok;
        ok
    }

    fn disconnect(&mut self) -> bool {
        self.calls.push(LinkCall::Disconnect);
        self.up = false;
        true
    }

    fn is_connected(&mut self) -> bool {
        self.up
    }

    fn test_reachability(&mut self) -> bool {
        self.calls.push(LinkCall::Reachability);
        self.up && self.reachability_results.pop_front().unwrap_or(self.reachability_default)
    }

    fn hard_recover(&mut self) -> bool {
        self.calls.push(LinkCall::HardRecover);
        let ok = self.recover_results.pop_front().unwrap_or(self.recover_default);
        self.up = ok;
        ok
    }
}

pub struct ScriptedSession {
    pub up: bool,
    pub connect_results: VecDeque<bool>,
    pub connect_default: bool,
    pub publish_results: VecDeque<bool>,
    pub publish_default: bool,
    pub published: Vec<(String, String)>,
    pub subscriptions: Vec<String>,
    pub connect_calls: usize,
    pub ticks: usize,
}

impl ScriptedSession {
    pub fn down() -> Self {
        Self {
            up: false,
            connect_results: VecDeque::new(),
            connect_default: false,
            publish_results: VecDeque::new(),
            publish_default: false,
            published: Vec::new(),
            subscriptions: Vec::new(),
            connect_calls: 0,
            ticks: 0,
        }
    }

    pub fn healthy() -> Self {
        Self {
            up: true,
            connect_default: true,
            publish_default: true,
            ..Self::down()
        }
    }

    pub fn payloads_on(&self, topic: &str) -> Vec<String> {
        self.published
            .iter()
            .filter(|(t, _)| t == topic)
            .map(|(_, p)| p.clone())
            .collect()
    }
}

impl MessageSession for ScriptedSession {
    fn connect(&mut self) -> bool {
        self.connect_calls += 1;
        let ok = self.connect_results.pop_front().unwrap_or(self.connect_default);
        self.up = ok;
        ok
    }

    fn is_connected(&mut self) -> bool {
        self.up
    }

    fn publish(&mut self, topic: &str, payload: &str) -> bool {
        if !self.up {
            return false;
        }
        let ok = self.publish_results.pop_front().unwrap_or(self.publish_default);
        if ok {
            self.published.push((topic.to_string(), payload.to_string()));
        }
        ok
    }

    fn subscribe(&mut self, topic: &str) -> bool {
        if !self.up {
            return false;
        }
        self.subscriptions.push(topic.to_string());
        true
    }

    fn tick(&mut self) {
        self.ticks += 1;
    }
}

/// Shared manual clock. With a step set, every `now()` moves time forward so
/// a real-time loop sees simulated minutes pass in milliseconds.
#[derive(Clone, Default)]
pub struct ManualClock {
    ms: Arc<AtomicU64>,
    step_ms: u64,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stepping(step_ms: u64) -> Self {
        Self {
            ms: Arc::new(AtomicU64::new(0)),
            step_ms,
        }
    }

    pub fn set(&self, at: Uptime) {
        self.ms.store(at.ms, Ordering::SeqCst);
    }

    pub fn advance_secs(&self, secs: u64) {
        self.ms.fetch_add(secs * 1_000, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Uptime {
        Uptime::from_millis(self.ms.fetch_add(self.step_ms, Ordering::SeqCst))
    }
}

pub fn secs(s: u64) -> Uptime {
    Uptime::from_secs(s)
}

pub type Machine = ConnectivityStateMachine<ScriptedLink, ScriptedSession>;

pub fn machine(link: ScriptedLink, session: ScriptedSession) -> Machine {
    ConnectivityStateMachine::new(link, session, RecoveryPolicy::default())
}

/// Healthy collaborators, walked up the ladder: FullyConnected at t=0.
pub fn connected_machine() -> Machine {
    let mut m = machine(ScriptedLink::healthy(), ScriptedSession::healthy());
    m.begin(Uptime::ZERO);
    m.tick(Uptime::ZERO);
    m.tick(Uptime::ZERO);
    assert_eq!(m.state(), ConnectionState::FullyConnected);
    m
}

pub fn volatile_storage(capacity: usize) -> StorageConfig {
    StorageConfig {
        primary_dir: None,
        secondary_dir: None,
        volatile_capacity: capacity,
        ..StorageConfig::default()
    }
}

pub fn primary_storage(dir: &Path) -> StorageConfig {
    StorageConfig {
        primary_dir: Some(dir.to_path_buf()),
        secondary_dir: None,
        ..StorageConfig::default()
    }
}

pub fn volatile_queue(capacity: usize) -> DurableQueue {
    DurableQueue::open(&volatile_storage(capacity))
}

pub fn record(text: &str) -> QueueRecord {
    QueueRecord::new(text).expect("valid record")
}
