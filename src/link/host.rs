use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use super::probe::TcpProbe;
use super::NetworkLink;
use crate::config::LinkConfig;

/// Shared attach flag, so a session adapter can follow the link it rides on.
#[derive(Debug, Clone, Default)]
pub struct AttachState(Arc<AtomicBool>);

impl AttachState {
    pub fn get(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    pub fn set(&self, attached: bool) {
        self.0.store(attached, Ordering::Relaxed);
    }
}

/// Host stand-in for the cellular modem.
///
/// Attaching means the configured gateway answers a TCP probe; the attach flag
/// is cached until the next connect or recovery, like a modem's registration
/// status.
pub struct HostLink {
    gateway: TcpProbe,
    reachability: TcpProbe,
    settle: Duration,
    attached: AttachState,
}

impl HostLink {
    pub fn new(config: &LinkConfig) -> Self {
        let timeout = config.probe_timeout();
        Self {
            gateway: TcpProbe::new(config.gateway_addr.clone(), timeout),
            reachability: TcpProbe::new(config.reachability_addr.clone(), timeout),
            settle: config.power_cycle_settle(),
            attached: AttachState::default(),
        }
    }

    pub fn attach_state(&self) -> AttachState {
        self.attached.clone()
    }
}

impl NetworkLink for HostLink {
    fn connect(&mut self) -> bool {
        let ok = self.gateway.probe();
        self.attached.set(ok);
        if ok {
            info!("link: attached via {}", self.gateway.addr());
        } else {
            warn!("link: gateway {} not answering", self.gateway.addr());
        }
        ok
    }

    fn disconnect(&mut self) -> bool {
        self.attached.set(false);
        true
    }

    fn is_connected(&mut self) -> bool {
        self.attached.get()
    }

    fn test_reachability(&mut self) -> bool {
        if !self.attached.get() {
            return false;
        }
        self.reachability.probe()
    }

    fn hard_recover(&mut self) -> bool {
        info!("link: power-cycling (settle {:?})", self.settle);
        self.attached.set(false);
        std::thread::sleep(self.settle);
        self.connect()
    }

    fn carrier(&mut self) -> Option<String> {
        Some("host".to_string())
    }
}
