use tracing::{info, warn};

use super::host::AttachState;
use super::MessageSession;

/// Log-only session used where no broker client is wired in. It lets the
/// whole ladder and the offline queue run end to end against a real link.
pub struct LogSession {
    client_id: String,
    link: AttachState,
    connected: bool,
    subscriptions: Vec<String>,
    published: u64,
}

impl LogSession {
    pub fn new(client_id: &str, link: AttachState) -> Self {
        Self {
            client_id: client_id.to_string(),
            link,
            connected: false,
            subscriptions: Vec::new(),
            published: 0,
        }
    }

    pub fn subscriptions(&self) -> &[String] {
        &self.subscriptions
    }

    pub fn published(&self) -> u64 {
        self.published
    }
}

impl MessageSession for LogSession {
    fn connect(&mut self) -> bool {
        self.connected = self.link.get();
        if self.connected {
            info!("session({}): connected", self.client_id);
        } else {
            warn!("session({}): link not attached", self.client_id);
        }
        self.connected
    }

    fn is_connected(&mut self) -> bool {
        self.connected = self.connected && self.link.get();
        self.connected
    }

    fn publish(&mut self, topic: &str, payload: &str) -> bool {
        if !self.is_connected() {
            return false;
        }
        self.published += 1;
        info!("session(LOG): publish topic='{}' len={}", topic, payload.len());
        true
    }

    fn subscribe(&mut self, topic: &str) -> bool {
        if !self.is_connected() {
            return false;
        }
        if !self.subscriptions.iter().any(|t| t == topic) {
            self.subscriptions.push(topic.to_string());
        }
        true
    }

    fn tick(&mut self) {
        if self.connected && !self.link.get() {
            warn!("session({}): dropped with link", self.client_id);
            self.connected = false;
        }
    }
}
