use std::collections::VecDeque;

use super::event::ConnectivityEvent;
use super::metrics::{compute_summary, TransitionSummary};

const MAX_EVENTS: usize = 256;

#[derive(Debug)]
pub struct EventRecorder {
    buffer: VecDeque<ConnectivityEvent>,
}

impl EventRecorder {
    pub fn new() -> Self {
        Self {
            buffer: VecDeque::with_capacity(MAX_EVENTS),
        }
    }

    pub fn record(&mut self, event: ConnectivityEvent) {
        if self.buffer.len() >= MAX_EVENTS {
            self.buffer.pop_front();
        }
        self.buffer.push_back(event);
    }

    pub fn events(&self) -> &VecDeque<ConnectivityEvent> {
        &self.buffer
    }

    pub fn last(&self) -> Option<&ConnectivityEvent> {
        self.buffer.back()
    }

    pub fn summary(&self) -> TransitionSummary {
        compute_summary(&self.buffer)
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
    }
}

impl Default for EventRecorder {
    fn default() -> Self {
        Self::new()
    }
}
