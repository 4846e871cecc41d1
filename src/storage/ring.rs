use ringbuf::traits::{Consumer, Observer, RingBuffer};
use ringbuf::HeapRb;
use tracing::warn;

use super::error::QueueError;
use super::journal::Journal;
use super::record::QueueRecord;

/// Last-resort tier: a fixed ring in RAM that overwrites its oldest record
/// when full. Lost on restart.
pub struct VolatileRing {
    rb: HeapRb<String>,
    capacity: usize,
    evicted: u64,
}

impl VolatileRing {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            rb: HeapRb::new(capacity),
            capacity,
            evicted: 0,
        }
    }

    /// Records overwritten since creation.
    pub fn evicted(&self) -> u64 {
        self.evicted
    }
}

impl Journal for VolatileRing {
    fn append(&mut self, record: &QueueRecord) -> Result<(), QueueError> {
        if let Some(dropped) = self.rb.push_overwrite(record.as_str().to_string()) {
            self.evicted += 1;
            warn!(
                "queue: RAM ring full ({}), evicted oldest record ({} bytes)",
                self.capacity,
                dropped.len()
            );
        }
        Ok(())
    }

    fn len(&self) -> Result<usize, QueueError> {
        Ok(self.rb.occupied_len())
    }

    fn peek_front(&self) -> Result<Option<Vec<u8>>, QueueError> {
        Ok(self.rb.iter().next().map(|s| s.as_bytes().to_vec()))
    }

    fn pop_front(&mut self) -> Result<Option<Vec<u8>>, QueueError> {
        Ok(self.rb.try_pop().map(String::into_bytes))
    }

    fn clear(&mut self) -> Result<(), QueueError> {
        while self.rb.try_pop().is_some() {}
        Ok(())
    }

    fn capacity(&self) -> Option<usize> {
        Some(self.capacity)
    }
}
