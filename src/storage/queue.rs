use serde::Serialize;
use tracing::{error, info, warn};

use super::error::QueueError;
use super::journal::{FileJournal, Journal};
use super::record::QueueRecord;
use super::ring::VolatileRing;
use crate::config::StorageConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum StorageTier {
    /// Removable medium (SD card).
    Primary,
    /// Internal flash filesystem.
    Secondary,
    /// RAM ring, lossy once full.
    Tertiary,
    None,
}

impl StorageTier {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Primary => "SD Card",
            Self::Secondary => "Internal Flash",
            Self::Tertiary => "RAM (Volatile)",
            Self::None => "None",
        }
    }

    pub const fn is_persistent(self) -> bool {
        matches!(self, Self::Primary | Self::Secondary)
    }
}

impl std::fmt::Display for StorageTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// FIFO of undelivered records on the best tier found at boot.
///
/// The tier is picked once by [`DurableQueue::init`] and never revisited, even
/// if a better medium shows up later.
pub struct DurableQueue {
    tier: StorageTier,
    journal: Option<Box<dyn Journal + Send>>,
}

impl DurableQueue {
    pub fn new() -> Self {
        Self {
            tier: StorageTier::None,
            journal: None,
        }
    }

    /// `new` followed by `init`.
    pub fn open(config: &StorageConfig) -> Self {
        let mut queue = Self::new();
        queue.init(config);
        queue
    }

    /// Selects the storage tier: Primary, then Secondary, then the RAM ring.
    /// Fallbacks are logged, never returned. Calling it again keeps the first
    /// selection.
    pub fn init(&mut self, config: &StorageConfig) -> StorageTier {
        if self.journal.is_some() {
            warn!("queue: already initialised on {}, keeping it", self.tier);
            return self.tier;
        }

        match config.primary_dir.as_deref() {
            Some(dir) => match FileJournal::open(dir, &config.primary_file, false) {
                Ok(journal) => return self.select(StorageTier::Primary, Box::new(journal)),
                Err(e) => warn!("queue: SD card unavailable ({}), trying internal flash", e),
            },
            None => info!("queue: no SD card configured"),
        }

        match config.secondary_dir.as_deref() {
            Some(dir) => match FileJournal::open(dir, &config.secondary_file, true) {
                Ok(journal) => return self.select(StorageTier::Secondary, Box::new(journal)),
                Err(e) => warn!("queue: internal flash unavailable ({}), using RAM", e),
            },
            None => info!("queue: no internal flash configured"),
        }

        let ring = VolatileRing::new(config.volatile_capacity);
        warn!(
            "queue: falling back to volatile RAM ring ({} records), data lost on restart",
            config.volatile_capacity.max(1)
        );
        self.select(StorageTier::Tertiary, Box::new(ring))
    }

    fn select(&mut self, tier: StorageTier, journal: Box<dyn Journal + Send>) -> StorageTier {
        self.tier = tier;
        self.journal = Some(journal);
        match self.size() {
            0 => info!("queue: using {}", tier),
            n => info!("queue: using {} ({} records pending from before restart)", tier, n),
        }
        tier
    }

    fn journal_mut(&mut self) -> Result<&mut Box<dyn Journal + Send>, QueueError> {
        self.journal.as_mut().ok_or(QueueError::NoStorage)
    }

    fn journal(&self) -> Result<&Box<dyn Journal + Send>, QueueError> {
        self.journal.as_ref().ok_or(QueueError::NoStorage)
    }

    /// Appends at the tail. A write failure is reported, not retried, and does
    /// not move the queue to another tier.
    pub fn enqueue(&mut self, record: &QueueRecord) -> Result<(), QueueError> {
        let tier = self.tier;
        let result = self.journal_mut()?.append(record);
        match &result {
            Ok(()) => info!("queue: stored record on {} ({} bytes)", tier, record.len()),
            Err(e) => error!("queue: failed to store record on {}: {}", tier, e),
        }
        result
    }

    /// Read errors are logged and count as an empty queue.
    pub fn size(&self) -> usize {
        let Ok(journal) = self.journal() else {
            return 0;
        };
        match journal.len() {
            Ok(n) => n,
            Err(e) => {
                warn!("queue: cannot read {} journal: {}", self.tier, e);
                0
            }
        }
    }

    /// Removes the oldest record and returns it. A record that is not valid
    /// UTF-8 JSON is still removed, then reported as [`QueueError::Corrupt`].
    pub fn dequeue_oldest(&mut self) -> Result<QueueRecord, QueueError> {
        let tier = self.tier;
        let raw = self.journal_mut()?.pop_front()?.ok_or(QueueError::Empty)?;

        match validate(raw) {
            Ok(record) => Ok(record),
            Err(e) => {
                warn!("queue: dropped unreadable record from {}: {}", tier, e);
                Err(e)
            }
        }
    }

    /// Oldest record without removing it.
    pub fn peek_oldest(&self) -> Result<QueueRecord, QueueError> {
        let raw = self.journal()?.peek_front()?.ok_or(QueueError::Empty)?;
        validate(raw)
    }

    pub fn clear(&mut self) -> Result<(), QueueError> {
        let tier = self.tier;
        self.journal_mut()?.clear()?;
        info!("queue: cleared {}", tier);
        Ok(())
    }

    pub fn tier(&self) -> StorageTier {
        self.tier
    }

    pub fn tier_name(&self) -> &'static str {
        self.tier.as_str()
    }

    pub fn is_available(&self) -> bool {
        self.journal.is_some()
    }

    pub fn capacity(&self) -> Option<usize> {
        self.journal.as_ref().and_then(|j| j.capacity())
    }
}

impl Default for DurableQueue {
    fn default() -> Self {
        Self::new()
    }
}

fn validate(raw: Vec<u8>) -> Result<QueueRecord, QueueError> {
    let text = String::from_utf8(raw).map_err(|e| QueueError::Corrupt {
        reason: format!("not UTF-8: {e}"),
    })?;
    let text = text.trim_end_matches('\r').to_string();
    QueueRecord::new(text).map_err(|e| match e {
        QueueError::InvalidRecord { reason } => QueueError::Corrupt { reason },
        other => other,
    })
}
