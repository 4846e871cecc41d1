//! Tiered offline queue for records that could not be published.

pub mod error;
pub mod journal;
pub mod queue;
pub mod record;
pub mod ring;

pub use error::QueueError;
pub use journal::{FileJournal, Journal};
pub use queue::{DurableQueue, StorageTier};
pub use record::QueueRecord;
pub use ring::VolatileRing;
