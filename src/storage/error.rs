use thiserror::Error;

#[derive(Debug, Error)]
pub enum QueueError {
    #[error("no storage tier selected")]
    NoStorage,

    #[error("queue is empty")]
    Empty,

    #[error("corrupt journal record dropped: {reason}")]
    Corrupt { reason: String },

    #[error("invalid record: {reason}")]
    InvalidRecord { reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl QueueError {
    /// Only a dropped record leaves the queue shorter than before.
    pub fn consumed_record(&self) -> bool {
        matches!(self, QueueError::Corrupt { .. })
    }
}
