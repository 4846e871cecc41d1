use std::fmt;

use super::error::QueueError;

/// One serialized telemetry record as stored in a journal line.
///
/// A record is a single line of JSON. The same rule is checked again when a
/// line is read back, so anything accepted here survives a round trip.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueueRecord(String);

impl QueueRecord {
    pub fn new(text: impl Into<String>) -> Result<Self, QueueError> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(QueueError::InvalidRecord {
                reason: "empty record".to_string(),
            });
        }
        if text.contains(['\n', '\r']) {
            return Err(QueueError::InvalidRecord {
                reason: "record contains a line break".to_string(),
            });
        }
        if let Err(e) = serde_json::from_str::<serde_json::Value>(&text) {
            return Err(QueueError::InvalidRecord {
                reason: format!("not JSON: {e}"),
            });
        }
        Ok(Self(text))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for QueueRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for QueueRecord {
    type Error = QueueError;

    fn try_from(text: String) -> Result<Self, Self::Error> {
        QueueRecord::new(text)
    }
}

impl TryFrom<&str> for QueueRecord {
    type Error = QueueError;

    fn try_from(text: &str) -> Result<Self, Self::Error> {
        QueueRecord::new(text)
    }
}
