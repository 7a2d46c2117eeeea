//! Batch and outcome types exchanged between the engine and its consumers.

use crate::error::{Result, TailError};
use serde::{Deserialize, Serialize};

/// Whether a batch replaces the subscriber's view or extends it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BatchKind {
    /// Full recent history: after startup and after a truncation or rotation
    Init,
    /// Lines appended since the previous batch
    Update,
}

/// One emitted group of lines, oldest first.
///
/// Serializes to the push-channel message shape `{"type": "init", "data": [..]}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Batch {
    #[serde(rename = "type")]
    pub kind: BatchKind,
    #[serde(rename = "data")]
    pub lines: Vec<String>,
}

impl Batch {
    pub fn init(lines: Vec<String>) -> Self {
        Self {
            kind: BatchKind::Init,
            lines,
        }
    }

    pub fn update(lines: Vec<String>) -> Self {
        Self {
            kind: BatchKind::Update,
            lines,
        }
    }

    pub fn is_init(&self) -> bool {
        self.kind == BatchKind::Init
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self)
            .map_err(|e| TailError::other(format!("failed to encode batch: {e}")))
    }
}

/// Lifecycle of a tail engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnginePhase {
    Idle,
    Initializing,
    Watching,
    Stopped,
}

/// Result of a single poll tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// No growth since the last poll
    Unchanged,
    /// File grew; `lines` complete lines were emitted (0 means no batch)
    Appended { lines: usize },
    /// File shrank or was replaced; a fresh Init batch of `lines` lines was emitted
    Reset { lines: usize },
    /// File is currently absent; nothing was emitted
    FileMissing,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_wire_format() {
        let init = Batch::init(vec!["a".to_string(), "b".to_string()]);
        assert_eq!(init.to_json().unwrap(), r#"{"type":"init","data":["a","b"]}"#);

        let update = Batch::update(vec!["d".to_string()]);
        assert_eq!(update.to_json().unwrap(), r#"{"type":"update","data":["d"]}"#);
        assert!(!update.is_init());
    }

    #[test]
    fn test_batch_parses_from_wire() {
        let batch: Batch = serde_json::from_str(r#"{"type":"update","data":["x"]}"#).unwrap();
        assert_eq!(batch, Batch::update(vec!["x".to_string()]));
    }
}
