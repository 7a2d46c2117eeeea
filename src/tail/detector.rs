//! Poll-time change classification.
//!
//! Only metadata is compared here; content is never inspected, so a poll with
//! no change costs a single `stat`.

use crate::file_handler::FileStat;
use crate::tail::state::TailState;

/// What happened to the file since the last successful poll
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileChange {
    /// Same size, same file
    Unchanged,
    /// Bytes were appended; read `[from, to)`
    Grew { from: u64, to: u64 },
    /// Shrunk below the last known size (truncated in place)
    Truncated { from: u64, to: u64 },
    /// A different file now lives at the path, or the file came back after vanishing
    Replaced,
    /// The file cannot be found
    Missing,
}

impl FileChange {
    /// True when stale offsets must not be used and a fresh snapshot is needed
    pub fn is_discontinuity(&self) -> bool {
        matches!(self, Self::Truncated { .. } | Self::Replaced)
    }
}

/// Compare the current metadata against the last known state
pub fn classify(state: &TailState, current: Option<&FileStat>) -> FileChange {
    let Some(current) = current else {
        return FileChange::Missing;
    };

    if state.missing {
        return FileChange::Replaced;
    }
    if let (Some(known), Some(now)) = (state.identity, current.identity) {
        if known != now {
            return FileChange::Replaced;
        }
    }

    if current.size < state.last_known_size {
        FileChange::Truncated {
            from: state.last_known_size,
            to: current.size,
        }
    } else if current.size > state.last_known_size {
        FileChange::Grew {
            from: state.byte_offset,
            to: current.size,
        }
    } else {
        FileChange::Unchanged
    }
}
