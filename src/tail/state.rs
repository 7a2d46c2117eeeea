//! Offset bookkeeping for the watched file.

use crate::file_handler::{FileIdentity, FileStat};
use std::path::PathBuf;

/// Offset bookkeeping for one watched file, owned by the engine.
///
/// `byte_offset <= last_known_size` always holds. They differ only while an
/// unterminated trailing line is waiting for its terminator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TailState {
    pub path: PathBuf,
    /// Bytes consumed from the start of the file
    pub byte_offset: u64,
    /// File size observed by the last successful poll
    pub last_known_size: u64,
    /// Identity observed by the last successful poll
    pub identity: Option<FileIdentity>,
    /// Set while the file cannot be found
    pub missing: bool,
}

impl TailState {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            byte_offset: 0,
            last_known_size: 0,
            identity: None,
            missing: false,
        }
    }

    /// Treat everything up to `stat.size` as consumed
    pub fn reset(&mut self, stat: &FileStat) {
        self.byte_offset = stat.size;
        self.last_known_size = stat.size;
        self.identity = stat.identity;
        self.missing = false;
    }

    /// Record a forward read that consumed up to `byte_offset` of a file of `size` bytes
    pub fn advance(&mut self, byte_offset: u64, size: u64) {
        debug_assert!(byte_offset <= size);
        self.byte_offset = byte_offset;
        self.last_known_size = size;
    }

    /// Bytes of an unterminated trailing line not yet emitted
    pub fn pending_bytes(&self) -> u64 {
        self.last_known_size - self.byte_offset
    }
}
