//! Bounded history of the most recent lines.
//!
//! The ring is what late-joining subscribers receive as their initial state.
//! It is mutated only by the tail engine; everyone else reads snapshots through
//! a [`SharedHistory`] handle.

use parking_lot::RwLock;
use std::collections::VecDeque;
use std::sync::Arc;

/// Default ring capacity (number of lines kept for replay)
pub const DEFAULT_MAX_LINES: usize = 10;

/// Fixed-capacity FIFO of recent lines, oldest first
#[derive(Debug, Clone)]
pub struct HistoryRing {
    lines: VecDeque<String>,
    capacity: usize,
}

impl HistoryRing {
    /// Create an empty ring holding at most `capacity` lines (minimum 1)
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            lines: VecDeque::with_capacity(capacity.min(1024)),
            capacity,
        }
    }

    /// Append a line, evicting the oldest one when the ring is full.
    ///
    /// Returns the evicted line, if any.
    pub fn push(&mut self, line: String) -> Option<String> {
        let evicted = if self.lines.len() == self.capacity {
            self.lines.pop_front()
        } else {
            None
        };
        self.lines.push_back(line);
        evicted
    }

    /// Push every line in order
    pub fn extend<I: IntoIterator<Item = String>>(&mut self, lines: I) {
        for line in lines {
            self.push(line);
        }
    }

    /// Discard the current contents and load `lines` (keeping the newest ones)
    pub fn replace<I: IntoIterator<Item = String>>(&mut self, lines: I) {
        self.lines.clear();
        self.extend(lines);
    }

    /// Current contents, oldest first
    pub fn snapshot(&self) -> Vec<String> {
        self.lines.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for HistoryRing {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_LINES)
    }
}

/// Cloneable read handle onto a ring owned by a tail engine
#[derive(Debug, Clone)]
pub struct SharedHistory {
    inner: Arc<RwLock<HistoryRing>>,
}

impl SharedHistory {
    pub fn new(ring: HistoryRing) -> Self {
        Self {
            inner: Arc::new(RwLock::new(ring)),
        }
    }

    /// Current contents, oldest first
    pub fn snapshot(&self) -> Vec<String> {
        self.inner.read().snapshot()
    }

    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }

    pub(crate) fn with_mut<T>(&self, f: impl FnOnce(&mut HistoryRing) -> T) -> T {
        f(&mut self.inner.write())
    }
}
