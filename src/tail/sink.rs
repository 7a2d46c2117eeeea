//! Batch sinks.
//!
//! The engine hands every batch to each injected sink and moves on. A sink that
//! is full, closed or slow loses batches; the engine keeps no per-subscriber
//! state and applies no flow control.

use crate::error::{Result, TailError};
use crate::tail::protocol::Batch;
use tokio::sync::{broadcast, mpsc};

/// Consumer of emitted batches
pub trait BatchSink: Send {
    /// Deliver one batch without blocking
    fn deliver(&mut self, batch: &Batch) -> Result<()>;
}

impl BatchSink for mpsc::UnboundedSender<Batch> {
    fn deliver(&mut self, batch: &Batch) -> Result<()> {
        self.send(batch.clone())
            .map_err(|_| TailError::other("batch receiver closed"))
    }
}

impl BatchSink for mpsc::Sender<Batch> {
    fn deliver(&mut self, batch: &Batch) -> Result<()> {
        self.try_send(batch.clone()).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => TailError::other("batch channel full"),
            mpsc::error::TrySendError::Closed(_) => TailError::other("batch receiver closed"),
        })
    }
}

impl BatchSink for broadcast::Sender<Batch> {
    fn deliver(&mut self, batch: &Batch) -> Result<()> {
        // No subscribers right now is normal for a fan-out channel
        let _ = self.send(batch.clone());
        Ok(())
    }
}

/// Sink backed by a closure
pub struct FnSink<F> {
    f: F,
}

impl<F> FnSink<F>
where
    F: FnMut(&Batch) + Send,
{
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F> BatchSink for FnSink<F>
where
    F: FnMut(&Batch) + Send,
{
    fn deliver(&mut self, batch: &Batch) -> Result<()> {
        (self.f)(batch);
        Ok(())
    }
}
