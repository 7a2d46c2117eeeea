//! Tail engine orchestration.
//!
//! The engine is the only writer of the offset state and the history ring. All
//! reads, splitting and ring mutation happen inside either the one-shot
//! [`TailEngine::initialize`] or a single [`TailEngine::poll`] call, which take
//! `&mut self` so two of them can never overlap.

use crate::config::TailConfig;
use crate::error::Result;
use crate::file_handler::{FileStat, FsRangeReader, RangeReader};
use crate::history::{HistoryRing, SharedHistory};
use crate::lines::split_complete;
use crate::tail::detector::{classify, FileChange};
use crate::tail::protocol::{Batch, EnginePhase, PollOutcome};
use crate::tail::sink::BatchSink;
use crate::tail::snapshot::read_last_lines;
use crate::tail::state::TailState;
use log::{debug, info, warn};

/// Tails one file and emits line batches to its sinks
pub struct TailEngine<R: RangeReader = FsRangeReader> {
    config: TailConfig,
    reader: R,
    state: TailState,
    history: SharedHistory,
    sinks: Vec<Box<dyn BatchSink>>,
    phase: EnginePhase,
}

impl TailEngine<FsRangeReader> {
    /// Validate the config and the file, and build an idle engine
    pub fn open(config: TailConfig) -> Result<Self> {
        config.validate()?;
        let reader = FsRangeReader::open(&config.path, config.read_timeout)?;
        Ok(Self::with_reader(config, reader))
    }
}

impl<R: RangeReader> TailEngine<R> {
    /// Build an idle engine over any reader
    pub fn with_reader(config: TailConfig, reader: R) -> Self {
        let history = SharedHistory::new(HistoryRing::new(config.max_lines));
        let state = TailState::new(&config.path);
        Self {
            config,
            reader,
            state,
            history,
            sinks: Vec::new(),
            phase: EnginePhase::Idle,
        }
    }

    /// Register a batch consumer
    pub fn add_sink(&mut self, sink: impl BatchSink + 'static) -> &mut Self {
        self.sinks.push(Box::new(sink));
        self
    }

    #[must_use]
    pub fn with_sink(mut self, sink: impl BatchSink + 'static) -> Self {
        self.add_sink(sink);
        self
    }

    pub fn config(&self) -> &TailConfig {
        &self.config
    }

    pub fn state(&self) -> &TailState {
        &self.state
    }

    pub fn phase(&self) -> EnginePhase {
        self.phase
    }

    /// Read handle onto the history ring, for serving late joiners
    pub fn history(&self) -> SharedHistory {
        self.history.clone()
    }

    /// Current history, oldest first. No side effects.
    pub fn logs(&self) -> Vec<String> {
        self.history.snapshot()
    }

    /// Take the startup snapshot and emit the Init batch.
    ///
    /// Errors are returned to the caller: without a snapshot there is nothing
    /// to watch from. On success the engine is in the `Watching` phase.
    pub async fn initialize(&mut self) -> Result<Batch> {
        self.phase = EnginePhase::Initializing;
        let result = match self.reader.stat().await {
            Ok(stat) => self.resnapshot(stat).await,
            Err(err) => Err(err),
        };
        match result {
            Ok(batch) => {
                self.phase = EnginePhase::Watching;
                info!(
                    "tailing {} from byte {} with {} lines of history",
                    self.state.path.display(),
                    self.state.byte_offset,
                    batch.lines.len()
                );
                Ok(batch)
            }
            Err(err) => {
                self.phase = EnginePhase::Idle;
                Err(err)
            }
        }
    }

    /// Run one poll tick.
    ///
    /// On error nothing is emitted and the offsets are left untouched, so the
    /// next tick retries the same range.
    pub async fn poll(&mut self) -> Result<PollOutcome> {
        let current = match self.reader.stat().await {
            Ok(stat) => Some(stat),
            Err(err) if err.is_file_missing() => None,
            Err(err) => return Err(err),
        };

        match classify(&self.state, current.as_ref()) {
            FileChange::Unchanged => Ok(PollOutcome::Unchanged),
            FileChange::Missing => {
                if !self.state.missing {
                    warn!(
                        "{} disappeared, waiting for it to come back",
                        self.state.path.display()
                    );
                    self.state.missing = true;
                }
                Ok(PollOutcome::FileMissing)
            }
            FileChange::Grew { from, to } => {
                let lines = self.read_appended(from, to).await?;
                Ok(PollOutcome::Appended { lines })
            }
            change => {
                debug_assert!(change.is_discontinuity());
                info!(
                    "{} changed underneath us ({:?}), taking a fresh snapshot",
                    self.state.path.display(),
                    change
                );
                // `current` is always Some for these variants
                let Some(stat) = current else {
                    return Ok(PollOutcome::FileMissing);
                };
                let batch = self.resnapshot(stat).await?;
                Ok(PollOutcome::Reset {
                    lines: batch.lines.len(),
                })
            }
        }
    }

    pub(crate) fn mark_stopped(&mut self) {
        self.phase = EnginePhase::Stopped;
    }

    async fn resnapshot(&mut self, stat: FileStat) -> Result<Batch> {
        let lines = read_last_lines(
            &self.reader,
            stat.size,
            self.config.max_lines,
            self.config.chunk_size,
        )
        .await?;

        self.history.with_mut(|ring| ring.replace(lines));
        self.state.reset(&stat);

        let batch = Batch::init(self.history.snapshot());
        self.emit(&batch);
        Ok(batch)
    }

    /// Read `[from, to)` forward in chunks and emit the complete lines.
    ///
    /// Returns the number of lines emitted. An unterminated tail stays unread.
    async fn read_appended(&mut self, from: u64, to: u64) -> Result<usize> {
        let chunk = self.config.chunk_size.max(1) as u64;
        let mut offset = from;
        let mut carry: Vec<u8> = Vec::new();
        let mut lines = Vec::new();

        while offset < to {
            let length = chunk.min(to - offset);
            let bytes = self.reader.read_range(offset, length).await?;
            offset += length;

            carry.extend_from_slice(&bytes);
            let (mut complete, consumed) = split_complete(&carry);
            lines.append(&mut complete);
            carry.drain(..consumed);
        }

        self.state.advance(to - carry.len() as u64, to);
        if lines.is_empty() {
            debug!(
                "{} grew to {} bytes without a complete line, {} bytes pending",
                self.state.path.display(),
                to,
                self.state.pending_bytes()
            );
            return Ok(0);
        }

        self.history.with_mut(|ring| ring.extend(lines.iter().cloned()));
        let batch = Batch::update(lines);
        debug!(
            "{} grew to {} bytes, emitting {} lines",
            self.state.path.display(),
            to,
            batch.lines.len()
        );
        self.emit(&batch);
        Ok(batch.lines.len())
    }

    fn emit(&mut self, batch: &Batch) {
        for sink in &mut self.sinks {
            if let Err(err) = sink.deliver(batch) {
                debug!("dropped {:?} batch for one sink: {}", batch.kind, err);
            }
        }
    }
}
