//! Incremental tail engine.
//!
//! The engine turns a growing file into an ordered sequence of line batches:
//! one `Init` batch with the most recent lines, then one `Update` batch per
//! poll in which complete lines were appended. A shrinking or replaced file
//! produces a fresh `Init` batch instead of an update.
//!
//! - [`snapshot`] - Backward chunked scan for the last N lines
//! - [`detector`] - Size/identity comparison between polls
//! - [`engine`] - The single actor that owns offsets and history
//! - [`watch`] - Timer-driven poll loop with cancelable shutdown
//! - [`sink`] - Injected batch consumers

pub mod detector;
pub mod engine;
pub mod protocol;
pub mod sink;
pub mod snapshot;
pub mod state;
pub mod watch;

pub use detector::{classify, FileChange};
pub use engine::TailEngine;
pub use protocol::{Batch, BatchKind, EnginePhase, PollOutcome};
pub use sink::{BatchSink, FnSink};
pub use snapshot::{read_last_lines, BackwardLines};
pub use state::TailState;
pub use watch::{watch_loop, TailHandle};
