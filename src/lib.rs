//! # tailcast - Incremental File Tail Engine
//!
//! Follows a growing text file and streams newly appended lines, plus a bounded
//! recent history, to live subscribers. Designed for arbitrarily large log files:
//! the startup snapshot reads backward from the end in fixed-size chunks and
//! every later read covers only the appended bytes.
//!
//! ## Features
//!
//! - **Bounded startup**: last N lines found without scanning the whole file
//! - **Incremental polling**: size/identity checks, forward reads of the delta only
//! - **Rotation aware**: truncation, replacement and deletion trigger a fresh snapshot
//! - **Decoupled output**: batches go to injected sinks (channels or closures)
//!
//! ## Architecture
//!
//! - [`error`] - Centralized error types and handling
//! - [`config`] - Engine settings and optional TOML loading
//! - [`file_handler`] - Chunked range reads and file metadata
//! - [`lines`] - Line splitting and blank-line filtering
//! - [`history`] - Fixed-capacity ring of recent lines
//! - [`tail`] - Change detection, the engine and its poll loop

// Core modules
pub mod config;
pub mod error;
pub mod file_handler;

// Engine building blocks
pub mod history;
pub mod lines;
pub mod tail;

// Re-export commonly used types for convenience
pub use error::{Result, TailError};

// Public API surface for external usage
pub use config::TailConfig;
pub use file_handler::{FsRangeReader, MemoryRangeReader, RangeReader};
pub use history::{HistoryRing, SharedHistory};
pub use tail::{Batch, BatchKind, BatchSink, PollOutcome, TailEngine, TailHandle};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
