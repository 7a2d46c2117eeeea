//! File access for the tail engine.
//!
//! This module provides bounded, offset-addressed reads of the watched file plus
//! the size/identity metadata the change detector compares between polls. Files
//! are opened per operation and closed on every exit path.

pub mod reader;
pub mod validation;

pub use reader::{FileIdentity, FileStat, FsRangeReader, MemoryRangeReader, RangeReader};
pub use validation::validate_tail_target;
