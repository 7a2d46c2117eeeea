//! Line splitting and normalization.
//!
//! Raw chunks read from the file are turned into line records here. A record
//! never contains a line terminator and is never blank after trimming. All
//! functions are pure: the same bytes always produce the same records.

use bstr::ByteSlice;
use memchr::{memchr_iter, memrchr};

/// Byte that terminates a line
pub const LINE_TERMINATOR: u8 = b'\n';

/// Split `bytes` into non-blank line records.
///
/// The fragment after the last terminator is kept as a record when it is not
/// blank, so callers must only pass bytes whose tail is a real end of stream.
pub fn split_lines(bytes: &[u8]) -> Vec<String> {
    let mut lines = Vec::new();
    let mut start = 0;
    for end in memchr_iter(LINE_TERMINATOR, bytes) {
        push_record(&mut lines, &bytes[start..end]);
        start = end + 1;
    }
    push_record(&mut lines, &bytes[start..]);
    lines
}

/// Split only the terminated lines of `bytes`.
///
/// Returns the records together with the number of bytes they consumed
/// (everything up to and including the last terminator). The unterminated
/// remainder is left for the caller to re-read once it is complete.
pub fn split_complete(bytes: &[u8]) -> (Vec<String>, usize) {
    match memrchr(LINE_TERMINATOR, bytes) {
        Some(last) => (split_lines(&bytes[..last]), last + 1),
        None => (Vec::new(), 0),
    }
}

fn push_record(lines: &mut Vec<String>, raw: &[u8]) {
    let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
    if raw.trim().is_empty() {
        return;
    }
    lines.push(raw.to_str_lossy().into_owned());
}
