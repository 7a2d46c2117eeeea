//! Backward chunked scan for the last N lines.
//!
//! Reading starts one chunk before the end of the file and walks toward the
//! start. Each chunk is split once, joined with the unsplit fragment carried
//! over from the chunk after it, and its lines are prepended to a ring capped
//! at N. Memory stays at N lines plus one chunk and the carried fragment; only
//! pathologically long lines force a read of the whole file.

use crate::error::Result;
use crate::file_handler::RangeReader;
use crate::lines::{split_lines, LINE_TERMINATOR};
use log::debug;
use memchr::memchr;
use std::collections::VecDeque;

/// Collects the newest non-blank lines from chunks fed newest first
#[derive(Debug)]
pub struct BackwardLines {
    lines: VecDeque<String>,
    max_lines: usize,
    /// Bytes before the first terminator of everything fed so far
    carry: Vec<u8>,
}

impl BackwardLines {
    pub fn new(max_lines: usize) -> Self {
        Self {
            lines: VecDeque::with_capacity(max_lines.min(1024)),
            max_lines,
            carry: Vec::new(),
        }
    }

    /// Feed the chunk that directly precedes everything fed so far.
    ///
    /// `at_file_start` marks the chunk beginning at byte 0, whose leading
    /// fragment is a whole line. Returns true once enough lines are collected.
    pub fn feed(&mut self, chunk: &[u8], at_file_start: bool) -> bool {
        let mut joined = Vec::with_capacity(chunk.len() + self.carry.len());
        joined.extend_from_slice(chunk);
        joined.extend_from_slice(&self.carry);

        let complete = if at_file_start {
            self.carry.clear();
            &joined[..]
        } else {
            match memchr(LINE_TERMINATOR, &joined) {
                Some(first) => {
                    self.carry = joined[..first].to_vec();
                    &joined[first + 1..]
                }
                None => {
                    self.carry = joined;
                    return self.is_full();
                }
            }
        };

        for line in split_lines(complete).into_iter().rev() {
            if self.is_full() {
                break;
            }
            self.lines.push_front(line);
        }
        self.is_full()
    }

    pub fn is_full(&self) -> bool {
        self.lines.len() >= self.max_lines
    }

    /// Bytes of the not yet delimited leading fragment
    pub fn carried_len(&self) -> usize {
        self.carry.len()
    }

    /// Collected lines, oldest first
    pub fn into_lines(self) -> Vec<String> {
        self.lines.into()
    }
}

/// Read the last `max_lines` non-blank lines of the first `file_size` bytes.
///
/// Lines come back oldest first. When the scan stops before byte 0 the
/// leading fragment is discarded, since it is usually a cut-off line.
///
/// # Errors
/// Any read error, including `MalformedRange` when the file shrinks below
/// `file_size` mid-scan.
pub async fn read_last_lines<R>(
    reader: &R,
    file_size: u64,
    max_lines: usize,
    chunk_size: usize,
) -> Result<Vec<String>>
where
    R: RangeReader + ?Sized,
{
    let chunk = chunk_size.max(1) as u64;
    let mut end = file_size;
    let mut collector = BackwardLines::new(max_lines);
    let mut chunks_read = 0usize;

    loop {
        let position = end.saturating_sub(chunk);
        let bytes = reader.read_range(position, end - position).await?;
        chunks_read += 1;

        if collector.feed(&bytes, position == 0) || position == 0 {
            break;
        }
        end = position;
    }

    let lines = collector.into_lines();
    debug!(
        "snapshot of {}: {} lines from {} chunks",
        reader.path().display(),
        lines.len(),
        chunks_read
    );
    Ok(lines)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TailError;
    use crate::file_handler::{FileStat, MemoryRangeReader};
    use async_trait::async_trait;
    use proptest::prelude::*;
    use std::path::Path;
    use std::sync::atomic::{AtomicU64, Ordering};

    /// Memory reader that counts calls and bytes handed out
    struct CountingReader {
        inner: MemoryRangeReader,
        reads: AtomicU64,
        bytes: AtomicU64,
    }

    #[async_trait]
    impl RangeReader for CountingReader {
        async fn stat(&self) -> Result<FileStat> {
            self.inner.stat().await
        }

        async fn read_range(&self, offset: u64, length: u64) -> Result<Vec<u8>> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            self.bytes.fetch_add(length, Ordering::SeqCst);
            self.inner.read_range(offset, length).await
        }

        fn path(&self) -> &Path {
            self.inner.path()
        }
    }

    async fn last_lines(content: &[u8], max_lines: usize, chunk_size: usize) -> Vec<String> {
        let reader = MemoryRangeReader::new(content.to_vec());
        read_last_lines(&reader, reader.len(), max_lines, chunk_size)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_empty_file() {
        assert!(last_lines(b"", 10, 64).await.is_empty());
    }

    #[tokio::test]
    async fn test_short_file_returns_all_non_blank_lines() {
        let lines = last_lines(b"a\nb\n\nc\n", 10, 64 * 1024).await;
        assert_eq!(lines, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_long_file_returns_last_lines_across_chunks() {
        let content: String = (0..500).map(|i| format!("entry {i}\n")).collect();
        let lines = last_lines(content.as_bytes(), 10, 16).await;
        let expected: Vec<String> = (490..500).map(|i| format!("entry {i}")).collect();
        assert_eq!(lines, expected);
    }

    #[tokio::test]
    async fn test_blank_runs_do_not_shorten_snapshot() {
        let mut content = String::new();
        for i in 0..20 {
            content.push_str(&format!("keep {i}\n"));
            content.push_str("\n\n   \n\n");
        }
        let lines = last_lines(content.as_bytes(), 5, 8).await;
        let expected: Vec<String> = (15..20).map(|i| format!("keep {i}")).collect();
        assert_eq!(lines, expected);
    }

    #[tokio::test]
    async fn test_line_longer_than_chunk() {
        let long = "x".repeat(300);
        let content = format!("first\n{long}\nlast\n");
        let lines = last_lines(content.as_bytes(), 2, 32).await;
        assert_eq!(lines, vec![long, "last".to_string()]);
    }

    #[tokio::test]
    async fn test_unterminated_last_line_is_included() {
        let lines = last_lines(b"one\ntwo\nthree", 2, 4).await;
        assert_eq!(lines, vec!["two", "three"]);
    }

    #[tokio::test]
    async fn test_size_beyond_file_is_an_error() {
        let reader = MemoryRangeReader::new(b"abc\n".to_vec());
        let result = read_last_lines(&reader, 100, 10, 16).await;
        assert!(matches!(result, Err(TailError::MalformedRange { .. })));
    }

    #[tokio::test]
    async fn test_blank_heavy_file_is_read_once() {
        let chunk_size = 64 * 1024;
        let mut content = b"only line\n".to_vec();
        content.resize(content.len() + 4 * 1024 * 1024, b'\n');
        let reader = CountingReader {
            inner: MemoryRangeReader::new(content),
            reads: AtomicU64::new(0),
            bytes: AtomicU64::new(0),
        };
        let file_size = reader.inner.len();

        let lines = read_last_lines(&reader, file_size, 10, chunk_size)
            .await
            .unwrap();
        assert_eq!(lines, vec!["only line"]);
        assert_eq!(reader.bytes.load(Ordering::SeqCst), file_size);
        assert_eq!(
            reader.reads.load(Ordering::SeqCst),
            file_size.div_ceil(chunk_size as u64)
        );
    }

    #[test]
    fn test_collector_carries_only_the_leading_fragment() {
        let mut collector = BackwardLines::new(10);
        let blanks = vec![b'\n'; 4096];
        let mut peak = 0;
        for _ in 0..256 {
            assert!(!collector.feed(&blanks, false));
            peak = peak.max(collector.carried_len());
        }
        assert_eq!(peak, 0);

        collector.feed(b"tail of a ", false);
        assert_eq!(collector.carried_len(), 10);
        collector.feed(b"head\nthe ", true);
        assert_eq!(collector.into_lines(), vec!["head", "the tail of a "]);
    }

    #[test]
    fn test_collector_stops_when_full() {
        let mut collector = BackwardLines::new(2);
        assert!(!collector.feed(b"c\n", false));
        assert_eq!(collector.carried_len(), 1);
        assert!(collector.feed(b"x\na\nb\n", false));
        assert_eq!(collector.into_lines(), vec!["b", "c"]);
    }

    proptest! {
        #[test]
        fn prop_snapshot_is_last_non_blank_lines(
            lines in prop::collection::vec("[a-z ]{0,20}", 0..60),
            max_lines in 1usize..15,
            chunk_size in 1usize..64,
        ) {
            let content: String = lines.iter().map(|l| format!("{l}\n")).collect();
            let non_blank: Vec<String> = lines
                .iter()
                .filter(|l| !l.trim().is_empty())
                .cloned()
                .collect();
            let expected = non_blank[non_blank.len().saturating_sub(max_lines)..].to_vec();

            let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
            let actual = runtime.block_on(last_lines(content.as_bytes(), max_lines, chunk_size));
            prop_assert_eq!(actual, expected);
        }
    }
}
