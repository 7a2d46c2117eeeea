//! Chunked range reads.
//!
//! [`RangeReader`] is the seam between the tail engine and storage. The
//! filesystem implementation opens the file for each call so no descriptor
//! outlives a single read, and bounds every call with a timeout.

use crate::error::{Result, TailError};
use crate::file_handler::validation::validate_tail_target;
use async_trait::async_trait;
use parking_lot::RwLock;
use std::future::Future;
use std::io::SeekFrom;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncSeekExt};

/// Identity of the file behind a path, used to spot rename-and-recreate rotation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FileIdentity {
    pub device: u64,
    pub inode: u64,
}

/// Metadata snapshot taken once per poll
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileStat {
    /// Current file size in bytes
    pub size: u64,
    /// Platform identity, when the platform exposes one
    pub identity: Option<FileIdentity>,
}

impl FileStat {
    pub fn from_metadata(metadata: &std::fs::Metadata) -> Self {
        Self {
            size: metadata.len(),
            identity: identity_of(metadata),
        }
    }
}

#[cfg(unix)]
fn identity_of(metadata: &std::fs::Metadata) -> Option<FileIdentity> {
    use std::os::unix::fs::MetadataExt;
    Some(FileIdentity {
        device: metadata.dev(),
        inode: metadata.ino(),
    })
}

#[cfg(not(unix))]
fn identity_of(_metadata: &std::fs::Metadata) -> Option<FileIdentity> {
    None
}

/// Byte-range access to a single growing file.
///
/// Implementations must be thread-safe. Neither call may hold the whole file in
/// memory: callers bound `length` by their chunk size.
#[async_trait]
pub trait RangeReader: Send + Sync {
    /// Current size and identity of the file
    ///
    /// # Errors
    /// * `FileNotFound` when the file is gone (see [`TailError::is_file_missing`])
    /// * `NotAFile` when the path no longer names a regular file
    async fn stat(&self) -> Result<FileStat>;

    /// Read exactly `length` bytes starting at `offset`
    ///
    /// # Errors
    /// * `MalformedRange` when `offset + length` exceeds the size at read time,
    ///   e.g. after a concurrent truncation. Not retried.
    /// * IO errors from open/seek/read
    async fn read_range(&self, offset: u64, length: u64) -> Result<Vec<u8>>;

    /// Path used for log messages
    fn path(&self) -> &Path;
}

#[async_trait]
impl<R: RangeReader + ?Sized> RangeReader for Arc<R> {
    async fn stat(&self) -> Result<FileStat> {
        (**self).stat().await
    }

    async fn read_range(&self, offset: u64, length: u64) -> Result<Vec<u8>> {
        (**self).read_range(offset, length).await
    }

    fn path(&self) -> &Path {
        (**self).path()
    }
}

/// Filesystem-backed reader
#[derive(Debug, Clone)]
pub struct FsRangeReader {
    path: PathBuf,
    read_timeout: Duration,
}

impl FsRangeReader {
    /// Validate `path` and build a reader for it
    pub fn open(path: impl Into<PathBuf>, read_timeout: Duration) -> Result<Self> {
        let path = path.into();
        validate_tail_target(&path)?;
        Ok(Self { path, read_timeout })
    }

    async fn bounded<T, F>(&self, operation: F) -> Result<T>
    where
        F: Future<Output = Result<T>> + Send,
    {
        tokio::time::timeout(self.read_timeout, operation)
            .await
            .map_err(|_| TailError::ReadTimeout {
                path: self.path.clone(),
                timeout: self.read_timeout,
            })?
    }

    async fn read_exact_range(&self, offset: u64, length: u64) -> Result<Vec<u8>> {
        let mut file = tokio::fs::File::open(&self.path)
            .await
            .map_err(|e| TailError::from_io(&self.path, e))?;
        let file_size = file
            .metadata()
            .await
            .map_err(|e| TailError::from_io(&self.path, e))?
            .len();

        let in_bounds = offset
            .checked_add(length)
            .is_some_and(|end| end <= file_size);
        if !in_bounds {
            return Err(TailError::malformed_range(offset, length, file_size));
        }
        let capacity = usize::try_from(length)
            .map_err(|_| TailError::malformed_range(offset, length, file_size))?;

        file.seek(SeekFrom::Start(offset))
            .await
            .map_err(|e| TailError::from_io(&self.path, e))?;
        let mut buffer = vec![0u8; capacity];
        match file.read_exact(&mut buffer).await {
            Ok(_) => Ok(buffer),
            // Shrunk between the bounds check and the read
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                Err(TailError::malformed_range(offset, length, file_size))
            }
            Err(e) => Err(TailError::from_io(&self.path, e)),
        }
    }
}

#[async_trait]
impl RangeReader for FsRangeReader {
    async fn stat(&self) -> Result<FileStat> {
        let metadata = self
            .bounded(async {
                tokio::fs::metadata(&self.path)
                    .await
                    .map_err(|e| TailError::from_io(&self.path, e))
            })
            .await?;
        if !metadata.is_file() {
            return Err(TailError::NotAFile {
                path: self.path.clone(),
            });
        }
        Ok(FileStat::from_metadata(&metadata))
    }

    async fn read_range(&self, offset: u64, length: u64) -> Result<Vec<u8>> {
        if length == 0 {
            return Ok(Vec::new());
        }
        self.bounded(self.read_exact_range(offset, length)).await
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

/// In-memory stand-in for a growing file.
///
/// Every `replace`/`restore` bumps the identity, mimicking a rotated file.
#[derive(Debug)]
pub struct MemoryRangeReader {
    path: PathBuf,
    file: RwLock<MemoryFile>,
}

#[derive(Debug)]
struct MemoryFile {
    content: Option<Vec<u8>>,
    generation: u64,
}

impl MemoryRangeReader {
    pub fn new(content: impl Into<Vec<u8>>) -> Self {
        Self {
            path: PathBuf::from("memory.log"),
            file: RwLock::new(MemoryFile {
                content: Some(content.into()),
                generation: 0,
            }),
        }
    }

    /// Append bytes to the end, like a writer would
    pub fn append(&self, bytes: &[u8]) {
        let mut file = self.file.write();
        file.content.get_or_insert_with(Vec::new).extend_from_slice(bytes);
    }

    /// Truncate in place, keeping the identity
    pub fn truncate(&self, len: usize) {
        if let Some(content) = self.file.write().content.as_mut() {
            content.truncate(len);
        }
    }

    /// Swap in a new file with a new identity
    pub fn replace(&self, content: impl Into<Vec<u8>>) {
        let mut file = self.file.write();
        file.content = Some(content.into());
        file.generation += 1;
    }

    /// Delete the file
    pub fn remove(&self) {
        self.file.write().content = None;
    }

    /// Recreate a deleted file
    pub fn restore(&self, content: impl Into<Vec<u8>>) {
        self.replace(content);
    }

    pub fn len(&self) -> u64 {
        self.file
            .read()
            .content
            .as_ref()
            .map_or(0, |content| content.len() as u64)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl RangeReader for MemoryRangeReader {
    async fn stat(&self) -> Result<FileStat> {
        let file = self.file.read();
        match &file.content {
            Some(content) => Ok(FileStat {
                size: content.len() as u64,
                identity: Some(FileIdentity {
                    device: 0,
                    inode: file.generation,
                }),
            }),
            None => Err(TailError::FileNotFound {
                path: self.path.clone(),
            }),
        }
    }

    async fn read_range(&self, offset: u64, length: u64) -> Result<Vec<u8>> {
        let file = self.file.read();
        let content = file.content.as_ref().ok_or_else(|| TailError::FileNotFound {
            path: self.path.clone(),
        })?;
        let file_size = content.len() as u64;
        match offset.checked_add(length) {
            Some(end) if end <= file_size => Ok(content[offset as usize..end as usize].to_vec()),
            _ => Err(TailError::malformed_range(offset, length, file_size)),
        }
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_test_file(content: &[u8]) -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("Failed to create temp file");
        file.write_all(content).expect("Failed to write test content");
        file.flush().expect("Failed to flush test file");
        file
    }

    fn reader_for(file: &NamedTempFile) -> FsRangeReader {
        FsRangeReader::open(file.path(), Duration::from_secs(5)).expect("open reader")
    }

    #[tokio::test]
    async fn test_read_range_returns_requested_bytes() {
        let file = create_test_file(b"0123456789");
        let reader = reader_for(&file);

        assert_eq!(reader.read_range(0, 4).await.unwrap(), b"0123");
        assert_eq!(reader.read_range(6, 4).await.unwrap(), b"6789");
        assert!(reader.read_range(10, 0).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_read_past_end_is_malformed_range() {
        let file = create_test_file(b"short");
        let reader = reader_for(&file);

        match reader.read_range(3, 10).await {
            Err(TailError::MalformedRange {
                offset,
                length,
                file_size,
            }) => {
                assert_eq!((offset, length, file_size), (3, 10, 5));
            }
            other => panic!("expected MalformedRange, got {other:?}"),
        }
        assert!(matches!(
            reader.read_range(u64::MAX, 2).await,
            Err(TailError::MalformedRange { .. })
        ));
    }

    #[tokio::test]
    async fn test_stat_tracks_growth_and_identity() {
        let mut file = create_test_file(b"abc\n");
        let reader = reader_for(&file);

        let before = reader.stat().await.unwrap();
        assert_eq!(before.size, 4);

        file.write_all(b"def\n").unwrap();
        file.flush().unwrap();
        let after = reader.stat().await.unwrap();
        assert_eq!(after.size, 8);
        assert_eq!(before.identity, after.identity);
        #[cfg(unix)]
        assert!(after.identity.is_some());
    }

    #[tokio::test]
    async fn test_stat_reports_missing_file() {
        let file = create_test_file(b"abc\n");
        let reader = reader_for(&file);
        let path = file.path().to_path_buf();
        drop(file);

        assert!(!path.exists());
        let err = reader.stat().await.unwrap_err();
        assert!(err.is_file_missing());
        let err = reader.read_range(0, 1).await.unwrap_err();
        assert!(err.is_file_missing());
    }

    #[tokio::test]
    async fn test_memory_reader_lifecycle() {
        let reader = MemoryRangeReader::new(b"one\n".to_vec());
        let first = reader.stat().await.unwrap();
        assert_eq!(first.size, 4);

        reader.append(b"two\n");
        assert_eq!(reader.read_range(4, 4).await.unwrap(), b"two\n");

        reader.truncate(2);
        let truncated = reader.stat().await.unwrap();
        assert_eq!(truncated.size, 2);
        assert_eq!(truncated.identity, first.identity);

        reader.replace(b"fresh\n".to_vec());
        assert_ne!(reader.stat().await.unwrap().identity, first.identity);

        reader.remove();
        assert!(reader.stat().await.unwrap_err().is_file_missing());
        reader.restore(b"back\n".to_vec());
        assert_eq!(reader.len(), 5);
    }

    #[tokio::test]
    async fn test_arc_reader_delegates() {
        let reader = Arc::new(MemoryRangeReader::new(b"abc".to_vec()));
        let shared: Arc<MemoryRangeReader> = Arc::clone(&reader);
        assert_eq!(RangeReader::read_range(&shared, 1, 2).await.unwrap(), b"bc");
        assert_eq!(RangeReader::path(&shared), Path::new("memory.log"));
    }
}
