//! Path validation run once before a file is tailed.
//!
//! Polling tolerates a missing file, but startup does not: the engine cannot
//! produce its initial snapshot without a readable regular file.

use crate::error::{Result, TailError};
use std::fs::File;
use std::path::Path;

/// Validate that a path can be tailed
///
/// # Validations Performed
/// - Path exists and is a regular file (not a directory)
/// - File is readable by the current process
///
/// An empty file is accepted: it simply yields an empty snapshot.
pub fn validate_tail_target(path: &Path) -> Result<()> {
    let metadata = std::fs::metadata(path).map_err(|e| TailError::from_io(path, e))?;

    if !metadata.is_file() {
        return Err(TailError::NotAFile {
            path: path.to_path_buf(),
        });
    }

    // Open once to verify read permissions; the handle is dropped immediately
    File::open(path).map_err(|e| TailError::from_io(path, e))?;

    Ok(())
}
