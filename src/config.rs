//! Engine configuration.
//!
//! All values are fixed for the lifetime of one engine instance. With the
//! `config` feature enabled, settings can also be loaded from a TOML file.

use crate::error::{Result, TailError};
use crate::history::DEFAULT_MAX_LINES;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default interval between two polls of the watched file
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1000);

/// Default size of one chunk read, backward or forward
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// Default upper bound on a single read
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_millis(5000);

/// Settings for one tail engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TailConfig {
    /// File being tailed
    pub path: PathBuf,
    /// Interval between size checks
    pub poll_interval: Duration,
    /// Bytes per chunk for both the startup scan and incremental reads
    pub chunk_size: usize,
    /// Ring capacity and size of the initial snapshot
    pub max_lines: usize,
    /// Upper bound on a single read before the tick is abandoned
    pub read_timeout: Duration,
}

impl TailConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            chunk_size: DEFAULT_CHUNK_SIZE,
            max_lines: DEFAULT_MAX_LINES,
            read_timeout: DEFAULT_READ_TIMEOUT,
        }
    }

    #[must_use]
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    #[must_use]
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    #[must_use]
    pub fn with_max_lines(mut self, max_lines: usize) -> Self {
        self.max_lines = max_lines;
        self
    }

    #[must_use]
    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// Reject settings the engine cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.path.as_os_str().is_empty() {
            return Err(TailError::config("file path must not be empty"));
        }
        if self.poll_interval.is_zero() {
            return Err(TailError::config("poll interval must be greater than zero"));
        }
        if self.chunk_size == 0 {
            return Err(TailError::config("chunk size must be greater than zero"));
        }
        if self.max_lines == 0 {
            return Err(TailError::config("line capacity must be greater than zero"));
        }
        if self.read_timeout.is_zero() {
            return Err(TailError::config("read timeout must be greater than zero"));
        }
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(feature = "config")]
mod file {
    use super::TailConfig;
    use crate::error::{Result, TailError};
    use serde::Deserialize;
    use std::path::{Path, PathBuf};
    use std::time::Duration;

    /// On-disk shape of the configuration file; every key is optional
    #[derive(Debug, Default, Deserialize)]
    #[serde(deny_unknown_fields)]
    pub struct ConfigFile {
        pub path: Option<PathBuf>,
        pub poll_interval_ms: Option<u64>,
        pub chunk_size: Option<usize>,
        pub max_lines: Option<usize>,
        pub read_timeout_ms: Option<u64>,
    }

    impl ConfigFile {
        pub fn parse(text: &str) -> Result<Self> {
            toml::from_str(text).map_err(|e| TailError::config(e.to_string()))
        }

        pub fn load(path: &Path) -> Result<Self> {
            let text = std::fs::read_to_string(path).map_err(|e| {
                TailError::file_error(format!("Failed to read config {}", path.display()), e)
            })?;
            Self::parse(&text)
        }

        /// Build a config, preferring `path_override` over the file's `path`
        pub fn into_config(self, path_override: Option<PathBuf>) -> Result<TailConfig> {
            let path = path_override
                .or(self.path)
                .ok_or_else(|| TailError::config("no file path given"))?;
            let mut config = TailConfig::new(path);
            if let Some(ms) = self.poll_interval_ms {
                config.poll_interval = Duration::from_millis(ms);
            }
            if let Some(chunk_size) = self.chunk_size {
                config.chunk_size = chunk_size;
            }
            if let Some(max_lines) = self.max_lines {
                config.max_lines = max_lines;
            }
            if let Some(ms) = self.read_timeout_ms {
                config.read_timeout = Duration::from_millis(ms);
            }
            config.validate()?;
            Ok(config)
        }
    }

    /// `<config_dir>/tailcast/config.toml`, when a config dir exists
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("tailcast").join("config.toml"))
    }

    impl TailConfig {
        /// Load a full config from a TOML file
        pub fn from_toml_file(path: &Path) -> Result<Self> {
            ConfigFile::load(path)?.into_config(None)
        }
    }
}

#[cfg(feature = "config")]
pub use file::{default_config_path, ConfigFile};
