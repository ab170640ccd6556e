//! Core types for the result cache.

use std::path::PathBuf;
use thiserror::Error;

/// Default maximum number of results held by a cache.
pub const DEFAULT_MAX_SIZE: usize = 100;

/// Directory name used under the system temp dir when none is configured.
pub const DEFAULT_CACHE_DIR_NAME: &str = "sonicache";

/// Errors that can occur during cache operations.
#[derive(Debug, Error)]
pub enum CacheError {
    /// I/O error while reading or writing a cache file
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Cache entry could not be encoded or decoded
    #[error("Malformed cache entry: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Cache entry was written by an incompatible format version
    #[error("Unsupported cache entry format version {found} (expected {expected})")]
    UnsupportedVersion { found: u32, expected: u32 },

    /// Invalid cache configuration
    #[error("Invalid cache configuration: {0}")]
    InvalidConfig(String),
}

/// Configuration for a [`ResultCache`](super::ResultCache).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultCacheConfig {
    /// Directory holding the disk tier
    pub directory: PathBuf,
    /// Maximum number of entries kept in the memory tier
    pub max_size: usize,
}

impl Default for ResultCacheConfig {
    fn default() -> Self {
        Self {
            directory: default_cache_directory(),
            max_size: DEFAULT_MAX_SIZE,
        }
    }
}

impl ResultCacheConfig {
    /// Create a configuration rooted at the given directory.
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            max_size: DEFAULT_MAX_SIZE,
        }
    }

    /// Set the maximum number of in-memory entries.
    pub fn with_max_size(mut self, max_size: usize) -> Self {
        self.max_size = max_size;
        self
    }

    /// Set the disk tier directory.
    pub fn with_directory(mut self, directory: impl Into<PathBuf>) -> Self {
        self.directory = directory.into();
        self
    }

    /// Check that the configuration can back a working cache.
    pub fn validate(&self) -> Result<(), CacheError> {
        if self.max_size == 0 {
            return Err(CacheError::InvalidConfig(
                "max_size must be greater than zero".to_string(),
            ));
        }
        if self.directory.as_os_str().is_empty() {
            return Err(CacheError::InvalidConfig(
                "cache directory must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Default disk tier location: `<temp dir>/sonicache`.
pub fn default_cache_directory() -> PathBuf {
    std::env::temp_dir().join(DEFAULT_CACHE_DIR_NAME)
}
