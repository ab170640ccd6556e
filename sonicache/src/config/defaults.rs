//! Default values for all configuration settings.
//!
//! Contains the `DEFAULT_*` constants and the `Default` implementations of the
//! settings sections.

use std::path::PathBuf;

use super::settings::*;
use crate::cache::{default_cache_directory, DEFAULT_MAX_SIZE};
use crate::logging::{default_log_dir, default_log_file};

/// Name of the per-user configuration directory under the home directory.
pub const CONFIG_DIR_NAME: &str = ".sonicache";

/// Configuration file name inside [`CONFIG_DIR_NAME`].
pub const CONFIG_FILE_NAME: &str = "config.ini";

/// Default maximum number of cached results held in memory.
pub const DEFAULT_CACHE_MAX_SIZE: usize = DEFAULT_MAX_SIZE;

/// Caching is on unless disabled.
pub const DEFAULT_CACHE_ENABLED: bool = true;

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            directory: default_cache_directory(),
            max_size: DEFAULT_CACHE_MAX_SIZE,
            enabled: DEFAULT_CACHE_ENABLED,
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            directory: PathBuf::from(default_log_dir()),
            file: default_log_file().to_string(),
        }
    }
}
