//! Settings structs for each configuration section.
//!
//! Each struct represents one `[section]` of the INI config file.
//! These are pure data types with no parsing or serialization logic.

use std::path::PathBuf;

/// Complete application configuration loaded from config.ini.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ConfigFile {
    /// Result cache settings
    pub cache: CacheSettings,
    /// Worker pool settings
    pub coordinator: CoordinatorSettings,
    /// Logging settings
    pub logging: LoggingSettings,
}

/// Result cache configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheSettings {
    /// Directory holding cached result files
    pub directory: PathBuf,
    /// Maximum number of results kept in memory
    pub max_size: usize,
    /// Whether results are cached at all
    pub enabled: bool,
}

/// Coordinator configuration.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CoordinatorSettings {
    /// Worker pool size; `None` picks a size from the CPU count
    pub workers: Option<usize>,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingSettings {
    /// Directory for log files
    pub directory: PathBuf,
    /// Log file name
    pub file: String,
}
