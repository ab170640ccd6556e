//! User configuration for sonicache.
//!
//! Settings are read from `~/.sonicache/config.ini`; a missing file means
//! defaults. [`ConfigFile::coordinator_config`] turns the loaded settings
//! into a [`CoordinatorConfig`](crate::coordinator::CoordinatorConfig).
//!
//! # Example
//!
//! ```
//! use sonicache::config::ConfigFile;
//!
//! let config = ConfigFile::default();
//! let coordinator = config.coordinator_config();
//! assert!(coordinator.enable_cache);
//! ```

mod defaults;
mod file;
mod parser;
mod settings;
mod writer;

pub use defaults::{
    CONFIG_DIR_NAME, CONFIG_FILE_NAME, DEFAULT_CACHE_ENABLED, DEFAULT_CACHE_MAX_SIZE,
};
pub use file::{config_directory, config_file_path, ConfigFileError};
pub use settings::{CacheSettings, ConfigFile, CoordinatorSettings, LoggingSettings};
