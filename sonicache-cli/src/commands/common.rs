//! Helpers shared across CLI commands.

use std::path::{Path, PathBuf};

use sonicache::cache::{ResultCache, ResultCacheConfig};
use sonicache::config::{config_file_path, ConfigFile};

use crate::error::CliError;

/// Config file selected by `--config`, or the default location.
pub fn config_path(explicit: Option<&Path>) -> PathBuf {
    explicit.map(Path::to_path_buf).unwrap_or_else(config_file_path)
}

/// Load the configuration.
///
/// A missing default file means defaults; a missing explicit file is an error.
pub fn load_config(explicit: Option<&Path>) -> Result<ConfigFile, CliError> {
    match explicit {
        Some(path) if !path.exists() => Err(CliError::Config(format!(
            "config file '{}' does not exist",
            path.display()
        ))),
        Some(path) => Ok(ConfigFile::load_from(path)?),
        None => Ok(ConfigFile::load()?),
    }
}

/// Open the configured result cache.
pub fn open_cache(config: &ConfigFile) -> Result<ResultCache, CliError> {
    let cache_config =
        ResultCacheConfig::new(&config.cache.directory).with_max_size(config.cache.max_size);
    Ok(ResultCache::new(cache_config)?)
}

/// Fail with [`CliError::FileNotFound`] unless `path` exists.
pub fn require_file(path: &Path) -> Result<(), CliError> {
    if path.exists() {
        Ok(())
    } else {
        Err(CliError::FileNotFound(path.to_path_buf()))
    }
}
