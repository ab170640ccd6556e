//! INI serialization logic for converting `ConfigFile` → INI string.
//!
//! Produces the commented INI representation written to `config.ini`.

use std::path::Path;

use super::settings::ConfigFile;

/// Convert a `ConfigFile` to a commented INI string for saving.
pub(super) fn to_config_string(config: &ConfigFile) -> String {
    let workers = config
        .coordinator
        .workers
        .map(|n| n.to_string())
        .unwrap_or_default();

    format!(
        r#"[cache]
; Directory for cached analysis results, one JSON file per result.
; Supports ~/ for the home directory.
directory = {}
; Number of results kept in memory before the oldest are evicted
max_size = {}
; Set to false to always recompute results
enabled = {}

[coordinator]
; Worker threads for blocking operations.
; Leave empty for automatic sizing (CPU count + 1, at most 4)
workers = {}

[logging]
; Log directory (relative paths are resolved against the working directory)
directory = {}
; Log file name; truncated at the start of each session
file = {}
"#,
        path_to_string(&config.cache.directory),
        config.cache.max_size,
        config.cache.enabled,
        workers,
        path_to_string(&config.logging.directory),
        config.logging.file,
    )
}

fn path_to_string(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}
