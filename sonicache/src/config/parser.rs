//! INI parsing logic for converting `Ini` → `ConfigFile`.
//!
//! This is the single place where INI key names are mapped to struct fields.

use ini::Ini;
use std::path::PathBuf;

use super::file::ConfigFileError;
use super::settings::ConfigFile;

/// Parse an `Ini` object into a `ConfigFile`.
///
/// Starts from `ConfigFile::default()` and overlays any values found in the INI.
pub(super) fn parse_ini(ini: &Ini) -> Result<ConfigFile, ConfigFileError> {
    let mut config = ConfigFile::default();

    // [cache] section
    if let Some(section) = ini.section(Some("cache")) {
        if let Some(v) = section.get("directory") {
            let v = v.trim();
            if !v.is_empty() {
                config.cache.directory = expand_tilde(v);
            }
        }
        if let Some(v) = section.get("max_size") {
            config.cache.max_size = parse_positive(v).ok_or_else(|| {
                invalid("cache", "max_size", v, "must be a positive integer (entries)")
            })?;
        }
        if let Some(v) = section.get("enabled") {
            config.cache.enabled = parse_bool(v)
                .ok_or_else(|| invalid("cache", "enabled", v, "must be 'true' or 'false'"))?;
        }
    }

    // [coordinator] section
    if let Some(section) = ini.section(Some("coordinator")) {
        if let Some(v) = section.get("workers") {
            let v = v.trim();
            config.coordinator.workers = if v.is_empty() || v.eq_ignore_ascii_case("auto") {
                None
            } else {
                Some(parse_positive(v).ok_or_else(|| {
                    invalid(
                        "coordinator",
                        "workers",
                        v,
                        "must be a positive integer, 'auto', or empty",
                    )
                })?)
            };
        }
    }

    // [logging] section
    if let Some(section) = ini.section(Some("logging")) {
        if let Some(v) = section.get("directory") {
            let v = v.trim();
            if !v.is_empty() {
                config.logging.directory = expand_tilde(v);
            }
        }
        if let Some(v) = section.get("file") {
            let v = v.trim();
            if v.is_empty() || v.contains(['/', '\\']) {
                return Err(invalid(
                    "logging",
                    "file",
                    v,
                    "must be a plain file name",
                ));
            }
            config.logging.file = v.to_string();
        }
    }

    Ok(config)
}

fn invalid(section: &str, key: &str, value: &str, reason: &str) -> ConfigFileError {
    ConfigFileError::InvalidValue {
        section: section.to_string(),
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn parse_positive(value: &str) -> Option<usize> {
    value.trim().parse().ok().filter(|n: &usize| *n > 0)
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Some(true),
        "false" | "no" | "off" | "0" => Some(false),
        _ => None,
    }
}

/// Expand a leading `~/` to the user's home directory.
pub(super) fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}
