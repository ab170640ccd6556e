//! `fingerprint` and `key` commands: show how the cache identifies a result.

use serde_json::Value;
use std::path::Path;

use sonicache::cache::{CacheKey, FileFingerprint, Params};

use super::common::require_file;
use crate::error::CliError;

/// Print the change-detection fingerprint of a file.
pub fn run_fingerprint(file: &Path) -> Result<(), CliError> {
    require_file(file)?;
    let fingerprint = FileFingerprint::try_compute(file).map_err(|error| CliError::FileRead {
        path: file.to_path_buf(),
        error,
    })?;

    println!("{}", fingerprint);
    Ok(())
}

/// Print the cache key for an operation on a file.
///
/// The file does not need to exist; keys depend only on the path as given.
pub fn run_key(file: &Path, operation: &str, raw_params: &[String]) -> Result<(), CliError> {
    let params = parse_params(raw_params)?;
    println!("{}", CacheKey::compute(file, operation, &params));
    Ok(())
}

/// Parse `key=value` arguments.
///
/// Values that parse as JSON (`22050`, `true`, `[1,2]`) keep their type;
/// anything else is taken as a string.
pub fn parse_params(raw: &[String]) -> Result<Params, CliError> {
    raw.iter()
        .map(|arg| {
            let (name, value) = arg
                .split_once('=')
                .filter(|(name, _)| !name.trim().is_empty())
                .ok_or_else(|| CliError::InvalidParam(arg.clone()))?;
            let value = serde_json::from_str::<Value>(value)
                .unwrap_or_else(|_| Value::String(value.to_string()));
            Ok((name.trim().to_string(), value))
        })
        .collect()
}
