//! `probe` command: cheap file inspection run through the coordinator.
//!
//! Each file is probed on the worker pool and its summary is cached like
//! any other operation result, so repeated probes of unchanged files are
//! served from the result cache.

use serde_json::{json, Value};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use sonicache::cache::Params;
use sonicache::coordinator::{
    Operation, OperationError, OperationOutput, ParallelTask, TaskCoordinator,
};

use super::common::load_config;
use crate::error::CliError;

/// Operation name under which probe results are cached.
pub const PROBE_OPERATION: &str = "probe";

/// Number of leading bytes included in the summary.
const HEADER_BYTES: usize = 12;

/// Probe files in parallel and print results and stats as JSON.
pub async fn run(
    files: Vec<PathBuf>,
    no_cache: bool,
    config_path: Option<&Path>,
) -> Result<(), CliError> {
    let config = load_config(config_path)?;
    let mut coordinator_config = config.coordinator_config();
    if no_cache {
        coordinator_config = coordinator_config.with_cache_enabled(false);
    }
    let coordinator = Arc::new(TaskCoordinator::new(coordinator_config)?);

    let tasks = files
        .into_iter()
        .map(|file| {
            let name = file.display().to_string();
            let coordinator = Arc::clone(&coordinator);
            ParallelTask::new(
                name,
                Operation::from_future(async move {
                    let target = file.clone();
                    coordinator
                        .run_with_cache(
                            PROBE_OPERATION,
                            Operation::blocking(move || probe_file(&target)),
                            &file,
                            &Params::new().with("header_bytes", HEADER_BYTES),
                        )
                        .await
                }),
            )
        })
        .collect();

    let results = coordinator.run_parallel(tasks).await;
    let stats = coordinator.get_performance_stats().await;

    let report = json!({
        "results": results,
        "stats": serde_json::to_value(stats)?,
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

/// Summarize a file: size, extension, leading bytes and a format guess.
pub fn probe_file(path: &Path) -> OperationOutput {
    let read_failed = |e: std::io::Error| {
        OperationError::failed(format!("cannot read {}: {}", path.display(), e))
    };

    let metadata = std::fs::metadata(path).map_err(read_failed)?;
    if !metadata.is_file() {
        return Err(OperationError::failed(format!(
            "{} is not a regular file",
            path.display()
        )));
    }

    let mut header = Vec::with_capacity(HEADER_BYTES);
    File::open(path)
        .and_then(|file| file.take(HEADER_BYTES as u64).read_to_end(&mut header))
        .map_err(read_failed)?;

    let extension = path
        .extension()
        .map(|ext| ext.to_string_lossy().to_lowercase());

    Ok(json!({
        "file": path.display().to_string(),
        "size_bytes": metadata.len(),
        "extension": extension,
        "header_hex": to_hex(&header),
        "detected_format": detect_format(&header),
    }))
}

fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Guess the container format from magic bytes.
fn detect_format(header: &[u8]) -> Value {
    let format = match header {
        [b'R', b'I', b'F', b'F', _, _, _, _, b'W', b'A', b'V', b'E', ..] => "wav",
        [b'f', b'L', b'a', b'C', ..] => "flac",
        [b'O', b'g', b'g', b'S', ..] => "ogg",
        [b'I', b'D', b'3', ..] => "mp3",
        [0xFF, second, ..] if second & 0xE0 == 0xE0 => "mp3",
        [b'F', b'O', b'R', b'M', _, _, _, _, b'A', b'I', b'F', ..] => "aiff",
        [_, _, _, _, b'f', b't', b'y', b'p', ..] => "mp4",
        _ => return Value::Null,
    };
    Value::String(format.to_string())
}
