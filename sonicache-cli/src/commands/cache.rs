//! Cache management CLI commands.

use clap::Subcommand;
use std::path::Path;
use tracing::info;

use super::common::{load_config, open_cache};
use crate::error::CliError;

/// Cache action subcommands.
#[derive(Debug, Subcommand)]
pub enum CacheAction {
    /// Delete every cached result on disk
    Clear,
    /// Show result cache statistics
    Stats,
}

/// Run a cache subcommand.
pub async fn run(action: CacheAction, config_path: Option<&Path>) -> Result<(), CliError> {
    let config = load_config(config_path)?;
    let cache = open_cache(&config)?;

    match action {
        CacheAction::Clear => {
            println!("Clearing result cache at: {}", cache.directory().display());

            let result = cache.clear().await;
            info!(
                files_deleted = result.files_deleted,
                failures = result.failures,
                "Result cache cleared"
            );
            println!("Deleted {} files", result.files_deleted);
            if result.failures > 0 {
                println!("Could not delete {} files (see log for details)", result.failures);
            }
            Ok(())
        }
        CacheAction::Stats => {
            let stats = cache.stats().await;

            println!("Result cache: {}", stats.location.display());
            println!("  Entries:  {}", stats.disk_entries);
            println!("  Max size: {} (in memory)", stats.max_size);
            println!("  Enabled:  {}", config.cache.enabled);
            Ok(())
        }
    }
}
