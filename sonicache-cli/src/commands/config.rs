//! Configuration management CLI commands.
//!
//! Provides `config init` to write a default config file, plus `config path`
//! and `config show` for inspecting the settings sonicache runs with.

use clap::Subcommand;
use sonicache::config::ConfigFile;
use std::path::Path;
use tracing::info;

use super::common::{config_path, load_config};
use crate::error::CliError;

/// Config subcommands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Create the configuration file with default values if it is missing
    Init,

    /// Show the configuration file path
    Path,

    /// Print the effective configuration (file values over defaults)
    Show,
}

/// Run a config subcommand.
pub fn run(command: ConfigCommands, explicit: Option<&Path>) -> Result<(), CliError> {
    match command {
        ConfigCommands::Init => {
            let path = config_path(explicit);
            if ConfigFile::ensure_exists(&path)? {
                info!(path = %path.display(), "Created default config file");
                println!("Created {}", path.display());
            } else {
                println!("Config file already exists: {}", path.display());
            }
            Ok(())
        }
        ConfigCommands::Path => {
            let path = config_path(explicit);
            println!("{}", path.display());
            if !path.exists() {
                eprintln!("(file does not exist; defaults are in effect)");
            }
            Ok(())
        }
        ConfigCommands::Show => {
            let config = load_config(explicit)?;
            print!("{}", config.to_ini_string());
            Ok(())
        }
    }
}
