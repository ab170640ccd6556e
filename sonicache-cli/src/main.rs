//! sonicache CLI - Command-line interface
//!
//! Inspects and manages the result cache and runs the built-in probe
//! operation through the task coordinator.

mod commands;
mod error;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use commands::cache::CacheAction;
use commands::config::ConfigCommands;
use error::CliError;
use sonicache::logging::{default_log_dir, default_log_file, init_logging, LoggingGuard};

#[derive(Parser)]
#[command(name = "sonicache")]
#[command(version = sonicache::VERSION)]
#[command(about = "Cache and coordinate audio analysis results", long_about = None)]
struct Cli {
    /// Config file to use instead of ~/.sonicache/config.ini
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Write logs to the configured log file and stdout
    #[arg(long, global = true)]
    log: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage the result cache
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },

    /// Create or inspect configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Print the change-detection fingerprint of a file
    Fingerprint {
        /// Audio file
        file: PathBuf,
    },

    /// Print the cache key for an operation on a file
    Key {
        /// Audio file (used as given, it need not exist)
        file: PathBuf,

        /// Operation name, e.g. analysis
        operation: String,

        /// Operation parameters as key=value
        params: Vec<String>,
    },

    /// Probe files in parallel and print the results as JSON
    Probe {
        /// Files to probe
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Always re-probe instead of using cached results
        #[arg(long)]
        no_cache: bool,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let _logging = match start_logging(&cli) {
        Ok(guard) => guard,
        Err(e) => e.exit(),
    };

    if let Err(e) = run(cli).await {
        e.exit();
    }
}

fn start_logging(cli: &Cli) -> Result<Option<LoggingGuard>, CliError> {
    if !cli.log {
        return Ok(None);
    }

    let (log_dir, log_file) = match commands::common::load_config(cli.config.as_deref()) {
        Ok(config) => (config.logging.directory, config.logging.file),
        Err(_) => (PathBuf::from(default_log_dir()), default_log_file().to_string()),
    };

    init_logging(&log_dir, &log_file)
        .map(Some)
        .map_err(CliError::LoggingInit)
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let config = cli.config.as_deref();

    match cli.command {
        Commands::Cache { action } => commands::cache::run(action, config).await,
        Commands::Config { command } => commands::config::run(command, config),
        Commands::Fingerprint { file } => commands::inspect::run_fingerprint(&file),
        Commands::Key {
            file,
            operation,
            params,
        } => commands::inspect::run_key(&file, &operation, &params),
        Commands::Probe { files, no_cache } => commands::probe::run(files, no_cache, config).await,
    }
}
