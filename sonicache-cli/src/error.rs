//! CLI error handling with user-friendly messages.
//!
//! Centralizes error handling for the CLI, providing consistent formatting
//! and appropriate exit codes.

use std::fmt;
use std::path::PathBuf;
use std::process;
use sonicache::cache::CacheError;
use sonicache::config::ConfigFileError;
use sonicache::coordinator::CoordinatorError;

/// CLI-specific errors with user-friendly messages.
#[derive(Debug)]
pub enum CliError {
    /// Failed to initialize logging
    LoggingInit(std::io::Error),
    /// Configuration error
    Config(String),
    /// Config file could not be read or parsed
    ConfigFile(ConfigFileError),
    /// Result cache could not be opened
    Cache(CacheError),
    /// Coordinator could not be created
    Coordinator(CoordinatorError),
    /// Input file does not exist
    FileNotFound(PathBuf),
    /// Input file could not be read
    FileRead { path: PathBuf, error: std::io::Error },
    /// A `key=value` argument could not be parsed
    InvalidParam(String),
    /// Output could not be serialized
    Output(serde_json::Error),
}

impl CliError {
    /// Exit the process with an appropriate error message and code.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        match self {
            CliError::ConfigFile(ConfigFileError::InvalidValue { .. }) => {
                eprintln!();
                eprintln!("Run 'sonicache config show' to see the expected format.");
            }
            CliError::InvalidParam(_) => {
                eprintln!();
                eprintln!("Parameters are written as key=value, e.g. sr=22050 mono=true");
            }
            _ => {}
        }

        process::exit(1)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::LoggingInit(e) => write!(f, "Failed to initialize logging: {}", e),
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::ConfigFile(e) => write!(f, "{}", e),
            CliError::Cache(e) => write!(f, "Failed to open result cache: {}", e),
            CliError::Coordinator(e) => write!(f, "{}", e),
            CliError::FileNotFound(path) => write!(f, "File not found: {}", path.display()),
            CliError::FileRead { path, error } => {
                write!(f, "Failed to read file '{}': {}", path.display(), error)
            }
            CliError::InvalidParam(arg) => {
                write!(f, "Invalid parameter '{}': expected key=value", arg)
            }
            CliError::Output(e) => write!(f, "Failed to serialize output: {}", e),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::LoggingInit(e) => Some(e),
            CliError::ConfigFile(e) => Some(e),
            CliError::Cache(e) => Some(e),
            CliError::Coordinator(e) => Some(e),
            CliError::FileRead { error, .. } => Some(error),
            CliError::Output(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ConfigFileError> for CliError {
    fn from(e: ConfigFileError) -> Self {
        CliError::ConfigFile(e)
    }
}

impl From<CacheError> for CliError {
    fn from(e: CacheError) -> Self {
        CliError::Cache(e)
    }
}

impl From<CoordinatorError> for CliError {
    fn from(e: CoordinatorError) -> Self {
        CliError::Coordinator(e)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        CliError::Output(e)
    }
}
