//! sonicache - result caching and task coordination for audio analysis
//!
//! Audio tooling spends most of its time re-running the same expensive
//! operations (feature extraction, source separation, classification) on
//! files that have not changed. This library keeps those results in a
//! two-tier cache keyed by file identity, operation and parameters, and runs
//! the operations through a bounded worker pool.
//!
//! # High-Level API
//!
//! ```no_run
//! use sonicache::cache::Params;
//! use sonicache::config::ConfigFile;
//! use sonicache::coordinator::{Operation, TaskCoordinator};
//! use serde_json::json;
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ConfigFile::load()?;
//! let coordinator = TaskCoordinator::new(config.coordinator_config())?;
//!
//! let features = coordinator
//!     .run_with_cache(
//!         "analysis",
//!         Operation::blocking(|| Ok(json!({"tempo": 120.0}))),
//!         "track.wav",
//!         &Params::new(),
//!     )
//!     .await?;
//! # let _ = features;
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod config;
pub mod coordinator;
pub mod logging;
pub mod workflow;

/// Version of the sonicache library and CLI.
///
/// The version is defined in `Cargo.toml` and injected at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
