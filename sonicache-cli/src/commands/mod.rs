//! CLI command implementations.
//!
//! Each subcommand has its own module with argument definitions and handlers.
//!
//! # Command Modules
//!
//! - [`cache`] - Result cache management (clear, stats)
//! - [`config`] - Configuration file (init, path, show)
//! - [`inspect`] - File fingerprints and cache keys
//! - [`probe`] - Parallel file probing through the coordinator

pub mod cache;
pub mod common;
pub mod config;
pub mod inspect;
pub mod probe;
