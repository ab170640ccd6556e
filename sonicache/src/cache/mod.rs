//! Two-tier cache for audio analysis results.
//!
//! This module provides a result cache keyed by file identity, operation
//! name and parameters:
//! - [`FileFingerprint`]: size + mtime change detection (not a content hash)
//! - [`CacheKey`] and [`Params`]: order-independent operation identity
//! - [`ResultCache`]: memory tier backed by versioned JSON files on disk
//!
//! # Example
//!
//! ```no_run
//! use sonicache::cache::{Params, ResultCache, ResultCacheConfig};
//! use serde_json::json;
//! use std::path::Path;
//!
//! # async fn demo() -> Result<(), sonicache::cache::CacheError> {
//! let cache = ResultCache::new(ResultCacheConfig::new("/tmp/sonicache"))?;
//! let params = Params::new().with("sr", 22050);
//! let track = Path::new("track.wav");
//!
//! cache.set(track, "analysis", json!({"tempo": 120}), &params).await;
//! assert!(cache.get(track, "analysis", &params).await.is_some());
//! # Ok(())
//! # }
//! ```

pub mod disk;
mod fingerprint;
mod key;
pub mod memory;
mod result_cache;
mod stats;
mod types;

pub use disk::{ClearResult, DiskEntry, DiskTier, FORMAT_VERSION};
pub use fingerprint::FileFingerprint;
pub use key::{CacheKey, Params};
pub use memory::{Lookup, MemoryTier};
pub use result_cache::ResultCache;
pub use stats::CacheStats;
pub use types::{
    default_cache_directory, CacheError, ResultCacheConfig, DEFAULT_CACHE_DIR_NAME,
    DEFAULT_MAX_SIZE,
};
