//! Cache statistics snapshot.

use serde::Serialize;
use std::path::PathBuf;

/// Point-in-time view of a [`ResultCache`](super::ResultCache).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Entries in the memory tier
    pub memory_entries: usize,
    /// Entry files in the disk tier
    pub disk_entries: usize,
    /// Memory tier capacity
    pub max_size: usize,
    /// Disk tier directory
    pub location: PathBuf,
}
