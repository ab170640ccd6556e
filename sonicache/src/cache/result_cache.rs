//! Two-tier result cache.
//!
//! Lookups consult the memory tier first and fall back to the disk tier,
//! promoting disk hits into memory. Every entry carries the
//! [`FileFingerprint`] of its source file; a mismatch on lookup discards the
//! entry (lazy invalidation).
//!
//! # Locking
//!
//! The memory tier's mutex covers membership checks, eviction and insertion.
//! It is never held across filesystem work: disk reads, writes and
//! deletions run on the blocking thread pool after the lock is released.
//!
//! # Failure Handling
//!
//! The cache is an optimization. Disk errors, corrupt entries and
//! incompatible format versions are logged and degrade to misses; none of
//! them reach the caller.

use serde_json::Value;
use std::path::Path;
use tracing::{debug, info, warn};

use super::disk::{ClearResult, DiskEntry, DiskTier};
use super::fingerprint::FileFingerprint;
use super::key::{CacheKey, Params};
use super::memory::{Lookup, MemoryTier};
use super::stats::CacheStats;
use super::types::{CacheError, ResultCacheConfig};

/// Memory + disk cache of operation results keyed by file identity.
pub struct ResultCache {
    memory: MemoryTier,
    disk: DiskTier,
}

impl ResultCache {
    /// Create a cache, creating its directory if needed.
    pub fn new(config: ResultCacheConfig) -> Result<Self, CacheError> {
        config.validate()?;
        let disk = DiskTier::open(&config.directory)?;

        info!(
            dir = %config.directory.display(),
            max_size = config.max_size,
            "Result cache ready"
        );

        Ok(Self {
            memory: MemoryTier::new(config.max_size),
            disk,
        })
    }

    /// Look up a cached result.
    ///
    /// Returns `None` when nothing is stored for the triple, when the stored
    /// entry belongs to an older version of the file, or when the disk entry
    /// cannot be decoded.
    pub async fn get(&self, path: &Path, operation: &str, params: &Params) -> Option<Value> {
        let key = CacheKey::compute(path, operation, params);
        let fingerprint = FileFingerprint::compute(path);

        match self.memory.lookup(&key, &fingerprint) {
            Lookup::Hit(value) => {
                debug!(operation, key = %key, "Memory cache hit");
                return Some(value);
            }
            Lookup::Stale => {
                debug!(operation, key = %key, "Discarded stale memory entry");
            }
            Lookup::Miss => {}
        }

        let lookup_key = key.clone();
        let read = self.on_disk(move |disk| disk.read(&lookup_key)).await?;

        match read {
            Ok(Some(entry)) if entry.fingerprint == fingerprint => {
                debug!(operation, key = %key, "Disk cache hit, promoting to memory");
                let evicted = self.memory.insert(key, fingerprint, entry.value.clone());
                self.drop_evicted(evicted).await;
                Some(entry.value)
            }
            Ok(Some(_)) => {
                debug!(operation, key = %key, "Discarded stale disk entry");
                self.discard(key).await;
                None
            }
            Ok(None) => None,
            Err(e) => {
                warn!(operation, key = %key, error = %e, "Discarding unreadable cache entry");
                self.discard(key).await;
                None
            }
        }
    }

    /// Store a result.
    ///
    /// The memory tier is updated before this returns any control to other
    /// tasks. Evicted files and the new disk entry are then written on the
    /// blocking pool, outside the lock.
    pub async fn set(&self, path: &Path, operation: &str, value: Value, params: &Params) {
        let key = CacheKey::compute(path, operation, params);
        let fingerprint = FileFingerprint::compute(path);
        let entry = DiskEntry::new(operation, fingerprint.clone(), value.clone());

        let evicted = self.memory.insert(key.clone(), fingerprint, value);
        if !evicted.is_empty() {
            debug!(count = evicted.len(), "Evicted least recently used entries");
        }

        self.on_disk(move |disk| {
            remove_all(disk, &evicted);
            if let Err(e) = disk.write(&key, &entry) {
                warn!(key = %key, error = %e, "Failed to write cache entry to disk");
            }
        })
        .await;
    }

    /// Remove every entry from both tiers.
    ///
    /// Disk deletion is best-effort; failures are logged and skipped.
    pub async fn clear(&self) -> ClearResult {
        self.memory.clear();
        let result = self.on_disk(|disk| disk.clear()).await.unwrap_or_default();

        info!(
            dir = %self.disk.directory().display(),
            deleted = result.files_deleted,
            failures = result.failures,
            "Result cache cleared"
        );
        result
    }

    /// Snapshot of entry counts and location.
    pub async fn stats(&self) -> CacheStats {
        let disk_entries = self
            .on_disk(|disk| disk.entry_count())
            .await
            .unwrap_or_default();

        CacheStats {
            memory_entries: self.memory.len(),
            disk_entries,
            max_size: self.memory.max_size(),
            location: self.disk.directory().to_path_buf(),
        }
    }

    /// Whether the memory tier currently holds the given triple.
    pub fn contains_in_memory(&self, path: &Path, operation: &str, params: &Params) -> bool {
        self.memory.contains(&CacheKey::compute(path, operation, params))
    }

    /// Number of entries in the memory tier.
    pub fn memory_len(&self) -> usize {
        self.memory.len()
    }

    pub fn max_size(&self) -> usize {
        self.memory.max_size()
    }

    pub fn directory(&self) -> &Path {
        self.disk.directory()
    }

    /// Run filesystem work on the blocking pool.
    ///
    /// Returns `None` if the blocking task panicked or was cancelled.
    async fn on_disk<T, F>(&self, work: F) -> Option<T>
    where
        F: FnOnce(&DiskTier) -> T + Send + 'static,
        T: Send + 'static,
    {
        let disk = self.disk.clone();
        match tokio::task::spawn_blocking(move || work(&disk)).await {
            Ok(output) => Some(output),
            Err(e) => {
                warn!(error = %e, "Disk cache task failed");
                None
            }
        }
    }

    async fn discard(&self, key: CacheKey) {
        self.on_disk(move |disk| remove_all(disk, std::slice::from_ref(&key)))
            .await;
    }

    async fn drop_evicted(&self, evicted: Vec<CacheKey>) {
        if evicted.is_empty() {
            return;
        }
        self.on_disk(move |disk| remove_all(disk, &evicted)).await;
    }
}

fn remove_all(disk: &DiskTier, keys: &[CacheKey]) {
    for key in keys {
        if let Err(e) = disk.remove(key) {
            warn!(key = %key, error = %e, "Failed to delete cache file");
        }
    }
}
