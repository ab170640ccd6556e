//! In-memory tier with batch LRU eviction.

use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashMap;
use std::time::Instant;

use super::fingerprint::FileFingerprint;
use super::key::CacheKey;

/// Share of the tier evicted at once when it is full (one fifth).
const EVICTION_DIVISOR: usize = 5;

/// Entry in the memory tier.
#[derive(Debug, Clone)]
struct CacheEntry {
    /// Fingerprint of the source file when the value was computed
    fingerprint: FileFingerprint,
    /// Cached result
    value: Value,
    /// Last access time for LRU eviction
    last_accessed: Instant,
}

impl CacheEntry {
    fn new(fingerprint: FileFingerprint, value: Value) -> Self {
        Self {
            fingerprint,
            value,
            last_accessed: Instant::now(),
        }
    }

    fn touch(&mut self) {
        self.last_accessed = Instant::now();
    }
}

/// Outcome of a memory tier lookup.
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup {
    /// Entry present with a matching fingerprint
    Hit(Value),
    /// Entry was present for an older version of the file and has been removed
    Stale,
    /// No entry for this key
    Miss,
}

/// Lock-guarded map from key to (fingerprint, value).
///
/// Every read-modify-write sequence runs under a single mutex and never
/// touches the filesystem, so the lock is only ever held for map work.
pub struct MemoryTier {
    entries: Mutex<HashMap<CacheKey, CacheEntry>>,
    max_size: usize,
}

impl MemoryTier {
    /// Create an empty tier holding at most `max_size` entries.
    pub fn new(max_size: usize) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            max_size: max_size.max(1),
        }
    }

    /// Look up a key, validating the stored fingerprint.
    ///
    /// A hit refreshes the entry's access time. A fingerprint mismatch
    /// removes the entry.
    pub fn lookup(&self, key: &CacheKey, fingerprint: &FileFingerprint) -> Lookup {
        let mut entries = self.entries.lock();

        match entries.get_mut(key) {
            None => return Lookup::Miss,
            Some(entry) if entry.fingerprint == *fingerprint => {
                entry.touch();
                return Lookup::Hit(entry.value.clone());
            }
            Some(_) => {}
        }

        entries.remove(key);
        Lookup::Stale
    }

    /// Insert or replace an entry.
    ///
    /// When the tier is at or above capacity, the least recently accessed
    /// fifth of its entries (at least one) is evicted first. Returns the
    /// evicted keys so the caller can drop their disk copies.
    pub fn insert(
        &self,
        key: CacheKey,
        fingerprint: FileFingerprint,
        value: Value,
    ) -> Vec<CacheKey> {
        let mut entries = self.entries.lock();

        let evicted = if entries.len() >= self.max_size {
            evict_oldest(&mut entries)
        } else {
            Vec::new()
        };

        entries.insert(key, CacheEntry::new(fingerprint, value));
        evicted
    }

    /// Remove an entry. Returns whether it existed.
    pub fn remove(&self, key: &CacheKey) -> bool {
        self.entries.lock().remove(key).is_some()
    }

    /// Check if a key is present, regardless of fingerprint.
    pub fn contains(&self, key: &CacheKey) -> bool {
        self.entries.lock().contains_key(key)
    }

    /// Current number of entries.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    /// Remove every entry.
    pub fn clear(&self) {
        self.entries.lock().clear();
    }
}

/// Remove the least recently accessed fifth of the map, minimum one entry.
fn evict_oldest(entries: &mut HashMap<CacheKey, CacheEntry>) -> Vec<CacheKey> {
    let count = (entries.len() / EVICTION_DIVISOR).max(1);

    let mut by_age: Vec<(&CacheKey, Instant)> = entries
        .iter()
        .map(|(key, entry)| (key, entry.last_accessed))
        .collect();
    by_age.sort_by_key(|(_, accessed)| *accessed);

    let victims: Vec<CacheKey> = by_age
        .into_iter()
        .take(count)
        .map(|(key, _)| key.clone())
        .collect();

    for key in &victims {
        entries.remove(key);
    }
    victims
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::Params;
    use serde_json::json;
    use std::thread;
    use std::time::Duration;

    fn key(n: usize) -> CacheKey {
        CacheKey::compute(format!("/music/{}.wav", n), "analysis", &Params::new())
    }

    fn fingerprint(tag: &str) -> FileFingerprint {
        serde_json::from_value(json!(tag)).unwrap()
    }

    #[test]
    fn test_memory_tier_new() {
        let tier = MemoryTier::new(10);
        assert_eq!(tier.max_size(), 10);
        assert!(tier.is_empty());
    }

    #[test]
    fn test_zero_capacity_is_clamped() {
        assert_eq!(MemoryTier::new(0).max_size(), 1);
    }

    #[test]
    fn test_insert_and_lookup() {
        let tier = MemoryTier::new(10);
        tier.insert(key(1), fingerprint("v1"), json!({"tempo": 120}));

        assert_eq!(
            tier.lookup(&key(1), &fingerprint("v1")),
            Lookup::Hit(json!({"tempo": 120}))
        );
        assert_eq!(tier.lookup(&key(2), &fingerprint("v1")), Lookup::Miss);
    }

    #[test]
    fn test_stale_entry_is_removed() {
        let tier = MemoryTier::new(10);
        tier.insert(key(1), fingerprint("v1"), json!(1));

        assert_eq!(tier.lookup(&key(1), &fingerprint("v2")), Lookup::Stale);
        assert!(!tier.contains(&key(1)));
        assert_eq!(tier.lookup(&key(1), &fingerprint("v1")), Lookup::Miss);
    }

    #[test]
    fn test_insert_replaces_existing() {
        let tier = MemoryTier::new(10);
        tier.insert(key(1), fingerprint("v1"), json!(1));
        tier.insert(key(1), fingerprint("v2"), json!(2));

        assert_eq!(tier.len(), 1);
        assert_eq!(tier.lookup(&key(1), &fingerprint("v2")), Lookup::Hit(json!(2)));
    }

    #[test]
    fn test_full_tier_evicts_one_fifth() {
        let tier = MemoryTier::new(10);
        for n in 0..10 {
            tier.insert(key(n), fingerprint("v"), json!(n));
            thread::sleep(Duration::from_millis(2));
        }

        let evicted = tier.insert(key(10), fingerprint("v"), json!(10));
        assert_eq!(evicted, vec![key(0), key(1)]);
        assert_eq!(tier.len(), 9);
        assert!(tier.contains(&key(10)));
    }

    #[test]
    fn test_small_tier_evicts_at_least_one() {
        let tier = MemoryTier::new(2);
        tier.insert(key(0), fingerprint("v"), json!(0));
        thread::sleep(Duration::from_millis(2));
        tier.insert(key(1), fingerprint("v"), json!(1));

        let evicted = tier.insert(key(2), fingerprint("v"), json!(2));
        assert_eq!(evicted, vec![key(0)]);
        assert_eq!(tier.len(), 2);
    }

    #[test]
    fn test_recent_access_protects_from_eviction() {
        let tier = MemoryTier::new(3);
        for n in 0..3 {
            tier.insert(key(n), fingerprint("v"), json!(n));
            thread::sleep(Duration::from_millis(2));
        }

        // Touch the oldest entry so key(1) becomes the LRU
        tier.lookup(&key(0), &fingerprint("v"));
        thread::sleep(Duration::from_millis(2));

        let evicted = tier.insert(key(3), fingerprint("v"), json!(3));
        assert_eq!(evicted, vec![key(1)]);
        assert!(tier.contains(&key(0)));
    }

    #[test]
    fn test_remove_and_clear() {
        let tier = MemoryTier::new(10);
        tier.insert(key(1), fingerprint("v"), json!(1));
        tier.insert(key(2), fingerprint("v"), json!(2));

        assert!(tier.remove(&key(1)));
        assert!(!tier.remove(&key(1)));

        tier.clear();
        assert!(tier.is_empty());
    }
}
