//! Disk tier: one versioned JSON file per cache key.
//!
//! # File Layout
//!
//! ```text
//! {cache_dir}/{key}.json
//! ```
//!
//! Each file holds a [`DiskEntry`] envelope. Every write goes through its
//! own uniquely named `.tmp` file followed by a rename, so readers never
//! observe a partial file and concurrent writers of one key do not collide.
//!
//! All methods are synchronous and perform blocking filesystem calls. The
//! [`ResultCache`](super::ResultCache) runs them on the blocking thread pool.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use super::fingerprint::FileFingerprint;
use super::key::CacheKey;
use super::types::CacheError;

/// Current on-disk entry format. Entries with any other version are rejected.
pub const FORMAT_VERSION: u32 = 1;

/// Extension of cache entry files.
pub const ENTRY_EXTENSION: &str = "json";

/// Extension of in-progress writes.
const TEMP_EXTENSION: &str = "tmp";

/// Serialized form of a cache entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiskEntry {
    pub format_version: u32,
    /// Operation that produced the value, kept for inspection
    pub operation: String,
    pub fingerprint: FileFingerprint,
    pub value: Value,
}

impl DiskEntry {
    /// Create an entry in the current format.
    pub fn new(operation: impl Into<String>, fingerprint: FileFingerprint, value: Value) -> Self {
        Self {
            format_version: FORMAT_VERSION,
            operation: operation.into(),
            fingerprint,
            value,
        }
    }
}

/// Result of clearing the disk tier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClearResult {
    pub files_deleted: usize,
    pub failures: usize,
}

/// Directory-backed store of [`DiskEntry`] files.
#[derive(Debug, Clone)]
pub struct DiskTier {
    directory: PathBuf,
}

impl DiskTier {
    /// Open the tier, creating the directory if needed.
    pub fn open(directory: impl Into<PathBuf>) -> Result<Self, CacheError> {
        let directory = directory.into();
        fs::create_dir_all(&directory)?;
        Ok(Self { directory })
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Path of the entry file for a key.
    pub fn entry_path(&self, key: &CacheKey) -> PathBuf {
        self.directory
            .join(format!("{}.{}", key.as_str(), ENTRY_EXTENSION))
    }

    /// Read and validate an entry.
    ///
    /// Returns `Ok(None)` if no file exists for the key. Malformed files and
    /// files from another format version are reported as errors so the
    /// caller can discard them.
    pub fn read(&self, key: &CacheKey) -> Result<Option<DiskEntry>, CacheError> {
        let bytes = match fs::read(self.entry_path(key)) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(CacheError::Io(e)),
        };

        let entry: DiskEntry = serde_json::from_slice(&bytes)?;
        if entry.format_version != FORMAT_VERSION {
            return Err(CacheError::UnsupportedVersion {
                found: entry.format_version,
                expected: FORMAT_VERSION,
            });
        }
        Ok(Some(entry))
    }

    /// Write an entry atomically via a unique temp file + rename.
    ///
    /// The last completed write of a key wins. A temp file left by a failed
    /// write is removed when it is dropped.
    pub fn write(&self, key: &CacheKey, entry: &DiskEntry) -> Result<(), CacheError> {
        let bytes = serde_json::to_vec(entry)?;

        let mut temp = tempfile::Builder::new()
            .prefix(".entry-")
            .suffix(&format!(".{}", TEMP_EXTENSION))
            .tempfile_in(&self.directory)?;
        temp.write_all(&bytes)?;
        persist(temp, &self.entry_path(key))
    }

    /// Delete the entry for a key. Returns whether a file was removed.
    pub fn remove(&self, key: &CacheKey) -> Result<bool, CacheError> {
        match fs::remove_file(self.entry_path(key)) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(CacheError::Io(e)),
        }
    }

    /// Delete every entry and leftover temp file.
    ///
    /// Best-effort: failures are logged and counted, never returned.
    pub fn clear(&self) -> ClearResult {
        let mut result = ClearResult::default();

        for path in self.files_with_extensions(&[ENTRY_EXTENSION, TEMP_EXTENSION]) {
            match fs::remove_file(&path) {
                Ok(()) => result.files_deleted += 1,
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Failed to delete cache file");
                    result.failures += 1;
                }
            }
        }

        debug!(
            dir = %self.directory.display(),
            deleted = result.files_deleted,
            failures = result.failures,
            "Disk cache cleared"
        );
        result
    }

    /// Number of entry files currently on disk.
    pub fn entry_count(&self) -> usize {
        self.files_with_extensions(&[ENTRY_EXTENSION]).len()
    }

    fn files_with_extensions(&self, extensions: &[&str]) -> Vec<PathBuf> {
        let entries = match fs::read_dir(&self.directory) {
            Ok(entries) => entries,
            Err(e) => {
                debug!(
                    dir = %self.directory.display(),
                    error = %e,
                    "Failed to read cache directory"
                );
                return Vec::new();
            }
        };

        entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_file())
            .filter(|path| {
                path.extension()
                    .and_then(|ext| ext.to_str())
                    .is_some_and(|ext| extensions.contains(&ext))
            })
            .collect()
    }
}

fn persist(temp: NamedTempFile, path: &Path) -> Result<(), CacheError> {
    temp.persist(path)
        .map(|_| ())
        .map_err(|e| CacheError::Io(e.error))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::Params;
    use serde_json::json;
    use tempfile::TempDir;

    fn create_temp_tier() -> (DiskTier, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let tier = DiskTier::open(temp_dir.path().join("cache")).unwrap();
        (tier, temp_dir)
    }

    fn key(name: &str) -> CacheKey {
        CacheKey::compute(name, "analysis", &Params::new())
    }

    fn fingerprint(tag: &str) -> FileFingerprint {
        serde_json::from_value(json!(tag)).unwrap()
    }

    #[test]
    fn test_open_creates_directory() {
        let (tier, _temp) = create_temp_tier();
        assert!(tier.directory().is_dir());
        assert_eq!(tier.entry_count(), 0);
    }

    #[test]
    fn test_entry_path_uses_key_and_extension() {
        let (tier, _temp) = create_temp_tier();
        let k = key("a.wav");
        let path = tier.entry_path(&k);
        assert_eq!(
            path.file_name().unwrap().to_str().unwrap(),
            format!("{}.json", k)
        );
    }

    #[test]
    fn test_write_and_read() {
        let (tier, _temp) = create_temp_tier();
        let entry = DiskEntry::new("analysis", fingerprint("v1"), json!({"tempo": 128.0}));

        tier.write(&key("a.wav"), &entry).unwrap();
        assert_eq!(tier.read(&key("a.wav")).unwrap(), Some(entry));
        assert_eq!(tier.entry_count(), 1);
    }

    #[test]
    fn test_read_missing_is_none() {
        let (tier, _temp) = create_temp_tier();
        assert!(tier.read(&key("missing.wav")).unwrap().is_none());
    }

    #[test]
    fn test_write_leaves_no_temp_file() {
        let (tier, _temp) = create_temp_tier();
        let k = key("a.wav");
        tier.write(&k, &DiskEntry::new("analysis", fingerprint("v1"), json!(1)))
            .unwrap();

        assert!(tier.entry_path(&k).exists());
        let leftovers = fs::read_dir(tier.directory())
            .unwrap()
            .filter_map(Result::ok)
            .filter(|e| e.path().extension().is_some_and(|ext| ext == "tmp"))
            .count();
        assert_eq!(leftovers, 0);
    }

    #[test]
    fn test_concurrent_writes_of_one_key() {
        let (tier, _temp) = create_temp_tier();
        let k = key("a.wav");

        std::thread::scope(|scope| {
            for writer in 0..2 {
                let (tier, k) = (&tier, &k);
                scope.spawn(move || {
                    for round in 0..100 {
                        let value = json!({"writer": writer, "round": round});
                        tier.write(k, &DiskEntry::new("analysis", fingerprint("v"), value))
                            .unwrap();
                    }
                });
            }
            scope.spawn(|| {
                for _ in 0..100 {
                    if let Some(entry) = tier.read(&k).unwrap() {
                        assert_eq!(entry.operation, "analysis");
                    }
                }
            });
        });

        let last = tier.read(&k).unwrap().unwrap();
        assert_eq!(last.value["round"], json!(99));
        assert_eq!(tier.entry_count(), 1);
        assert_eq!(tier.clear().files_deleted, 1);
    }

    #[test]
    fn test_read_malformed_is_error() {
        let (tier, _temp) = create_temp_tier();
        let k = key("a.wav");
        fs::write(tier.entry_path(&k), b"not json").unwrap();

        assert!(matches!(tier.read(&k), Err(CacheError::Serialization(_))));
    }

    #[test]
    fn test_read_other_version_is_error() {
        let (tier, _temp) = create_temp_tier();
        let k = key("a.wav");
        let mut entry = DiskEntry::new("analysis", fingerprint("v1"), json!(1));
        entry.format_version = FORMAT_VERSION + 1;
        fs::write(tier.entry_path(&k), serde_json::to_vec(&entry).unwrap()).unwrap();

        assert!(matches!(
            tier.read(&k),
            Err(CacheError::UnsupportedVersion { found, expected })
                if found == FORMAT_VERSION + 1 && expected == FORMAT_VERSION
        ));
    }

    #[test]
    fn test_remove() {
        let (tier, _temp) = create_temp_tier();
        let k = key("a.wav");
        tier.write(&k, &DiskEntry::new("analysis", fingerprint("v1"), json!(1)))
            .unwrap();

        assert!(tier.remove(&k).unwrap());
        assert!(!tier.remove(&k).unwrap());
    }

    #[test]
    fn test_clear_removes_entries_and_temp_files() {
        let (tier, _temp) = create_temp_tier();
        for name in ["a.wav", "b.wav", "c.wav"] {
            tier.write(&key(name), &DiskEntry::new("analysis", fingerprint("v"), json!(name)))
                .unwrap();
        }
        fs::write(tier.directory().join("orphan.tmp"), b"partial").unwrap();
        fs::write(tier.directory().join("notes.txt"), b"keep me").unwrap();

        let result = tier.clear();
        assert_eq!(result.files_deleted, 4);
        assert_eq!(result.failures, 0);
        assert_eq!(tier.entry_count(), 0);
        assert!(tier.directory().join("notes.txt").exists());
    }

    #[test]
    fn test_entry_count_ignores_other_files() {
        let (tier, _temp) = create_temp_tier();
        tier.write(&key("a.wav"), &DiskEntry::new("analysis", fingerprint("v"), json!(1)))
            .unwrap();
        fs::write(tier.directory().join("orphan.tmp"), b"partial").unwrap();

        assert_eq!(tier.entry_count(), 1);
    }
}
