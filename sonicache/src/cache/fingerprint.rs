//! File fingerprints for cheap change detection.
//!
//! A fingerprint is a SHA-256 digest of a file's absolute path, byte size
//! and modification time. Computing one costs a single `stat` call and
//! never reads the file body.
//!
//! # Not a content hash
//!
//! Two files with the same path, size and mtime share a fingerprint even if
//! their bytes differ. A rewrite that preserves both length and mtime goes
//! undetected, and any cached result for that file keeps being served until
//! one of them changes. This is a known false-negative source.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::io;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::warn;

/// Distinguishes fallback tokens minted within the same clock tick.
static FALLBACK_SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// Change-detection token for a file on disk.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileFingerprint(String);

impl FileFingerprint {
    /// Fingerprint a file from its metadata.
    ///
    /// Never fails. If the metadata cannot be read the returned token is
    /// derived from the current wall-clock time, so it matches nothing that
    /// was stored earlier and the lookup degrades to a cache miss.
    pub fn compute(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::try_compute(path) {
            Ok(fingerprint) => fingerprint,
            Err(e) => {
                warn!(
                    path = %path.display(),
                    error = %e,
                    "Failed to read file metadata, using fallback fingerprint"
                );
                Self::fallback(path)
            }
        }
    }

    /// Fingerprint a file, surfacing metadata errors.
    pub fn try_compute(path: &Path) -> io::Result<Self> {
        let metadata = std::fs::metadata(path)?;
        let mtime = signed_nanos(metadata.modified()?);
        let absolute = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());

        Ok(Self(sha256_hex(&format!(
            "{}_{}_{}",
            absolute.display(),
            metadata.len(),
            mtime
        ))))
    }

    fn fallback(path: &Path) -> Self {
        let now = signed_nanos(SystemTime::now());
        let sequence = FALLBACK_SEQUENCE.fetch_add(1, Ordering::Relaxed);
        Self(sha256_hex(&format!(
            "unreadable_{}_{}_{}",
            path.display(),
            now,
            sequence
        )))
    }

    /// The token as a lowercase hex string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FileFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Nanoseconds relative to the Unix epoch, negative for earlier times.
fn signed_nanos(time: SystemTime) -> i128 {
    match time.duration_since(UNIX_EPOCH) {
        Ok(after) => after.as_nanos() as i128,
        Err(before) => -(before.duration().as_nanos() as i128),
    }
}

/// SHA-256 of a string as lowercase hex.
pub(crate) fn sha256_hex(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{self, File, OpenOptions};
    use std::io::Write;
    use std::time::Duration;
    use tempfile::TempDir;

    fn write_file(dir: &TempDir, name: &str, contents: &[u8]) -> std::path::PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_fingerprint_is_stable_for_untouched_file() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "track.wav", b"RIFF....WAVE");

        let first = FileFingerprint::compute(&path);
        let second = FileFingerprint::compute(&path);
        assert_eq!(first, second);
        assert_eq!(first.as_str().len(), 64);
    }

    #[test]
    fn test_fingerprint_changes_with_size() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "track.wav", b"abc");
        let before = FileFingerprint::compute(&path);

        let mut file = OpenOptions::new().append(true).open(&path).unwrap();
        file.write_all(b"def").unwrap();
        drop(file);

        assert_ne!(before, FileFingerprint::compute(&path));
    }

    #[test]
    fn test_fingerprint_changes_with_mtime() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "track.wav", b"abc");
        let before = FileFingerprint::compute(&path);

        let file = File::options().write(true).open(&path).unwrap();
        let bumped = fs::metadata(&path).unwrap().modified().unwrap() + Duration::from_secs(10);
        file.set_modified(bumped).unwrap();
        drop(file);

        assert_ne!(before, FileFingerprint::compute(&path));
    }

    #[test]
    fn test_same_size_and_mtime_is_not_detected() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "track.wav", b"aaaa");
        let mtime = fs::metadata(&path).unwrap().modified().unwrap();
        let before = FileFingerprint::compute(&path);

        fs::write(&path, b"bbbb").unwrap();
        File::options()
            .write(true)
            .open(&path)
            .unwrap()
            .set_modified(mtime)
            .unwrap();

        assert_eq!(before, FileFingerprint::compute(&path));
    }

    #[test]
    fn test_different_paths_differ() {
        let dir = TempDir::new().unwrap();
        let a = write_file(&dir, "a.wav", b"same");
        let b = write_file(&dir, "b.wav", b"same");
        assert_ne!(FileFingerprint::compute(a), FileFingerprint::compute(b));
    }

    #[test]
    fn test_missing_file_yields_unique_fallbacks() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("missing.wav");

        assert!(FileFingerprint::try_compute(&missing).is_err());
        let first = FileFingerprint::compute(&missing);
        let second = FileFingerprint::compute(&missing);
        assert_ne!(first, second);
    }

    #[test]
    fn test_signed_nanos_before_epoch() {
        let before = UNIX_EPOCH - Duration::from_nanos(5);
        assert_eq!(signed_nanos(before), -5);
        assert_eq!(signed_nanos(UNIX_EPOCH + Duration::from_nanos(7)), 7);
    }

    #[test]
    fn test_sha256_hex_known_value() {
        assert_eq!(
            sha256_hex("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
