//! Chunk sizing and windowed processing of long signals.

use dashmap::DashMap;
use std::fmt;
use std::str::FromStr;
use tracing::warn;

use super::error::ChunkError;

/// Reference sample rate for chunk sizes.
pub const SAMPLE_RATE: usize = 22_050;

/// Default window for [`ChunkedProcessor`]: ten seconds of samples.
pub const DEFAULT_CHUNK_SAMPLES: usize = SAMPLE_RATE * 10;

/// Files below this size get half-size chunks.
pub const SMALL_FILE_BYTES: u64 = 1024 * 1024;

/// Files above this size get double-size chunks.
pub const LARGE_FILE_BYTES: u64 = 50 * 1024 * 1024;

/// Memo entries kept before the memo is reset.
const MEMO_CAPACITY: usize = 128;

/// Kind of processing a chunk size is chosen for.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum OperationType {
    Analysis,
    Separation,
    Visualization,
    /// Any other operation; uses the analysis base
    Other(String),
}

impl OperationType {
    /// Base chunk size in samples.
    pub fn base_chunk_samples(&self) -> usize {
        match self {
            Self::Analysis => SAMPLE_RATE * 10,
            Self::Separation => SAMPLE_RATE * 30,
            Self::Visualization => SAMPLE_RATE * 5,
            Self::Other(_) => SAMPLE_RATE * 10,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Analysis => "analysis",
            Self::Separation => "separation",
            Self::Visualization => "visualization",
            Self::Other(name) => name,
        }
    }
}

impl From<&str> for OperationType {
    fn from(name: &str) -> Self {
        match name {
            "analysis" => Self::Analysis,
            "separation" => Self::Separation,
            "visualization" => Self::Visualization,
            other => Self::Other(other.to_string()),
        }
    }
}

impl FromStr for OperationType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from(s))
    }
}

impl fmt::Display for OperationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Chunk size in samples for a file of the given size.
///
/// Halved below 1 MiB, doubled above 50 MiB, base size otherwise.
pub fn optimal_chunk_size(file_size_bytes: u64, operation: &OperationType) -> usize {
    let base = operation.base_chunk_samples();
    if file_size_bytes < SMALL_FILE_BYTES {
        base / 2
    } else if file_size_bytes > LARGE_FILE_BYTES {
        base * 2
    } else {
        base
    }
}

/// Memoized [`optimal_chunk_size`] keyed by (file size, operation type).
#[derive(Debug, Default)]
pub struct ChunkSizeMemo {
    sizes: DashMap<(u64, OperationType), usize>,
}

impl ChunkSizeMemo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, file_size_bytes: u64, operation: OperationType) -> usize {
        let key = (file_size_bytes, operation);
        if let Some(size) = self.sizes.get(&key) {
            return *size;
        }

        let size = optimal_chunk_size(key.0, &key.1);
        if self.sizes.len() >= MEMO_CAPACITY {
            self.sizes.clear();
        }
        self.sizes.insert(key, size);
        size
    }

    /// Number of memoized entries.
    pub fn len(&self) -> usize {
        self.sizes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sizes.is_empty()
    }
}

/// Lazy iterator applying a function to overlapping windows of a slice.
///
/// Windows start at 0 and advance by `chunk_size - overlap`; the last one
/// may be shorter. A window whose function returns `Err` is logged and
/// skipped. Call [`restart`](Self::restart) or clone the iterator to run the
/// pass again.
pub struct ChunkedProcessor<'a, T, F> {
    data: &'a [T],
    process: F,
    chunk_size: usize,
    step: usize,
    position: usize,
}

impl<'a, T, F> ChunkedProcessor<'a, T, F> {
    /// Build a processor.
    ///
    /// `chunk_size` defaults to `min(data.len(), 220_500)`. Rejects a zero
    /// chunk size and an overlap that would stop the window from advancing.
    pub fn new(
        data: &'a [T],
        process: F,
        chunk_size: Option<usize>,
        overlap: usize,
    ) -> Result<Self, ChunkError> {
        let chunk_size = match chunk_size {
            Some(0) => return Err(ChunkError::ZeroChunkSize),
            Some(size) => size,
            None => data.len().min(DEFAULT_CHUNK_SAMPLES).max(1),
        };
        if overlap >= chunk_size {
            return Err(ChunkError::OverlapTooLarge {
                chunk_size,
                overlap,
            });
        }

        Ok(Self {
            data,
            process,
            chunk_size,
            step: chunk_size - overlap,
            position: 0,
        })
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Distance between consecutive window starts.
    pub fn step(&self) -> usize {
        self.step
    }

    /// Rewind to the first window.
    pub fn restart(&mut self) {
        self.position = 0;
    }
}

impl<T, F: Clone> Clone for ChunkedProcessor<'_, T, F> {
    fn clone(&self) -> Self {
        Self {
            data: self.data,
            process: self.process.clone(),
            chunk_size: self.chunk_size,
            step: self.step,
            position: self.position,
        }
    }
}

impl<'a, T, R, E, F> Iterator for ChunkedProcessor<'a, T, F>
where
    F: FnMut(&'a [T]) -> Result<R, E>,
    E: fmt::Display,
{
    type Item = R;

    fn next(&mut self) -> Option<R> {
        while self.position < self.data.len() {
            let start = self.position;
            let end = (start + self.chunk_size).min(self.data.len());
            self.position += self.step;

            match (self.process)(&self.data[start..end]) {
                Ok(result) => return Some(result),
                Err(e) => {
                    warn!(start, end, error = %e, "Chunk processing failed, skipping");
                }
            }
        }
        None
    }
}

/// Split items into consecutive batches of `batch_size` (minimum 1).
pub fn batch_process<T>(items: Vec<T>, batch_size: usize) -> Vec<Vec<T>> {
    let batch_size = batch_size.max(1);
    let mut batches = Vec::with_capacity(items.len().div_ceil(batch_size));
    let mut items = items.into_iter().peekable();

    while items.peek().is_some() {
        batches.push(items.by_ref().take(batch_size).collect());
    }
    batches
}
