//! Per-operation timing samples and cache hit/miss counters.

use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap};
use std::time::{Duration, Instant};

use super::stats::OperationTiming;

/// Metrics collected by a [`TaskCoordinator`](super::TaskCoordinator).
#[derive(Debug, Default)]
pub struct PerformanceLedger {
    timings: HashMap<String, Vec<Duration>>,
    cache_hits: u64,
    cache_misses: u64,
}

impl PerformanceLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an elapsed-time sample for an operation.
    pub fn record_timing(&mut self, operation: &str, elapsed: Duration) {
        self.timings
            .entry(operation.to_string())
            .or_default()
            .push(elapsed);
    }

    pub fn record_hit(&mut self) {
        self.cache_hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.cache_misses += 1;
    }

    pub fn cache_hits(&self) -> u64 {
        self.cache_hits
    }

    pub fn cache_misses(&self) -> u64 {
        self.cache_misses
    }

    /// Cache hit rate (0.0 to 1.0), zero before any lookup.
    pub fn hit_rate(&self) -> f64 {
        let total = self.cache_hits + self.cache_misses;
        if total == 0 {
            0.0
        } else {
            self.cache_hits as f64 / total as f64
        }
    }

    /// Aggregate timings per operation, sorted by name.
    pub fn summary(&self) -> BTreeMap<String, OperationTiming> {
        self.timings
            .iter()
            .filter_map(|(name, samples)| {
                OperationTiming::from_samples(samples).map(|timing| (name.clone(), timing))
            })
            .collect()
    }

    /// Reset hit/miss counters. Timing samples are kept.
    pub fn reset_counters(&mut self) {
        self.cache_hits = 0;
        self.cache_misses = 0;
    }
}

/// Records elapsed time for an operation when dropped.
///
/// Dropping happens on every exit path, including early returns, errors,
/// panics and cancellation of the enclosing future.
pub(crate) struct TimingGuard<'a> {
    ledger: &'a Mutex<PerformanceLedger>,
    operation: &'a str,
    started: Instant,
}

impl<'a> TimingGuard<'a> {
    pub(crate) fn start(ledger: &'a Mutex<PerformanceLedger>, operation: &'a str) -> Self {
        Self {
            ledger,
            operation,
            started: Instant::now(),
        }
    }
}

impl Drop for TimingGuard<'_> {
    fn drop(&mut self) {
        let elapsed = self.started.elapsed();
        self.ledger.lock().record_timing(self.operation, elapsed);
    }
}
