//! Performance statistics snapshot.

use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Duration;

use crate::cache::CacheStats;

/// Aggregated timing for one operation name, in seconds.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OperationTiming {
    pub avg_time: f64,
    pub min_time: f64,
    pub max_time: f64,
    pub total_runs: usize,
}

impl OperationTiming {
    /// Aggregate samples. Returns `None` for an empty slice.
    pub fn from_samples(samples: &[Duration]) -> Option<Self> {
        let first = samples.first()?.as_secs_f64();

        let (sum, min, max) = samples.iter().map(Duration::as_secs_f64).fold(
            (0.0_f64, first, first),
            |(sum, min, max), secs| (sum + secs, min.min(secs), max.max(secs)),
        );

        Some(Self {
            avg_time: sum / samples.len() as f64,
            min_time: min,
            max_time: max,
            total_runs: samples.len(),
        })
    }
}

/// Point-in-time view of a coordinator's configuration and metrics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PerformanceStats {
    /// Worker pool size
    pub worker_count: usize,
    pub cache_enabled: bool,
    /// hits / (hits + misses), zero before the first lookup
    pub cache_hit_rate: f64,
    pub operation_performance: BTreeMap<String, OperationTiming>,
    /// Present when caching is enabled
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_stats: Option<CacheStats>,
}
