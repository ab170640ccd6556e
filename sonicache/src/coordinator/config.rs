//! Coordinator configuration.

use crate::cache::ResultCacheConfig;

use super::pool::default_worker_count;

/// Configuration for a [`TaskCoordinator`](super::TaskCoordinator).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoordinatorConfig {
    /// Worker pool size; `None` selects `min(4, num_cpus + 1)`
    pub max_workers: Option<usize>,
    /// Whether results are cached
    pub enable_cache: bool,
    /// Cache settings, used when caching is enabled
    pub cache: ResultCacheConfig,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            max_workers: None,
            enable_cache: true,
            cache: ResultCacheConfig::default(),
        }
    }
}

impl CoordinatorConfig {
    pub fn with_max_workers(mut self, workers: usize) -> Self {
        self.max_workers = Some(workers);
        self
    }

    pub fn with_cache_enabled(mut self, enabled: bool) -> Self {
        self.enable_cache = enabled;
        self
    }

    pub fn with_cache_config(mut self, cache: ResultCacheConfig) -> Self {
        self.cache = cache;
        self
    }

    /// Worker count after applying the default.
    pub fn worker_count(&self) -> usize {
        self.max_workers.unwrap_or_else(default_worker_count)
    }
}
