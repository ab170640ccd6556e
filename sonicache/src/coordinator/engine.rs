//! Task coordinator: cached execution, parallel fan-out and metrics.

use futures::future::join_all;
use futures::FutureExt;
use parking_lot::Mutex;
use serde_json::Value;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, error, info};

use crate::cache::{Params, ResultCache};

use super::chunking::{batch_process, ChunkSizeMemo, ChunkedProcessor, OperationType};
use super::config::CoordinatorConfig;
use super::error::{ChunkError, CoordinatorError};
use super::ledger::{PerformanceLedger, TimingGuard};
use super::operation::{error_result, is_error_result, Operation, OperationOutput, ParallelTask};
use super::pool::{panic_message, WorkerPool};
use super::stats::PerformanceStats;

/// Runs collaborator operations with caching, offloading and metrics.
///
/// A coordinator owns its worker pool, ledger and chunk-size memo. The
/// result cache is shared through an `Arc` so several coordinators (or a
/// CLI command) can use the same cache directory.
pub struct TaskCoordinator {
    pool: WorkerPool,
    cache: Option<Arc<ResultCache>>,
    ledger: Mutex<PerformanceLedger>,
    chunk_sizes: ChunkSizeMemo,
}

impl TaskCoordinator {
    /// Create a coordinator and, if enabled, its result cache.
    pub fn new(config: CoordinatorConfig) -> Result<Self, CoordinatorError> {
        if config.max_workers == Some(0) {
            return Err(CoordinatorError::InvalidConfig(
                "max_workers must be greater than zero".to_string(),
            ));
        }

        let cache = if config.enable_cache {
            Some(Arc::new(ResultCache::new(config.cache.clone())?))
        } else {
            None
        };

        Ok(Self::with_cache(config.worker_count(), cache))
    }

    /// Create a coordinator around an existing cache (or none).
    pub fn with_cache(workers: usize, cache: Option<Arc<ResultCache>>) -> Self {
        let pool = WorkerPool::new(workers);
        debug!(
            workers = pool.size(),
            cache_enabled = cache.is_some(),
            "Task coordinator created"
        );

        Self {
            pool,
            cache,
            ledger: Mutex::new(PerformanceLedger::new()),
            chunk_sizes: ChunkSizeMemo::new(),
        }
    }

    pub fn worker_count(&self) -> usize {
        self.pool.size()
    }

    pub fn cache_enabled(&self) -> bool {
        self.cache.is_some()
    }

    pub fn cache(&self) -> Option<&Arc<ResultCache>> {
        self.cache.as_ref()
    }

    pub fn pool(&self) -> &WorkerPool {
        &self.pool
    }

    /// Run an operation, serving and storing its result through the cache.
    ///
    /// On a hit the operation is dropped without running. On a miss it runs
    /// (inline if async, on the worker pool if blocking) and its result is
    /// cached unless it carries an `"error"` key. Elapsed time is recorded
    /// under `operation_name` on every exit path.
    ///
    /// # Errors
    ///
    /// Returns the operation's own error, or [`OperationError::Panicked`]
    /// if a blocking operation panicked.
    ///
    /// [`OperationError::Panicked`]: super::OperationError::Panicked
    pub async fn run_with_cache(
        &self,
        operation_name: &str,
        operation: Operation,
        file_path: impl AsRef<Path>,
        params: &Params,
    ) -> OperationOutput {
        let _timing = TimingGuard::start(&self.ledger, operation_name);
        let path = file_path.as_ref();

        if let Some(cache) = &self.cache {
            if let Some(hit) = cache.get(path, operation_name, params).await {
                self.ledger.lock().record_hit();
                debug!(operation = operation_name, path = %path.display(), "Cache hit");
                return Ok(hit);
            }
            self.ledger.lock().record_miss();
            debug!(operation = operation_name, path = %path.display(), "Cache miss");
        }

        let result = self.execute(operation).await?;

        if let Some(cache) = &self.cache {
            if is_error_result(&result) {
                debug!(
                    operation = operation_name,
                    path = %path.display(),
                    "Not caching error result"
                );
            } else {
                cache
                    .set(path, operation_name, result.clone(), params)
                    .await;
            }
        }

        Ok(result)
    }

    /// Run tasks concurrently, returning results in input order.
    ///
    /// A task that fails or panics yields
    /// `{"error": "Task <name> failed: <reason>"}` in its slot; the others
    /// are unaffected.
    pub async fn run_parallel(&self, tasks: Vec<ParallelTask>) -> Vec<Value> {
        let runs = tasks.into_iter().map(|task| async move {
            let ParallelTask { name, operation } = task;
            let outcome = AssertUnwindSafe(self.execute(operation))
                .catch_unwind()
                .await;

            let reason = match outcome {
                Ok(Ok(value)) => return value,
                Ok(Err(e)) => e.to_string(),
                Err(payload) => panic_message(&*payload),
            };

            error!(task = %name, error = %reason, "Task failed");
            error_result(format!("Task {} failed: {}", name, reason))
        });

        join_all(runs).await
    }

    /// Execute an operation without caching or timing.
    pub(crate) async fn execute(&self, operation: Operation) -> OperationOutput {
        match operation {
            Operation::Async(future) => future.await,
            Operation::Blocking(work) => self.pool.run(work).await?,
        }
    }

    /// Memoized processing chunk size in samples.
    pub fn get_optimal_chunk_size(
        &self,
        file_size_bytes: u64,
        operation_type: impl Into<OperationType>,
    ) -> usize {
        self.chunk_sizes.get(file_size_bytes, operation_type.into())
    }

    /// Lazily apply `process` to overlapping windows of `data`.
    ///
    /// See [`ChunkedProcessor`] for windowing and failure semantics.
    pub fn memory_efficient_processing<'a, T, F>(
        &self,
        data: &'a [T],
        process: F,
        chunk_size: Option<usize>,
        overlap: usize,
    ) -> Result<ChunkedProcessor<'a, T, F>, ChunkError> {
        ChunkedProcessor::new(data, process, chunk_size, overlap)
    }

    /// Split items into batches of `batch_size`.
    pub fn batch_process<T>(&self, items: Vec<T>, batch_size: usize) -> Vec<Vec<T>> {
        batch_process(items, batch_size)
    }

    /// Snapshot of configuration, hit rate and per-operation timings.
    pub async fn get_performance_stats(&self) -> PerformanceStats {
        let (cache_hit_rate, operation_performance) = {
            let ledger = self.ledger.lock();
            (ledger.hit_rate(), ledger.summary())
        };

        let cache_stats = match &self.cache {
            Some(cache) => Some(cache.stats().await),
            None => None,
        };

        PerformanceStats {
            worker_count: self.pool.size(),
            cache_enabled: self.cache.is_some(),
            cache_hit_rate,
            operation_performance,
            cache_stats,
        }
    }

    /// Clear the cache and reset hit/miss counters.
    pub async fn clear_cache(&self) {
        if let Some(cache) = &self.cache {
            cache.clear().await;
        }
        self.ledger.lock().reset_counters();
        info!("Coordinator cache and counters cleared");
    }
}

impl fmt::Debug for TaskCoordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskCoordinator")
            .field("workers", &self.pool.size())
            .field("cache_enabled", &self.cache.is_some())
            .finish()
    }
}
