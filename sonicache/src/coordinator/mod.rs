//! Task coordination for audio processing operations.
//!
//! The [`TaskCoordinator`] sits between callers and collaborator operations
//! (feature extraction, separation, classification, rendering):
//!
//! - async operations are awaited on the calling task
//! - blocking operations run on a bounded [`WorkerPool`]
//! - results flow through an optional [`ResultCache`](crate::cache::ResultCache)
//! - every call is timed in a [`PerformanceLedger`]
//!
//! There is no timeout or cancellation token; wrap calls in
//! `tokio::time::timeout` where a bound is needed. A blocking operation
//! that never returns keeps its worker slot.
//!
//! # Example
//!
//! ```no_run
//! use sonicache::cache::Params;
//! use sonicache::coordinator::{CoordinatorConfig, Operation, TaskCoordinator};
//! use serde_json::json;
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let coordinator = TaskCoordinator::new(CoordinatorConfig::default())?;
//! let params = Params::new().with("sr", 22050);
//!
//! let _tempo = coordinator
//!     .run_with_cache(
//!         "analysis",
//!         Operation::blocking(|| Ok(json!({"tempo": 120}))),
//!         "track.wav",
//!         &params,
//!     )
//!     .await?;
//! # Ok(())
//! # }
//! ```

mod cached;
pub mod chunking;
mod config;
mod engine;
mod error;
mod ledger;
mod operation;
mod pool;
mod stats;

pub use cached::CachedOperation;
pub use chunking::{
    batch_process, optimal_chunk_size, ChunkSizeMemo, ChunkedProcessor, OperationType,
    DEFAULT_CHUNK_SAMPLES, SAMPLE_RATE,
};
pub use config::CoordinatorConfig;
pub use engine::TaskCoordinator;
pub use error::{ChunkError, CoordinatorError, OperationError};
pub use ledger::PerformanceLedger;
pub use operation::{
    error_result, is_error_result, Operation, OperationOutput, ParallelTask, ERROR_KEY,
};
pub use pool::{default_worker_count, num_cpus, WorkerPool};
pub use stats::{OperationTiming, PerformanceStats};
