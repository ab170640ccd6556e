//! Error types for the task coordinator.

use thiserror::Error;

use crate::cache::CacheError;

/// Failure of a coordinated operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OperationError {
    /// The operation itself reported a failure
    #[error("{0}")]
    Failed(String),

    /// A blocking operation panicked on its worker thread
    #[error("operation panicked: {0}")]
    Panicked(String),

    /// The worker pool could not accept the operation
    #[error("worker pool unavailable")]
    WorkerUnavailable,
}

impl OperationError {
    /// Shorthand for [`OperationError::Failed`].
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }
}

/// Errors constructing a [`TaskCoordinator`](super::TaskCoordinator).
#[derive(Debug, Error)]
pub enum CoordinatorError {
    /// The result cache could not be created
    #[error("Failed to create result cache: {0}")]
    Cache(#[from] CacheError),

    /// Invalid coordinator configuration
    #[error("Invalid coordinator configuration: {0}")]
    InvalidConfig(String),
}

/// Invalid arguments to chunked processing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChunkError {
    #[error("chunk size must be greater than zero")]
    ZeroChunkSize,

    #[error("overlap {overlap} must be smaller than chunk size {chunk_size}")]
    OverlapTooLarge { chunk_size: usize, overlap: usize },
}
