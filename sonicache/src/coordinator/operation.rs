//! Operations executed by the coordinator.
//!
//! Collaborators hand the coordinator either a future, which is awaited on
//! the calling task, or a blocking closure, which is shipped to the worker
//! pool. Arguments are captured by the closure or future; the coordinator
//! only needs the file path and parameters separately to build cache keys.

use futures::future::BoxFuture;
use serde_json::{json, Value};
use std::fmt;
use std::future::Future;

use super::error::OperationError;

/// Result type returned by every operation.
pub type OperationOutput = Result<Value, OperationError>;

/// Key whose presence in a result object marks it as an error.
pub const ERROR_KEY: &str = "error";

/// A unit of work for the coordinator.
pub enum Operation {
    /// Awaited directly on the calling task
    Async(BoxFuture<'static, OperationOutput>),
    /// Run on the bounded worker pool
    Blocking(Box<dyn FnOnce() -> OperationOutput + Send + 'static>),
}

impl Operation {
    /// Wrap a future.
    pub fn from_future<F>(future: F) -> Self
    where
        F: Future<Output = OperationOutput> + Send + 'static,
    {
        Self::Async(Box::pin(future))
    }

    /// Wrap a blocking closure.
    pub fn blocking<F>(f: F) -> Self
    where
        F: FnOnce() -> OperationOutput + Send + 'static,
    {
        Self::Blocking(Box::new(f))
    }
}

impl fmt::Debug for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Async(_) => f.write_str("Operation::Async"),
            Self::Blocking(_) => f.write_str("Operation::Blocking"),
        }
    }
}

/// Named operation for [`TaskCoordinator::run_parallel`](super::TaskCoordinator::run_parallel).
#[derive(Debug)]
pub struct ParallelTask {
    pub name: String,
    pub operation: Operation,
}

impl ParallelTask {
    pub fn new(name: impl Into<String>, operation: Operation) -> Self {
        Self {
            name: name.into(),
            operation,
        }
    }
}

/// Whether a result carries an embedded error indicator.
///
/// Only JSON objects with an `"error"` key count. Such results are returned
/// to callers but never cached.
pub fn is_error_result(value: &Value) -> bool {
    value
        .as_object()
        .is_some_and(|object| object.contains_key(ERROR_KEY))
}

/// Build an error-shaped result.
pub fn error_result(message: impl Into<String>) -> Value {
    json!({ ERROR_KEY: message.into() })
}
