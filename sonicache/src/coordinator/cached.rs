//! Named, reusable handle for running one kind of operation.

use std::path::Path;
use std::sync::Arc;

use crate::cache::Params;

use super::engine::TaskCoordinator;
use super::operation::{Operation, OperationOutput};

/// Binds an operation name to an injected coordinator.
///
/// Collaborators hold one of these per capability (e.g. "analysis") and
/// call it instead of reaching for a shared global coordinator.
#[derive(Debug, Clone)]
pub struct CachedOperation {
    name: String,
    coordinator: Arc<TaskCoordinator>,
    use_cache: bool,
}

impl CachedOperation {
    pub fn new(name: impl Into<String>, coordinator: Arc<TaskCoordinator>) -> Self {
        Self {
            name: name.into(),
            coordinator,
            use_cache: true,
        }
    }

    /// Bypass the cache and timing; the operation always runs.
    pub fn without_cache(mut self) -> Self {
        self.use_cache = false;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn coordinator(&self) -> &Arc<TaskCoordinator> {
        &self.coordinator
    }

    /// Run the operation for a file.
    pub async fn call(
        &self,
        file_path: impl AsRef<Path>,
        params: &Params,
        operation: Operation,
    ) -> OperationOutput {
        if self.use_cache {
            self.coordinator
                .run_with_cache(&self.name, operation, file_path, params)
                .await
        } else {
            self.coordinator.execute(operation).await
        }
    }
}
