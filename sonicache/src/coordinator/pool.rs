//! Bounded pool for blocking operations.
//!
//! Blocking collaborator calls (DSP, model inference) run on Tokio's
//! blocking threads, gated by a semaphore so that at most `size` of them
//! execute at once. Callers beyond that wait for a permit without holding a
//! thread.
//!
//! The permit moves into the blocking closure, so capacity is only released
//! once the work has really finished, even if the awaiting caller is dropped
//! first.

use std::any::Any;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Semaphore;

use super::error::OperationError;

/// Upper bound on the default pool size.
pub const MAX_DEFAULT_WORKERS: usize = 4;

/// Number of available CPU cores.
pub fn num_cpus() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

/// Default pool size: `min(4, num_cpus + 1)`.
pub fn default_worker_count() -> usize {
    (num_cpus() + 1).min(MAX_DEFAULT_WORKERS)
}

/// Semaphore-gated pool of blocking workers.
#[derive(Debug)]
pub struct WorkerPool {
    semaphore: Arc<Semaphore>,
    size: usize,
    in_flight: Arc<AtomicUsize>,
    peak_in_flight: Arc<AtomicUsize>,
}

impl WorkerPool {
    /// Create a pool running at most `size` operations at once (minimum 1).
    pub fn new(size: usize) -> Self {
        let size = size.max(1);
        Self {
            semaphore: Arc::new(Semaphore::new(size)),
            size,
            in_flight: Arc::new(AtomicUsize::new(0)),
            peak_in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Run a blocking closure on the pool and wait for its result.
    ///
    /// A panic inside the closure is returned as [`OperationError::Panicked`].
    pub async fn run<F, T>(&self, work: F) -> Result<T, OperationError>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        let permit = self
            .semaphore
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| OperationError::WorkerUnavailable)?;

        let guard = InFlightGuard::enter(&self.in_flight, &self.peak_in_flight);

        let handle = tokio::task::spawn_blocking(move || {
            let _permit = permit;
            let _guard = guard;
            work()
        });

        match handle.await {
            Ok(output) => Ok(output),
            Err(e) if e.is_panic() => {
                Err(OperationError::Panicked(panic_message(&*e.into_panic())))
            }
            Err(_) => Err(OperationError::WorkerUnavailable),
        }
    }

    /// Maximum concurrent operations.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Number of free worker slots.
    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }

    /// Operations currently executing.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::Relaxed)
    }

    /// Highest concurrency observed since creation.
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::Relaxed)
    }
}

/// Tracks one executing operation; decrements on drop.
struct InFlightGuard {
    in_flight: Arc<AtomicUsize>,
}

impl InFlightGuard {
    fn enter(in_flight: &Arc<AtomicUsize>, peak: &AtomicUsize) -> Self {
        let current = in_flight.fetch_add(1, Ordering::Relaxed) + 1;
        update_peak(peak, current);
        Self {
            in_flight: Arc::clone(in_flight),
        }
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.in_flight.fetch_sub(1, Ordering::Relaxed);
    }
}

/// Raise the peak counter to `current` if it is higher.
fn update_peak(peak: &AtomicUsize, current: usize) {
    let mut observed = peak.load(Ordering::Relaxed);
    while current > observed {
        match peak.compare_exchange_weak(observed, current, Ordering::Relaxed, Ordering::Relaxed) {
            Ok(_) => break,
            Err(p) => observed = p,
        }
    }
}

/// Best-effort text of a panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
