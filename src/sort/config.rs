//! Tuning knobs of the parallel sort.

use once_cell::sync::Lazy;
use tracing::warn;

/// Overrides the detected worker cap, e.g. `XLIST_SORT_WORKERS=0` sorts on the calling thread
/// only.
pub const WORKERS_ENV: &str = "XLIST_SORT_WORKERS";

/// Minimum span length that is worth handing to another thread. Below this the thread spawn
/// costs more than the sort.
pub const DEFAULT_PARALLEL_THRESHOLD: usize = 2048;

// The calling thread counts as one worker.
static DEFAULT_MAX_WORKERS: Lazy<usize> = Lazy::new(|| {
    if let Ok(raw) = std::env::var(WORKERS_ENV) {
        match raw.trim().parse::<usize>() {
            Ok(workers) => return workers,
            Err(err) => warn!(value = %raw, %err, "ignoring invalid {}", WORKERS_ENV),
        }
    }

    std::thread::available_parallelism()
        .map_or(1, |n| n.get().saturating_sub(1))
        .max(1)
});

/// Configuration of a single sort call.
///
/// `max_workers` bounds the number of *additional* threads that may be active at the same
/// time, `0` disables parallelism altogether. The bound is soft: a dispatch that loses the race
/// for the last slot simply runs on the current thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortConfig {
    max_workers: usize,
    parallel_threshold: usize,
}

impl SortConfig {
    /// Hardware parallelism minus one (at least one), unless overridden through [`WORKERS_ENV`].
    pub fn new() -> Self {
        Self {
            max_workers: *DEFAULT_MAX_WORKERS,
            parallel_threshold: DEFAULT_PARALLEL_THRESHOLD,
        }
    }

    /// Never spawns threads.
    pub fn sequential() -> Self {
        Self::new().with_max_workers(0)
    }

    pub fn with_max_workers(mut self, max_workers: usize) -> Self {
        self.max_workers = max_workers;
        self
    }

    pub fn with_parallel_threshold(mut self, parallel_threshold: usize) -> Self {
        self.parallel_threshold = parallel_threshold;
        self
    }

    pub fn max_workers(&self) -> usize {
        self.max_workers
    }

    pub fn parallel_threshold(&self) -> usize {
        self.parallel_threshold
    }
}

impl Default for SortConfig {
    fn default() -> Self {
        Self::new()
    }
}
