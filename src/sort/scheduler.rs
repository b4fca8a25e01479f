//! Bounded fan-out of sort workers.
//!
//! Workers are scoped threads, the top-level sort call joins all of them before it releases the
//! list lock. The only state they share is the active worker counter, a few statistics counters
//! and the slot for the first panic.
//!
//! The driver only sees the [`Dispatch`] trait. [`Context`] may fork onto other threads, [`Inline`]
//! never does and therefore needs neither `Send` nor `Sync`.

use core::any::Any;
use core::sync::atomic::{AtomicUsize, Ordering};
use std::panic::{self, AssertUnwindSafe};
use std::thread::{self, Scope};

use parking_lot::Mutex;
use tracing::{trace, warn};

use crate::sort::config::SortConfig;
use crate::sort::driver::quicksort;
use crate::sort::{SortStats, Span};

pub(crate) struct Scheduler {
    active: AtomicUsize,
    max_workers: usize,
    parallel_threshold: usize,

    spawned: AtomicUsize,
    exchanges: AtomicUsize,
    heapsorts: AtomicUsize,
    equal_partitions: AtomicUsize,

    panic: Mutex<Option<Box<dyn Any + Send + 'static>>>,
}

impl Scheduler {
    pub(crate) fn new(config: &SortConfig) -> Self {
        Self {
            active: AtomicUsize::new(0),
            max_workers: config.max_workers(),
            parallel_threshold: config.parallel_threshold(),
            spawned: AtomicUsize::new(0),
            exchanges: AtomicUsize::new(0),
            heapsorts: AtomicUsize::new(0),
            equal_partitions: AtomicUsize::new(0),
            panic: Mutex::new(None),
        }
    }

    /// Reserves a worker slot for a span of `len` elements, if that is worth it and the cap
    /// allows it.
    fn try_acquire(&self, len: usize) -> Option<WorkerSlot<'_>> {
        if len < self.parallel_threshold || self.active.load(Ordering::Relaxed) >= self.max_workers
        {
            return None;
        }

        if self.active.fetch_add(1, Ordering::AcqRel) < self.max_workers {
            return Some(WorkerSlot {
                active: &self.active,
            });
        }

        // Lost the race for the last slot, undo the increment.
        self.active.fetch_sub(1, Ordering::AcqRel);
        trace!(len, "worker cap reached, sorting span inline");
        None
    }

    fn record_spawn(&self) {
        self.spawned.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_exchanges(&self, exchanges: usize) {
        self.exchanges.fetch_add(exchanges, Ordering::Relaxed);
    }

    pub(crate) fn record_heapsort(&self) {
        self.heapsorts.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_equal_partition(&self) {
        self.equal_partitions.fetch_add(1, Ordering::Relaxed);
    }

    /// Runs `f`, keeping the payload of the first panic of any worker.
    pub(crate) fn catch_panic(&self, f: impl FnOnce()) {
        if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(f)) {
            let mut slot = self.panic.lock();
            if slot.is_none() {
                *slot = Some(payload);
            }
        }
    }

    /// Re-raises the first panic of any worker on the current thread.
    pub(crate) fn resume_panic(&self) {
        if let Some(payload) = self.panic.lock().take() {
            panic::resume_unwind(payload);
        }
    }

    pub(crate) fn stats(&self) -> SortStats {
        SortStats {
            exchanges: self.exchanges.load(Ordering::Relaxed),
            workers_spawned: self.spawned.load(Ordering::Relaxed),
            heapsort_fallbacks: self.heapsorts.load(Ordering::Relaxed),
            equal_partitions: self.equal_partitions.load(Ordering::Relaxed),
        }
    }
}

/// An occupied worker slot, released on drop so unwinding workers give it back as well.
struct WorkerSlot<'a> {
    active: &'a AtomicUsize,
}

impl Drop for WorkerSlot<'_> {
    fn drop(&mut self) {
        self.active.fetch_sub(1, Ordering::AcqRel);
    }
}

/// How the driver hands off the shorter side of a partition.
pub(crate) trait Dispatch<T>: Copy {
    type Less: Fn(&T, &T) -> bool;

    fn is_less(&self) -> &Self::Less;

    fn scheduler(&self) -> &Scheduler;

    /// Sorts `span`, now or on another thread before the sort call returns.
    fn dispatch(self, span: Span<T>, limit: u32);
}

/// Everything a worker needs, shared by all workers of one sort call.
pub(crate) struct Context<'scope, 'env, F> {
    pub(crate) scope: &'scope Scope<'scope, 'env>,
    pub(crate) scheduler: &'env Scheduler,
    pub(crate) is_less: &'env F,
}

impl<F> Clone for Context<'_, '_, F> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<F> Copy for Context<'_, '_, F> {}

impl<'scope, 'env, T, F> Dispatch<T> for Context<'scope, 'env, F>
where
    T: Send + Sync + 'env,
    F: Fn(&T, &T) -> bool + Sync + 'env,
{
    type Less = F;

    fn is_less(&self) -> &F {
        self.is_less
    }

    fn scheduler(&self) -> &Scheduler {
        self.scheduler
    }

    /// Sorts `span` on a new worker if it is long enough and a slot is free, inline otherwise.
    fn dispatch(self, span: Span<T>, limit: u32) {
        if let Some(slot) = self.scheduler.try_acquire(span.len) {
            trace!(len = span.len, "spawning sort worker");
            let spawned = thread::Builder::new()
                .name("xlist-sort".into())
                .spawn_scoped(self.scope, move || {
                    let _slot = slot;
                    self.scheduler.catch_panic(|| quicksort(self, span, limit));
                });

            match spawned {
                Ok(_) => {
                    self.scheduler.record_spawn();
                    return;
                }
                // The closure and with it the slot are gone, the span is sorted below.
                Err(err) => warn!(%err, len = span.len, "failed to spawn sort worker"),
            }
        }

        quicksort(self, span, limit);
    }
}

/// Sorts every span on the calling thread.
pub(crate) struct Inline<'a, F> {
    pub(crate) scheduler: &'a Scheduler,
    pub(crate) is_less: &'a F,
}

impl<F> Clone for Inline<'_, F> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<F> Copy for Inline<'_, F> {}

impl<T, F> Dispatch<T> for Inline<'_, F>
where
    F: Fn(&T, &T) -> bool,
{
    type Less = F;

    fn is_less(&self) -> &F {
        self.is_less
    }

    fn scheduler(&self) -> &Scheduler {
        self.scheduler
    }

    fn dispatch(self, span: Span<T>, limit: u32) {
        quicksort(self, span, limit);
    }
}
