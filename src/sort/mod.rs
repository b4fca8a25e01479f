//! In-place pattern-defeating quicksort over the nodes of an [`XList`].
//!
//! The algorithm follows [pdqsort] by Orson Peters, with every array primitive replaced by a
//! pointer walk:
//!
//! - positions are [`Cursor`]s carrying their offset from the low end of a span, so distances are
//!   O(1) once a position has been reached,
//! - elements move by exchanging the payload boxes of two nodes, links are never touched,
//! - heapsort, the only part that really needs random access, works on a temporary buffer of node
//!   pointers.
//!
//! The shorter side of every partition may be sorted on another thread. Spans handed to different
//! workers never overlap, so the workers need no synchronization beyond a counter that bounds
//! their number. The list's write lock is held for the whole call.
//!
//! [pdqsort]: https://github.com/orlp/pdqsort

mod config;
mod driver;
mod fallback;
mod kernel;
mod scheduler;

use core::ptr::NonNull;
use std::thread;

use tracing::debug;

use crate::list::XList;
use crate::node::{Cursor, Link, Node};

pub use config::{SortConfig, DEFAULT_PARALLEL_THRESHOLD, WORKERS_ENV};
use scheduler::{Context, Inline, Scheduler};

/// Counters collected during one sort call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SortStats {
    /// Number of payload exchanges between two distinct nodes.
    pub exchanges: usize,
    /// Number of worker threads spawned.
    pub workers_spawned: usize,
    /// Number of spans that exhausted their depth budget and were heapsorted.
    pub heapsort_fallbacks: usize,
    /// Number of spans split into a run equal to the pivot and the rest, which happens when a
    /// span holds many duplicates.
    pub equal_partitions: usize,
}

/// A contiguous run of `len` nodes from `lo` to `hi`, both inclusive.
pub(crate) struct Span<T> {
    pub(crate) lo: NonNull<Node<T>>,
    pub(crate) hi: NonNull<Node<T>>,
    pub(crate) len: usize,
}

impl<T> Clone for Span<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Span<T> {}

// SAFETY: A span is handed to exactly one worker at a time, and spans of concurrently running
// workers are disjoint. The worker moves payloads between its nodes (`T: Send`) and may read the
// final payload in front of its span while another worker reads it too (`T: Sync`).
unsafe impl<T: Send + Sync> Send for Span<T> {}

impl<T> Span<T> {
    /// Panics if a bound is missing, which can only be caused by broken range bookkeeping.
    #[inline]
    pub(crate) fn new(lo: Link<T>, hi: Link<T>, len: usize) -> Self {
        match (lo, hi) {
            (Some(lo), Some(hi)) if len > 0 => Self { lo, hi, len },
            _ => panic!("span of length {len} without both bounds"),
        }
    }

    #[inline(always)]
    pub(crate) fn low(&self) -> Cursor<T> {
        Cursor::new(self.lo, 0)
    }

    #[inline(always)]
    pub(crate) fn high(&self) -> Cursor<T> {
        Cursor::new(self.hi, self.len - 1)
    }
}

impl<T: Ord + Send + Sync> XList<T> {
    /// Sorts the list in ascending order.
    ///
    /// See [`XList::sort_by`].
    pub fn sort(&self) {
        self.sort_by(|a, b| a.lt(b));
    }
}

impl<T: Send + Sync> XList<T> {
    /// Sorts the list with a comparator function, but might not preserve the order of equal
    /// elements.
    ///
    /// `is_less(a, b)` must return `true` exactly when `a` has to be placed before `b`. If it
    /// doesn't implement a strict weak ordering the resulting order is unspecified, but all
    /// elements remain in the list.
    ///
    /// This sort is in-place: it exchanges the payloads of the existing nodes and allocates
    /// nothing except a temporary node buffer in the rare heapsort fallback. It is *O*(*n* \*
    /// log(*n*)) worst-case and uses up to [`SortConfig::max_workers`] extra threads.
    ///
    /// Workers read and move elements and call `is_less` from several threads, hence the `Send +
    /// Sync` bounds on `T` and `Sync` on `is_less`. Use [`XList::sort_by_sequential`] for types
    /// like `Rc` or comparators with interior mutability.
    ///
    /// Marks are attached to positions, not to values, they don't move with the elements.
    ///
    /// # Panics
    ///
    /// If `is_less` panics on any worker, the panic is resumed on the calling thread once all
    /// workers have stopped. The lock is released and the list still holds all of its elements,
    /// in an unspecified order.
    pub fn sort_by<F>(&self, is_less: F)
    where
        F: Fn(&T, &T) -> bool + Sync,
    {
        self.sort_by_with(&SortConfig::default(), is_less);
    }

    /// Same as [`XList::sort_by`] with an explicit configuration. Returns what the sort did.
    ///
    /// With [`SortConfig::sequential`] this runs exactly like [`XList::sort_by_sequential`].
    pub fn sort_by_with<F>(&self, config: &SortConfig, is_less: F) -> SortStats
    where
        F: Fn(&T, &T) -> bool + Sync,
    {
        if config.max_workers() == 0 {
            return self.sort_on(config, |scheduler, span, limit| {
                driver::quicksort(Inline { scheduler, is_less: &is_less }, span, limit)
            });
        }

        self.sort_on(config, |scheduler, span, limit| {
            thread::scope(|scope| {
                let ctx = Context {
                    scope,
                    scheduler,
                    is_less: &is_less,
                };
                scheduler.catch_panic(|| driver::quicksort(ctx, span, limit));
            });

            // All workers are joined at this point.
            scheduler.resume_panic();
        })
    }
}

impl<T> XList<T> {
    /// Sorts the list on the calling thread, see [`XList::sort_by`].
    ///
    /// Neither the elements nor `is_less` have to be shareable between threads. A panic in
    /// `is_less` unwinds straight through, the list keeps all of its elements.
    pub fn sort_by_sequential<F>(&self, is_less: F) -> SortStats
    where
        F: Fn(&T, &T) -> bool,
    {
        self.sort_on(&SortConfig::sequential(), |scheduler, span, limit| {
            driver::quicksort(Inline { scheduler, is_less: &is_less }, span, limit)
        })
    }

    /// Takes the write lock and runs `run` on the whole list, unless it is trivially sorted.
    fn sort_on(
        &self,
        config: &SortConfig,
        run: impl FnOnce(&Scheduler, Span<T>, u32),
    ) -> SortStats {
        let chain = self.chain.write();

        // Lists of length 0 or 1 are always sorted.
        let len = chain.len();
        if len < 2 {
            return SortStats::default();
        }

        let span = Span::new(chain.head(), chain.tail(), len);
        let limit = usize::BITS - len.leading_zeros();
        let scheduler = Scheduler::new(config);

        debug!(
            len,
            max_workers = config.max_workers(),
            parallel_threshold = config.parallel_threshold(),
            "sorting list"
        );

        run(&scheduler, span, limit);

        let stats = scheduler.stats();
        debug!(?stats, "list sorted");
        drop(chain);

        stats
    }
}
