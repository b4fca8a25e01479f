//! Partitioning kernel: the array primitives of pdqsort rebuilt as pointer walks.
//!
//! Nothing in here can index. Every position is a [`Cursor`] that carries its offset from the low
//! end of the span, so distances and crossing checks are O(1) and only the initial walk to a
//! position costs O(n).

use core::marker::PhantomData;
use core::mem;
use core::ptr::NonNull;

use crate::node::{self, Cursor, Node};
use crate::sort::Span;

/// Hint for the driver about the shape of the span, derived from the pivot selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SortedHint {
    Unknown,
    Increasing,
    Decreasing,
}

/// Per-worker view of the comparison function, plus the number of payload exchanges it did.
///
/// Every method only touches nodes of the span it is handed. The single exception is the read
/// of the ancestor pivot in front of a span, whose payload is final and never exchanged again.
pub(crate) struct Sorter<'a, T, F> {
    is_less: &'a F,
    pub(crate) exchanges: usize,
    _marker: PhantomData<fn(&T)>,
}

impl<'a, T, F> Sorter<'a, T, F>
where
    F: Fn(&T, &T) -> bool,
{
    pub(crate) fn new(is_less: &'a F) -> Self {
        Self {
            is_less,
            exchanges: 0,
            _marker: PhantomData,
        }
    }

    #[inline(always)]
    pub(crate) fn less(&self, a: NonNull<Node<T>>, b: NonNull<Node<T>>) -> bool {
        // SAFETY: Both nodes are live for the whole sort, and neither payload is exchanged by
        // another worker, see the type level docs.
        unsafe { (self.is_less)(node::payload(a), node::payload(b)) }
    }

    #[inline(always)]
    pub(crate) fn exchange(&mut self, a: NonNull<Node<T>>, b: NonNull<Node<T>>) {
        if a == b {
            return;
        }
        // SAFETY: Both nodes are part of the span owned by this worker.
        unsafe { node::exchange(a, b) };
        self.exchanges += 1;
    }

    /// Selects a pivot and guesses whether the span is already sorted.
    ///
    /// Samples the elements at n/4, n/2 and 3n/4. Spans of at least 8 elements use the median of
    /// the three, spans of at least 50 elements first replace every sample by the median of
    /// itself and its two neighbours (ninther). No reordering of the samples hints at an
    /// ascending span, the maximum amount of reordering at a descending one.
    #[cfg_attr(feature = "no_inline_sub_functions", inline(never))]
    pub(crate) fn choose_pivot(&self, span: Span<T>) -> (Cursor<T>, SortedHint) {
        const SHORTEST_NINTHER: usize = 50;
        const MAX_SWAPS: usize = 4 * 3;

        let len = span.len;
        let mut swaps = 0;

        // SAFETY: All offsets are below `len`, the walks stay inside the span. The ninther is only
        // taken for `len >= 50`, which keeps the neighbours of every sample inside as well.
        unsafe {
            let mut a = span.low().advance(len / 4);
            let mut b = a.advance(len / 4 * 2 - a.offset);
            let mut c = b.advance(len / 4 * 3 - b.offset);

            if len >= 8 {
                if len >= SHORTEST_NINTHER {
                    a = self.median_adjacent(a, &mut swaps);
                    b = self.median_adjacent(b, &mut swaps);
                    c = self.median_adjacent(c, &mut swaps);
                }
                b = self.median3(a, b, c, &mut swaps);
            }

            let hint = match swaps {
                0 => SortedHint::Increasing,
                MAX_SWAPS => SortedHint::Decreasing,
                _ => SortedHint::Unknown,
            };

            (b, hint)
        }
    }

    /// Orders `a` and `b` so that `*b` is not less than `*a`, counting the reorder.
    #[inline(always)]
    fn sort2(&self, a: &mut Cursor<T>, b: &mut Cursor<T>, swaps: &mut usize) {
        if self.less(b.node, a.node) {
            mem::swap(a, b);
            *swaps += 1;
        }
    }

    /// Returns the median of 3 cursors.
    #[inline(always)]
    fn median3(
        &self,
        mut a: Cursor<T>,
        mut b: Cursor<T>,
        mut c: Cursor<T>,
        swaps: &mut usize,
    ) -> Cursor<T> {
        self.sort2(&mut a, &mut b, swaps);
        self.sort2(&mut b, &mut c, swaps);
        self.sort2(&mut a, &mut b, swaps);
        b
    }

    /// Returns the median of `a` and its two neighbours.
    ///
    /// SAFETY: `a` must have a neighbour on both sides inside the span.
    #[inline(always)]
    unsafe fn median_adjacent(&self, a: Cursor<T>, swaps: &mut usize) -> Cursor<T> {
        // SAFETY: See function safety.
        unsafe { self.median3(a.back(), a, a.forward(), swaps) }
    }

    /// Partitions `span` around `pivot`.
    ///
    /// Returns the final position of the pivot. All elements before it compare less than the
    /// pivot and all elements after it do not. The bool is `true` when no element had to move
    /// apart from the pivot itself.
    #[cfg_attr(feature = "no_inline_sub_functions", inline(never))]
    pub(crate) fn partition(&mut self, span: Span<T>, pivot: Cursor<T>) -> (Cursor<T>, bool) {
        // Place the pivot at the beginning of the span.
        self.exchange(span.lo, pivot.node);
        let pivot = span.lo;

        // SAFETY: `i` and `j` are only dereferenced while `1 <= i.offset <= j.offset < len`, the
        // backward walk never passes offset 0.
        unsafe {
            let mut i = span.low().forward();
            let mut j = span.high();
            let mut was_partitioned = true;

            loop {
                while i.offset <= j.offset && self.less(i.node, pivot) {
                    i.step_forward();
                }
                while j.offset > 0 && !self.less(j.node, pivot) {
                    j.step_back();
                }
                if i.offset > j.offset {
                    break;
                }

                self.exchange(i.node, j.node);
                was_partitioned = false;
                i.step_forward();
                j.step_back();
            }

            // Place the pivot between the two partitions.
            self.exchange(j.node, pivot);
            (j, was_partitioned)
        }
    }

    /// Moves every element equal to `pivot` to the front of `span`.
    ///
    /// Only valid when no element of the span is less than the pivot, which the driver
    /// establishes by comparing with the ancestor pivot in front of the span. Returns the
    /// remainder of elements greater than the pivot, `None` when all of them were equal.
    #[cfg_attr(feature = "no_inline_sub_functions", inline(never))]
    pub(crate) fn partition_equal(&mut self, span: Span<T>, pivot: Cursor<T>) -> Option<Span<T>> {
        self.exchange(span.lo, pivot.node);
        let pivot = span.lo;

        // SAFETY: See `partition`, the same offset bounds guard every dereference.
        unsafe {
            let mut i = span.low().forward();
            let mut j = span.high();

            loop {
                while i.offset <= j.offset && !self.less(pivot, i.node) {
                    i.step_forward();
                }
                while j.offset > 0 && self.less(pivot, j.node) {
                    j.step_back();
                }
                if i.offset > j.offset {
                    break;
                }

                self.exchange(i.node, j.node);
                i.step_forward();
                j.step_back();
            }

            if i.offset >= span.len {
                return None;
            }

            Some(Span {
                lo: i.node,
                hi: span.hi,
                len: span.len - i.offset,
            })
        }
    }

    /// Reverses `span` by exchanging payloads from both ends inward.
    #[cfg_attr(feature = "no_inline_sub_functions", inline(never))]
    pub(crate) fn reverse(&mut self, span: Span<T>) {
        let mut i = span.low();
        let mut j = span.high();

        while i.offset < j.offset {
            self.exchange(i.node, j.node);
            // SAFETY: `i.offset < j.offset` keeps both cursors inside the span.
            unsafe {
                i.step_forward();
                j.step_back();
            }
        }
    }

    /// Scatters the elements at the quarter, half and three-quarter positions to pseudo-random
    /// places, in order to break patterns that cause imbalanced partitions.
    #[cfg_attr(feature = "no_inline_sub_functions", inline(never))]
    pub(crate) fn break_patterns(&mut self, span: Span<T>) {
        let len = span.len;
        if len < 8 {
            return;
        }

        let mut random = XorShift64::new(len as u64);
        let modulus = next_power_of_two(len);

        let mut cur = span.low();
        for pos in [len / 4, len / 2, len / 4 * 3] {
            let mut other = random.next() as usize & (modulus - 1);
            if other >= len {
                other -= len;
            }

            // SAFETY: `pos` and `other` are both below `len`.
            unsafe {
                cur = cur.advance(pos - cur.offset);
                let other = span.low().advance(other);
                self.exchange(cur.node, other.node);
            }
        }
    }
}

/// Returns `2^bit_length(len)`, a power of two strictly greater than `len` and at most `2 * len`.
#[inline(always)]
fn next_power_of_two(len: usize) -> usize {
    1 << (usize::BITS - len.leading_zeros())
}

/// Xorshift PRNG, see <https://www.jstatsoft.org/article/view/v008i14/xorshift.pdf>.
///
/// Seeded from the span length, so sorting stays deterministic.
struct XorShift64(u64);

impl XorShift64 {
    fn new(seed: u64) -> Self {
        // Zero is a fixed point of xorshift.
        Self(seed.max(1))
    }

    fn next(&mut self) -> u64 {
        let mut r = self.0;
        r ^= r << 13;
        r ^= r >> 7;
        r ^= r << 17;
        self.0 = r;
        r
    }
}
