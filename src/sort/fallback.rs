//! Fallback sorters: insertion sort for short spans, a bounded insertion sort for nearly sorted
//! spans, and heapsort for when the driver runs out of depth budget.

use core::cmp;
use core::ptr::NonNull;

use crate::node::Node;
use crate::sort::kernel::Sorter;
use crate::sort::Span;

impl<T, F> Sorter<'_, T, F>
where
    F: Fn(&T, &T) -> bool,
{
    /// Sorts `span` by shifting every element backward until it is in place.
    #[cfg_attr(feature = "no_inline_sub_functions", inline(never))]
    pub(crate) fn insertion_sort(&mut self, span: Span<T>) {
        let mut tail = span.low();

        for _ in 1..span.len {
            // SAFETY: The loop runs `len - 1` times, `tail` stays inside the span. `hole` only
            // steps back while its offset is positive.
            unsafe {
                tail.step_forward();

                let mut hole = tail;
                while hole.offset > 0 {
                    let before = hole.back();
                    if !self.less(hole.node, before.node) {
                        break;
                    }
                    self.exchange(hole.node, before.node);
                    hole = before;
                }
            }
        }
    }

    /// Partially sorts `span` by shifting several out-of-order elements around.
    ///
    /// Returns `true` if the span is sorted at the end. This function is *O*(*n*) worst-case.
    #[cfg_attr(feature = "no_inline_sub_functions", inline(never))]
    pub(crate) fn partial_insertion_sort(&mut self, span: Span<T>) -> bool {
        // Maximum number of adjacent out-of-order pairs that will get shifted.
        const MAX_STEPS: usize = 5;
        // If the span is shorter than this, don't shift any elements.
        const SHORTEST_SHIFTING: usize = 50;

        let len = span.len;

        // SAFETY: Every dereferenced cursor has `0 < offset < len`. The offset checks happen
        // before any comparison.
        unsafe {
            let mut i = span.low().forward();

            for _ in 0..MAX_STEPS {
                // Find the next pair of adjacent out-of-order elements.
                while i.offset < len && !self.less(i.node, i.back().node) {
                    i.step_forward();
                }

                // Are we done?
                if i.offset == len {
                    return true;
                }

                // Don't shift elements on short spans, that has a performance cost.
                if len < SHORTEST_SHIFTING {
                    return false;
                }

                // Swap the found pair of elements. This puts them in correct order.
                let before = i.back();
                self.exchange(i.node, before.node);

                // Shift the smaller element to the left.
                let mut j = before;
                while j.offset > 0 {
                    let k = j.back();
                    if !self.less(j.node, k.node) {
                        break;
                    }
                    self.exchange(j.node, k.node);
                    j = k;
                }

                // Shift the greater element to the right.
                let mut j = i.forward();
                while j.offset < len {
                    let k = j.back();
                    if !self.less(j.node, k.node) {
                        break;
                    }
                    self.exchange(j.node, k.node);
                    j.step_forward();
                }
            }
        }

        // Didn't manage to sort the span in the limited number of steps.
        false
    }

    /// Sorts `span` using heapsort, which guarantees *O*(*n* \* log(*n*)) worst-case.
    ///
    /// A heap needs random access, so this collects the nodes into a temporary buffer first. The
    /// buffer only holds node pointers and is dropped before returning, sorting still happens by
    /// exchanging payloads. Never inline this, it sits in the main loop of the driver and is meant
    /// as unlikely algorithmic fallback.
    #[inline(never)]
    pub(crate) fn heapsort(&mut self, span: Span<T>) {
        let mut nodes = Vec::with_capacity(span.len);
        let mut cur = span.low();
        nodes.push(cur.node);
        for _ in 1..span.len {
            // SAFETY: `len - 1` steps from the low end stay inside the span.
            unsafe { cur.step_forward() };
            nodes.push(cur.node);
        }

        let len = nodes.len();

        for i in (0..len + len / 2).rev() {
            let sift_idx = if i >= len {
                i - len
            } else {
                self.exchange(nodes[0], nodes[i]);
                0
            };

            self.sift_down(&nodes[..cmp::min(i, len)], sift_idx);
        }
    }

    // This binary heap respects the invariant `parent >= child`.
    #[inline(always)]
    fn sift_down(&mut self, v: &[NonNull<Node<T>>], mut node: usize) {
        let len = v.len();

        loop {
            // Children of `node`.
            let mut child = 2 * node + 1;
            if child >= len {
                break;
            }

            // Choose the greater child.
            if child + 1 < len {
                child += self.less(v[child], v[child + 1]) as usize;
            }

            // Stop if the invariant holds at `node`.
            if !self.less(v[node], v[child]) {
                break;
            }

            self.exchange(v[node], v[child]);
            node = child;
        }
    }
}
