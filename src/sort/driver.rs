//! The pdqsort control loop.

use tracing::trace;

use crate::node;
use crate::sort::kernel::{SortedHint, Sorter};
use crate::sort::scheduler::Dispatch;
use crate::sort::Span;

/// Spans up to this length get sorted using insertion sort.
const MAX_INSERTION: usize = 12;

/// Sorts `span` using pattern-defeating quicksort.
///
/// The shorter side of every partition goes to [`Dispatch::dispatch`], the longer side is handled
/// by the next iteration of the loop. Native recursion is therefore bounded by *O*(log(*n*)) no
/// matter how many workers get spawned.
///
/// `limit` is the number of allowed imbalanced partitions before switching to heapsort. If zero,
/// this function will immediately switch to heapsort. Every imbalanced partition halves it.
pub(crate) fn quicksort<T, D>(ctx: D, mut span: Span<T>, mut limit: u32)
where
    D: Dispatch<T>,
{
    let mut sorter = Sorter::new(ctx.is_less());

    // True if the last partitioning was reasonably balanced.
    let mut was_balanced = true;
    // True if the last partitioning didn't move elements (the span was already partitioned).
    let mut was_partitioned = true;

    loop {
        // Very short spans get sorted using insertion sort.
        if span.len <= MAX_INSERTION {
            sorter.insertion_sort(span);
            break;
        }

        // If too many bad pivot choices were made, simply fall back to heapsort in order to
        // guarantee `O(n * log(n))` worst-case.
        if limit == 0 {
            trace!(len = span.len, "depth budget exhausted, falling back to heapsort");
            sorter.heapsort(span);
            ctx.scheduler().record_heapsort();
            break;
        }

        // If the last partitioning was imbalanced, try breaking patterns in the span by shuffling
        // some elements around. Hopefully we'll choose a better pivot this time.
        if !was_balanced {
            sorter.break_patterns(span);
            limit /= 2;
        }

        // Choose a pivot and try guessing whether the span is already sorted.
        let (mut pivot, mut hint) = sorter.choose_pivot(span);

        // A descending span is reversed into an ascending one. The pivot payload moves to the
        // mirrored offset.
        if hint == SortedHint::Decreasing {
            sorter.reverse(span);
            // SAFETY: The mirrored offset is inside the span.
            pivot = unsafe { span.low().advance(span.len - 1 - pivot.offset) };
            hint = SortedHint::Increasing;
        }

        // If the last partitioning was decently balanced and didn't shuffle elements, and if pivot
        // selection predicts the span is likely already sorted...
        if was_balanced && was_partitioned && hint == SortedHint::Increasing {
            // Try identifying several out-of-order elements and shifting them to correct
            // positions. If the span ends up being completely sorted, we're done.
            if sorter.partial_insertion_sort(span) {
                break;
            }
        }

        // If the chosen pivot is equal to the predecessor, then it's the smallest element in the
        // span. Partition the span into elements equal to and elements greater than the pivot.
        // This case is usually hit when the span contains many duplicate elements.
        //
        // SAFETY: Links don't change during the sort, the predecessor is either an ancestor pivot
        // or part of an equal run that is already in its final place.
        if let Some(pred) = unsafe { node::prev(span.lo) } {
            if !sorter.less(pred, pivot.node) {
                ctx.scheduler().record_equal_partition();
                match sorter.partition_equal(span, pivot) {
                    Some(greater) => {
                        span = greater;
                        continue;
                    }
                    None => break,
                }
            }
        }

        // Partition the span.
        let (mid, already_partitioned) = sorter.partition(span, pivot);
        was_partitioned = already_partitioned;

        // Split the span into `left`, `pivot`, and `right`.
        let left_len = mid.offset;
        let right_len = span.len - mid.offset - 1;

        // SAFETY: `mid` is inside the span. Its neighbours are only used for non-empty sides.
        let (below, above) = unsafe { (node::prev(mid.node), node::next(mid.node)) };

        // Hand the shorter side to the scheduler, keep iterating on the longer side.
        if left_len < right_len {
            was_balanced = left_len >= span.len / 8;
            if left_len > 1 {
                ctx.dispatch(Span::new(Some(span.lo), below, left_len), limit);
            }
            span = Span::new(above, Some(span.hi), right_len);
        } else {
            was_balanced = right_len >= span.len / 8;
            if right_len > 1 {
                ctx.dispatch(Span::new(above, Some(span.hi), right_len), limit);
            }
            span = Span::new(Some(span.lo), below, left_len);
        }
    }

    ctx.scheduler().record_exchanges(sorter.exchanges);
}
