//! Borrowing access to a list under its read lock.
//!
//! References handed out by the list have to be tied to the lock, so iteration goes through a
//! [`ReadGuard`]. Writers, sorting included, wait until the guard is dropped.

use core::iter::Rev;
use core::ops::{Bound, Range, RangeBounds};

use parking_lot::RwLockReadGuard;

use crate::error::XListError;
use crate::list::Chain;
use crate::node::{self, Cursor, Values};

/// Shared access to all elements of an [`XList`](crate::XList), see
/// [`XList::read`](crate::XList::read).
pub struct ReadGuard<'a, T> {
    chain: RwLockReadGuard<'a, Chain<T>>,
}

impl<'a, T> ReadGuard<'a, T> {
    pub(crate) fn new(chain: RwLockReadGuard<'a, Chain<T>>) -> Self {
        Self { chain }
    }

    pub fn len(&self) -> usize {
        self.chain.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chain.is_empty()
    }

    /// Returns the element at `index`, walking from whichever end is closer.
    pub fn get(&self, index: usize) -> Option<&T> {
        // SAFETY: The guard keeps the node alive and its payload unchanged for `&self`.
        self.chain
            .node_at(index)
            .map(|node| unsafe { node::payload(node) })
    }

    pub fn first(&self) -> Option<&T> {
        self.iter().next()
    }

    pub fn last(&self) -> Option<&T> {
        self.iter().next_back()
    }

    /// Iterates front to back.
    pub fn iter(&self) -> Values<'_, T> {
        self.chain.values()
    }

    /// Iterates back to front.
    pub fn iter_rev(&self) -> Rev<Values<'_, T>> {
        self.iter().rev()
    }

    /// Iterates over the elements at the positions in `range`.
    pub fn range(&self, range: impl RangeBounds<usize>) -> Result<Values<'_, T>, XListError> {
        let Range { start, end } = resolve_range(range, self.len())?;
        if start == end {
            return Ok(Values::new(None, None, 0));
        }

        let first = self.chain.node_at(start);
        let last = self.chain.node_at(end - 1);
        Ok(Values::new(first, last, end - start))
    }

    /// Creates an unpositioned two-way cursor confined to `range`.
    pub fn cursor(&self, range: impl RangeBounds<usize>) -> Result<RangeCursor<'_, T>, XListError> {
        let Range { start, end } = resolve_range(range, self.len())?;
        Ok(RangeCursor {
            chain: &*self.chain,
            start,
            end,
            current: None,
        })
    }
}

impl<'g, T> IntoIterator for &'g ReadGuard<'_, T> {
    type Item = &'g T;
    type IntoIter = Values<'g, T>;

    fn into_iter(self) -> Values<'g, T> {
        self.iter()
    }
}

/// A position inside a fixed range of a list that moves in both directions.
///
/// A fresh or [`reset`](RangeCursor::reset) cursor points nowhere. The first
/// [`move_next`](RangeCursor::move_next) lands on the start of the range, the first
/// [`move_prev`](RangeCursor::move_prev) on its end. Moving past either end of the range fails
/// and leaves the cursor where it was.
pub struct RangeCursor<'g, T> {
    chain: &'g Chain<T>,
    start: usize,
    end: usize,
    current: Option<Cursor<T>>,
}

impl<'g, T> RangeCursor<'g, T> {
    /// The positions this cursor may visit.
    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    /// Confines the cursor to a new range and unpositions it.
    pub fn reset(&mut self, range: impl RangeBounds<usize>) -> Result<(), XListError> {
        let Range { start, end } = resolve_range(range, self.chain.len())?;
        self.start = start;
        self.end = end;
        self.current = None;
        Ok(())
    }

    /// Position of the cursor in the list, `None` while unpositioned.
    pub fn index(&self) -> Option<usize> {
        self.current.map(|cur| cur.offset)
    }

    /// The element under the cursor.
    pub fn current(&self) -> Option<&'g T> {
        // SAFETY: The read guard borrowed for `'g` keeps every node alive and unchanged.
        self.current.map(|cur| unsafe { node::payload(cur.node) })
    }

    /// Moves to `index` if it lies inside the range.
    pub fn seek(&mut self, index: usize) -> Option<&'g T> {
        if !self.range().contains(&index) {
            return None;
        }

        let node = self.chain.node_at(index)?;
        self.current = Some(Cursor::new(node, index));
        self.current()
    }

    /// Moves to the start of the range.
    pub fn first(&mut self) -> Option<&'g T> {
        self.seek(self.start)
    }

    /// Moves to the end of the range.
    pub fn last(&mut self) -> Option<&'g T> {
        self.seek(self.end.checked_sub(1)?)
    }

    pub fn move_next(&mut self) -> bool {
        if self.current.is_none() {
            return self.first().is_some();
        }

        let end = self.end;
        match &mut self.current {
            Some(cur) if cur.offset + 1 < end => {
                // SAFETY: The next position is inside the range and therefore inside the chain.
                unsafe { cur.step_forward() };
                true
            }
            _ => false,
        }
    }

    pub fn move_prev(&mut self) -> bool {
        if self.current.is_none() {
            return self.last().is_some();
        }

        let start = self.start;
        match &mut self.current {
            Some(cur) if cur.offset > start => {
                // SAFETY: `offset > start >= 0`, the previous node exists.
                unsafe { cur.step_back() };
                true
            }
            _ => false,
        }
    }

    pub fn next_value(&mut self) -> Option<&'g T> {
        if self.move_next() {
            self.current()
        } else {
            None
        }
    }

    pub fn prev_value(&mut self) -> Option<&'g T> {
        if self.move_prev() {
            self.current()
        } else {
            None
        }
    }
}

/// Turns `range` into a half-open range of positions of a list of length `len`.
pub(crate) fn resolve_range(
    range: impl RangeBounds<usize>,
    len: usize,
) -> Result<Range<usize>, XListError> {
    let start = match range.start_bound() {
        Bound::Included(&start) => start,
        Bound::Excluded(&start) => start.saturating_add(1),
        Bound::Unbounded => 0,
    };
    let end = match range.end_bound() {
        Bound::Included(&end) => end
            .checked_add(1)
            .ok_or(XListError::InvalidIndex { index: end, len })?,
        Bound::Excluded(&end) => end,
        Bound::Unbounded => len,
    };

    if end > len {
        return Err(XListError::InvalidIndex {
            index: end - 1,
            len,
        });
    }
    if start > end {
        return Err(XListError::InvalidIndex { index: start, len });
    }

    Ok(start..end)
}
