//! The container: a doubly-linked chain behind a reader/writer lock.
//!
//! Every public operation takes the lock for its whole duration, readers share it and writers
//! (including [`XList::sort_by`]) hold it exclusively. Index based operations walk the chain
//! from whichever end is closer.

use core::fmt;
use core::hash::Hash;
use core::marker::PhantomData;
use core::mem;
use core::ops::{Range, RangeBounds};
use core::ptr::{self, NonNull};
use std::collections::HashSet;

use parking_lot::{RwLock, RwLockWriteGuard};

use crate::error::XListError;
use crate::guard::{self, ReadGuard};
use crate::node::{self, Link, Node, Values};

/// The links of a list, only ever touched through the lock of the owning [`XList`].
pub(crate) struct Chain<T> {
    head: Link<T>,
    tail: Link<T>,
    len: usize,
    _owns: PhantomData<Box<Node<T>>>,
}

// SAFETY: The chain owns its nodes exactly like a `Box` would, moving it to another thread moves
// the payloads with it.
unsafe impl<T: Send> Send for Chain<T> {}
// SAFETY: Shared access only hands out shared references to payloads.
unsafe impl<T: Sync> Sync for Chain<T> {}

impl<T> Chain<T> {
    const fn new() -> Self {
        Self {
            head: None,
            tail: None,
            len: 0,
            _owns: PhantomData,
        }
    }

    #[inline]
    pub(crate) fn head(&self) -> Link<T> {
        self.head
    }

    #[inline]
    pub(crate) fn tail(&self) -> Link<T> {
        self.tail
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.len
    }

    pub(crate) fn is_empty(&self) -> bool {
        let empty = self.head.is_none() && self.tail.is_none();
        debug_assert!(!empty || self.len == 0);
        empty
    }

    pub(crate) fn values(&self) -> Values<'_, T> {
        Values::new(self.head, self.tail, self.len)
    }

    fn push_back(&mut self, value: T) {
        let node = Node::alloc(value);

        // SAFETY: `node` is fresh, `tail` is live and owned by this chain.
        unsafe {
            (*node.as_ptr()).prev = self.tail;
            match self.tail {
                Some(tail) => (*tail.as_ptr()).next = Some(node),
                None => self.head = Some(node),
            }
        }

        self.tail = Some(node);
        self.len += 1;
    }

    pub(crate) fn node_at(&self, index: usize) -> Link<T> {
        if index >= self.len {
            return None;
        }

        // SAFETY: The walk stays inside `0..len`, every visited node is live.
        unsafe {
            if index <= self.len / 2 {
                let mut cur = self.head?;
                for _ in 0..index {
                    cur = node::next(cur)?;
                }
                Some(cur)
            } else {
                let mut cur = self.tail?;
                for _ in 0..(self.len - 1 - index) {
                    cur = node::prev(cur)?;
                }
                Some(cur)
            }
        }
    }

    fn checked_node_at(&self, index: usize) -> Result<NonNull<Node<T>>, XListError> {
        self.node_at(index).ok_or(XListError::InvalidIndex {
            index,
            len: self.len,
        })
    }

    fn insert_before(&mut self, at: NonNull<Node<T>>, value: T) {
        let node = Node::alloc(value);

        // SAFETY: `at` belongs to this chain, `node` is fresh.
        unsafe {
            let prev = (*at.as_ptr()).prev;
            (*node.as_ptr()).prev = prev;
            (*node.as_ptr()).next = Some(at);
            (*at.as_ptr()).prev = Some(node);
            match prev {
                Some(prev) => (*prev.as_ptr()).next = Some(node),
                None => self.head = Some(node),
            }
        }

        self.len += 1;
    }

    fn unlink(&mut self, node: NonNull<Node<T>>) -> T {
        // SAFETY: `node` belongs to this chain. After relinking its neighbours nothing points to
        // it anymore, so it can be released.
        unsafe {
            let prev = (*node.as_ptr()).prev;
            let next = (*node.as_ptr()).next;
            match prev {
                Some(prev) => (*prev.as_ptr()).next = next,
                None => self.head = next,
            }
            match next {
                Some(next) => (*next.as_ptr()).prev = prev,
                None => self.tail = prev,
            }
            self.len -= 1;
            Node::release(node)
        }
    }

    /// Moves every node of `other` in front of `at`, or to the end when `at` is `None`.
    fn splice_before(&mut self, at: Link<T>, other: &mut Chain<T>) {
        let other = mem::replace(other, Chain::new());
        let (Some(first), Some(last)) = (other.head, other.tail) else {
            return;
        };
        let moved = other.len;
        // The nodes now belong to `self`.
        mem::forget(other);

        // SAFETY: `first..=last` is a well formed chain, `at` belongs to `self`.
        unsafe {
            let before = match at {
                Some(at) => (*at.as_ptr()).prev,
                None => self.tail,
            };

            (*first.as_ptr()).prev = before;
            match before {
                Some(before) => (*before.as_ptr()).next = Some(first),
                None => self.head = Some(first),
            }

            (*last.as_ptr()).next = at;
            match at {
                Some(at) => (*at.as_ptr()).prev = Some(last),
                None => self.tail = Some(last),
            }
        }

        self.len += moved;
    }

    fn for_each_node(&mut self, mut f: impl FnMut(usize, &mut Node<T>)) {
        let mut cur = self.head;
        let mut index = 0;
        while let Some(node) = cur {
            // SAFETY: `&mut self` gives exclusive access to every node of the chain.
            unsafe {
                f(index, &mut *node.as_ptr());
                cur = (*node.as_ptr()).next;
            }
            index += 1;
        }
    }

    fn for_each_node_rev(&mut self, mut f: impl FnMut(usize, &mut Node<T>)) {
        let mut cur = self.tail;
        let mut index = self.len;
        while let Some(node) = cur {
            index -= 1;
            // SAFETY: See `for_each_node`.
            unsafe {
                f(index, &mut *node.as_ptr());
                cur = (*node.as_ptr()).prev;
            }
        }
    }

    fn clear(&mut self) {
        while let Some(head) = self.head {
            // SAFETY: `head` is live, it gets detached before it is released.
            unsafe {
                self.head = node::next(head);
                Node::release(head);
            }
        }
        self.tail = None;
        self.len = 0;
    }
}

impl<T> Drop for Chain<T> {
    fn drop(&mut self) {
        self.clear();
    }
}

/// A thread-safe doubly-linked list.
///
/// All methods take `&self`, the list synchronizes internally with a reader/writer lock. Sorting
/// holds the write lock for the entire operation, other threads never observe a half sorted list.
pub struct XList<T> {
    pub(crate) chain: RwLock<Chain<T>>,
}

impl<T> XList<T> {
    /// Creates an empty list.
    pub const fn new() -> Self {
        Self {
            chain: RwLock::new(Chain::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.chain.read().len
    }

    pub fn is_empty(&self) -> bool {
        self.chain.read().is_empty()
    }

    /// Removes all elements.
    pub fn clear(&self) {
        self.chain.write().clear();
    }

    pub fn push_back(&self, value: T) {
        self.chain.write().push_back(value);
    }

    /// Appends all `values` at the end, under a single lock acquisition.
    pub fn append<I: IntoIterator<Item = T>>(&self, values: I) {
        let mut chain = self.chain.write();
        for value in values {
            chain.push_back(value);
        }
    }

    /// Replaces the whole content with `values`. An empty `values` leaves the list unchanged.
    pub fn set<I: IntoIterator<Item = T>>(&self, values: I) {
        let mut values = values.into_iter().peekable();
        if values.peek().is_none() {
            return;
        }

        let mut chain = self.chain.write();
        chain.clear();
        for value in values {
            chain.push_back(value);
        }
    }

    /// Locks the list for reading and gives access to its elements by reference.
    ///
    /// Writers, including [`XList::sort_by`], block until the guard is dropped.
    pub fn read(&self) -> ReadGuard<'_, T> {
        ReadGuard::new(self.chain.read())
    }

    /// Inserts `values` in front of position `pos`. `pos == len` appends.
    pub fn insert<I: IntoIterator<Item = T>>(&self, pos: usize, values: I) -> Result<(), XListError> {
        let mut chain = self.chain.write();
        if pos == chain.len {
            for value in values {
                chain.push_back(value);
            }
            return Ok(());
        }

        let at = chain.checked_node_at(pos)?;
        for value in values {
            chain.insert_before(at, value);
        }
        Ok(())
    }

    /// Replaces the element at `pos` and returns the previous one.
    pub fn replace(&self, pos: usize, value: T) -> Result<T, XListError> {
        let mut chain = self.chain.write();
        if chain.is_empty() {
            return Err(XListError::ElementNotFound);
        }

        let node = chain.checked_node_at(pos)?;
        // SAFETY: The write guard gives exclusive access to the node.
        let old = unsafe { mem::replace(&mut *(*node.as_ptr()).value, value) };
        Ok(old)
    }

    /// Replaces the last element and returns the previous one.
    pub fn replace_last(&self, value: T) -> Result<T, XListError> {
        let chain = self.chain.write();
        let tail = chain.tail.ok_or(XListError::ElementNotFound)?;
        // SAFETY: See `replace`.
        let old = unsafe { mem::replace(&mut *(*tail.as_ptr()).value, value) };
        Ok(old)
    }

    /// Removes and returns the element at `pos`.
    pub fn delete_at(&self, pos: usize) -> Result<T, XListError> {
        let mut chain = self.chain.write();
        if chain.is_empty() {
            return Err(XListError::ElementNotFound);
        }

        let node = chain.checked_node_at(pos)?;
        Ok(chain.unlink(node))
    }

    /// Removes and returns the last element.
    pub fn delete_last(&self) -> Result<T, XListError> {
        let mut chain = self.chain.write();
        let tail = chain.tail.ok_or(XListError::ElementNotFound)?;
        Ok(chain.unlink(tail))
    }

    /// Exchanges the elements at positions `i` and `j`. Marks stay at their positions.
    pub fn swap(&self, i: usize, j: usize) -> Result<(), XListError> {
        let chain = self.chain.write();
        let a = chain.checked_node_at(i)?;
        let b = chain.checked_node_at(j)?;
        // SAFETY: Both nodes are live and exclusively owned through the write guard.
        unsafe { node::exchange(a, b) };
        Ok(())
    }

    /// Calls `f` with every index and element, front to back.
    pub fn for_each(&self, mut f: impl FnMut(usize, &T)) {
        let chain = self.chain.read();
        for (index, value) in chain.values().enumerate() {
            f(index, value);
        }
    }

    /// Calls `f` with every index and element, back to front.
    pub fn for_each_rev(&self, mut f: impl FnMut(usize, &T)) {
        let chain = self.chain.read();
        let len = chain.len;
        for (rev_index, value) in chain.values().rev().enumerate() {
            f(len - 1 - rev_index, value);
        }
    }

    /// Transforms every element in place, front to back.
    pub fn modify(&self, mut change: impl FnMut(usize, &mut T)) -> &Self {
        self.chain
            .write()
            .for_each_node(|index, node| change(index, &mut *node.value));
        self
    }

    /// Transforms every element in place, back to front.
    pub fn modify_rev(&self, mut change: impl FnMut(usize, &mut T)) -> &Self {
        self.chain
            .write()
            .for_each_node_rev(|index, node| change(index, &mut *node.value));
        self
    }

    /// Moves all elements of `other` to the end of `self`, leaving `other` empty.
    pub fn move_from(&self, other: &XList<T>) {
        if ptr::eq(self, other) {
            return;
        }

        let (mut dst, mut src) = self.write_pair(other);
        dst.splice_before(None, &mut src);
    }

    /// Moves all elements of `other` in front of position `pos`, leaving `other` empty.
    pub fn move_at(&self, pos: usize, other: &XList<T>) -> Result<(), XListError> {
        if ptr::eq(self, other) {
            return Ok(());
        }

        let (mut dst, mut src) = self.write_pair(other);
        let at = if pos == dst.len {
            None
        } else {
            Some(dst.checked_node_at(pos)?)
        };
        dst.splice_before(at, &mut src);
        Ok(())
    }

    /// Locks two distinct lists in address order, so two threads moving in opposite directions
    /// can't deadlock.
    fn write_pair<'a>(
        &'a self,
        other: &'a XList<T>,
    ) -> (RwLockWriteGuard<'a, Chain<T>>, RwLockWriteGuard<'a, Chain<T>>) {
        if (self as *const Self) < (other as *const Self) {
            let dst = self.chain.write();
            let src = other.chain.write();
            (dst, src)
        } else {
            let src = other.chain.write();
            let dst = self.chain.write();
            (dst, src)
        }
    }

    // --- Marks ---

    pub fn mark_at(&self, index: usize) -> Result<(), XListError> {
        self.set_mark_at(index, true)
    }

    pub fn unmark_at(&self, index: usize) -> Result<(), XListError> {
        self.set_mark_at(index, false)
    }

    /// Returns `false` for positions outside of the list.
    pub fn is_marked_at(&self, index: usize) -> bool {
        let chain = self.chain.read();
        // SAFETY: The read guard keeps the node alive, marks are only written under the write lock.
        chain
            .node_at(index)
            .map_or(false, |node| unsafe { (*node.as_ptr()).mark })
    }

    pub fn mark_all(&self) {
        self.chain.write().for_each_node(|_, node| node.mark = true);
    }

    pub fn unmark_all(&self) {
        self.chain.write().for_each_node(|_, node| node.mark = false);
    }

    fn set_mark_at(&self, index: usize, mark: bool) -> Result<(), XListError> {
        let chain = self.chain.write();
        let node = chain.checked_node_at(index)?;
        // SAFETY: Exclusive access through the write guard.
        unsafe { (*node.as_ptr()).mark = mark };
        Ok(())
    }
}

impl<T: Clone> XList<T> {
    /// Returns a copy of the element at `index`.
    pub fn at(&self, index: usize) -> Option<T> {
        let chain = self.chain.read();
        // SAFETY: The read guard keeps the node alive and its payload unchanged.
        chain
            .node_at(index)
            .map(|node| unsafe { node::payload(node) }.clone())
    }

    pub fn first(&self) -> Option<T> {
        let chain = self.chain.read();
        chain.values().next().cloned()
    }

    pub fn last(&self) -> Option<T> {
        let chain = self.chain.read();
        chain.values().next_back().cloned()
    }

    /// Copies all elements into a `Vec`, front to back.
    pub fn to_vec(&self) -> Vec<T> {
        let chain = self.chain.read();
        chain.values().cloned().collect()
    }

    /// Returns a new list with copies of all elements for which `is` returns `true`.
    pub fn find(&self, mut is: impl FnMut(usize, &T) -> bool) -> XList<T> {
        let chain = self.chain.read();
        chain
            .values()
            .enumerate()
            .filter(|(index, value)| is(*index, value))
            .map(|(_, value)| value.clone())
            .collect()
    }

    /// Returns a new list with copies of the elements at the positions in `range`.
    pub fn copy_range(&self, range: impl RangeBounds<usize>) -> Result<XList<T>, XListError> {
        let chain = self.chain.read();
        let Range { start, end } = guard::resolve_range(range, chain.len)?;
        Ok(chain.values().skip(start).take(end - start).cloned().collect())
    }

    /// Returns a new list holding copies of the elements of `self` followed by those of `other`.
    pub fn concat(&self, other: &XList<T>) -> XList<T> {
        let joined: XList<T> = self.to_vec().into();
        joined.append(other.to_vec());
        joined
    }
}

impl<T: Hash + Eq> XList<T> {
    /// Returns `true` if every one of `values` is in the list. An empty list contains nothing.
    ///
    /// Hashes the list once, the cost is *O*(*n* + *m*).
    pub fn contains_all<'v, I>(&self, values: I) -> bool
    where
        I: IntoIterator<Item = &'v T>,
        T: 'v,
    {
        let chain = self.chain.read();
        if chain.is_empty() {
            return false;
        }

        let present: HashSet<&T> = chain.values().collect();
        values.into_iter().all(|wanted| present.contains(wanted))
    }

    /// Appends those `values` that are not in the list yet, in order. Duplicates within `values`
    /// are appended once.
    pub fn append_unique<I: IntoIterator<Item = T>>(&self, values: I) {
        let mut chain = self.chain.write();
        let mut present = HashSet::with_capacity(chain.len);

        // SAFETY: Every payload sits in its own box. Pushing nodes neither moves nor drops the
        // existing ones, and `present` is dropped before the write guard.
        unsafe {
            let mut cur = chain.head;
            while let Some(node) = cur {
                present.insert(node::payload::<T>(node));
                cur = node::next(node);
            }
        }

        for value in values {
            if present.contains(&value) {
                continue;
            }
            chain.push_back(value);
            if let Some(tail) = chain.tail {
                // SAFETY: See above.
                present.insert(unsafe { node::payload::<T>(tail) });
            }
        }
    }
}

impl<T> Default for XList<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> FromIterator<T> for XList<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut chain = Chain::new();
        for value in iter {
            chain.push_back(value);
        }
        Self {
            chain: RwLock::new(chain),
        }
    }
}

impl<T> From<Vec<T>> for XList<T> {
    fn from(values: Vec<T>) -> Self {
        values.into_iter().collect()
    }
}

impl<T> Extend<T> for XList<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        let chain = self.chain.get_mut();
        for value in iter {
            chain.push_back(value);
        }
    }
}

/// Deep copy. Marks are not copied.
impl<T: Clone> Clone for XList<T> {
    fn clone(&self) -> Self {
        self.to_vec().into()
    }
}

impl<T: fmt::Debug> fmt::Debug for XList<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let chain = self.chain.read();
        f.debug_list().entries(chain.values()).finish()
    }
}
