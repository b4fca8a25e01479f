//! Chain nodes and the `(node, offset)` cursor used by every pointer walk of the sort.

use core::iter::FusedIterator;
use core::marker::PhantomData;
use core::ptr::{self, NonNull};

pub(crate) type Link<T> = Option<NonNull<Node<T>>>;

/// One element of the chain.
///
/// Links are plain navigation pointers, the owning [`Chain`](crate::list::Chain) allocates and
/// frees nodes. The payload lives in its own box so that sorting can exchange two payloads by
/// swapping two pointers, no matter how large `T` is.
pub(crate) struct Node<T> {
    pub(crate) next: Link<T>,
    pub(crate) prev: Link<T>,
    /// Positional flag, stays with the node when payloads are exchanged.
    pub(crate) mark: bool,
    pub(crate) value: Box<T>,
}

impl<T> Node<T> {
    /// Allocates an unlinked node.
    pub(crate) fn alloc(value: T) -> NonNull<Node<T>> {
        let node = Box::new(Node {
            next: None,
            prev: None,
            mark: false,
            value: Box::new(value),
        });

        NonNull::from(Box::leak(node))
    }

    /// Releases a node created by [`Node::alloc`] and hands back its payload.
    ///
    /// SAFETY: `node` must come from `alloc`, must no longer be reachable from any chain and must
    /// not be released twice.
    pub(crate) unsafe fn release(node: NonNull<Node<T>>) -> T {
        // SAFETY: See function safety.
        let node = unsafe { Box::from_raw(node.as_ptr()) };
        *node.value
    }
}

/// SAFETY: `node` must be live and no other thread may exchange its payload for the lifetime `'a`.
#[inline(always)]
pub(crate) unsafe fn payload<'a, T>(node: NonNull<Node<T>>) -> &'a T {
    // SAFETY: See function safety.
    unsafe { &*(*node.as_ptr()).value }
}

/// SAFETY: `node` must be live.
#[inline(always)]
pub(crate) unsafe fn next<T>(node: NonNull<Node<T>>) -> Link<T> {
    // SAFETY: Only the link field is read, links are never written while a sort runs.
    unsafe { (*node.as_ptr()).next }
}

/// SAFETY: `node` must be live.
#[inline(always)]
pub(crate) unsafe fn prev<T>(node: NonNull<Node<T>>) -> Link<T> {
    // SAFETY: Only the link field is read, links are never written while a sort runs.
    unsafe { (*node.as_ptr()).prev }
}

/// Exchanges the payloads of `a` and `b` in O(1). Links and marks stay where they are.
///
/// SAFETY: both nodes must be live and owned by the calling worker. `a == b` is allowed.
#[inline(always)]
pub(crate) unsafe fn exchange<T>(a: NonNull<Node<T>>, b: NonNull<Node<T>>) {
    // SAFETY: `ptr::swap` tolerates `a == b`, and no reference to either payload box is alive
    // while the comparison function is not running.
    unsafe {
        ptr::swap(
            ptr::addr_of_mut!((*a.as_ptr()).value),
            ptr::addr_of_mut!((*b.as_ptr()).value),
        );
    }
}

/// A node together with its distance from the low end of the range being worked on.
///
/// Lists don't have O(1) distance, so every walk moves node and offset in lockstep. Stepping
/// forward from the tail of the whole chain clamps the node and only advances the offset, callers
/// compare offsets before they touch such a cursor.
pub(crate) struct Cursor<T> {
    pub(crate) node: NonNull<Node<T>>,
    pub(crate) offset: usize,
}

impl<T> Clone for Cursor<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Cursor<T> {}

impl<T> Cursor<T> {
    #[inline(always)]
    pub(crate) fn new(node: NonNull<Node<T>>, offset: usize) -> Self {
        Self { node, offset }
    }

    /// SAFETY: the node must be live.
    #[inline(always)]
    pub(crate) unsafe fn step_forward(&mut self) {
        // SAFETY: See function safety.
        if let Some(next) = unsafe { next(self.node) } {
            self.node = next;
        }
        self.offset += 1;
    }

    /// SAFETY: the node must be live and `offset > 0`.
    #[inline(always)]
    pub(crate) unsafe fn step_back(&mut self) {
        debug_assert!(self.offset > 0);

        // SAFETY: See function safety.
        self.node = unsafe { prev(self.node) }.expect("cursor walked past the head of the chain");
        self.offset -= 1;
    }

    /// SAFETY: the node must be live.
    #[inline(always)]
    pub(crate) unsafe fn forward(mut self) -> Self {
        // SAFETY: See function safety.
        unsafe { self.step_forward() };
        self
    }

    /// SAFETY: the node must be live and `offset > 0`.
    #[inline(always)]
    pub(crate) unsafe fn back(mut self) -> Self {
        // SAFETY: See function safety.
        unsafe { self.step_back() };
        self
    }

    /// Walks `steps` links forward.
    ///
    /// SAFETY: the node must be live and the walk must stay inside the chain.
    pub(crate) unsafe fn advance(mut self, steps: usize) -> Self {
        for _ in 0..steps {
            // SAFETY: See function safety.
            self.node = unsafe { next(self.node) }.expect("cursor walked past the tail of the chain");
        }
        self.offset += steps;
        self
    }
}

/// Iterator over the elements of a list, front to back or back to front.
///
/// Created by [`ReadGuard::iter`](crate::ReadGuard::iter), it borrows the guard and with it the
/// read lock.
pub struct Values<'a, T> {
    front: Link<T>,
    back: Link<T>,
    remaining: usize,
    _marker: PhantomData<&'a T>,
}

impl<'a, T> Values<'a, T> {
    pub(crate) fn new(head: Link<T>, tail: Link<T>, len: usize) -> Self {
        Self {
            front: head,
            back: tail,
            remaining: len,
            _marker: PhantomData,
        }
    }
}

impl<'a, T> Iterator for Values<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<&'a T> {
        if self.remaining == 0 {
            return None;
        }

        let node = self.front?;
        self.remaining -= 1;

        // SAFETY: The chain is borrowed for `'a` through a lock guard, so the node is live and
        // nobody exchanges its payload.
        unsafe {
            self.front = next(node);
            Some(payload(node))
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<'a, T> DoubleEndedIterator for Values<'a, T> {
    fn next_back(&mut self) -> Option<&'a T> {
        if self.remaining == 0 {
            return None;
        }

        let node = self.back?;
        self.remaining -= 1;

        // SAFETY: See `next`.
        unsafe {
            self.back = prev(node);
            Some(payload(node))
        }
    }
}

impl<T> ExactSizeIterator for Values<'_, T> {}

impl<T> FusedIterator for Values<'_, T> {}
