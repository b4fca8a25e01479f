//! A thread-safe doubly-linked list with an in-place, multi-threaded pattern-defeating quicksort.
//!
//! [`XList`] keeps its elements in individually allocated nodes behind a reader/writer lock.
//! [`XList::sort_by`] reorders them without collecting them into an array: it exchanges node
//! payloads while walking the chain, and sorts independent parts of the list on several threads
//! while holding the write lock. [`XList::sort_by_sequential`] does the same on the calling thread
//! only, for element types and comparators that can't be shared between threads.
//!
//! Borrowing iteration goes through [`XList::read`], which holds the read lock for as long as the
//! returned [`ReadGuard`] lives.

mod error;
mod guard;
mod list;
mod node;
mod sort;

pub use error::XListError;
pub use guard::{RangeCursor, ReadGuard};
pub use list::XList;
pub use node::Values;
pub use sort::{SortConfig, SortStats, DEFAULT_PARALLEL_THRESHOLD, WORKERS_ENV};
