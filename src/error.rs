//! Errors returned by the index based container operations.
//!
//! Sorting never returns an error. A panicking comparison function propagates to the caller and
//! broken range bookkeeping inside the sort is a bug that asserts.

use core::fmt::{Display, Formatter, Result};
use std::error::Error;

/// Error type for the fallible [`XList`](crate::XList) operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XListError {
    /// The position is outside of the list.
    InvalidIndex {
        /// Requested position.
        index: usize,
        /// Length of the list at the time of the call.
        len: usize,
    },

    /// The operation needs an element but the list is empty.
    ElementNotFound,
}

impl Display for XListError {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        match self {
            XListError::InvalidIndex { index, len } => {
                write!(f, "invalid index {index} for list of length {len}")
            }
            XListError::ElementNotFound => write!(f, "element not found"),
        }
    }
}

impl Error for XListError {}
