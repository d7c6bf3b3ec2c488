//! Session-wide sequence number allocation.

use std::sync::atomic::{AtomicI32, Ordering::Relaxed};

/// An allocator of strictly increasing sequence numbers, scoped to one monitoring session.
///
/// Every traceable event within a session consumes one sequence number, which the backend uses both to keep
/// correlation tags unique and to order events within the session's record stream.
///
/// Allocation is a single atomic increment: concurrent callers from any number of threads each receive a distinct
/// value, with no value skipped or issued twice. Values are monotonically increasing as observed by any single thread;
/// no total ordering across threads is implied, and none is required by the backend.
#[derive(Debug)]
pub struct SequenceAllocator {
    next: AtomicI32,
}

impl SequenceAllocator {
    /// Creates an allocator that issues values starting from `base`.
    pub const fn new(base: i32) -> Self {
        Self {
            next: AtomicI32::new(base),
        }
    }

    /// Returns the next sequence number.
    ///
    /// This operation never fails.
    pub fn next(&self) -> i32 {
        self.next.fetch_add(1, Relaxed)
    }
}
