//! Session-relative time.

use std::time::Instant;

/// A clock anchored at session creation.
///
/// Timestamps are expressed as milliseconds elapsed since the session began. The clock is backed by
/// [`Instant`], so it is monotonic: wall clock adjustments on the host never move it backwards, and
/// `end - start` durations computed from it are always non-negative.
#[derive(Debug)]
pub struct SessionClock {
    origin: Instant,
}

impl SessionClock {
    /// Creates a clock anchored at the current instant.
    pub fn new() -> Self {
        Self { origin: Instant::now() }
    }

    /// Gets the current session-relative timestamp, in milliseconds.
    pub fn current_timestamp(&self) -> i64 {
        self.origin.elapsed().as_millis() as i64
    }
}

impl Default for SessionClock {
    fn default() -> Self {
        Self::new()
    }
}
