//! Monotonic exchange clock
//!
//! Wall-clock nanoseconds, bumped by one whenever the wall clock stalls or
//! steps backwards. Every timestamp handed out is unique, which makes
//! `created_at` a total time-priority key.

use std::sync::atomic::{AtomicI64, Ordering};

use chrono::Utc;

#[derive(Debug, Default)]
pub struct MonotonicClock {
    last: AtomicI64,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next timestamp in Unix nanos, strictly greater than any before it
    pub fn now(&self) -> i64 {
        let wall = Utc::now().timestamp_nanos_opt().unwrap_or_default();
        let mut last = self.last.load(Ordering::SeqCst);
        loop {
            let next = wall.max(last + 1);
            match self
                .last
                .compare_exchange_weak(last, next, Ordering::SeqCst, Ordering::SeqCst)
            {
                Ok(_) => return next,
                Err(current) => last = current,
            }
        }
    }

    /// Never hand out a timestamp at or below `timestamp` again
    pub fn advance_to(&self, timestamp: i64) {
        self.last.fetch_max(timestamp, Ordering::SeqCst);
    }
}
