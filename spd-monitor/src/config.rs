//! Tunables and the clock.

use chrono::NaiveDateTime;
use std::cell::Cell;
use std::time::Duration;

/// Rows per table page unless a caller says otherwise.
pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Delays used by the controllers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timings {
    /// Quiet period before a search term is forwarded.
    pub search_debounce: Duration,
    /// Quiet period before a (re)fetch starts after a plant or range change.
    pub fetch_debounce: Duration,
    /// Pause between a recompute and the fetch that picks up its results.
    pub retry_delay: Duration,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            search_debounce: Duration::from_millis(300),
            fetch_debounce: Duration::from_millis(500),
            retry_delay: Duration::from_millis(1000),
        }
    }
}

/// Source of "now" for range normalization.
pub trait Clock {
    fn now(&self) -> NaiveDateTime;
}

/// The local wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        spd_core::dates::now()
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct FixedClock(Cell<NaiveDateTime>);

impl FixedClock {
    pub fn new(now: NaiveDateTime) -> Self {
        Self(Cell::new(now))
    }

    pub fn set(&self, now: NaiveDateTime) {
        self.0.set(now);
    }
}

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0.get()
    }
}
