//! Time sources for age and period math

use crate::types::Seconds;
use chrono::Utc;
use std::cell::Cell;

/// Source of wall-clock timestamps, in seconds
pub trait Clock {
    /// Current time in seconds
    fn now(&self) -> Seconds;
}

/// Wall clock backed by the system time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Seconds {
        let now = Utc::now();
        now.timestamp() as f64 + f64::from(now.timestamp_subsec_micros()) / 1e6
    }
}

/// Manually driven clock, for replays and tests
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Cell<Seconds>,
}

impl ManualClock {
    pub fn new(start: Seconds) -> Self {
        Self {
            now: Cell::new(start),
        }
    }

    pub fn set(&self, now: Seconds) {
        self.now.set(now);
    }

    pub fn advance(&self, delta: Seconds) {
        self.now.set(self.now.get() + delta);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Seconds {
        self.now.get()
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> Seconds {
        (**self).now()
    }
}
