use std::time::Duration;

use crate::timer::Timer;

/// Resettable stopwatch over a [`Timer`].
#[derive(Debug, Clone)]
pub struct Clock<T: Timer> {
    timer: T,
    origin: T::Timestamp,
}

impl<T: Timer> Clock<T> {
    pub fn new(timer: T) -> Self {
        let origin = timer.now();
        Self { timer, origin }
    }

    pub fn reset(&mut self) {
        self.origin = self.timer.now();
    }

    pub fn elapsed(&self) -> Duration {
        self.timer.elapsed(self.origin)
    }

    pub fn elapsed_ms(&self) -> f64 {
        self.elapsed().as_nanos() as f64 / 1e6
    }

    pub fn timer(&self) -> &T {
        &self.timer
    }
}
