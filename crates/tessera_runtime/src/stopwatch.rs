//! # Stopwatch
//!
//! Elapsed-time measurement for time-based component logic.

use std::thread;
use std::time::{Duration, Instant};

/// Measures time since it was started or last reset.
#[derive(Clone, Copy, Debug)]
pub struct Stopwatch {
    started: Instant,
}

impl Stopwatch {
    /// Starts a new stopwatch at the current instant.
    #[must_use]
    pub fn start() -> Self {
        Self {
            started: Instant::now(),
        }
    }

    /// Seconds elapsed since start or the last reset.
    #[must_use]
    pub fn peek(&self) -> f64 {
        self.elapsed().as_secs_f64()
    }

    /// Time elapsed since start or the last reset.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Restarts measurement from now.
    pub fn reset(&mut self) {
        self.started = Instant::now();
    }

    /// Returns the elapsed time and restarts measurement.
    pub fn lap(&mut self) -> Duration {
        let now = Instant::now();
        let lap = now - self.started;
        self.started = now;
        lap
    }

    /// Blocks the calling thread for `seconds`.
    ///
    /// Negative or non-finite values are treated as zero. Called from a
    /// component hook this stalls the whole tick.
    pub fn delay(&self, seconds: f64) {
        let duration = Duration::try_from_secs_f64(seconds).unwrap_or(Duration::ZERO);
        if !duration.is_zero() {
            thread::sleep(duration);
        }
    }
}

impl Default for Stopwatch {
    fn default() -> Self {
        Self::start()
    }
}
