//! # Deferred Callbacks
//!
//! One-shot and repeating callbacks, each on its own background thread.
//!
//! ## Thread Safety
//!
//! Callbacks never run on the tick thread. A component that schedules one
//! must not touch entity or component state from it without its own
//! synchronisation; hand results back through a channel or a
//! [`Signal`](crate::Signal) instead.
//!
//! ## Cancellation
//!
//! Every timer returns a [`TimerHandle`]. Cancelling wakes the worker out of
//! its current wait; dropping the handle detaches the timer, which then runs
//! to completion on its own.

use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};

use crate::error::{RuntimeError, RuntimeResult};

/// How many times a repeating timer fires.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Rounds {
    /// Fires exactly this many times in total.
    Finite(u32),
    /// Fires until cancelled.
    Infinite,
}

impl From<u32> for Rounds {
    /// `0` means infinite.
    fn from(rounds: u32) -> Self {
        if rounds == 0 {
            Self::Infinite
        } else {
            Self::Finite(rounds)
        }
    }
}

/// Handle to a running timer.
#[derive(Debug)]
pub struct TimerHandle {
    cancel: Sender<()>,
    thread: JoinHandle<()>,
}

impl TimerHandle {
    /// Stops the timer before its next invocation.
    ///
    /// An invocation already in progress finishes first.
    pub fn cancel(&self) {
        // A full slot means a cancel is already pending.
        let _ = self.cancel.try_send(());
    }

    /// Returns `true` once the worker thread has exited.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.thread.is_finished()
    }

    /// Blocks until the worker thread exits.
    ///
    /// Returns `false` if a callback panicked.
    pub fn join(self) -> bool {
        self.thread.join().is_ok()
    }
}

/// Waits out one interval unless cancelled.
struct Pacer {
    /// `None` once the handle was dropped: nobody can cancel any more.
    cancel: Option<Receiver<()>>,
}

impl Pacer {
    /// Returns `false` if the timer was cancelled.
    fn wait(&mut self, interval: Duration) -> bool {
        let deadline = Instant::now() + interval;
        let Some(cancel) = &self.cancel else {
            thread::sleep(interval);
            return true;
        };

        match cancel.recv_deadline(deadline) {
            Ok(()) => false,
            Err(RecvTimeoutError::Timeout) => true,
            Err(RecvTimeoutError::Disconnected) => {
                self.cancel = None;
                thread::sleep(deadline.saturating_duration_since(Instant::now()));
                true
            }
        }
    }

    fn cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(|rx| rx.try_recv().is_ok())
    }
}

fn spawn<F>(name: &str, body: F) -> RuntimeResult<TimerHandle>
where
    F: FnOnce(Pacer) + Send + 'static,
{
    let (cancel, rx) = bounded(1);
    let pacer = Pacer { cancel: Some(rx) };
    let thread = thread::Builder::new()
        .name(name.to_owned())
        .spawn(move || body(pacer))
        .map_err(RuntimeError::TimerSpawn)?;
    Ok(TimerHandle { cancel, thread })
}

/// Runs `callback` once after `delay`.
///
/// # Errors
///
/// [`RuntimeError::TimerSpawn`] if the worker thread cannot be started.
pub fn after<F>(delay: Duration, callback: F) -> RuntimeResult<TimerHandle>
where
    F: FnOnce() + Send + 'static,
{
    spawn("tessera-timer-once", move |mut pacer| {
        if pacer.wait(delay) {
            callback();
        }
    })
}

/// Runs `callback` every `interval`, for the given number of `rounds`.
///
/// With `immediate`, the first invocation happens right away and counts
/// as one of the rounds.
///
/// # Errors
///
/// [`RuntimeError::TimerSpawn`] if the worker thread cannot be started.
pub fn every<F>(
    interval: Duration,
    rounds: Rounds,
    immediate: bool,
    mut callback: F,
) -> RuntimeResult<TimerHandle>
where
    F: FnMut() + Send + 'static,
{
    spawn("tessera-timer-rounds", move |mut pacer| {
        let mut fired = 0u32;
        let remaining = |fired: u32| match rounds {
            Rounds::Finite(total) => fired < total,
            Rounds::Infinite => true,
        };

        if immediate && remaining(fired) {
            callback();
            fired += 1;
        }
        while remaining(fired) {
            if !pacer.wait(interval) {
                break;
            }
            callback();
            fired = fired.saturating_add(1);
        }
    })
}

/// Runs `callback` every `interval` for as long as `condition` holds.
///
/// `condition` is checked before each wait. With `immediate`, one
/// invocation happens right away regardless of `condition`.
///
/// # Errors
///
/// [`RuntimeError::TimerSpawn`] if the worker thread cannot be started.
pub fn every_while<F, C>(
    interval: Duration,
    mut condition: C,
    immediate: bool,
    mut callback: F,
) -> RuntimeResult<TimerHandle>
where
    F: FnMut() + Send + 'static,
    C: FnMut() -> bool + Send + 'static,
{
    spawn("tessera-timer-while", move |mut pacer| {
        if immediate {
            callback();
        }
        while !pacer.cancelled() && condition() {
            if !pacer.wait(interval) {
                break;
            }
            callback();
        }
    })
}
