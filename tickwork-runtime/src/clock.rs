//! Time source used by every scheduled task.
//!
//! Tasks never call `tokio::time::sleep` directly; they go through a
//! [`Clock`], which lets tests substitute [`ManualClock`] and observe or
//! compress the delays a schedule asks for.

use crate::error::Cancelled;
use chrono::{Local, NaiveDateTime, Utc};
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Future returned by [`Clock::delay`]
pub type DelayFuture<'a> = Pin<Box<dyn Future<Output = Result<(), Cancelled>> + Send + 'a>>;

/// Current time plus a cancellable delay
pub trait Clock: Send + Sync + 'static {
    /// Current local wall time
    fn now(&self) -> NaiveDateTime;

    /// Suspend for `duration`, or until `cancel` fires, whichever comes first.
    /// Resolves to `Err(Cancelled)` when interrupted.
    fn delay<'a>(&'a self, duration: Duration, cancel: &'a CancellationToken) -> DelayFuture<'a>;
}

/// Real wall clock backed by the tokio timer
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }

    fn delay<'a>(&'a self, duration: Duration, cancel: &'a CancellationToken) -> DelayFuture<'a> {
        Box::pin(async move {
            let mut expected = duration;
            // The timer is monotonic but schedules are wall-clock targets:
            // keep sleeping while the wall clock says we woke up early.
            loop {
                let before = Utc::now();
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => return Err(Cancelled),
                    _ = tokio::time::sleep(expected) => {}
                }
                let elapsed = match (Utc::now() - before).to_std() {
                    Ok(elapsed) => elapsed,
                    // wall clock moved backwards; trust the timer
                    Err(_) => return Ok(()),
                };
                if elapsed >= expected {
                    return Ok(());
                }
                expected = expected - elapsed + Duration::from_millis(1);
            }
        })
    }
}

/// How [`ManualClock`] spends real time on a delay
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pace {
    /// Sleep the full requested duration
    Realtime,
    /// Sleep a fixed short step regardless of the requested duration
    Accelerated(Duration),
}

/// Deterministic clock for tests.
///
/// Each `delay` call is counted and advances the logical time by the
/// requested duration once it finishes.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<NaiveDateTime>,
    delays: AtomicUsize,
    pace: Pace,
}

impl ManualClock {
    /// Delays take their real duration
    pub fn realtime(start: NaiveDateTime) -> Self {
        Self::with_pace(start, Pace::Realtime)
    }

    /// Delays take 1ms of real time, however long they are logically
    pub fn accelerated(start: NaiveDateTime) -> Self {
        Self::with_pace(start, Pace::Accelerated(Duration::from_millis(1)))
    }

    fn with_pace(start: NaiveDateTime, pace: Pace) -> Self {
        Self {
            now: Mutex::new(start),
            delays: AtomicUsize::new(0),
            pace,
        }
    }

    /// Number of `delay` calls so far
    pub fn delay_calls(&self) -> usize {
        self.delays.load(Ordering::SeqCst)
    }

    /// Move logical time forward without waiting
    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        *now += chrono::Duration::from_std(by).unwrap_or(chrono::Duration::zero());
    }

    /// Jump logical time to `to`
    pub fn set(&self, to: NaiveDateTime) {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner) = to;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> NaiveDateTime {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn delay<'a>(&'a self, duration: Duration, cancel: &'a CancellationToken) -> DelayFuture<'a> {
        self.delays.fetch_add(1, Ordering::SeqCst);
        let real = match self.pace {
            Pace::Realtime => duration,
            Pace::Accelerated(step) => step,
        };
        Box::pin(async move {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => Err(Cancelled),
                _ = tokio::time::sleep(real) => {
                    self.advance(duration);
                    Ok(())
                }
            }
        })
    }
}
