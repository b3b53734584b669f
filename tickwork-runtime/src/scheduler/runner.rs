//! The loops behind each kind of schedule.
//!
//! Every loop suspends only inside [`Clock::delay`] and while awaiting the
//! action itself. Cancellation is observed at the next delay or at the top
//! of the next iteration, never in the middle of an action.

use crate::clock::Clock;
use crate::error::{ActionResult, TaskFault};
use crate::task::{TaskId, TaskOutcome};
use crate::timing::{next_daily_wait, time_until_minute_at};
use chrono::{NaiveDateTime, NaiveTime, TimeZone, Utc, Weekday};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

/// Type-erased user action
pub(crate) type BoxAction =
    Box<dyn FnMut() -> Pin<Box<dyn Future<Output = ActionResult> + Send>> + Send>;

pub(crate) fn boxed<F, Fut>(mut action: F) -> BoxAction
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = ActionResult> + Send + 'static,
{
    Box::new(move || Box::pin(action()))
}

/// Everything a running task needs besides its action
pub(crate) struct TaskContext {
    pub(crate) id: TaskId,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) cancel: CancellationToken,
}

impl TaskContext {
    async fn delay(&self, duration: Duration) -> bool {
        self.clock.delay(duration, &self.cancel).await.is_ok()
    }

    async fn invoke(&self, action: &mut BoxAction) -> Result<(), TaskFault> {
        trace!(task = %self.id, time = %self.clock.now(), "Invoking scheduled action");
        action().await.map_err(|err| {
            warn!(task = %self.id, error = %err, "Unhandled error in scheduled action");
            TaskFault::from(err)
        })
    }
}

/// Wait `delay`, then invoke once
pub(crate) async fn run_once(ctx: TaskContext, delay: Duration, mut action: BoxAction) -> TaskOutcome {
    trace!(task = %ctx.id, delay = ?delay, "RunIn");
    if !ctx.delay(delay).await {
        return TaskOutcome::Cancelled;
    }
    match ctx.invoke(&mut action).await {
        Ok(()) => TaskOutcome::Completed,
        Err(fault) => TaskOutcome::Faulted(fault),
    }
}

/// Invoke once at `at` local time, immediately if that is already past
pub(crate) async fn run_at(ctx: TaskContext, at: NaiveDateTime, action: BoxAction) -> TaskOutcome {
    let delay = (at - ctx.clock.now()).to_std().unwrap_or_default();
    run_once(ctx, delay, action).await
}

/// Invoke every `interval`, measured start to start.
///
/// Execution time is subtracted from the next wait; an overrun skips the
/// wait altogether rather than queueing catch-up runs.
pub(crate) async fn run_every(ctx: TaskContext, interval: Duration, mut action: BoxAction) -> TaskOutcome {
    while !ctx.cancel.is_cancelled() {
        let started = Instant::now();
        if let Err(fault) = ctx.invoke(&mut action).await {
            return TaskOutcome::Faulted(fault);
        }
        let elapsed = started.elapsed();

        if let Some(rest) = interval.checked_sub(elapsed).filter(|d| !d.is_zero()) {
            trace!(task = %ctx.id, interval = ?interval, delay = ?rest, "RunEvery");
            if !ctx.delay(rest).await {
                break;
            }
        } else {
            trace!(task = %ctx.id, interval = ?interval, elapsed = ?elapsed, "RunEvery overran, no delay");
        }
    }
    TaskOutcome::Cancelled
}

/// Invoke daily at `time`, on `weekdays` only when that is non-empty
pub(crate) async fn run_daily(
    ctx: TaskContext,
    time: NaiveTime,
    weekdays: Vec<Weekday>,
    mut action: BoxAction,
) -> TaskOutcome {
    let mut fired = false;
    while !ctx.cancel.is_cancelled() {
        let wait = next_daily_wait(ctx.clock.now(), time, &weekdays, fired);
        trace!(task = %ctx.id, time = %time, delay = ?wait, "RunDaily");
        if !ctx.delay(wait).await {
            break;
        }
        if let Err(fault) = ctx.invoke(&mut action).await {
            return TaskOutcome::Faulted(fault);
        }
        fired = true;
    }
    TaskOutcome::Cancelled
}

/// Invoke every minute when the clock reaches `second`
pub(crate) async fn run_every_minute(ctx: TaskContext, second: u32, mut action: BoxAction) -> TaskOutcome {
    while !ctx.cancel.is_cancelled() {
        let wait = time_until_minute_at(ctx.clock.now(), second);
        trace!(task = %ctx.id, second, delay = ?wait, "RunEveryMinute");
        if !ctx.delay(wait).await {
            break;
        }
        if let Err(fault) = ctx.invoke(&mut action).await {
            return TaskOutcome::Faulted(fault);
        }
    }
    TaskOutcome::Cancelled
}

/// Invoke on every occurrence of `schedule`, evaluated on local wall time
pub(crate) async fn run_cron(ctx: TaskContext, schedule: cron::Schedule, mut action: BoxAction) -> TaskOutcome {
    while !ctx.cancel.is_cancelled() {
        // cron evaluates in a timezone; local wall time is treated as UTC
        // so occurrences match the clock face
        let now = Utc.from_utc_datetime(&ctx.clock.now());
        let Some(next) = schedule.after(&now).next() else {
            debug!(task = %ctx.id, "Cron schedule has no further occurrences");
            return TaskOutcome::Completed;
        };
        let wait = (next - now).to_std().unwrap_or_default();
        trace!(task = %ctx.id, next = %next.naive_utc(), delay = ?wait, "RunCron");
        if !ctx.delay(wait).await {
            break;
        }
        if let Err(fault) = ctx.invoke(&mut action).await {
            return TaskOutcome::Faulted(fault);
        }
    }
    TaskOutcome::Cancelled
}
