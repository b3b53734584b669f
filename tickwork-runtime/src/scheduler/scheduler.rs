use super::builder::SchedulerBuilder;
use super::handle::TaskHandle;
use super::runner::{self, boxed, TaskContext};
use crate::clock::Clock;
use crate::config::SchedulerConfig;
use crate::error::{ActionResult, PendingTask, Result, SchedulerError};
use crate::registry::{self, LiveTasks, TrackedTask};
use crate::task::{TaskId, TaskKind, TaskOutcome};
use crate::timing::parse_time_of_day;
use chrono::{NaiveDateTime, NaiveTime, Weekday};
use futures::future::{self, BoxFuture, FutureExt, Shared};
use std::future::Future;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Status {
    Active,
    Stopping,
    Stopped,
}

/// Settle step of an in-flight `stop`, yields the tasks that outlived the timeout
type Shutdown = Shared<BoxFuture<'static, Vec<PendingTask>>>;

struct Lifecycle {
    status: Status,
    cancel: CancellationToken,
    shutdown: Option<Shutdown>,
}

struct Inner {
    config: SchedulerConfig,
    clock: Arc<dyn Clock>,
    runtime: Handle,
    live: Arc<LiveTasks>,
    next_id: AtomicU64,
    lifecycle: Mutex<Lifecycle>,
}

impl Inner {
    fn lifecycle(&self) -> MutexGuard<'_, Lifecycle> {
        self.lifecycle.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn allocate_id(&self) -> TaskId {
        TaskId(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    /// Fresh process-wide signal plus a new reaper, status back to Active
    fn arm(&self, lifecycle: &mut Lifecycle) {
        lifecycle.status = Status::Active;
        lifecycle.cancel = CancellationToken::new();
        lifecycle.shutdown = None;

        let id = self.allocate_id();
        let reaper = TrackedTask::spawn(
            &self.runtime,
            id,
            TaskKind::Reaper,
            registry::reap(self.live.clone(), id, self.config.tick, lifecycle.cancel.clone()),
        );
        self.live.insert(reaper);
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        self.lifecycle().cancel.cancel();
    }
}

/// Registry of scheduled actions.
///
/// Cheap to clone; clones share the same tasks. Dropping the last clone
/// cancels every task it still owns without waiting for them, call
/// [`Scheduler::stop`] for an orderly shutdown.
#[derive(Clone)]
pub struct Scheduler {
    inner: Arc<Inner>,
}

impl Scheduler {
    pub fn builder() -> SchedulerBuilder {
        SchedulerBuilder::new()
    }

    pub(crate) fn start(config: SchedulerConfig, clock: Arc<dyn Clock>, runtime: Handle) -> Self {
        let inner = Inner {
            config,
            clock,
            runtime,
            live: Arc::new(LiveTasks::default()),
            next_id: AtomicU64::new(1),
            lifecycle: Mutex::new(Lifecycle {
                status: Status::Stopped,
                cancel: CancellationToken::new(),
                shutdown: None,
            }),
        };
        {
            let mut lifecycle = inner.lifecycle();
            inner.arm(&mut lifecycle);
        }
        Self {
            inner: Arc::new(inner),
        }
    }

    /// Run `action` once after `delay`
    pub fn run_in<F, Fut>(&self, delay: Duration, action: F) -> Result<TaskHandle>
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ActionResult> + Send + 'static,
    {
        let action = boxed(action);
        self.schedule(TaskKind::Delayed, move |ctx| runner::run_once(ctx, delay, action))
    }

    /// Run `action` once at a local date-time, immediately if it is in the past
    pub fn run_at<F, Fut>(&self, at: NaiveDateTime, action: F) -> Result<TaskHandle>
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ActionResult> + Send + 'static,
    {
        let action = boxed(action);
        self.schedule(TaskKind::At, move |ctx| runner::run_at(ctx, at, action))
    }

    /// Run `action` every `interval`, start to start.
    ///
    /// The first run happens right away. Runs never overlap: a run that
    /// takes longer than `interval` is followed by the next one without
    /// any wait. An action error ends the loop and faults the handle.
    pub fn run_every<F, Fut>(&self, interval: Duration, action: F) -> Result<TaskHandle>
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ActionResult> + Send + 'static,
    {
        if interval.is_zero() {
            return Err(SchedulerError::ZeroInterval);
        }
        let action = boxed(action);
        self.schedule(TaskKind::Interval, move |ctx| runner::run_every(ctx, interval, action))
    }

    /// Run `action` every day at `time` (`HH:MM:SS`), restricted to
    /// `weekdays` unless that is empty
    pub fn run_daily<F, Fut>(&self, time: &str, weekdays: &[Weekday], action: F) -> Result<TaskHandle>
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ActionResult> + Send + 'static,
    {
        let time = parse_time_of_day(time).ok_or_else(|| SchedulerError::InvalidTimeOfDay(time.to_string()))?;
        self.run_daily_at(time, weekdays, action)
    }

    /// [`run_daily`](Self::run_daily) with an already parsed time of day
    pub fn run_daily_at<F, Fut>(&self, time: NaiveTime, weekdays: &[Weekday], action: F) -> Result<TaskHandle>
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ActionResult> + Send + 'static,
    {
        let weekdays = weekdays.to_vec();
        let action = boxed(action);
        self.schedule(TaskKind::Daily, move |ctx| runner::run_daily(ctx, time, weekdays, action))
    }

    /// Run `action` every minute when the clock reaches `second`
    pub fn run_every_minute<F, Fut>(&self, second: u32, action: F) -> Result<TaskHandle>
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ActionResult> + Send + 'static,
    {
        if second > 59 {
            return Err(SchedulerError::InvalidSecond(second));
        }
        let action = boxed(action);
        self.schedule(TaskKind::MinuteAtSecond, move |ctx| {
            runner::run_every_minute(ctx, second, action)
        })
    }

    /// Run `action` on a cron expression with a leading seconds field,
    /// e.g. `"0 30 7 * * Mon-Fri"`
    pub fn run_cron<F, Fut>(&self, expression: &str, action: F) -> Result<TaskHandle>
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ActionResult> + Send + 'static,
    {
        let schedule = cron::Schedule::from_str(expression).map_err(|source| SchedulerError::InvalidCron {
            expression: expression.to_string(),
            source,
        })?;
        let action = boxed(action);
        self.schedule(TaskKind::Cron, move |ctx| runner::run_cron(ctx, schedule, action))
    }

    /// Spawn a task and track it, all while holding the lifecycle lock so a
    /// concurrent `stop` either sees the task or rejects it
    fn schedule<M, Fut>(&self, kind: TaskKind, make: M) -> Result<TaskHandle>
    where
        M: FnOnce(TaskContext) -> Fut,
        Fut: Future<Output = TaskOutcome> + Send + 'static,
    {
        let lifecycle = self.inner.lifecycle();
        if lifecycle.status != Status::Active {
            return Err(SchedulerError::Stopped);
        }

        let id = self.inner.allocate_id();
        let cancel = lifecycle.cancel.child_token();
        let ctx = TaskContext {
            id,
            clock: self.inner.clock.clone(),
            cancel: cancel.clone(),
        };
        let tracked = TrackedTask::spawn(&self.inner.runtime, id, kind, make(ctx));
        let completion = tracked.completion.clone();
        self.inner.live.insert(tracked);
        drop(lifecycle);

        debug!(task = %id, kind = %kind, "Registered scheduled task");
        Ok(TaskHandle::new(id, kind, cancel, completion))
    }

    /// Stop the scheduler.
    ///
    /// Cancels every task, then waits up to the configured shutdown timeout
    /// for all of them (the reaper included) to settle. Tasks still running
    /// after that are reported in [`SchedulerError::ShutdownTimeout`] and
    /// aborted. A `stop` that overlaps one already in progress waits for it
    /// and returns the same result; once stopped, `stop` is a no-op.
    pub async fn stop(&self) -> Result<()> {
        let shutdown = {
            let mut lifecycle = self.inner.lifecycle();
            let status = lifecycle.status;
            match status {
                Status::Stopped => return Ok(()),
                Status::Stopping => match &lifecycle.shutdown {
                    Some(shutdown) => shutdown.clone(),
                    None => return Ok(()),
                },
                Status::Active => {
                    lifecycle.status = Status::Stopping;
                    let shutdown = self.begin_shutdown(&lifecycle.cancel);
                    lifecycle.shutdown = Some(shutdown.clone());
                    shutdown
                }
            }
        };

        let pending = shutdown.await;
        {
            let mut lifecycle = self.inner.lifecycle();
            if lifecycle.status == Status::Stopping {
                lifecycle.status = Status::Stopped;
                lifecycle.shutdown = None;
            }
        }

        if pending.is_empty() {
            Ok(())
        } else {
            Err(SchedulerError::ShutdownTimeout { pending })
        }
    }

    /// Cancel everything and return the settle step, shared by every caller
    /// of `stop` until it has finished
    fn begin_shutdown(&self, cancel: &CancellationToken) -> Shutdown {
        info!(tasks = self.inner.live.len(), "Stopping scheduler");
        cancel.cancel();

        let live = self.inner.live.clone();
        let tracked = live.snapshot();
        let timeout = self.inner.config.shutdown_timeout;

        async move {
            let settle = future::join_all(tracked.iter().map(|task| task.completion.clone()));
            let settled = tokio::time::timeout(timeout, settle).await.is_ok();

            let pending: Vec<PendingTask> = if settled {
                Vec::new()
            } else {
                tracked
                    .iter()
                    .filter(|task| task.completion.peek().is_none())
                    .map(|task| PendingTask {
                        id: task.id,
                        kind: task.kind,
                    })
                    .collect()
            };

            for task in &tracked {
                if task.completion.peek().is_none() {
                    task.abort();
                }
            }
            live.clear();

            if pending.is_empty() {
                info!("Scheduler stopped");
            }
            for task in &pending {
                error!(task = %task.id, kind = %task.kind, timeout = ?timeout, "Task did not stop in time");
            }
            pending
        }
        .boxed()
        .shared()
    }

    /// Stop, then accept new tasks again with a fresh cancellation signal.
    /// Tasks scheduled before the restart stay cancelled.
    pub async fn restart(&self) -> Result<()> {
        self.stop().await?;
        let mut lifecycle = self.inner.lifecycle();
        if lifecycle.status == Status::Stopped {
            self.inner.arm(&mut lifecycle);
            info!("Scheduler restarted");
        }
        Ok(())
    }

    pub fn is_stopped(&self) -> bool {
        self.inner.lifecycle().status != Status::Active
    }

    /// Tasks currently tracked, the reaper included. Finished tasks
    /// disappear once the reaper has pruned them.
    pub fn active_tasks(&self) -> Vec<(TaskId, TaskKind)> {
        let mut tasks: Vec<_> = self
            .inner
            .live
            .snapshot()
            .into_iter()
            .map(|task| (task.id, task.kind))
            .collect();
        tasks.sort_by_key(|(id, _)| *id);
        tasks
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.inner.clock
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.inner.config
    }
}
