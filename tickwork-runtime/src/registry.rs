//! Live-task set and the reconciliation loop that prunes it.

use crate::error::TaskFault;
use crate::task::{TaskId, TaskKind, TaskOutcome};
use futures::future::{BoxFuture, FutureExt, Shared};
use futures::stream::{FuturesUnordered, StreamExt};
use std::any::Any;
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::Notify;
use tokio::task::AbortHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

/// Awaitable outcome of a spawned task, shareable between the registry
/// and any number of handles
pub(crate) type Completion = Shared<BoxFuture<'static, TaskOutcome>>;

/// A spawned task as seen by the registry
#[derive(Clone)]
pub(crate) struct TrackedTask {
    pub(crate) id: TaskId,
    pub(crate) kind: TaskKind,
    pub(crate) completion: Completion,
    abort: Arc<AbortHandle>,
}

impl TrackedTask {
    /// Spawn `fut` on `runtime` and start tracking it
    pub(crate) fn spawn<Fut>(runtime: &Handle, id: TaskId, kind: TaskKind, fut: Fut) -> Self
    where
        Fut: Future<Output = TaskOutcome> + Send + 'static,
    {
        let join = runtime.spawn(fut);
        let abort = Arc::new(join.abort_handle());
        let completion = async move {
            match join.await {
                Ok(outcome) => outcome,
                Err(err) => match err.try_into_panic() {
                    Ok(payload) => {
                        let message = panic_message(payload);
                        warn!(task = %id, kind = %kind, panic = %message, "Scheduled task panicked");
                        TaskOutcome::Faulted(TaskFault::Panicked(message))
                    }
                    Err(_) => TaskOutcome::Cancelled,
                },
            }
        }
        .boxed()
        .shared();

        Self {
            id,
            kind,
            completion,
            abort,
        }
    }

    pub(crate) fn is_finished(&self) -> bool {
        self.completion.peek().is_some() || self.abort.is_finished()
    }

    /// Forcibly stop the task at its next poll
    pub(crate) fn abort(&self) {
        self.abort.abort();
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

#[derive(Default)]
struct Entries {
    tasks: HashMap<TaskId, TrackedTask>,
    /// Inserted since the reaper last looked
    fresh: Vec<TrackedTask>,
}

/// Concurrency-safe map of every task that has not been pruned yet
#[derive(Default)]
pub(crate) struct LiveTasks {
    entries: Mutex<Entries>,
    inserted: Notify,
}

impl LiveTasks {
    fn lock(&self) -> MutexGuard<'_, Entries> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn insert(&self, task: TrackedTask) {
        {
            let mut entries = self.lock();
            entries.fresh.push(task.clone());
            entries.tasks.insert(task.id, task);
        }
        self.inserted.notify_one();
    }

    pub(crate) fn remove(&self, id: TaskId) -> Option<TrackedTask> {
        self.lock().tasks.remove(&id)
    }

    pub(crate) fn snapshot(&self) -> Vec<TrackedTask> {
        self.lock().tasks.values().cloned().collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.lock().tasks.len()
    }

    pub(crate) fn clear(&self) {
        let mut entries = self.lock();
        entries.tasks.clear();
        entries.fresh.clear();
    }

    fn take_fresh(&self) -> Vec<TrackedTask> {
        std::mem::take(&mut self.lock().fresh)
    }

    /// Drop every entry whose task has finished, returns how many went
    pub(crate) fn prune_finished(&self) -> usize {
        let mut entries = self.lock();
        let before = entries.tasks.len();
        entries.tasks.retain(|_, task| !task.is_finished());
        before - entries.tasks.len()
    }
}

/// Reconciliation loop: removes each task as soon as its completion
/// resolves and sweeps the whole set on every heartbeat `tick`. Runs
/// until `cancel` fires.
///
/// Every task is watched once, from the moment it is inserted, so a pass
/// only polls the completions that actually woke up.
pub(crate) async fn reap(
    live: Arc<LiveTasks>,
    reaper_id: TaskId,
    tick: Duration,
    cancel: CancellationToken,
) -> TaskOutcome {
    debug!(task = %reaper_id, tick = ?tick, "Reaper started");

    let mut waiters: FuturesUnordered<BoxFuture<'static, TaskId>> = FuturesUnordered::new();
    loop {
        for task in live.take_fresh() {
            if task.id == reaper_id {
                continue;
            }
            let id = task.id;
            waiters.push(task.completion.map(move |_| id).boxed());
        }

        tokio::select! {
            _ = cancel.cancelled() => break,
            Some(id) = waiters.next(), if !waiters.is_empty() => {
                if live.remove(id).is_some() {
                    trace!(task = %id, "Removed finished task");
                }
            }
            _ = live.inserted.notified() => {}
            _ = tokio::time::sleep(tick) => {
                let pruned = live.prune_finished();
                if pruned > 0 {
                    debug!(pruned, remaining = live.len(), "Pruned finished tasks");
                }
            }
        }
    }

    debug!(task = %reaper_id, watching = waiters.len(), "Reaper stopped");
    TaskOutcome::Cancelled
}
