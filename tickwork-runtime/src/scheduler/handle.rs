use crate::registry::Completion;
use crate::task::{TaskId, TaskKind, TaskOutcome};
use futures::FutureExt;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio_util::sync::CancellationToken;

/// Handle for one scheduled task
///
/// Awaiting the handle resolves once the task has ended, which for a
/// recurring schedule means its loop exited (cancelled or faulted), not
/// after each invocation. The handle stays valid after the task has been
/// pruned from the scheduler, and clones share the same outcome.
#[derive(Clone)]
pub struct TaskHandle {
    id: TaskId,
    kind: TaskKind,
    cancel: CancellationToken,
    completion: Completion,
}

impl TaskHandle {
    pub(crate) fn new(id: TaskId, kind: TaskKind, cancel: CancellationToken, completion: Completion) -> Self {
        Self {
            id,
            kind,
            cancel,
            completion,
        }
    }

    pub fn id(&self) -> TaskId {
        self.id
    }

    pub fn kind(&self) -> TaskKind {
        self.kind
    }

    /// Cancel this task only, other tasks keep running
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Whether cancellation was requested, by this handle or by scheduler shutdown
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Whether the task has ended, without waiting for it
    pub fn is_finished(&self) -> bool {
        self.completion.peek().is_some() || self.completion.clone().now_or_never().is_some()
    }
}

impl Future for TaskHandle {
    type Output = TaskOutcome;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.completion).poll(cx)
    }
}

impl fmt::Debug for TaskHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskHandle")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("cancelled", &self.is_cancelled())
            .field("finished", &self.is_finished())
            .finish()
    }
}
