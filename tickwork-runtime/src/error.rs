//! Error types for the scheduler.

use crate::task::{TaskId, TaskKind};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Result type for scheduler operations.
pub type Result<T> = std::result::Result<T, SchedulerError>;

/// Boxed error an action may return.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// What every scheduled action returns.
pub type ActionResult = std::result::Result<(), BoxError>;

/// Errors raised by the scheduler itself.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// The scheduler was stopped, no new tasks are accepted.
    #[error("Scheduler is stopped")]
    Stopped,

    /// The builder was used outside of a tokio runtime.
    #[error("No tokio runtime available to spawn scheduled tasks")]
    NoRuntime,

    /// Time of day did not match `HH:MM:SS`.
    #[error("Invalid time of day '{0}', expected HH:MM:SS")]
    InvalidTimeOfDay(String),

    /// Second-within-minute outside `0..=59`.
    #[error("Invalid second {0}, expected 0..=59")]
    InvalidSecond(u32),

    /// Recurring interval of zero length.
    #[error("Interval must be greater than zero")]
    ZeroInterval,

    /// Cron expression could not be parsed.
    #[error("Invalid cron expression '{expression}': {source}")]
    InvalidCron {
        expression: String,
        #[source]
        source: cron::error::Error,
    },

    /// Duration string that is neither shorthand nor plain milliseconds.
    #[error("Invalid duration '{0}'")]
    InvalidDuration(String),

    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// Some tasks did not settle within the shutdown window.
    #[error("Failed to cancel all tasks: {} still pending ({})", pending.len(), PendingList(pending))]
    ShutdownTimeout { pending: Vec<PendingTask> },
}

/// A task that was still running when the shutdown window closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingTask {
    pub id: TaskId,
    pub kind: TaskKind,
}

impl fmt::Display for PendingTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.id, self.kind)
    }
}

struct PendingList<'a>(&'a [PendingTask]);

impl fmt::Display for PendingList<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, task) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", task)?;
        }
        Ok(())
    }
}

/// Why a scheduled task ended with a fault.
#[derive(Debug, Clone, Error)]
pub enum TaskFault {
    /// The action returned an error.
    #[error("Scheduled action failed: {0}")]
    Action(Arc<dyn std::error::Error + Send + Sync>),

    /// The action panicked.
    #[error("Scheduled action panicked: {0}")]
    Panicked(String),
}

impl From<BoxError> for TaskFault {
    fn from(err: BoxError) -> Self {
        TaskFault::Action(Arc::from(err))
    }
}

/// Returned by [`Clock::delay`](crate::Clock::delay) when the wait was interrupted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Delay cancelled")]
pub struct Cancelled;
