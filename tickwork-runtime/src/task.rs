use crate::error::TaskFault;
use std::fmt;

/// Identity of a scheduled task, unique within one scheduler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(pub(crate) u64);

impl TaskId {
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "task-{}", self.0)
    }
}

/// What kind of schedule a task follows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskKind {
    /// One-shot after a relative delay
    Delayed,
    /// One-shot at an absolute local date-time
    At,
    /// Fixed cadence, drift compensated
    Interval,
    /// Daily at a time of day, optionally on selected weekdays
    Daily,
    /// Every minute at a given second
    MinuteAtSecond,
    /// Cron expression
    Cron,
    /// The scheduler's own reconciliation loop
    Reaper,
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TaskKind::Delayed => "delayed",
            TaskKind::At => "at",
            TaskKind::Interval => "interval",
            TaskKind::Daily => "daily",
            TaskKind::MinuteAtSecond => "minute-at-second",
            TaskKind::Cron => "cron",
            TaskKind::Reaper => "reaper",
        };
        f.write_str(name)
    }
}

/// How a scheduled task ended.
///
/// Cancellation is a normal outcome, not a fault: a recurring task only
/// ever ends as [`TaskOutcome::Cancelled`] or [`TaskOutcome::Faulted`]
/// (cron schedules may also run out of occurrences).
#[derive(Debug, Clone)]
pub enum TaskOutcome {
    Completed,
    Cancelled,
    Faulted(TaskFault),
}

impl TaskOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, TaskOutcome::Completed)
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, TaskOutcome::Cancelled)
    }

    pub fn is_faulted(&self) -> bool {
        matches!(self, TaskOutcome::Faulted(_))
    }

    /// The fault, if the task ended with one
    pub fn fault(&self) -> Option<&TaskFault> {
        match self {
            TaskOutcome::Faulted(fault) => Some(fault),
            _ => None,
        }
    }
}
