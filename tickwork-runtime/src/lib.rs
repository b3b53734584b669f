//! Tickwork Runtime - Core engine for delayed, recurring and time-of-day tasks
//!
//! This crate provides the scheduler, its clock abstraction and the pure
//! time calculations behind daily and minute schedules.

mod clock;
mod config;
mod error;
mod registry;
mod scheduler;
mod task;
mod time_unit;
pub mod timing;

// Re-export public API
pub use clock::{Clock, DelayFuture, ManualClock, SystemClock};
pub use config::{load_toml_config, load_yaml_config, SchedulerConfig, DEFAULT_SHUTDOWN_TIMEOUT, DEFAULT_TICK};
pub use error::{ActionResult, BoxError, Cancelled, PendingTask, Result, SchedulerError, TaskFault};
pub use scheduler::{Scheduler, SchedulerBuilder, TaskHandle};
pub use task::{TaskId, TaskKind, TaskOutcome};
pub use time_unit::{resolve_duration, TimeUnit};
