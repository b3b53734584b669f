//! # Tickwork - async scheduling for automation hosts
//!
//! Register delayed, recurring and time-of-day actions on a tokio runtime,
//! cancel them one by one, and shut everything down within a bounded time.
//!
//! ## Features
//!
//! - **Run in**: run once after a delay
//! - **Run at**: run once at a local date-time
//! - **Run every**: fixed cadence, execution time is subtracted from the wait
//! - **Run daily**: at `HH:MM:SS`, optionally on selected weekdays only
//! - **Run every minute**: at a given second of every minute
//! - **Cron**: six-field cron expressions (seconds first)
//! - **Orderly shutdown**: `stop()` cancels every task and reports any that
//!   do not settle within the shutdown timeout
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use tickwork::{Scheduler, Weekday};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let scheduler = Scheduler::builder().build()?;
//!
//!     scheduler.run_every(Duration::from_secs(30), || async {
//!         println!("every 30 seconds");
//!         Ok(())
//!     })?;
//!
//!     scheduler.run_daily("07:30:00", &[Weekday::Mon, Weekday::Fri], || async {
//!         println!("good morning");
//!         Ok(())
//!     })?;
//!
//!     let reminder = scheduler.run_in(Duration::from_secs(10), || async {
//!         println!("ten seconds later");
//!         Ok(())
//!     })?;
//!     reminder.cancel();
//!
//!     tokio::signal::ctrl_c().await?;
//!     scheduler.stop().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Configuration
//!
//! `SchedulerBuilder::with_toml("config/scheduler.toml")` reads:
//!
//! ```toml
//! [scheduler]
//! tick = "100ms"
//! shutdown_timeout = "1s"
//! ```
//!
//! Environment variables override the file, e.g.
//! `TICKWORK_SCHEDULER__SHUTDOWN_TIMEOUT=2s`.

// Re-export core types
pub use tickwork_runtime::{
    load_toml_config, load_yaml_config, timing, ActionResult, BoxError, Cancelled, Clock,
    ManualClock, PendingTask, Result, Scheduler, SchedulerBuilder, SchedulerConfig,
    SchedulerError, SystemClock, TaskFault, TaskHandle, TaskId, TaskKind, TaskOutcome, TimeUnit,
};

// Make tickwork_runtime available to downstream crates
pub use tickwork_runtime;

// Re-export commonly used chrono types
pub use chrono::{NaiveDateTime, NaiveTime, Weekday};
