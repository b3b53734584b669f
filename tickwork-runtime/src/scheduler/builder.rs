use super::scheduler::Scheduler;
use crate::clock::{Clock, SystemClock};
use crate::config::{load_toml_config, load_yaml_config, SchedulerConfig};
use crate::error::{Result, SchedulerError};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tracing::info;

/// Builder for the scheduler
pub struct SchedulerBuilder {
    pub(crate) config: SchedulerConfig,
    pub(crate) clock: Arc<dyn Clock>,
}

impl Default for SchedulerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SchedulerBuilder {
    /// Create a new scheduler builder with default settings and the system clock
    pub fn new() -> Self {
        Self::with_config(SchedulerConfig::default())
    }

    /// Create with TOML config file
    pub fn with_toml<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(Self::with_config(load_toml_config(path)?))
    }

    /// Create with YAML config file
    pub fn with_yaml<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(Self::with_config(load_yaml_config(path)?))
    }

    /// Create with custom config
    pub fn with_config(config: SchedulerConfig) -> Self {
        Self {
            config,
            clock: Arc::new(SystemClock),
        }
    }

    /// Use a different time source, e.g. [`ManualClock`](crate::ManualClock) in tests
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Heartbeat of the reconciliation loop
    pub fn tick(mut self, tick: Duration) -> Self {
        self.config.tick = tick;
        self
    }

    /// How long `stop` waits for tasks before reporting a failure
    pub fn shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.config.shutdown_timeout = timeout;
        self
    }

    /// Build and start the scheduler.
    ///
    /// Must be called from within a tokio runtime; tasks are spawned on that
    /// runtime, so registering them later works from any thread.
    pub fn build(self) -> Result<Scheduler> {
        let runtime = Handle::try_current().map_err(|_| SchedulerError::NoRuntime)?;

        info!(
            tick = ?self.config.tick,
            shutdown_timeout = ?self.config.shutdown_timeout,
            "Building scheduler"
        );

        Ok(Scheduler::start(self.config, self.clock, runtime))
    }
}
