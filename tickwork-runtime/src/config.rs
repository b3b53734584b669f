use crate::error::Result;
use crate::time_unit::resolve_duration;
use config::{Config, File, FileFormat};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Heartbeat of the reconciliation loop.
pub const DEFAULT_TICK: Duration = Duration::from_millis(100);

/// How long shutdown waits for tasks to settle.
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_millis(1000);

/// Runtime settings of a scheduler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerConfig {
    pub tick: Duration,
    pub shutdown_timeout: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            tick: DEFAULT_TICK,
            shutdown_timeout: DEFAULT_SHUTDOWN_TIMEOUT,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct RawSettings {
    #[serde(default)]
    scheduler: RawSchedulerSection,
}

#[derive(Debug, Default, Deserialize)]
struct RawSchedulerSection {
    tick: Option<String>,
    shutdown_timeout: Option<String>,
}

impl SchedulerConfig {
    /// Read the `[scheduler]` section of a loaded config, falling back to
    /// defaults for missing keys
    pub fn from_config(config: &Config) -> Result<Self> {
        let raw: RawSettings = config.clone().try_deserialize()?;
        let mut settings = Self::default();
        if let Some(tick) = raw.scheduler.tick {
            settings.tick = resolve_duration(&tick)?;
        }
        if let Some(timeout) = raw.scheduler.shutdown_timeout {
            settings.shutdown_timeout = resolve_duration(&timeout)?;
        }
        Ok(settings)
    }
}

fn environment() -> config::Environment {
    config::Environment::with_prefix("TICKWORK")
        .prefix_separator("_")
        .separator("__")
}

/// Load config from a specific TOML file
pub fn load_toml_config<P: AsRef<Path>>(path: P) -> Result<SchedulerConfig> {
    let config = Config::builder()
        .add_source(File::from(path.as_ref()).format(FileFormat::Toml))
        .add_source(environment())
        .build()?;
    SchedulerConfig::from_config(&config)
}

/// Load config from a specific YAML file
pub fn load_yaml_config<P: AsRef<Path>>(path: P) -> Result<SchedulerConfig> {
    let config = Config::builder()
        .add_source(File::from(path.as_ref()).format(FileFormat::Yaml))
        .add_source(environment())
        .build()?;
    SchedulerConfig::from_config(&config)
}
