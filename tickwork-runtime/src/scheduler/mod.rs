mod builder;
mod handle;
mod runner;
mod scheduler;

pub use builder::SchedulerBuilder;
pub use handle::TaskHandle;
pub use scheduler::Scheduler;
