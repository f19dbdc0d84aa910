pub mod app;
pub mod outcome;
pub mod pipeline;
pub mod schedule;
pub mod stats;

pub use outcome::TriggerOutcome;
pub use pipeline::Pipeline;
pub use schedule::{CronSchedule, ScheduleError};
pub use stats::RunStats;
